//! `explain` command.

use crate::cli::args::{ExplainArgs, OutputFormat};
use crate::error::{ExitCode, Result, explain};
use crate::render;

/// Print the remediation record for a code. Needs no configuration.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub fn execute(
    args: &ExplainArgs,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<ExitCode> {
    let explanation = explain(&args.code);
    println!(
        "{}",
        render::render_explain(&explanation, format, pretty, no_color)?
    );
    Ok(ExitCode::Success)
}
