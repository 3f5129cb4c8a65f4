//! Doctor command implementation.

use std::sync::Arc;

use crate::cli::args::OutputFormat;
use crate::core::doctor::runner::DiagnosticRunner;
use crate::core::gateway::GatewayClient;
use crate::core::status::StatusBoard;
use crate::error::{ExitCode, Result};
use crate::render;
use crate::storage::GatewayConfig;

/// Execute the doctor command. Exit 1 when any step needs attention.
///
/// # Errors
///
/// Returns configuration errors, or an error if rendering fails.
pub async fn execute(
    config: GatewayConfig,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<ExitCode> {
    let client = Arc::new(GatewayClient::new(config)?);
    let runner = DiagnosticRunner::new(client, Arc::new(StatusBoard::new()));

    let report = runner.run().await;
    print!(
        "{}",
        render::render_doctor(&report, format, pretty, no_color)?
    );
    if format == OutputFormat::Json {
        println!();
    }

    let (_, needs_attention) = report.summary();
    Ok(if needs_attention > 0 {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    })
}
