//! Error rendering.
//!
//! Every failure is shown as a title plus remediation steps. JSON and
//! Markdown formats get a structured object for machine consumption.

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::{FixSuggestion, GatewayError};

// =============================================================================
// Public API
// =============================================================================

/// Render an error for stderr.
#[must_use]
pub fn render_error(error: &GatewayError, format: OutputFormat, no_color: bool) -> String {
    render_error_full(error, format, no_color, false)
}

/// Render an error with explicit control over `--pretty`.
#[must_use]
pub fn render_error_full(
    error: &GatewayError,
    format: OutputFormat,
    no_color: bool,
    pretty: bool,
) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Md => render_error_json(error, true),
        OutputFormat::Human => {
            let use_color = !no_color && crate::util::env::stderr_is_tty();
            render_human(error, use_color)
        }
    }
}

/// Render error as structured JSON.
#[must_use]
pub fn render_error_json(error: &GatewayError, pretty: bool) -> String {
    let json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    rendered.unwrap_or_else(|_| render_human(error, false))
}

// =============================================================================
// Human Rendering
// =============================================================================

fn render_human(error: &GatewayError, use_color: bool) -> String {
    let suggestions = error.fix_suggestions();
    let mut lines = Vec::new();

    let title = error.title();
    let code = format!("[{}]", error.error_code());
    if use_color {
        lines.push(format!("{} {}", title.red().bold(), code.dimmed()));
        lines.push(format!("  {error}"));
    } else {
        lines.push(format!("Error: {title} {code}"));
        lines.push(format!("  {error}"));
    }

    if let Some(context) = suggestions.first().map(|s| s.context.as_str()) {
        if !context.is_empty() {
            lines.push(String::new());
            lines.push(format!("  {context}"));
        }
    }

    let steps = numbered_steps(&suggestions);
    if !steps.is_empty() {
        lines.push(String::new());
        let header = "How to fix:";
        lines.push(if use_color {
            header.cyan().bold().to_string()
        } else {
            header.to_string()
        });
        lines.extend(steps);
    }

    if let Some(prevention) = suggestions.first().and_then(|s| s.prevention.as_deref()) {
        lines.push(String::new());
        lines.push(if use_color {
            format!("  {}", prevention.dimmed())
        } else {
            format!("  {prevention}")
        });
    }

    lines.join("\n")
}

fn numbered_steps(suggestions: &[FixSuggestion]) -> Vec<String> {
    suggestions
        .iter()
        .flat_map(|s| s.commands.iter())
        .enumerate()
        .map(|(i, step)| format!("  {}. {step}", i + 1))
        .collect()
}

// =============================================================================
// JSON Rendering
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorJson {
    error: bool,
    code: &'static str,
    category: &'static str,
    title: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic_code: Option<String>,
    retryable: bool,
    exit_code: i32,
    suggestions: Vec<FixSuggestion>,
}

impl ErrorJson {
    fn from_error(error: &GatewayError) -> Self {
        let diagnostic_code = match error {
            GatewayError::Request(err) => Some(err.code.key()),
            _ => None,
        };
        Self {
            error: true,
            code: error.error_code(),
            category: error.category().description(),
            title: error.title(),
            message: error.to_string(),
            diagnostic_code,
            retryable: error.is_retryable(),
            exit_code: error.exit_code().into(),
            suggestions: error.fix_suggestions(),
        }
    }
}
