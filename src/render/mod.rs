//! Output rendering for human and robot modes.

pub mod doctor;
pub mod error;
pub mod human;
pub mod robot;

use chrono::{DateTime, Utc};

use crate::cli::args::OutputFormat;
use crate::cli::chat::{ChatReply, ConnectionReport};
use crate::cli::status::PingReport;
use crate::core::doctor::DiagnosticReport;
use crate::core::status::StatusSnapshot;
use crate::error::{Explanation, Result};

/// Render a chat reply.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_chat(
    reply: &ChatReply,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_chat(reply, no_color)),
        OutputFormat::Json => robot::render_json("chat", reply, pretty),
        OutputFormat::Md => Ok(robot::chat_md(reply)),
    }
}

/// Render a connection test result.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_connection(
    report: &ConnectionReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_connection(report, no_color)),
        OutputFormat::Json => robot::render_json("test", report, pretty),
        OutputFormat::Md => Ok(robot::connection_md(report)),
    }
}

/// Render a ping result.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_ping(
    report: &PingReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_ping(report, no_color)),
        OutputFormat::Json => robot::render_json("ping", report, pretty),
        OutputFormat::Md => Ok(robot::ping_md(report)),
    }
}

/// Render a status snapshot.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_status(
    snapshot: &StatusSnapshot,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_status(snapshot, no_color)),
        OutputFormat::Json => robot::render_json("status", snapshot, pretty),
        OutputFormat::Md => Ok(robot::status_md(snapshot)),
    }
}

/// Render one watch tick. Markdown falls back to the plain status line.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_watch_line(
    snapshot: &StatusSnapshot,
    passed: usize,
    needs_attention: usize,
    at: Option<DateTime<Utc>>,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let tick = serde_json::json!({
                "status": snapshot,
                "passed": passed,
                "needsAttention": needs_attention,
                "at": at,
            });
            robot::render_json("watch", &tick, pretty)
        }
        OutputFormat::Human => Ok(human::render_watch_line(
            snapshot,
            passed,
            needs_attention,
            at,
            no_color,
        )),
        OutputFormat::Md => Ok(human::render_watch_line(
            snapshot,
            passed,
            needs_attention,
            at,
            true,
        )),
    }
}

/// Render an error code explanation.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_explain(
    explanation: &Explanation,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_explain(explanation, no_color)),
        OutputFormat::Json => robot::render_json("explain", explanation, pretty),
        OutputFormat::Md => Ok(robot::explain_md(explanation)),
    }
}

/// Render a diagnostic report.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_doctor(
    report: &DiagnosticReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => doctor::render_human(report, no_color),
        OutputFormat::Json => doctor::render_json(report, pretty),
        OutputFormat::Md => doctor::render_md(report),
    }
}
