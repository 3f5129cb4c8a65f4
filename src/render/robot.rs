//! Robot-mode output (JSON and Markdown).
//!
//! JSON output is wrapped in a versioned [`RobotOutput`] envelope so scripts
//! can rely on a stable shape.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::chat::{ChatReply, ConnectionReport};
use crate::cli::status::PingReport;
use crate::core::status::StatusSnapshot;
use crate::error::{Explanation, Result};

pub const SCHEMA_VERSION: &str = "chatgate.v1";

/// Envelope for JSON output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub command: &'static str,
    pub data: T,
}

impl<T> RobotOutput<T> {
    #[must_use]
    pub fn new(command: &'static str, data: T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            command,
            data,
        }
    }
}

/// Serialize `data` for `command` inside the envelope.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json<T: Serialize>(command: &'static str, data: &T, pretty: bool) -> Result<String> {
    let output = RobotOutput::new(command, data);
    Ok(if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    })
}

// =============================================================================
// Markdown
// =============================================================================

#[must_use]
pub fn chat_md(reply: &ChatReply) -> String {
    let mut output = reply.content.clone();
    if reply.mock {
        output.push_str("\n\n> Demo mode reply.");
    }
    output
}

#[must_use]
pub fn connection_md(report: &ConnectionReport) -> String {
    let mut output = String::from("## API connection\n\n");
    if report.connected {
        output.push_str("- **Status:** \u{2705} connected\n");
    } else {
        output.push_str("- **Status:** \u{274C} unavailable\n");
    }
    if let Some(err) = &report.error {
        let remediation = err.remediation();
        let _ = writeln!(output, "- **Error:** `{}` {}", err.code, remediation.title);
        let _ = writeln!(output, "- **Message:** {}", err.raw_message);
        for step in remediation.steps {
            let _ = writeln!(output, "  - {step}");
        }
    }
    output
}

#[must_use]
pub fn ping_md(report: &PingReport) -> String {
    let latency = report
        .latency_ms
        .map_or_else(|| "unavailable".to_string(), |ms| format!("{ms} ms"));
    format!(
        "## Ping\n\n- **Network:** {}\n- **Target:** {}\n- **Latency:** {latency}\n",
        if report.online { "online" } else { "offline" },
        report.target
    )
}

#[must_use]
pub fn status_md(snapshot: &StatusSnapshot) -> String {
    let ping = snapshot
        .ping
        .map_or_else(|| "-".to_string(), |ms| format!("{ms} ms"));
    let last_check = snapshot
        .last_check
        .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
    format!(
        "## Status\n\n| Field | Value |\n|-------|-------|\n\
         | Network | {} |\n| API | {} |\n| Token | {} |\n| Ping | {ping} |\n| Last check | {last_check} |\n",
        snapshot.network,
        enum_label(&snapshot.api),
        enum_label(&snapshot.token),
    )
}

#[must_use]
pub fn explain_md(explanation: &Explanation) -> String {
    let mut output = format!("## {} (`{}`)\n\n{}\n\n", explanation.title, explanation.key, explanation.solution);
    for (i, step) in explanation.steps.iter().enumerate() {
        let _ = writeln!(output, "{}. {step}", i + 1);
    }
    if let Some(policy) = &explanation.retry_policy {
        let _ = write!(output, "\n**Retry policy:** {policy}\n");
    }
    output
}

/// Lowercase serde name of a unit enum (`active`, `invalid`, ...).
pub(crate) fn enum_label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
