//! Diagnostic report rendering.

use std::fmt::Write as _;

use colored::{Color, Colorize};

use crate::core::doctor::{CheckStatus, DiagnosticCheck, DiagnosticReport};
use crate::error::Result;

const TITLE: &str = "chatgate doctor - Diagnostic Report";

// =============================================================================
// Human-Readable Output
// =============================================================================

/// Render a report for a terminal.
///
/// # Errors
///
/// Infallible today; returns `Result` to match the other formats.
pub fn render_human(report: &DiagnosticReport, no_color: bool) -> Result<String> {
    let mut output = String::new();

    if no_color {
        let border = "-".repeat(TITLE.len() + 4);
        let _ = writeln!(output, "{border}\n| {TITLE} |\n{border}");
    } else {
        let _ = writeln!(output, "{}", TITLE.cyan().bold());
    }
    if report.mock_mode {
        let _ = writeln!(output, "{}", paint("(demo mode)", Color::Yellow, no_color));
    }
    output.push('\n');

    for check in &report.checks {
        output.push_str(&render_check_line(check, no_color));
        output.push('\n');
    }

    if !report.recommendations.is_empty() {
        output.push('\n');
        let _ = writeln!(output, "{}", paint("Recommendations:", Color::Cyan, no_color));
        for (i, recommendation) in report.recommendations.iter().enumerate() {
            let _ = writeln!(output, "  {}. {recommendation}", i + 1);
        }
    }

    output.push('\n');
    output.push_str(&render_summary(report, no_color));
    Ok(output)
}

fn render_check_line(check: &DiagnosticCheck, no_color: bool) -> String {
    let icon = status_icon(&check.status, no_color);
    let detail = check.status.detail().unwrap_or_default();
    let mut line = format!("{icon} {:<14} {detail}", check.name());
    if let Some(code) = check.code {
        let _ = write!(line, " [{code}]");
    }
    let mut line = paint(&line, status_color(&check.status), no_color);

    if let Some(suggestion) = check.status.suggestion() {
        let _ = write!(line, "\n    -> {suggestion}");
    }
    line
}

fn render_summary(report: &DiagnosticReport, no_color: bool) -> String {
    let (passed, needs_attention) = report.summary();
    let summary = format!("Summary: {passed} passed, {needs_attention} need attention");
    let time = format!("[{}ms]", report.total_duration.as_millis());
    let color = if needs_attention > 0 {
        Color::Yellow
    } else {
        Color::Green
    };
    format!(
        "{}\n{:<50} {}\n",
        "-".repeat(60),
        paint(&summary, color, no_color),
        if no_color {
            time
        } else {
            time.dimmed().to_string()
        }
    )
}

const fn status_icon(status: &CheckStatus, no_color: bool) -> &'static str {
    match (status, no_color) {
        (CheckStatus::Pass { .. }, true) => "[OK]",
        (CheckStatus::Pass { .. }, false) => "\u{2713}",
        (CheckStatus::Warning { .. } | CheckStatus::Fail { .. }, true) => "[!!]",
        (CheckStatus::Warning { .. }, false) => "\u{26A0}",
        (CheckStatus::Fail { .. }, false) => "\u{2717}",
        (CheckStatus::Unavailable { .. }, true) => "[--]",
        (CheckStatus::Unavailable { .. }, false) => "\u{23ED}",
    }
}

const fn status_color(status: &CheckStatus) -> Color {
    match status {
        CheckStatus::Pass { .. } => Color::Green,
        CheckStatus::Warning { .. } => Color::Yellow,
        CheckStatus::Fail { .. } => Color::Red,
        CheckStatus::Unavailable { .. } => Color::BrightBlack,
    }
}

fn paint(text: &str, color: Color, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.color(color).to_string()
    }
}

// =============================================================================
// JSON Output
// =============================================================================

/// Render a report as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(report: &DiagnosticReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

// =============================================================================
// Markdown Output
// =============================================================================

/// Render a report as Markdown.
///
/// # Errors
///
/// Infallible today; returns `Result` to match the other formats.
pub fn render_md(report: &DiagnosticReport) -> Result<String> {
    let mut output = format!("# {TITLE}\n\n");
    if report.mock_mode {
        output.push_str("> Demo mode is on.\n\n");
    }

    output.push_str("| Step | Status | Details |\n|------|--------|---------|\n");
    for check in &report.checks {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            check.name(),
            status_md(&check.status),
            check_detail_md(check)
        );
    }

    if !report.recommendations.is_empty() {
        output.push_str("\n## Recommendations\n\n");
        for (i, recommendation) in report.recommendations.iter().enumerate() {
            let _ = writeln!(output, "{}. {recommendation}", i + 1);
        }
    }

    let (passed, needs_attention) = report.summary();
    let _ = write!(
        output,
        "\n## Summary\n\n- **Passed:** {passed}\n- **Needs attention:** {needs_attention}\n- **Duration:** {}ms\n",
        report.total_duration.as_millis()
    );
    Ok(output)
}

const fn status_md(status: &CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass { .. } => "\u{2705} pass",
        CheckStatus::Warning { .. } => "\u{26A0}\u{FE0F} warning",
        CheckStatus::Fail { .. } => "\u{274C} fail",
        CheckStatus::Unavailable { .. } => "\u{23ED}\u{FE0F} unavailable",
    }
}

fn check_detail_md(check: &DiagnosticCheck) -> String {
    let mut detail = check.status.detail().unwrap_or_default().replace('|', "\\|");
    if let Some(suggestion) = check.status.suggestion() {
        let _ = write!(detail, " *({suggestion})*");
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::doctor::DiagnosticStep;
    use crate::error::DiagnosticCode;
    use chrono::Utc;
    use std::time::Duration;

    fn sample_report() -> DiagnosticReport {
        DiagnosticReport {
            version: "0.1.0".to_string(),
            started_at: Utc::now(),
            checks: vec![
                DiagnosticCheck::new(
                    DiagnosticStep::Network,
                    CheckStatus::Pass {
                        details: Some("Internet connection established".to_string()),
                    },
                ),
                DiagnosticCheck::new(
                    DiagnosticStep::Ping,
                    CheckStatus::Pass {
                        details: Some("42 ms to the auth endpoint".to_string()),
                    },
                ),
                DiagnosticCheck::new(
                    DiagnosticStep::Configuration,
                    CheckStatus::Pass { details: None },
                ),
                DiagnosticCheck::new(
                    DiagnosticStep::Api,
                    CheckStatus::Fail {
                        reason: "Authorization failed: API 401: bad token".to_string(),
                        suggestion: Some("Check client_id in config.toml".to_string()),
                    },
                )
                .with_code(DiagnosticCode::Unauthorized),
            ],
            recommendations: vec!["Check client_id in config.toml".to_string()],
            mock_mode: false,
            total_duration: Duration::from_millis(120),
        }
    }

    #[test]
    fn human_plain_lists_every_step() {
        let out = render_human(&sample_report(), true).unwrap();
        assert!(out.contains("| chatgate doctor - Diagnostic Report |"));
        assert!(out.contains("[OK] Network"));
        assert!(out.contains("[!!] Chat API"));
        assert!(out.contains("[401]"));
        assert!(out.contains("  1. Check client_id in config.toml"));
        assert!(out.contains("Summary: 3 passed, 1 need attention"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn json_round_trips_summary_fields() {
        let out = render_json(&sample_report(), false).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["checks"].as_array().unwrap().len(), 4);
        assert_eq!(json["checks"][3]["code"], "401");
        assert_eq!(json["mockMode"], false);
    }

    #[test]
    fn markdown_has_table_and_summary() {
        let out = render_md(&sample_report()).unwrap();
        assert!(out.contains("| Step | Status | Details |"));
        assert!(out.contains("| Chat API | \u{274C} fail |"));
        assert!(out.contains("- **Needs attention:** 1"));
    }
}
