//! Human-readable output using `colored`.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use colored::{Color, Colorize};

use crate::cli::chat::{ChatReply, ConnectionReport};
use crate::cli::status::PingReport;
use crate::core::status::{ApiStatus, StatusSnapshot, TokenStatus};
use crate::error::Explanation;
use crate::render::robot::enum_label;
use crate::util::{format_latency, format_relative_time};

fn paint(text: &str, color: Color, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.color(color).to_string()
    }
}

fn bold(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.bold().to_string()
    }
}

/// Latency color: green under 300 ms, yellow under 1 s, red above.
const fn latency_color(latency_ms: u64) -> Color {
    if latency_ms < 300 {
        Color::Green
    } else if latency_ms < 1000 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn network_field(snapshot: &StatusSnapshot, no_color: bool) -> String {
    let color = match snapshot.network {
        "online" => Color::Green,
        "offline" => Color::Red,
        _ => Color::BrightBlack,
    };
    paint(snapshot.network, color, no_color)
}

fn ping_field(ping: Option<u64>, no_color: bool) -> String {
    ping.map_or_else(
        || paint("-", Color::BrightBlack, no_color),
        |ms| paint(&format_latency(ms), latency_color(ms), no_color),
    )
}

const fn api_color(api: ApiStatus) -> Color {
    match api {
        ApiStatus::Active => Color::Green,
        ApiStatus::Error => Color::Red,
        ApiStatus::Unknown => Color::BrightBlack,
    }
}

const fn token_color(token: TokenStatus) -> Color {
    match token {
        TokenStatus::Valid => Color::Green,
        TokenStatus::Invalid => Color::Red,
        TokenStatus::Unknown => Color::BrightBlack,
    }
}

#[must_use]
pub fn render_chat(reply: &ChatReply, no_color: bool) -> String {
    let mut output = reply.content.clone();
    if reply.mock {
        let _ = write!(output, "\n{}", paint("(demo mode)", Color::Yellow, no_color));
    }
    if reply.reauthenticated {
        let _ = write!(
            output,
            "\n{}",
            paint("(token refreshed after 401)", Color::BrightBlack, no_color)
        );
    }
    output
}

#[must_use]
pub fn render_connection(report: &ConnectionReport, no_color: bool) -> String {
    let mut output = if report.connected {
        let suffix = if report.mock { " (demo mode)" } else { "" };
        paint(&format!("API connection OK{suffix}"), Color::Green, no_color)
    } else {
        paint("API unavailable", Color::Red, no_color)
    };

    if let Some(err) = &report.error {
        let remediation = err.remediation();
        let _ = write!(
            output,
            "\n{} [{}]\n  {}",
            bold(remediation.title, no_color),
            err.code,
            err.raw_message
        );
        for (i, step) in remediation.steps.iter().enumerate() {
            let _ = write!(output, "\n  {}. {step}", i + 1);
        }
    }
    output
}

#[must_use]
pub fn render_ping(report: &PingReport, no_color: bool) -> String {
    if !report.online {
        return format!(
            "{} ping skipped",
            paint("Network offline:", Color::Red, no_color)
        );
    }
    match report.latency_ms {
        Some(ms) => format!(
            "Ping {}: {}",
            report.target,
            paint(&format_latency(ms), latency_color(ms), no_color)
        ),
        None => format!(
            "Ping {}: {}",
            report.target,
            paint("no answer", Color::Yellow, no_color)
        ),
    }
}

#[must_use]
pub fn render_status(snapshot: &StatusSnapshot, no_color: bool) -> String {
    let last_check = snapshot
        .last_check
        .map_or_else(|| "never".to_string(), |t| format_relative_time(t, Utc::now()));
    format!(
        "{:<12}{}\n{:<12}{}\n{:<12}{}\n{:<12}{}\n{:<12}{}",
        "Network:",
        network_field(snapshot, no_color),
        "API:",
        paint(&enum_label(&snapshot.api), api_color(snapshot.api), no_color),
        "Token:",
        paint(
            &enum_label(&snapshot.token),
            token_color(snapshot.token),
            no_color
        ),
        "Ping:",
        ping_field(snapshot.ping, no_color),
        "Last check:",
        last_check
    )
}

/// One line per watch tick.
#[must_use]
pub fn render_watch_line(
    snapshot: &StatusSnapshot,
    passed: usize,
    needs_attention: usize,
    at: Option<DateTime<Utc>>,
    no_color: bool,
) -> String {
    let time = at.map_or_else(|| "--:--:--".to_string(), |t| t.format("%H:%M:%S").to_string());
    let health = if needs_attention == 0 {
        paint(&format!("{passed} ok"), Color::Green, no_color)
    } else {
        paint(
            &format!("{passed} ok, {needs_attention} need attention"),
            Color::Yellow,
            no_color,
        )
    };
    format!(
        "[{time}] network {} | api {} | ping {} | {health}",
        network_field(snapshot, no_color),
        paint(&enum_label(&snapshot.api), api_color(snapshot.api), no_color),
        ping_field(snapshot.ping, no_color),
    )
}

#[must_use]
pub fn render_explain(explanation: &Explanation, no_color: bool) -> String {
    let mut output = format!(
        "{} {}\n\n{}\n",
        bold(&explanation.title, no_color),
        paint(&format!("[{}]", explanation.key), Color::BrightBlack, no_color),
        explanation.solution
    );
    if !explanation.steps.is_empty() {
        let _ = write!(output, "\n{}", paint("Steps:", Color::Cyan, no_color));
        for (i, step) in explanation.steps.iter().enumerate() {
            let _ = write!(output, "\n  {}. {step}", i + 1);
        }
        output.push('\n');
    }
    if let Some(policy) = &explanation.retry_policy {
        let _ = write!(output, "\nRetry policy: {policy}");
    }
    output
}
