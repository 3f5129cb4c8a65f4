//! Time formatting utilities.

use chrono::{DateTime, Utc};

/// Format how long ago `target` was, relative to `now`.
#[must_use]
pub fn format_relative_time(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(target).num_seconds().max(0);

    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{hours} hour{} ago", if hours == 1 { "" } else { "s" })
    } else {
        format!("{minutes} minute{} ago", if minutes == 1 { "" } else { "s" })
    }
}

/// Format a round-trip latency.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_latency(latency_ms: u64) -> String {
    if latency_ms >= 1000 {
        format!("{:.1}s", latency_ms as f64 / 1000.0)
    } else {
        format!("{latency_ms}ms")
    }
}
