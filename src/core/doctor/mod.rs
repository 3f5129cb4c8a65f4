//! Diagnostic report model.
//!
//! A [`DiagnosticReport`] is built fresh by each [`runner::DiagnosticRunner`]
//! run and never mutated afterwards.

pub mod runner;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DiagnosticCode;

/// Outcome of one diagnostic step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    Pass { details: Option<String> },
    /// Working, but degraded (e.g. ping unmeasurable).
    Warning {
        details: String,
        suggestion: Option<String>,
    },
    Fail {
        reason: String,
        suggestion: Option<String>,
    },
    /// Not run because a prerequisite step failed.
    Unavailable { reason: String },
}

impl CheckStatus {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    /// Warning or failure. Unavailable steps are attributed to the step that
    /// made them unavailable.
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(self, Self::Warning { .. } | Self::Fail { .. })
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pass { .. } => "pass",
            Self::Warning { .. } => "warning",
            Self::Fail { .. } => "fail",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Pass { details } => details.as_deref(),
            Self::Warning { details, .. } => Some(details),
            Self::Fail { reason, .. } | Self::Unavailable { reason } => Some(reason),
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Warning { suggestion, .. } | Self::Fail { suggestion, .. } => {
                suggestion.as_deref()
            }
            Self::Pass { .. } | Self::Unavailable { .. } => None,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.detail(), self.suggestion()) {
            (Some(detail), Some(suggestion)) => {
                write!(f, "{}: {detail} (suggestion: {suggestion})", self.label())
            }
            (Some(detail), None) => write!(f, "{}: {detail}", self.label()),
            _ => f.write_str(self.label()),
        }
    }
}

/// The four steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStep {
    Network,
    Ping,
    Configuration,
    Api,
}

impl DiagnosticStep {
    pub const ALL: [Self; 4] = [Self::Network, Self::Ping, Self::Configuration, Self::Api];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::Ping => "Ping",
            Self::Configuration => "Configuration",
            Self::Api => "Chat API",
        }
    }
}

/// A single step result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticCheck {
    pub step: DiagnosticStep,
    pub status: CheckStatus,
    /// Classification of the failure, for the API step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<DiagnosticCode>,
    pub duration: Option<Duration>,
}

impl DiagnosticCheck {
    #[must_use]
    pub const fn new(step: DiagnosticStep, status: CheckStatus) -> Self {
        Self {
            step,
            status,
            code: None,
            duration: None,
        }
    }

    #[must_use]
    pub const fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.step.name()
    }
}

/// Complete diagnostic report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub checks: Vec<DiagnosticCheck>,
    pub recommendations: Vec<String>,
    pub mock_mode: bool,
    pub total_duration: Duration,
}

impl DiagnosticReport {
    /// Returns (`passed`, `needs_attention`).
    #[must_use]
    pub fn summary(&self) -> (usize, usize) {
        let passed = self.checks.iter().filter(|c| c.status.is_pass()).count();
        let needs_attention = self
            .checks
            .iter()
            .filter(|c| c.status.needs_attention())
            .count();
        (passed, needs_attention)
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.summary().1 == 0
    }

    #[must_use]
    pub fn check(&self, step: DiagnosticStep) -> Option<&DiagnosticCheck> {
        self.checks.iter().find(|c| c.step == step)
    }
}
