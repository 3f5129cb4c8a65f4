//! Remediation database.
//!
//! One static table maps each [`DiagnosticCode`] key to a title, a
//! one-paragraph solution and ordered remediation steps. The request path,
//! the doctor report and `chatgate explain` all read from this table.
//!
//! [`FixSuggestion`] wraps the same data for crate-level errors that never
//! went over the wire (configuration problems and the like).

use serde::Serialize;

use super::classify::DiagnosticCode;

// =============================================================================
// Remediation Table
// =============================================================================

/// Static remediation record for one taxonomy key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Remediation {
    pub title: &'static str,
    pub solution: &'static str,
    pub steps: &'static [&'static str],
}

const UNKNOWN_HTTP: Remediation = Remediation {
    title: "Unexpected HTTP status",
    solution: "The API answered with a status this client does not recognise. \
               It is usually a transient upstream or gateway problem.",
    steps: &[
        "Retry in a few minutes",
        "Run `chatgate doctor` for a full diagnostic",
        "Check api_url in config.toml",
    ],
};

const UNKNOWN: Remediation = Remediation {
    title: "Unknown error",
    solution: "The failure could not be classified. Re-run with --verbose to see \
               the full request log.",
    steps: &[
        "Run `chatgate doctor` for a full diagnostic",
        "Check config.toml for typos",
    ],
};

static REMEDIATIONS: &[(&str, Remediation)] = &[
    (
        "400",
        Remediation {
            title: "Malformed request",
            solution: "The API rejected the request body. Check the JSON payload and \
                       the encoding of the messages.",
            steps: &[
                "Check config.toml",
                "Make sure the configured model name is valid",
            ],
        },
    ),
    (
        "401",
        Remediation {
            title: "Authorization failed",
            solution: "The client credential or access token is invalid or expired.",
            steps: &[
                "Check client_id in config.toml",
                "Clear the token cache and retry once",
            ],
        },
    ),
    (
        "403",
        Remediation {
            title: "Access denied",
            solution: "The credential has no permission to use this resource.",
            steps: &[
                "Check scope in config.toml",
                "Make sure the API key has been activated",
            ],
        },
    ),
    (
        "429",
        Remediation {
            title: "Too many requests",
            solution: "The request limit was exceeded. Wait 60 seconds before retrying.",
            steps: &[
                "Reduce the request rate",
                "Check the limits of your plan",
            ],
        },
    ),
    (
        "500",
        Remediation {
            title: "Server error",
            solution: "The problem is on the API side.",
            steps: &[
                "Retry in 5 minutes",
                "Check the provider status page",
            ],
        },
    ),
    (
        "network",
        Remediation {
            title: "Network problem",
            solution: "There is no connection to the host, or the connection is blocked.",
            steps: &[
                "Check your internet connection",
                "Disable VPN/proxy",
            ],
        },
    ),
    (
        "timeout",
        Remediation {
            title: "Connection timed out",
            solution: "The server did not respond before the deadline.",
            steps: &[
                "Check your internet connection",
                "Increase timeouts.chat_secs in config.toml",
            ],
        },
    ),
    ("unknown", UNKNOWN),
];

/// Look up a record by key (`401`, `timeout`, ...).
#[must_use]
pub fn remediation_for_key(key: &str) -> Option<&'static Remediation> {
    REMEDIATIONS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, remediation)| remediation)
}

/// Record for a code. Unmapped HTTP statuses share one generic record.
#[must_use]
pub fn remediation(code: DiagnosticCode) -> &'static Remediation {
    remediation_for_key(&code.key()).unwrap_or(match code {
        DiagnosticCode::UnknownHttp(_) => &UNKNOWN_HTTP,
        _ => &UNKNOWN,
    })
}

// =============================================================================
// Explanations
// =============================================================================

/// A remediation record resolved for a user-typed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub key: String,
    /// False when the key is not part of the taxonomy.
    pub known: bool,
    pub title: String,
    pub solution: &'static str,
    pub steps: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediately_actionable: Option<bool>,
}

/// Resolve `key` (`401`, `timeout`, `network`, any 3-digit status, ...).
///
/// Unrecognised keys get the generic record titled `Unknown error (<key>)`.
#[must_use]
pub fn explain(key: &str) -> Explanation {
    match DiagnosticCode::parse(key) {
        Some(code) => {
            let record = remediation(code);
            let title = match code {
                DiagnosticCode::UnknownHttp(status) => format!("{} ({status})", record.title),
                _ => record.title.to_string(),
            };
            Explanation {
                key: code.key(),
                known: true,
                title,
                solution: record.solution,
                steps: record.steps,
                retry_policy: Some(code.retry_policy().to_string()),
                immediately_actionable: Some(code.is_immediately_actionable()),
            }
        }
        None => {
            let key = key.trim();
            Explanation {
                key: key.to_string(),
                known: false,
                title: format!("{} ({key})", UNKNOWN.title),
                solution: UNKNOWN.solution,
                steps: UNKNOWN.steps,
                retry_policy: None,
                immediately_actionable: None,
            }
        }
    }
}

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// A fix suggestion for a crate-level error.
#[derive(Debug, Clone, Serialize)]
pub struct FixSuggestion {
    /// Steps or commands in order of preference.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }
}

impl From<&Remediation> for FixSuggestion {
    fn from(remediation: &Remediation) -> Self {
        Self::new(
            remediation.steps.iter().map(|s| (*s).to_string()).collect(),
            remediation.solution,
        )
    }
}

// =============================================================================
// Suggestion Generators
// =============================================================================

/// Suggestions for required configuration fields that are absent.
#[must_use]
pub fn missing_fields_suggestions(fields: &[String]) -> Vec<FixSuggestion> {
    let commands = fields
        .iter()
        .map(|field| format!("Set {field} in config.toml or via CHATGATE_{}", field.to_uppercase()))
        .collect();
    vec![
        FixSuggestion::new(
            commands,
            "chatgate cannot talk to the API without these values.",
        )
        .with_prevention("Run `chatgate doctor` after editing the config file."),
    ]
}

/// Suggestions for a config file that does not parse.
#[must_use]
pub fn config_parse_suggestions(path: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("$EDITOR {path}")],
        format!("The config file has a syntax error. The TOML parser reported: {message}"),
    )]
}

/// Suggestions for a config value that is present but unusable.
#[must_use]
pub fn config_invalid_suggestions(key: &str, value: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("Fix '{key}' in config.toml")],
        format!("The value '{value}' for '{key}' is invalid: {message}"),
    )]
}
