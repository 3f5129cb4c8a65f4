//! Error types for chatgate.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Two layers:
//! - [`DiagnosticCode`] / [`ClassifiedError`]: the closed taxonomy every
//!   request failure is mapped onto (see [`classify`]).
//! - [`GatewayError`]: crate-level failures (configuration, client
//!   construction, I/O) plus a wrapper for classified request failures.
//!
//! Each [`GatewayError`] has a stable error code (e.g., `CGW-C001`) and can
//! provide fix suggestions via [`GatewayError::fix_suggestions()`].

pub mod classify;
pub mod suggestions;

use thiserror::Error;

pub use classify::{
    ClassifiedError, DiagnosticCode, FailureReason, RetryPolicy, TransportFailure, classify,
};
pub use suggestions::{Explanation, FixSuggestion, Remediation, explain};

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Authentication issues (invalid credential, expired token, missing scope).
    Authentication,
    /// Network issues (timeout, unreachable host).
    Network,
    /// Configuration issues (parse errors, invalid or missing values).
    Configuration,
    /// Upstream API issues (rate limits, server errors, bad requests).
    Upstream,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Upstream => "Upstream API error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Authentication => "A",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Upstream => "U",
            Self::Internal => "X",
        }
    }

    /// Category of a classified request failure.
    #[must_use]
    pub const fn of_code(code: DiagnosticCode) -> Self {
        match code {
            DiagnosticCode::Unauthorized | DiagnosticCode::Forbidden => Self::Authentication,
            DiagnosticCode::Timeout | DiagnosticCode::NetworkUnreachable => Self::Network,
            DiagnosticCode::BadRequest
            | DiagnosticCode::RateLimited
            | DiagnosticCode::ServerError
            | DiagnosticCode::UnknownHttp(_) => Self::Upstream,
            DiagnosticCode::Unknown => Self::Internal,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Request failure or unhealthy diagnostic
    GeneralError = 1,
    /// Missing or invalid configuration
    ConfigError = 3,
    /// Deadline exceeded
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

// =============================================================================
// Crate Error
// =============================================================================

/// Main error type for chatgate operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Required configuration fields are absent.
    #[error("missing required configuration fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// Config file given explicitly but not found.
    #[error("config file not found: {path}")]
    ConfigNotFound { path: String },

    /// Config file does not parse.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    /// A request failed and was classified.
    #[error("request failed: {0}")]
    Request(#[from] ClassifiedError),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GatewayError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::MissingFields { .. }
            | Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::Config(_) => ExitCode::ConfigError,

            Self::Request(ClassifiedError {
                code: DiagnosticCode::Timeout,
                ..
            }) => ExitCode::Timeout,

            Self::HttpClient(_)
            | Self::Request(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingFields { .. }
            | Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::Config(_) => ErrorCategory::Configuration,
            Self::Request(err) => ErrorCategory::of_code(err.code),
            Self::HttpClient(_) | Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `CGW-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingFields { .. } => "CGW-C001",
            Self::ConfigNotFound { .. } => "CGW-C002",
            Self::ConfigParse { .. } => "CGW-C003",
            Self::ConfigInvalid { .. } => "CGW-C004",
            Self::Config(_) => "CGW-C005",
            Self::Request(err) => match err.code {
                DiagnosticCode::Unauthorized => "CGW-A001",
                DiagnosticCode::Forbidden => "CGW-A002",
                DiagnosticCode::Timeout => "CGW-N001",
                DiagnosticCode::NetworkUnreachable => "CGW-N002",
                DiagnosticCode::BadRequest => "CGW-U001",
                DiagnosticCode::RateLimited => "CGW-U002",
                DiagnosticCode::ServerError => "CGW-U003",
                DiagnosticCode::UnknownHttp(_) => "CGW-U099",
                DiagnosticCode::Unknown => "CGW-X099",
            },
            Self::HttpClient(_) => "CGW-X001",
            Self::Io(_) => "CGW-X002",
            Self::Json(_) => "CGW-X003",
            Self::Other(_) => "CGW-X000",
        }
    }

    /// Whether a caller may retry the operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Request(err) => !matches!(
                err.code.retry_policy(),
                RetryPolicy::NotRetried | RetryPolicy::SurfaceVerbatim
            ),
            _ => false,
        }
    }

    /// Title used when rendering the error for a user.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Request(err) => err.remediation().title,
            other => other.category().description(),
        }
    }

    /// Actionable suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::MissingFields { fields } => suggestions::missing_fields_suggestions(fields),
            Self::ConfigNotFound { path } => vec![FixSuggestion::new(
                vec![format!("Create {path}"), "Or unset CHATGATE_CONFIG".to_string()],
                format!("No config file at {path}."),
            )],
            Self::ConfigParse { path, message } => {
                suggestions::config_parse_suggestions(path, message)
            }
            Self::ConfigInvalid {
                key,
                value,
                message,
            } => suggestions::config_invalid_suggestions(key, value, message),
            Self::Config(message) => vec![FixSuggestion::new(
                vec!["Run `chatgate doctor`".to_string()],
                message.clone(),
            )],
            Self::Request(err) => {
                vec![
                    FixSuggestion::from(err.remediation())
                        .with_prevention(format!("Retry policy: {}", err.code.retry_policy())),
                ]
            }
            Self::HttpClient(_) | Self::Io(_) | Self::Json(_) | Self::Other(_) => Vec::new(),
        }
    }
}

/// Result type alias using `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn request(code: DiagnosticCode) -> GatewayError {
        GatewayError::Request(ClassifiedError::new(code, "raw"))
    }

    #[test]
    fn missing_fields_lists_every_field() {
        let err = GatewayError::MissingFields {
            fields: vec!["client_id".to_string(), "model".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing required configuration fields: client_id, model"
        );
        assert_eq!(err.exit_code(), ExitCode::ConfigError);
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn request_errors_take_category_from_code() {
        assert_eq!(
            request(DiagnosticCode::Unauthorized).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            request(DiagnosticCode::Timeout).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            request(DiagnosticCode::UnknownHttp(502)).category(),
            ErrorCategory::Upstream
        );
    }

    #[test]
    fn timeout_maps_to_timeout_exit_code() {
        assert_eq!(request(DiagnosticCode::Timeout).exit_code(), ExitCode::Timeout);
        assert_eq!(
            request(DiagnosticCode::ServerError).exit_code(),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn error_codes_follow_format() {
        let errors = vec![
            GatewayError::MissingFields { fields: vec![] },
            GatewayError::HttpClient("x".to_string()),
            request(DiagnosticCode::RateLimited),
            request(DiagnosticCode::NetworkUnreachable),
        ];
        for err in errors {
            let code = err.error_code();
            assert!(code.starts_with("CGW-"), "{code} should start with CGW-");
            assert_eq!(code.len(), 8);
        }
    }

    #[test]
    fn retryable_follows_policy() {
        assert!(request(DiagnosticCode::RateLimited).is_retryable());
        assert!(request(DiagnosticCode::Unauthorized).is_retryable());
        assert!(!request(DiagnosticCode::Forbidden).is_retryable());
        assert!(!request(DiagnosticCode::Unknown).is_retryable());
        assert!(!GatewayError::Config("x".to_string()).is_retryable());
    }

    #[test]
    fn request_suggestions_come_from_table() {
        let fixes = request(DiagnosticCode::Unauthorized).fix_suggestions();
        assert_eq!(fixes.len(), 1);
        assert!(fixes[0].commands[0].contains("client_id"));
        assert!(fixes[0]
            .prevention
            .as_deref()
            .is_some_and(|p| p.contains("retry once")));
    }

    #[test]
    fn title_prefers_remediation() {
        assert_eq!(request(DiagnosticCode::Forbidden).title(), "Access denied");
        assert_eq!(
            GatewayError::HttpClient("x".to_string()).title(),
            "Internal error"
        );
    }
}
