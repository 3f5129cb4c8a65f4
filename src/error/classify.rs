//! Failure classification.
//!
//! Turns a raw transport failure into a [`ClassifiedError`] carrying a code
//! from the closed [`DiagnosticCode`] taxonomy. The transport tags every
//! failure with a [`FailureReason`] at the point it is detected, so free-text
//! matching is only used for failures nothing upstream could tag.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::suggestions::{Remediation, remediation};

// =============================================================================
// Raw Failures
// =============================================================================

/// Why a single transport attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with a non-2xx status.
    HttpStatus { status: u16, body: String },
    /// The deadline elapsed before the response was complete.
    DeadlineExceeded { after: Duration },
    /// No connection could be established (DNS, refused, TLS handshake).
    Connect,
    /// The call was cancelled through its cancel handle.
    Cancelled,
    /// A 2xx response arrived but its body was unusable.
    InvalidResponse,
    /// Anything the HTTP client reported without a more specific tag.
    Other,
}

/// A transport failure before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl TransportFailure {
    #[must_use]
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// Non-2xx response. `label` prefixes the message (`OAuth`, `API`).
    #[must_use]
    pub fn http(label: &str, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let detail = extract_error_message(&body);
        Self {
            message: format!("{label} {status}: {detail}"),
            reason: FailureReason::HttpStatus { status, body },
        }
    }

    #[must_use]
    pub fn deadline(after: Duration) -> Self {
        Self::new(
            FailureReason::DeadlineExceeded { after },
            format!("request timed out after {}s", after.as_secs()),
        )
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(FailureReason::InvalidResponse, message)
    }

    /// HTTP status carried by this failure, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match &self.reason {
            FailureReason::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"error":{"message":..}}`, `{"error":".."}`, `{"message":..}`
/// or plain text.
#[must_use]
pub fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let nested = json
            .get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .and_then(serde_json::Value::as_str);
        let top = json.get("message").and_then(serde_json::Value::as_str);
        if let Some(message) = nested.or(top) {
            return message.to_string();
        }
    }
    trimmed.to_string()
}

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Closed failure taxonomy shared by the request path and the diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// 400: malformed request.
    BadRequest,
    /// 401: invalid or expired token.
    Unauthorized,
    /// 403: scope or permission denied.
    Forbidden,
    /// 429: rate limited.
    RateLimited,
    /// 500: upstream failure.
    ServerError,
    /// Any other HTTP status.
    UnknownHttp(u16),
    /// Deadline exceeded.
    Timeout,
    /// No path to the host.
    NetworkUnreachable,
    /// Could not be classified.
    Unknown,
}

impl DiagnosticCode {
    /// Map an HTTP status onto the taxonomy.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            429 => Self::RateLimited,
            500 => Self::ServerError,
            other => Self::UnknownHttp(other),
        }
    }

    /// Parse a lookup key as typed by a user (`401`, `timeout`, `network`).
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        match key.as_str() {
            "timeout" => Some(Self::Timeout),
            "network" => Some(Self::NetworkUnreachable),
            "unknown" => Some(Self::Unknown),
            digits if is_three_digit(digits) => digits.parse().ok().map(Self::from_status),
            _ => None,
        }
    }

    /// HTTP status behind this code, if any.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::BadRequest => Some(400),
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::RateLimited => Some(429),
            Self::ServerError => Some(500),
            Self::UnknownHttp(code) => Some(*code),
            Self::Timeout | Self::NetworkUnreachable | Self::Unknown => None,
        }
    }

    /// Stable key used for table lookup and serialization.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Timeout => "timeout".to_string(),
            Self::NetworkUnreachable => "network".to_string(),
            Self::Unknown => "unknown".to_string(),
            http => http
                .http_status()
                .map_or_else(|| "unknown".to_string(), |s| s.to_string()),
        }
    }

    /// What a caller is allowed to do about this failure.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::BadRequest | Self::Forbidden => RetryPolicy::NotRetried,
            Self::Unauthorized => RetryPolicy::ClearTokenAndRetryOnce,
            Self::RateLimited => RetryPolicy::RetryAfter(Duration::from_secs(60)),
            Self::ServerError | Self::UnknownHttp(_) => {
                RetryPolicy::RetryAfter(Duration::from_secs(300))
            }
            Self::Timeout => RetryPolicy::RetrySameOrLongerDeadline,
            Self::NetworkUnreachable => RetryPolicy::WhenOnline,
            Self::Unknown => RetryPolicy::SurfaceVerbatim,
        }
    }

    /// Whether the user can fix the cause right now rather than wait it out.
    #[must_use]
    pub const fn is_immediately_actionable(&self) -> bool {
        matches!(
            self,
            Self::BadRequest | Self::Unauthorized | Self::Forbidden | Self::NetworkUnreachable
        )
    }

    /// Static remediation record for this code.
    #[must_use]
    pub fn remediation(&self) -> &'static Remediation {
        remediation(*self)
    }
}

fn is_three_digit(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for DiagnosticCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Self::parse(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown diagnostic code: {key}")))
    }
}

/// Retry guidance attached to each code. The core never acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    NotRetried,
    ClearTokenAndRetryOnce,
    RetryAfter(Duration),
    RetrySameOrLongerDeadline,
    WhenOnline,
    SurfaceVerbatim,
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRetried => write!(f, "not retried"),
            Self::ClearTokenAndRetryOnce => write!(f, "clear the token cache and retry once"),
            Self::RetryAfter(delay) => write!(f, "retry after {}s", delay.as_secs()),
            Self::RetrySameOrLongerDeadline => write!(f, "retry with the same or a longer timeout"),
            Self::WhenOnline => write!(f, "retry once the network is back online"),
            Self::SurfaceVerbatim => write!(f, "not retried; reported as-is"),
        }
    }
}

// =============================================================================
// Classified Errors
// =============================================================================

/// A failure mapped onto the taxonomy. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{code}: {raw_message}")]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub code: DiagnosticCode,
    pub raw_message: String,
    pub is_immediately_actionable: bool,
}

impl ClassifiedError {
    #[must_use]
    pub fn new(code: DiagnosticCode, raw_message: impl Into<String>) -> Self {
        Self {
            code,
            raw_message: raw_message.into(),
            is_immediately_actionable: code.is_immediately_actionable(),
        }
    }

    #[must_use]
    pub fn remediation(&self) -> &'static Remediation {
        self.code.remediation()
    }

    /// True when the remote host answered, whatever the status.
    #[must_use]
    pub const fn server_responded(&self) -> bool {
        self.code.http_status().is_some()
    }
}

/// Classify a transport failure. Pure: same input, same code.
#[must_use]
pub fn classify(failure: &TransportFailure) -> ClassifiedError {
    let code = match &failure.reason {
        FailureReason::HttpStatus { status, .. } if (100..=999).contains(status) => {
            DiagnosticCode::from_status(*status)
        }
        FailureReason::DeadlineExceeded { .. } => DiagnosticCode::Timeout,
        FailureReason::Connect => DiagnosticCode::NetworkUnreachable,
        FailureReason::Other => classify_message(&failure.message),
        FailureReason::HttpStatus { .. }
        | FailureReason::Cancelled
        | FailureReason::InvalidResponse => DiagnosticCode::Unknown,
    };
    ClassifiedError::new(code, failure.message.clone())
}

/// Last-resort text match for untagged failures.
fn classify_message(message: &str) -> DiagnosticCode {
    let lower = message.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") {
        DiagnosticCode::Timeout
    } else if ["failed to fetch", "network", "dns", "connection refused", "unreachable"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        DiagnosticCode::NetworkUnreachable
    } else {
        DiagnosticCode::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_wins_over_message_text() {
        let failure = TransportFailure::http("API", 429, "request timed out upstream");
        assert_eq!(classify(&failure).code, DiagnosticCode::RateLimited);
    }

    #[test]
    fn mapped_and_unmapped_statuses() {
        for (status, code) in [
            (400, DiagnosticCode::BadRequest),
            (401, DiagnosticCode::Unauthorized),
            (403, DiagnosticCode::Forbidden),
            (429, DiagnosticCode::RateLimited),
            (500, DiagnosticCode::ServerError),
            (503, DiagnosticCode::UnknownHttp(503)),
        ] {
            let failure = TransportFailure::http("API", status, "");
            assert_eq!(classify(&failure).code, code, "status {status}");
        }
    }

    #[test]
    fn deadline_and_connect_are_distinct() {
        let timeout = classify(&TransportFailure::deadline(Duration::from_secs(30)));
        let unreachable = classify(&TransportFailure::new(FailureReason::Connect, "refused"));
        assert_eq!(timeout.code, DiagnosticCode::Timeout);
        assert_eq!(unreachable.code, DiagnosticCode::NetworkUnreachable);
        assert!(!timeout.is_immediately_actionable);
        assert!(unreachable.is_immediately_actionable);
    }

    #[test]
    fn untagged_failures_fall_back_to_text() {
        let t = TransportFailure::new(FailureReason::Other, "operation timed out");
        let n = TransportFailure::new(FailureReason::Other, "Failed to fetch");
        let u = TransportFailure::new(FailureReason::Other, "something odd");
        assert_eq!(classify(&t).code, DiagnosticCode::Timeout);
        assert_eq!(classify(&n).code, DiagnosticCode::NetworkUnreachable);
        assert_eq!(classify(&u).code, DiagnosticCode::Unknown);
    }

    #[test]
    fn invalid_response_is_unknown_even_with_timeout_text() {
        let failure = TransportFailure::invalid_response("timeout field missing");
        assert_eq!(classify(&failure).code, DiagnosticCode::Unknown);
    }

    #[test]
    fn classification_is_pure() {
        let failure = TransportFailure::http("OAuth", 401, r#"{"error":{"message":"bad"}}"#);
        assert_eq!(classify(&failure), classify(&failure));
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"bad token"}}"#),
            "bad token"
        );
        assert_eq!(extract_error_message(r#"{"error":"nope"}"#), "nope");
        assert_eq!(
            extract_error_message(r#"{"status":401,"message":"Unauthorized"}"#),
            "Unauthorized"
        );
        assert_eq!(extract_error_message("  plain text\n"), "plain text");
    }

    #[test]
    fn http_failure_message_includes_status_and_detail() {
        let failure = TransportFailure::http("API", 401, r#"{"error":{"message":"bad token"}}"#);
        assert_eq!(failure.message, "API 401: bad token");
        assert_eq!(failure.status(), Some(401));
    }

    #[test]
    fn parse_keys() {
        assert_eq!(DiagnosticCode::parse("401"), Some(DiagnosticCode::Unauthorized));
        assert_eq!(DiagnosticCode::parse(" Timeout "), Some(DiagnosticCode::Timeout));
        assert_eq!(DiagnosticCode::parse("network"), Some(DiagnosticCode::NetworkUnreachable));
        assert_eq!(DiagnosticCode::parse("418"), Some(DiagnosticCode::UnknownHttp(418)));
        assert_eq!(DiagnosticCode::parse("4000"), None);
        assert_eq!(DiagnosticCode::parse("teapot"), None);
    }

    #[test]
    fn keys_round_trip_through_parse() {
        for code in [
            DiagnosticCode::BadRequest,
            DiagnosticCode::UnknownHttp(502),
            DiagnosticCode::Timeout,
            DiagnosticCode::NetworkUnreachable,
            DiagnosticCode::Unknown,
        ] {
            assert_eq!(DiagnosticCode::parse(&code.key()), Some(code));
        }
    }

    #[test]
    fn retry_policies_follow_taxonomy() {
        assert_eq!(
            DiagnosticCode::Unauthorized.retry_policy(),
            RetryPolicy::ClearTokenAndRetryOnce
        );
        assert_eq!(DiagnosticCode::Forbidden.retry_policy(), RetryPolicy::NotRetried);
        assert_eq!(
            DiagnosticCode::RateLimited.retry_policy(),
            RetryPolicy::RetryAfter(Duration::from_secs(60))
        );
        assert_eq!(
            DiagnosticCode::NetworkUnreachable.retry_policy(),
            RetryPolicy::WhenOnline
        );
    }

    #[test]
    fn classified_error_serializes_code_as_key() {
        let err = ClassifiedError::new(DiagnosticCode::Unauthorized, "API 401: bad token");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "401");
        assert_eq!(json["isImmediatelyActionable"], true);
    }
}
