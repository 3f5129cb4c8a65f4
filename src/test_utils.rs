//! Test utilities for chatgate.
//!
//! Provides a manually driven clock, config and response factories for mock
//! servers, and a temporary directory helper.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chatgate::test_utils::*;
//!
//! let server = wiremock::MockServer::start().await;
//! let config = mock_server_config(&server.uri());
//! let clock = ManualClock::new();
//! ```

use std::fs;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};

use crate::core::clock::Clock;
use crate::storage::GatewayConfig;

// =============================================================================
// Clock
// =============================================================================

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at the current wall-clock instant.
    #[must_use]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    #[must_use]
    pub const fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Config Factories
// =============================================================================

/// Config pointing every endpoint at a mock server.
///
/// OAuth lives at `{uri}/oauth`, chat at `{uri}/chat`, and the only probe URL
/// is the server root. Deadlines are short so timeout tests stay fast.
#[must_use]
pub fn mock_server_config(uri: &str) -> GatewayConfig {
    GatewayConfig {
        client_id: "abc".to_string(),
        scope: "TEST_SCOPE".to_string(),
        auth_url: format!("{uri}/oauth"),
        api_url: format!("{uri}/chat"),
        model: "test-model".to_string(),
        chat_timeout: Duration::from_secs(2),
        probe_timeout: Duration::from_secs(1),
        ping_timeout: Duration::from_secs(1),
        probe_urls: vec![format!("{uri}/")],
        ..GatewayConfig::default()
    }
}

/// Config with no reachable network at all: probes hit a closed local port.
#[must_use]
pub fn offline_config(uri: &str) -> GatewayConfig {
    GatewayConfig {
        probe_urls: vec!["http://127.0.0.1:1/".to_string()],
        ..mock_server_config(uri)
    }
}

// =============================================================================
// Response Bodies
// =============================================================================

/// Successful OAuth exchange body.
#[must_use]
pub fn oauth_body(token: &str, expires_in: i64) -> Value {
    json!({ "access_token": token, "expires_in": expires_in })
}

/// Chat completion with a single assistant choice.
#[must_use]
pub fn chat_body(content: &str) -> Value {
    json!({
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "created": 1_700_000_000,
        "model": "test-model",
        "usage": { "prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12 }
    })
}

/// Error body in the `{"error":{"message":...}}` shape.
#[must_use]
pub fn error_body(message: &str) -> Value {
    json!({ "error": { "message": message } })
}

// =============================================================================
// Temporary Directories
// =============================================================================

/// Isolated temporary directory, removed on drop.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content and return its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
        path
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);
        clock.advance(TimeDelta::seconds(90));
        assert_eq!(clock.now() - start, TimeDelta::seconds(90));
    }

    #[test]
    fn mock_config_passes_required_validation() {
        let config = mock_server_config("http://127.0.0.1:9");
        assert!(config.validate_required().is_ok());
        assert_eq!(config.auth_url, "http://127.0.0.1:9/oauth");
    }

    #[test]
    fn test_dir_writes_files() {
        let dir = TestDir::new();
        let path = dir.create_file("nested/config.toml", "[general]\n");
        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
    }
}
