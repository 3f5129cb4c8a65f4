//! Configuration file loading and resolution.
//!
//! Loads configuration from:
//! - Linux: `~/.config/chatgate/config.toml`
//! - macOS: `~/Library/Application Support/chatgate/config.toml`
//! - Windows: `%APPDATA%/chatgate/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `CHATGATE_CONFIG`: Override config file path
//! - `CHATGATE_CLIENT_ID`, `CHATGATE_SCOPE`: OAuth credential
//! - `CHATGATE_AUTH_URL`, `CHATGATE_API_URL`: Endpoints
//! - `CHATGATE_MODEL`: Model name
//! - `CHATGATE_MOCK`: Demo mode, no network calls (1, true, yes)
//! - `CHATGATE_DEBUG`: Debug logging (1, true, yes)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::error::{GatewayError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "CHATGATE_CONFIG";
/// Environment variable for the OAuth client id.
pub const ENV_CLIENT_ID: &str = "CHATGATE_CLIENT_ID";
/// Environment variable for the OAuth scope.
pub const ENV_SCOPE: &str = "CHATGATE_SCOPE";
/// Environment variable for the OAuth endpoint.
pub const ENV_AUTH_URL: &str = "CHATGATE_AUTH_URL";
/// Environment variable for the chat-completion endpoint.
pub const ENV_API_URL: &str = "CHATGATE_API_URL";
/// Environment variable for the model name.
pub const ENV_MODEL: &str = "CHATGATE_MODEL";
/// Environment variable enabling demo mode.
pub const ENV_MOCK: &str = "CHATGATE_MOCK";
/// Environment variable enabling debug mode.
pub const ENV_DEBUG: &str = "CHATGATE_DEBUG";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "GigaChat";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Well-known endpoints that answer HEAD cheaply and tolerate anonymous callers.
pub const DEFAULT_PROBE_URLS: [&str; 3] = [
    "https://www.google.com/gen_204",
    "https://connectivitycheck.gstatic.com/generate_204",
    "https://captive.apple.com/hotspot-detect.html",
];

// =============================================================================
// Config File Schema
// =============================================================================

/// Root configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub endpoints: EndpointsConfig,
    pub model: ModelConfig,
    pub monitor: MonitorConfig,
    pub timeouts: TimeoutsConfig,
    pub general: GeneralConfig,
}

/// OAuth client credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub client_id: Option<String>,
    pub scope: Option<String>,
}

/// Remote endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub auth_url: Option<String>,
    pub api_url: Option<String>,
}

/// Completion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
}

/// Background reachability checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub ping_interval_ms: u64,
    pub network_check_interval_ms: u64,
    pub probe_urls: Vec<String>,
}

/// Per-call deadlines in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub chat_secs: u64,
    pub probe_secs: u64,
    pub ping_secs: u64,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Answer chat calls with canned replies and never touch the network.
    pub use_mock_data: bool,
    /// Raise the default log level to debug.
    pub debug_mode: bool,
    /// Default log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: None,
            max_tokens: 1000,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: 60_000,
            network_check_interval_ms: 30_000,
            probe_urls: DEFAULT_PROBE_URLS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            chat_secs: 30,
            probe_secs: 5,
            ping_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| GatewayError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load a file that must exist (explicit `--config` or `CHATGATE_CONFIG`).
    pub fn load_required(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GatewayError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        Self::load_from(path)
    }

    /// Get the default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - Temperature is within 0.0-2.0
    /// - `max_tokens` and every timeout are non-zero
    /// - Monitor intervals are at least one second
    /// - Configured URLs are http(s)
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, value: String, message: &str| GatewayError::ConfigInvalid {
            key: key.to_string(),
            value,
            message: message.to_string(),
        };

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(invalid(
                "model.temperature",
                self.model.temperature.to_string(),
                "must be between 0.0 and 2.0",
            ));
        }
        if self.model.max_tokens == 0 {
            return Err(invalid("model.max_tokens", "0".to_string(), "must be positive"));
        }
        for (key, secs) in [
            ("timeouts.chat_secs", self.timeouts.chat_secs),
            ("timeouts.probe_secs", self.timeouts.probe_secs),
            ("timeouts.ping_secs", self.timeouts.ping_secs),
        ] {
            if secs == 0 {
                return Err(invalid(key, "0".to_string(), "must be at least 1 second"));
            }
        }
        for (key, ms) in [
            ("monitor.ping_interval_ms", self.monitor.ping_interval_ms),
            (
                "monitor.network_check_interval_ms",
                self.monitor.network_check_interval_ms,
            ),
        ] {
            if ms < 1000 {
                return Err(invalid(key, ms.to_string(), "must be at least 1000"));
            }
        }

        let urls = self
            .endpoints
            .auth_url
            .iter()
            .map(|u| ("endpoints.auth_url", u))
            .chain(self.endpoints.api_url.iter().map(|u| ("endpoints.api_url", u)))
            .chain(self.monitor.probe_urls.iter().map(|u| ("monitor.probe_urls", u)));
        for (key, url) in urls {
            if !url.is_empty() && !is_http_url(url) {
                return Err(invalid(key, url.clone(), "must start with http:// or https://"));
            }
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Overrides coming from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub use_mock_data: bool,
    pub debug_mode: bool,
}

/// Fully resolved configuration consumed by the gateway core.
///
/// Required fields (`client_id`, `auth_url`, `api_url`, `model`) are empty
/// strings when absent; [`GatewayConfig::validate_required`] rejects them.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub client_id: String,
    pub scope: String,
    pub auth_url: String,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub ping_interval: Duration,
    pub network_check_interval: Duration,
    pub chat_timeout: Duration,
    pub probe_timeout: Duration,
    pub ping_timeout: Duration,
    pub probe_urls: Vec<String>,
    pub use_mock_data: bool,
    pub debug_mode: bool,
    pub log_level: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from_file(Config::default())
    }
}

impl GatewayConfig {
    /// Resolve final configuration from CLI overrides, environment variables,
    /// and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named config file is missing, if the
    /// file exists but is invalid, or if any value is out of range.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let file = match (&overrides.config_path, std::env::var(ENV_CONFIG)) {
            (Some(path), _) => Config::load_required(path)?,
            (None, Ok(path)) if !path.trim().is_empty() => {
                Config::load_required(Path::new(path.trim()))?
            }
            _ => Config::load()?,
        };
        file.validate()?;

        let mut config = Self::from_file(file);
        config.apply_env(|key| std::env::var(key).ok());
        config.validate_endpoints()?;
        if overrides.use_mock_data {
            config.use_mock_data = true;
        }
        if overrides.debug_mode {
            config.debug_mode = true;
        }
        Ok(config)
    }

    /// Flatten a config file, filling defaults.
    #[must_use]
    pub fn from_file(file: Config) -> Self {
        Self {
            client_id: file.credentials.client_id.unwrap_or_default(),
            scope: file
                .credentials
                .scope
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            auth_url: file
                .endpoints
                .auth_url
                .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            api_url: file
                .endpoints
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: file.model.name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: file.model.max_tokens,
            temperature: file.model.temperature,
            system_prompt: file.model.system_prompt,
            ping_interval: Duration::from_millis(file.monitor.ping_interval_ms),
            network_check_interval: Duration::from_millis(
                file.monitor.network_check_interval_ms,
            ),
            chat_timeout: Duration::from_secs(file.timeouts.chat_secs),
            probe_timeout: Duration::from_secs(file.timeouts.probe_secs),
            ping_timeout: Duration::from_secs(file.timeouts.ping_secs),
            probe_urls: file.monitor.probe_urls,
            use_mock_data: file.general.use_mock_data,
            debug_mode: file.general.debug_mode,
            log_level: file.general.log_level,
        }
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        for (key, slot) in [
            (ENV_CLIENT_ID, &mut self.client_id),
            (ENV_SCOPE, &mut self.scope),
            (ENV_AUTH_URL, &mut self.auth_url),
            (ENV_API_URL, &mut self.api_url),
            (ENV_MODEL, &mut self.model),
        ] {
            if let Some(v) = value(key) {
                *slot = v;
            }
        }
        if let Some(v) = value(ENV_MOCK) {
            self.use_mock_data = crate::util::env::parse_bool(&v);
        }
        if let Some(v) = value(ENV_DEBUG) {
            self.debug_mode = crate::util::env::parse_bool(&v);
        }
    }

    /// Check the resolved endpoint URLs, including environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigInvalid`] for a non-http(s) endpoint.
    pub fn validate_endpoints(&self) -> Result<()> {
        for (key, url) in [("auth_url", &self.auth_url), ("api_url", &self.api_url)] {
            if !url.is_empty() && !is_http_url(url) {
                return Err(GatewayError::ConfigInvalid {
                    key: key.to_string(),
                    value: url.clone(),
                    message: "must start with http:// or https://".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fail fast when any required field is absent.
    ///
    /// The client id is not required in demo mode, which never authenticates.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingFields`] naming every absent field.
    pub fn validate_required(&self) -> Result<()> {
        let mut fields = Vec::new();
        if self.client_id.trim().is_empty() && !self.use_mock_data {
            fields.push("client_id".to_string());
        }
        for (name, value) in [
            ("auth_url", &self.auth_url),
            ("api_url", &self.api_url),
            ("model", &self.model),
        ] {
            if value.trim().is_empty() {
                fields.push(name.to_string());
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::MissingFields { fields })
        }
    }

    /// Human-readable problems for the diagnostic report: absent values and
    /// values that still look like template placeholders.
    #[must_use]
    pub fn configuration_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (name, value) in [
            ("client_id", &self.client_id),
            ("scope", &self.scope),
            ("auth_url", &self.auth_url),
            ("api_url", &self.api_url),
            ("model", &self.model),
        ] {
            if value.trim().is_empty() {
                issues.push(format!("{name} is not set"));
            } else if is_placeholder(value) {
                issues.push(format!("{name} still has a placeholder value"));
            }
        }
        issues
    }
}

/// Whether a value looks like an unfilled template.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    let bracketed = lower.starts_with('<') && lower.ends_with('>');
    let masked = lower.contains('x') && lower.chars().all(|c| c == 'x' || c == '-');
    bracketed
        || masked
        || ["your_", "your-", "changeme", "placeholder"]
            .iter()
            .any(|marker| lower.contains(marker))
}
