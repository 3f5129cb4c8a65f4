//! Tracing subscriber setup for the binary.
//!
//! Level precedence: `--log-level`, then `CHATGATE_LOG`, then the config
//! file's `[general] log_level`, then `--verbose` or `debug_mode` (debug),
//! then `warn`. `RUST_LOG`, when set, replaces the whole filter.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "CHATGATE_LOG";
pub const LOG_FORMAT_ENV: &str = "CHATGATE_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "CHATGATE_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Json,
    Compact,
}

impl LogFormat {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" | "jsonl" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Parse a level name. Accepts `verbose` for debug and `warning` for warn.
#[must_use]
pub fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" | "verbose" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: Level,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Resolve settings from flags and the environment.
    ///
    /// Level precedence: flag, `CHATGATE_LOG`, config file, then `debug`.
    /// `debug` covers both `--verbose` and the config file's `debug_mode`.
    #[must_use]
    pub fn resolve(
        cli_level: Option<&str>,
        config_level: Option<&str>,
        json_output: bool,
        debug: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let level = cli_level
            .and_then(parse_level)
            .or_else(|| lookup(LOG_LEVEL_ENV).as_deref().and_then(parse_level))
            .or_else(|| config_level.and_then(parse_level))
            .unwrap_or(if debug { Level::DEBUG } else { Level::WARN });
        let format = if json_output {
            LogFormat::Json
        } else {
            lookup(LOG_FORMAT_ENV)
                .as_deref()
                .and_then(LogFormat::from_arg)
                .unwrap_or_default()
        };
        let file = lookup(LOG_FILE_ENV).map(PathBuf::from);
        Self {
            level,
            format,
            file,
        }
    }

    /// [`LogSettings::resolve`] against the process environment.
    #[must_use]
    pub fn from_env(
        cli_level: Option<&str>,
        config_level: Option<&str>,
        json_output: bool,
        debug: bool,
    ) -> Self {
        Self::resolve(cli_level, config_level, json_output, debug, env_value)
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "chatgate={}",
                self.level.as_str().to_lowercase()
            ))
        })
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(settings: &LogSettings) {
    let file = settings.file.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    let writer = match file {
        Some(file) => BoxMakeWriter::new(file),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let filter = settings.filter();

    let installed = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_writer(writer)
            .with_target(true)
            .try_init(),
        LogFormat::Human => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(false)
            .without_time()
            .try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(level = %settings.level, format = ?settings.format, "Logging initialised");
    }
}
