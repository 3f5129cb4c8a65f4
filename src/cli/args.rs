//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::storage::ConfigOverrides;

/// Resilient chat-completion client with connectivity diagnostics.
#[derive(Parser, Debug)]
#[command(name = "chatgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Demo mode: canned replies, no network calls to the API
    #[arg(long, global = true)]
    pub mock: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    #[must_use]
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            use_mock_data: self.mock,
            debug_mode: self.verbose,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a message and print the reply
    Chat(ChatArgs),

    /// Test the API connection with a minimal request
    Test,

    /// Check connectivity and measure latency to the auth endpoint
    Ping,

    /// Show current network, API and token status
    Status,

    /// Run the full four-step diagnostic
    Doctor,

    /// Monitor connectivity until Ctrl+C
    Watch(WatchArgs),

    /// Explain an error code (400, 401, 403, 429, 500, timeout, network, ...)
    Explain(ExplainArgs),
}

/// Arguments for the `chat` command.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Message text; multiple words are joined with spaces
    #[arg(required = true, value_name = "MESSAGE")]
    pub message: Vec<String>,

    /// System prompt (defaults to the configured one)
    #[arg(long, value_name = "PROMPT")]
    pub system: Option<String>,

    /// Do not clear the token and retry once on 401
    #[arg(long)]
    pub no_reauth: bool,
}

impl ChatArgs {
    #[must_use]
    pub fn text(&self) -> String {
        self.message.join(" ")
    }
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Seconds between diagnostic runs
    #[arg(long, default_value = "60")]
    pub interval: u64,
}

impl WatchArgs {
    /// Validate argument combinations.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero interval.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.interval == 0 {
            return Err(crate::error::GatewayError::Config(
                "Watch interval must be greater than 0 seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Arguments for the `explain` command.
#[derive(Parser, Debug)]
pub struct ExplainArgs {
    /// Error code or key
    #[arg(value_name = "CODE")]
    pub code: String,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}
