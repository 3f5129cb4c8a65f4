//! chatgate - resilient chat-completion client
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use chatgate::cli::{Cli, Commands};
use chatgate::core::logging::{self, LogSettings};
use chatgate::error::GatewayError;
use chatgate::storage::GatewayConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.effective_format();
    let pretty = cli.pretty;
    let no_color = cli.no_color;

    // Explain needs no configuration; everything else resolves it before
    // logging so the config file's debug_mode can raise the level.
    let config = match &cli.command {
        None | Some(Commands::Explain(_)) => Ok(None),
        Some(_) => GatewayConfig::resolve(&cli.config_overrides()).map(Some),
    };
    let resolved = config.as_ref().ok().and_then(Option::as_ref);
    let debug = cli.verbose || resolved.is_some_and(|c| c.debug_mode);
    logging::init(&LogSettings::from_env(
        cli.log_level.as_deref(),
        resolved.and_then(|c| c.log_level.as_deref()),
        cli.json_output,
        debug,
    ));

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => ExitCode::from(exit_byte(i32::from(code))),
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            let output = chatgate::render::error::render_error_full(&e, format, no_color, pretty);
            eprintln!("{output}");
            ExitCode::from(exit_byte(i32::from(e.exit_code())))
        }
    }
}

fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

async fn run(cli: Cli, config: Option<GatewayConfig>) -> chatgate::Result<chatgate::ExitCode> {
    let format = cli.effective_format();
    let pretty = cli.pretty;
    let no_color = !chatgate::util::env::should_use_color(cli.no_color);

    let Some(command) = cli.command else {
        print_quickstart();
        return Ok(chatgate::ExitCode::Success);
    };

    let require = |config: Option<GatewayConfig>| {
        config.ok_or_else(|| GatewayError::Config("Configuration was not resolved".to_string()))
    };

    match command {
        Commands::Explain(args) => chatgate::cli::explain::execute(&args, format, pretty, no_color),
        Commands::Chat(args) => {
            chatgate::cli::chat::execute(&args, require(config)?, format, pretty, no_color).await
        }
        Commands::Test => {
            chatgate::cli::chat::execute_test(require(config)?, format, pretty, no_color).await
        }
        Commands::Ping => {
            chatgate::cli::status::execute_ping(require(config)?, format, pretty, no_color).await
        }
        Commands::Status => {
            chatgate::cli::status::execute_status(require(config)?, format, pretty, no_color)
                .await
        }
        Commands::Doctor => {
            chatgate::cli::doctor::execute(require(config)?, format, pretty, no_color).await
        }
        Commands::Watch(args) => {
            chatgate::cli::watch::execute(&args, require(config)?, format, pretty, no_color).await
        }
    }
}

fn print_quickstart() {
    println!(
        r"chatgate - resilient chat-completion client

USAGE:
    chatgate [OPTIONS] <COMMAND>

COMMANDS:
    chat      Send a message and print the reply
    test      Test the API connection
    ping      Check connectivity and latency
    status    Show network, API and token status
    doctor    Run the four-step diagnostic
    watch     Monitor connectivity until Ctrl+C
    explain   Explain an error code

QUICK START:
    chatgate doctor                  # Check setup and connectivity
    chatgate chat Hello there        # Ask something
    chatgate --mock chat Hello       # Demo mode, no network
    chatgate explain 401             # What does a 401 mean?

ROBOT MODE:
    chatgate status --json           # JSON output
    chatgate doctor --format md      # Markdown output

Config: {}
For more help: chatgate --help",
        chatgate::storage::Config::config_path().display()
    );
}
