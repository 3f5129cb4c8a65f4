//! `ping` and `status` commands.

use std::sync::Arc;

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::core::gateway::GatewayClient;
use crate::core::ping::PingMeter;
use crate::core::probe::NetworkProbe;
use crate::core::status::{StatusBoard, StatusSnapshot};
use crate::error::{ExitCode, Result};
use crate::render;
use crate::storage::GatewayConfig;

/// Result of `chatgate ping`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingReport {
    pub target: String,
    pub online: bool,
    /// `None` when offline or the endpoint did not answer.
    pub latency_ms: Option<u64>,
}

/// Probe the network, then measure ping. Both write to `board`.
async fn refresh(client: &GatewayClient, board: &Arc<StatusBoard>) {
    NetworkProbe::for_client(client, Arc::clone(board))
        .check_online()
        .await;
    PingMeter::for_client(client, Arc::clone(board))
        .measure()
        .await;
}

/// Execute the `ping` command. Exit 1 when no latency could be measured.
///
/// # Errors
///
/// Returns configuration errors.
pub async fn execute_ping(
    config: GatewayConfig,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<ExitCode> {
    let client = GatewayClient::new(config)?;
    let board = Arc::new(StatusBoard::new());
    refresh(&client, &board).await;

    let report = PingReport {
        target: client.config().auth_url.clone(),
        online: board.is_online(),
        latency_ms: board.ping().map(|p| p.latency_ms),
    };
    println!("{}", render::render_ping(&report, format, pretty, no_color)?);
    Ok(if report.latency_ms.is_some() {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    })
}

/// Execute the `status` command.
///
/// # Errors
///
/// Returns configuration errors.
pub async fn execute_status(
    config: GatewayConfig,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<ExitCode> {
    let client = GatewayClient::new(config)?;
    let board = Arc::new(StatusBoard::new());
    refresh(&client, &board).await;

    let snapshot: StatusSnapshot = board.snapshot();
    println!(
        "{}",
        render::render_status(&snapshot, format, pretty, no_color)?
    );
    Ok(ExitCode::Success)
}
