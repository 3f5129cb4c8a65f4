//! Watch mode: background monitor plus periodic diagnostics.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{Duration, interval};

use crate::cli::args::{OutputFormat, WatchArgs};
use crate::core::doctor::DiagnosticReport;
use crate::core::doctor::runner::DiagnosticRunner;
use crate::core::gateway::GatewayClient;
use crate::core::monitor::Monitor;
use crate::core::ping::PingMeter;
use crate::core::probe::NetworkProbe;
use crate::core::status::{StatusBoard, StatusSnapshot};
use crate::error::{ExitCode, Result};
use crate::render;
use crate::storage::GatewayConfig;

/// State tracked across watch iterations.
#[derive(Debug, Default)]
pub struct WatchState {
    pub last_report: Option<DiagnosticReport>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub run_count: u64,
    /// Runs with at least one step needing attention.
    pub unhealthy_count: u64,
}

impl WatchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update(&mut self, report: DiagnosticReport, at: DateTime<Utc>) {
        self.run_count += 1;
        if !report.is_healthy() {
            self.unhealthy_count += 1;
        }
        self.last_report = Some(report);
        self.last_run_at = Some(at);
    }
}

/// Run watch mode until Ctrl+C.
///
/// # Errors
///
/// Returns configuration errors, or an error if rendering fails.
pub async fn execute(
    args: &WatchArgs,
    config: GatewayConfig,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<ExitCode> {
    args.validate()?;
    let network_interval = config.network_check_interval;
    let ping_interval = config.ping_interval;

    let client = Arc::new(GatewayClient::new(config)?);
    let board = Arc::new(StatusBoard::new());
    let monitor = Monitor::spawn(
        NetworkProbe::for_client(&client, Arc::clone(&board)),
        PingMeter::for_client(&client, Arc::clone(&board)),
        network_interval,
        ping_interval,
    );
    let runner = DiagnosticRunner::new(Arc::clone(&client), Arc::clone(&board));

    let mut state = WatchState::new();
    let mut ticker = interval(Duration::from_secs(args.interval));

    // Ctrl+C handler for clean shutdown.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    tracing::info!(interval_secs = args.interval, "Watching");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = runner.run().await;
                state.update(report, client.clock().now());
                render_watch_frame(&state, &board.snapshot(), format, pretty, no_color)?;
            }
            _ = &mut shutdown_rx => break,
        }
    }

    monitor.stop();
    tracing::info!(runs = state.run_count, unhealthy = state.unhealthy_count, "Watch stopped");

    Ok(ExitCode::Success)
}

fn render_watch_frame(
    state: &WatchState,
    snapshot: &StatusSnapshot,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let (passed, needs_attention) = state
        .last_report
        .as_ref()
        .map_or((0, 0), DiagnosticReport::summary);
    println!(
        "{}",
        render::render_watch_line(
            snapshot,
            passed,
            needs_attention,
            state.last_run_at,
            format,
            pretty,
            no_color
        )?
    );
    Ok(())
}
