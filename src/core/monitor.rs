//! Periodic network checks and ping measurements.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::core::ping::PingMeter;
use crate::core::probe::NetworkProbe;

/// Floor applied to configured intervals.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns the background probe and ping loops.
pub struct Monitor;

impl Monitor {
    /// Start both loops on the current runtime. The first network check and
    /// ping fire immediately.
    #[must_use]
    pub fn spawn(
        probe: NetworkProbe,
        meter: PingMeter,
        network_interval: Duration,
        ping_interval: Duration,
    ) -> MonitorHandle {
        let network_interval = network_interval.max(MIN_INTERVAL);
        let ping_interval = ping_interval.max(MIN_INTERVAL);
        tracing::debug!(
            network_ms = network_interval.as_millis(),
            ping_ms = ping_interval.as_millis(),
            "Starting monitor"
        );

        let network = tokio::spawn(async move {
            let mut ticker = interval(network_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                probe.check_online().await;
            }
        });

        // Ping reads the board itself and skips while offline.
        let ping = tokio::spawn(async move {
            let mut ticker = interval(ping_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                meter.measure().await;
            }
        });

        MonitorHandle {
            tasks: vec![network, ping],
        }
    }
}

/// Owns the monitor tasks; aborts them on [`MonitorHandle::stop`] or drop.
#[derive(Debug)]
pub struct MonitorHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorHandle {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }

    pub fn stop(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.abort_all();
    }
}
