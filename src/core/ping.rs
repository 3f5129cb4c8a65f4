//! Round-trip latency to the auth endpoint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::clock::Clock;
use crate::core::gateway::GatewayClient;
use crate::core::http::{HttpRequest, HttpTransport, RequestOutcome};
use crate::core::status::{PingSample, StatusBoard};

#[derive(Debug, Clone)]
pub struct PingMeter {
    transport: HttpTransport,
    url: String,
    deadline: Duration,
    board: Arc<StatusBoard>,
    clock: Arc<dyn Clock>,
}

impl PingMeter {
    #[must_use]
    pub fn new(
        transport: HttpTransport,
        url: impl Into<String>,
        deadline: Duration,
        board: Arc<StatusBoard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            deadline,
            board,
            clock,
        }
    }

    /// Meter pointed at the client's auth endpoint.
    #[must_use]
    pub fn for_client(client: &GatewayClient, board: Arc<StatusBoard>) -> Self {
        let config = client.config();
        Self::new(
            client.transport().clone(),
            &config.auth_url,
            config.ping_timeout,
            board,
            client.clock(),
        )
    }

    /// Measure one round trip.
    ///
    /// Returns `None` without issuing a request while the board says offline,
    /// and `None` when the request fails or times out. Any HTTP status counts
    /// as a completed round trip.
    pub async fn measure(&self) -> Option<PingSample> {
        if !self.board.is_online() {
            tracing::debug!("Offline, skipping ping");
            self.board.set_ping(None);
            return None;
        }

        let measured_at = self.clock.now();
        let start = Instant::now();
        let request = HttpRequest::head(&self.url)
            .deadline(self.deadline)
            .label("ping");
        let completed = match self.transport.execute(request).await {
            RequestOutcome::Success(_) => true,
            RequestOutcome::Failure(err) => err.server_responded(),
        };

        let sample = completed.then(|| PingSample {
            latency_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            measured_at,
        });
        match sample {
            Some(sample) => tracing::debug!(latency_ms = sample.latency_ms, "Ping measured"),
            None => tracing::debug!(url = %self.url, "Ping unmeasurable"),
        }
        self.board.set_ping(sample);
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SystemClock;
    use crate::core::status::NetworkStatus;
    use chrono::Utc;

    #[tokio::test]
    async fn offline_board_short_circuits() {
        let board = Arc::new(StatusBoard::new());
        board.set_network(NetworkStatus {
            online: false,
            last_checked_at: Some(Utc::now()),
        });
        board.set_ping(Some(PingSample {
            latency_ms: 5,
            measured_at: Utc::now(),
        }));
        // Unroutable; would hang for the full deadline if a request were sent.
        let meter = PingMeter::new(
            HttpTransport::new().unwrap(),
            "http://10.255.255.1/",
            Duration::from_secs(30),
            Arc::clone(&board),
            Arc::new(SystemClock),
        );

        let start = Instant::now();
        assert!(meter.measure().await.is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(board.ping().is_none());
    }
}
