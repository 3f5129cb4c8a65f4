//! Internet reachability probe.
//!
//! Independent of the target API: a short ordered list of external endpoints
//! is tried one at a time, each under its own deadline, stopping at the first
//! that answers. Any HTTP response counts as reachable; the body is ignored.

use std::sync::Arc;
use std::time::Duration;

use crate::core::clock::Clock;
use crate::core::gateway::GatewayClient;
use crate::core::http::{HttpRequest, HttpTransport, RequestOutcome};
use crate::core::status::{NetworkStatus, StatusBoard};

#[derive(Debug, Clone)]
pub struct NetworkProbe {
    transport: HttpTransport,
    urls: Vec<String>,
    deadline: Duration,
    board: Arc<StatusBoard>,
    clock: Arc<dyn Clock>,
}

impl NetworkProbe {
    #[must_use]
    pub fn new(
        transport: HttpTransport,
        urls: Vec<String>,
        deadline: Duration,
        board: Arc<StatusBoard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            urls,
            deadline,
            board,
            clock,
        }
    }

    /// Probe built from a client's configuration, sharing its transport.
    #[must_use]
    pub fn for_client(client: &GatewayClient, board: Arc<StatusBoard>) -> Self {
        let config = client.config();
        Self::new(
            client.transport().clone(),
            config.probe_urls.clone(),
            config.probe_timeout,
            board,
            client.clock(),
        )
    }

    /// Whether any probe endpoint answers. Records the result on the board.
    pub async fn check_online(&self) -> bool {
        let mut online = false;
        for url in &self.urls {
            let request = HttpRequest::head(url)
                .deadline(self.deadline)
                .label("probe");
            match self.transport.execute(request).await {
                RequestOutcome::Success(_) => online = true,
                RequestOutcome::Failure(err) if err.server_responded() => online = true,
                RequestOutcome::Failure(err) => {
                    tracing::debug!(%url, code = %err.code, "Probe endpoint unreachable");
                }
            }
            if online {
                tracing::debug!(%url, "Probe endpoint answered");
                break;
            }
        }

        if !online {
            tracing::warn!(probes = self.urls.len(), "All network probes failed");
        }
        self.board.set_network(NetworkStatus {
            online,
            last_checked_at: Some(self.clock.now()),
        });
        online
    }
}
