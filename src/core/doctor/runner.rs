//! Four-step diagnostic: network, ping, configuration, chat API.
//!
//! Steps run strictly in order and are isolated: each produces its own
//! [`DiagnosticCheck`] and none can abort the ones after it. Ping and API are
//! reported unavailable when the network step finds no connectivity.

use std::sync::Arc;
use std::time::Instant;

use super::{CheckStatus, DiagnosticCheck, DiagnosticReport, DiagnosticStep};
use crate::core::gateway::GatewayClient;
use crate::core::http::RequestOutcome;
use crate::core::ping::PingMeter;
use crate::core::probe::NetworkProbe;
use crate::core::status::{ApiStatus, StatusBoard, TokenStatus};
use crate::error::{ClassifiedError, DiagnosticCode};

/// Shown when the network step fails.
pub const OFFLINE_RECOMMENDATIONS: [&str; 3] = [
    "Check your internet connection",
    "Disable VPN/proxy",
    "Try a different network",
];

/// Shown when demo mode is on.
pub const MOCK_RECOMMENDATION: &str = "Set use_mock_data = false to use the real API";

const OFFLINE_REASON: &str = "network offline";

#[derive(Debug, Clone)]
pub struct DiagnosticRunner {
    client: Arc<GatewayClient>,
    probe: NetworkProbe,
    meter: PingMeter,
    board: Arc<StatusBoard>,
}

impl DiagnosticRunner {
    /// Runner whose probe and meter come from the client's configuration.
    #[must_use]
    pub fn new(client: Arc<GatewayClient>, board: Arc<StatusBoard>) -> Self {
        let probe = NetworkProbe::for_client(&client, Arc::clone(&board));
        let meter = PingMeter::for_client(&client, Arc::clone(&board));
        Self::with_parts(client, probe, meter, board)
    }

    #[must_use]
    pub fn with_parts(
        client: Arc<GatewayClient>,
        probe: NetworkProbe,
        meter: PingMeter,
        board: Arc<StatusBoard>,
    ) -> Self {
        Self {
            client,
            probe,
            meter,
            board,
        }
    }

    #[must_use]
    pub const fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    #[must_use]
    pub const fn client(&self) -> &Arc<GatewayClient> {
        &self.client
    }

    /// Run all steps and build a fresh report.
    ///
    /// Safe to call while an earlier report is still in use; runs share only
    /// the status board.
    pub async fn run(&self) -> DiagnosticReport {
        let start = Instant::now();
        let started_at = self.client.clock().now();
        tracing::debug!("Starting diagnostic run");

        let (network, online) = self.check_network().await;
        let ping = self.check_ping(online).await;
        let configuration = self.check_configuration();
        let (api, api_failure) = self.check_api(online).await;

        let recommendations = self.recommendations(online, api_failure.as_ref());
        let report = DiagnosticReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at,
            checks: vec![network, ping, configuration, api],
            recommendations,
            mock_mode: self.client.config().use_mock_data,
            total_duration: start.elapsed(),
        };

        self.board.mark_diagnostic(self.client.clock().now());
        let (passed, needs_attention) = report.summary();
        tracing::info!(
            passed,
            needs_attention,
            duration_ms = report.total_duration.as_millis(),
            "Diagnostic finished"
        );
        report
    }

    async fn check_network(&self) -> (DiagnosticCheck, bool) {
        let start = Instant::now();
        let online = self.probe.check_online().await;
        let status = if online {
            CheckStatus::Pass {
                details: Some("Internet connection established".to_string()),
            }
        } else {
            CheckStatus::Fail {
                reason: "No internet connection".to_string(),
                suggestion: Some(OFFLINE_RECOMMENDATIONS[0].to_string()),
            }
        };
        (
            DiagnosticCheck::new(DiagnosticStep::Network, status).with_duration(start.elapsed()),
            online,
        )
    }

    async fn check_ping(&self, online: bool) -> DiagnosticCheck {
        if !online {
            return unavailable(DiagnosticStep::Ping);
        }
        let start = Instant::now();
        let status = match self.meter.measure().await {
            Some(sample) => CheckStatus::Pass {
                details: Some(format!("{} ms to the auth endpoint", sample.latency_ms)),
            },
            None => CheckStatus::Warning {
                details: "Auth endpoint did not answer".to_string(),
                suggestion: Some("Check auth_url in config.toml".to_string()),
            },
        };
        DiagnosticCheck::new(DiagnosticStep::Ping, status).with_duration(start.elapsed())
    }

    fn check_configuration(&self) -> DiagnosticCheck {
        let start = Instant::now();
        let config = self.client.config();
        let issues: Vec<String> = config
            .configuration_issues()
            .into_iter()
            // Demo mode never authenticates.
            .filter(|issue| !(config.use_mock_data && issue.starts_with("client_id")))
            .collect();

        let status = if issues.is_empty() {
            CheckStatus::Pass {
                details: Some("All parameters are set".to_string()),
            }
        } else {
            CheckStatus::Fail {
                reason: issues.join(", "),
                suggestion: Some(format!(
                    "Edit {}",
                    crate::storage::Config::config_path().display()
                )),
            }
        };
        DiagnosticCheck::new(DiagnosticStep::Configuration, status).with_duration(start.elapsed())
    }

    async fn check_api(&self, online: bool) -> (DiagnosticCheck, Option<ClassifiedError>) {
        if !online {
            return (unavailable(DiagnosticStep::Api), None);
        }
        let start = Instant::now();
        let mock = self.client.config().use_mock_data;

        match self.client.probe_connection().await {
            RequestOutcome::Success(_) => {
                let token = if mock {
                    TokenStatus::Unknown
                } else {
                    TokenStatus::Valid
                };
                self.board.set_api_status(ApiStatus::Active, token);
                let details = if mock {
                    "Demo mode, canned replies"
                } else {
                    "Test request succeeded"
                };
                let check = DiagnosticCheck::new(
                    DiagnosticStep::Api,
                    CheckStatus::Pass {
                        details: Some(details.to_string()),
                    },
                );
                (check.with_duration(start.elapsed()), None)
            }
            RequestOutcome::Failure(err) => {
                let token = match err.code {
                    DiagnosticCode::Unauthorized => TokenStatus::Invalid,
                    _ if self.client.tokens().has_valid_token() => TokenStatus::Valid,
                    _ => TokenStatus::Unknown,
                };
                self.board.set_api_status(ApiStatus::Error, token);

                let remediation = err.remediation();
                let check = DiagnosticCheck::new(
                    DiagnosticStep::Api,
                    CheckStatus::Fail {
                        reason: format!("{}: {}", remediation.title, err.raw_message),
                        suggestion: remediation.steps.first().map(|s| (*s).to_string()),
                    },
                )
                .with_code(err.code)
                .with_duration(start.elapsed());
                (check, Some(err))
            }
        }
    }

    fn recommendations(&self, online: bool, api_failure: Option<&ClassifiedError>) -> Vec<String> {
        let mut recommendations = Vec::new();
        if !online {
            recommendations.extend(OFFLINE_RECOMMENDATIONS.iter().map(|s| (*s).to_string()));
        }
        if self.client.config().use_mock_data {
            recommendations.push(MOCK_RECOMMENDATION.to_string());
        }
        if let Some(step) = api_failure.and_then(|err| err.remediation().steps.first()) {
            recommendations.push((*step).to_string());
        }
        recommendations
    }
}

fn unavailable(step: DiagnosticStep) -> DiagnosticCheck {
    DiagnosticCheck::new(
        step,
        CheckStatus::Unavailable {
            reason: OFFLINE_REASON.to_string(),
        },
    )
}
