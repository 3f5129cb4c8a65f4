//! Shared reachability state.
//!
//! [`StatusBoard`] holds the last known network status, ping sample and
//! API/token status. Each slot has a single writer (the network probe, the
//! ping meter, the diagnostic runner) and is replaced as a whole value, so
//! readers never observe a partial update.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Internet reachability as last determined by the network probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub online: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Default for NetworkStatus {
    /// Optimistic until the first probe runs.
    fn default() -> Self {
        Self {
            online: true,
            last_checked_at: None,
        }
    }
}

/// One latency measurement against the auth endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingSample {
    pub latency_ms: u64,
    pub measured_at: DateTime<Utc>,
}

/// Last known chat API health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    #[default]
    Unknown,
    Active,
    Error,
}

/// Last known token health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

/// Point-in-time copy of the board for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// `checking` before the first probe, then `online` / `offline`.
    pub network: &'static str,
    pub api: ApiStatus,
    pub token: TokenStatus,
    pub ping: Option<u64>,
    pub last_check: Option<DateTime<Utc>>,
    pub is_online: bool,
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    network: RwLock<NetworkStatus>,
    ping: RwLock<Option<PingSample>>,
    api: RwLock<(ApiStatus, TokenStatus)>,
    last_diagnostic: RwLock<Option<DateTime<Utc>>>,
}

impl StatusBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn network(&self) -> NetworkStatus {
        *self.network.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.network().online
    }

    #[must_use]
    pub fn ping(&self) -> Option<PingSample> {
        *self.ping.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn api_status(&self) -> ApiStatus {
        self.api.read().unwrap_or_else(PoisonError::into_inner).0
    }

    #[must_use]
    pub fn token_status(&self) -> TokenStatus {
        self.api.read().unwrap_or_else(PoisonError::into_inner).1
    }

    pub(crate) fn set_network(&self, status: NetworkStatus) {
        *self.network.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub(crate) fn set_ping(&self, sample: Option<PingSample>) {
        *self.ping.write().unwrap_or_else(PoisonError::into_inner) = sample;
    }

    pub(crate) fn set_api_status(&self, api: ApiStatus, token: TokenStatus) {
        *self.api.write().unwrap_or_else(PoisonError::into_inner) = (api, token);
    }

    pub(crate) fn mark_diagnostic(&self, at: DateTime<Utc>) {
        *self
            .last_diagnostic
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        let network = self.network();
        let last_diagnostic = *self
            .last_diagnostic
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let label = match (network.last_checked_at, network.online) {
            (None, _) => "checking",
            (Some(_), true) => "online",
            (Some(_), false) => "offline",
        };

        StatusSnapshot {
            network: label,
            api: self.api_status(),
            token: self.token_status(),
            ping: self.ping().map(|p| p.latency_ms),
            last_check: network.last_checked_at.max(last_diagnostic),
            is_online: network.online,
        }
    }
}
