//! Access-token cache.
//!
//! Single source of truth for authentication state. A cached token is reused
//! while `now < expires_at`; otherwise one OAuth exchange runs and every
//! concurrent caller awaits that same exchange.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;

use crate::core::clock::Clock;
use crate::core::credential::{Credential, REQUEST_ID_HEADER};
use crate::core::http::{HttpRequest, HttpTransport, RequestOutcome};
use crate::error::{ClassifiedError, TransportFailure, classify};

/// Subtracted from the server TTL so a token never expires mid-flight.
pub const EXPIRY_SAFETY_MARGIN: TimeDelta = TimeDelta::seconds(60);

type TokenResult = Result<AccessToken, ClassifiedError>;
type PendingExchange = Shared<BoxFuture<'static, TokenResult>>;

// =============================================================================
// Access Token
// =============================================================================

/// An OAuth access token and the instant it stops being usable.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token is usable iff `now < expires_at`.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &format_args!("<{} chars>", self.value.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

// =============================================================================
// Token Cache
// =============================================================================

#[derive(Default)]
struct TokenState {
    token: Option<AccessToken>,
    pending: Option<PendingExchange>,
    /// Bumped by `clear()`; exchanges started before a clear do not install.
    generation: u64,
}

struct Inner {
    exchange: ExchangeConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<TokenState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything one exchange needs, cloned into the shared future.
#[derive(Clone)]
struct ExchangeConfig {
    transport: HttpTransport,
    credential: Credential,
    auth_url: String,
    deadline: Duration,
}

/// Caches the access token and coalesces concurrent refreshes.
#[derive(Clone)]
pub struct TokenCache {
    inner: Arc<Inner>,
}

impl TokenCache {
    #[must_use]
    pub fn new(
        transport: HttpTransport,
        credential: Credential,
        auth_url: impl Into<String>,
        deadline: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                exchange: ExchangeConfig {
                    transport,
                    credential,
                    auth_url: auth_url.into(),
                    deadline,
                },
                clock,
                state: Mutex::new(TokenState::default()),
            }),
        }
    }

    /// Return the cached token, or run (or join) an OAuth exchange.
    ///
    /// # Errors
    ///
    /// Propagates the classified exchange failure. The cache is left empty and
    /// nothing is retried here.
    pub async fn get_token(&self) -> TokenResult {
        let pending = {
            let mut state = self.inner.lock();
            let now = self.inner.clock.now();
            if let Some(token) = state.token.as_ref().filter(|t| t.is_usable(now)) {
                tracing::trace!("Using cached access token");
                return Ok(token.clone());
            }
            if let Some(pending) = &state.pending {
                tracing::debug!("Joining in-flight token exchange");
                pending.clone()
            } else {
                state.token = None;
                let pending = self.start_exchange(state.generation);
                state.pending = Some(pending.clone());
                pending
            }
        };
        pending.await
    }

    fn start_exchange(&self, generation: u64) -> PendingExchange {
        let config = self.inner.exchange.clone();
        let clock = Arc::clone(&self.inner.clock);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        async move {
            let result = exchange(&config, clock.as_ref()).await;
            if let Some(inner) = weak.upgrade() {
                let mut state = inner.lock();
                if state.generation == generation {
                    state.pending = None;
                    if let Ok(token) = &result {
                        state.token = Some(token.clone());
                    }
                }
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Discard the cached token unconditionally. Idempotent.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.token = None;
        state.pending = None;
        state.generation = state.generation.wrapping_add(1);
        tracing::debug!("Token cache cleared");
    }

    /// The cached token, if any, without triggering an exchange.
    #[must_use]
    pub fn peek(&self) -> Option<AccessToken> {
        self.inner.lock().token.clone()
    }

    /// Whether a usable token is cached right now.
    #[must_use]
    pub fn has_valid_token(&self) -> bool {
        let now = self.inner.clock.now();
        self.inner
            .lock()
            .token
            .as_ref()
            .is_some_and(|t| t.is_usable(now))
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("TokenCache")
            .field("token", &state.token)
            .field("pending", &state.pending.is_some())
            .finish_non_exhaustive()
    }
}

/// One OAuth exchange.
async fn exchange(config: &ExchangeConfig, clock: &dyn Clock) -> TokenResult {
    let request_id = Credential::new_request_id();
    tracing::info!(request_id = %request_id, "Requesting new OAuth token");

    let request = HttpRequest::post(&config.auth_url)
        .header("Authorization", config.credential.basic_authorization())
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/json")
        .header(REQUEST_ID_HEADER, request_id)
        .form(vec![(
            "scope".to_string(),
            config.credential.scope().to_string(),
        )])
        .deadline(config.deadline)
        .label("OAuth");

    let exchanged_at = clock.now();
    let response = match config.transport.execute(request).await {
        RequestOutcome::Success(response) => response,
        RequestOutcome::Failure(err) => return Err(err),
    };

    let body: TokenResponse = response.json()?;
    let value = body
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing_field("access_token"))?;
    let expires_in = body.expires_in.ok_or_else(|| missing_field("expires_in"))?;

    let expires_at = expiry_instant(exchanged_at, expires_in).ok_or_else(|| {
        classify(&TransportFailure::invalid_response(format!(
            "expires_in out of range: {expires_in}"
        )))
    })?;
    tracing::info!(
        token_len = value.len(),
        expires_in,
        "OAuth token acquired"
    );
    Ok(AccessToken::new(value, expires_at))
}

/// `exchanged_at + expires_in - margin`, or `None` for a negative or
/// unrepresentable lifetime. Lifetimes shorter than the margin yield a token
/// that is already stale and gets exchanged again on the next call.
fn expiry_instant(exchanged_at: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    if expires_in < 0 {
        return None;
    }
    TimeDelta::try_seconds(expires_in)
        .and_then(|ttl| exchanged_at.checked_add_signed(ttl))
        .and_then(|at| at.checked_sub_signed(EXPIRY_SAFETY_MARGIN))
}

fn missing_field(field: &str) -> ClassifiedError {
    classify(&TransportFailure::invalid_response(format!(
        "{field} missing from OAuth response"
    )))
}
