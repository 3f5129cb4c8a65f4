//! Gateway client: token cache plus chat-completion dispatch.
//!
//! This is the unit callers invoke. Within one `send_chat` the token is
//! always acquired (or the acquisition has failed) before the chat request is
//! issued. Across calls there is no ordering guarantee; each dispatch is
//! stamped with a [`SequenceToken`] so callers can detect out-of-order
//! replies.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::core::clock::{Clock, SystemClock};
use crate::core::credential::Credential;
use crate::core::http::{HttpRequest, HttpTransport, RequestOutcome};
use crate::core::models::{ChatCompletion, ChatMessage, ChatRequestBody};
use crate::core::token::TokenCache;
use crate::error::{ClassifiedError, Result, TransportFailure, classify};
use crate::storage::GatewayConfig;

/// Content of the one-message probe conversation.
pub const PROBE_PROMPT: &str = "ping";

/// `max_tokens` used for probe requests.
pub const PROBE_MAX_TOKENS: u32 = 10;

/// Monotonic per-client dispatch number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SequenceToken(u64);

impl SequenceToken {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct GatewayClient {
    config: GatewayConfig,
    transport: HttpTransport,
    tokens: TokenCache,
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
}

impl GatewayClient {
    /// Build a client on the system clock.
    ///
    /// # Errors
    ///
    /// Fails fast with [`crate::error::GatewayError::MissingFields`] when a
    /// required field is absent, or if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a client reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayClient::new`].
    pub fn with_clock(config: GatewayConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate_required()?;
        let transport = HttpTransport::new()?;
        let tokens = TokenCache::new(
            transport.clone(),
            Credential::new(&config.client_id, &config.scope),
            &config.auth_url,
            config.chat_timeout,
            Arc::clone(&clock),
        );

        tracing::debug!(
            model = %config.model,
            mock = config.use_mock_data,
            "Gateway client ready"
        );

        Ok(Self {
            config,
            transport,
            tokens,
            clock,
            sequence: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Transport shared with the probe and ping meter.
    #[must_use]
    pub const fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Discard the cached token. Callers use this before retrying a 401.
    pub fn clear_token_cache(&self) {
        self.tokens.clear();
    }

    /// Send a conversation and return the completion.
    pub async fn send_chat(
        &self,
        messages: &[ChatMessage],
        is_probe: bool,
    ) -> RequestOutcome<ChatCompletion> {
        self.dispatch_chat(messages, is_probe).await.1
    }

    /// Like [`GatewayClient::send_chat`], also returning the dispatch number.
    pub async fn dispatch_chat(
        &self,
        messages: &[ChatMessage],
        is_probe: bool,
    ) -> (SequenceToken, RequestOutcome<ChatCompletion>) {
        let sequence = SequenceToken(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);

        if self.config.use_mock_data {
            tracing::debug!(sequence = sequence.get(), "Demo mode: returning canned reply");
            return (sequence, RequestOutcome::Success(mock_completion(messages)));
        }

        let token = match self.tokens.get_token().await {
            Ok(token) => token,
            Err(err) => return (sequence, RequestOutcome::Failure(err)),
        };

        let probe = [ChatMessage::user(PROBE_PROMPT)];
        let (messages, max_tokens) = if is_probe {
            (&probe[..], PROBE_MAX_TOKENS)
        } else {
            (messages, self.config.max_tokens)
        };
        let body = ChatRequestBody {
            model: &self.config.model,
            messages,
            max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };
        let body = match serde_json::to_value(&body) {
            Ok(body) => body,
            Err(e) => {
                let err = classify(&TransportFailure::invalid_response(format!(
                    "failed to encode request: {e}"
                )));
                return (sequence, RequestOutcome::Failure(err));
            }
        };

        tracing::debug!(
            sequence = sequence.get(),
            messages = messages.len(),
            is_probe,
            "Sending chat request"
        );

        let request = HttpRequest::post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", token.value()))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body)
            .deadline(self.config.chat_timeout)
            .label("API");

        let outcome = match self.transport.execute(request).await {
            RequestOutcome::Success(response) => response.json::<ChatCompletion>().into(),
            RequestOutcome::Failure(err) => RequestOutcome::Failure(err),
        };
        (sequence, outcome)
    }

    /// Probe the API with a minimal request, keeping the classified failure.
    pub async fn probe_connection(&self) -> RequestOutcome<ChatCompletion> {
        match self.send_chat(&[], true).await {
            RequestOutcome::Success(completion) if completion.choices.is_empty() => {
                RequestOutcome::Failure(ClassifiedError::new(
                    crate::error::DiagnosticCode::Unknown,
                    "API returned no completion choices",
                ))
            }
            outcome => outcome,
        }
    }

    /// True iff a probe request succeeds with at least one choice.
    pub async fn test_connection(&self) -> bool {
        let outcome = self.probe_connection().await;
        if let Some(err) = outcome.failure() {
            tracing::warn!(code = %err.code, error = %err.raw_message, "API unavailable");
        }
        outcome.is_success()
    }
}

/// Canned reply for demo mode, echoing the last message.
fn mock_completion(messages: &[ChatMessage]) -> ChatCompletion {
    let last = messages.last().map_or("", |m| m.content.as_str());
    let preview: String = last.chars().take(50).collect();
    let text = match messages.len() % 3 {
        0 => format!("Demo reply to: \"{last}\". In live mode this would be answered by the model."),
        1 => "Demo mode is on. Set use_mock_data = false in config.toml to use the real API."
            .to_string(),
        _ => format!("Demo mode: your request \"{preview}...\" was received."),
    };
    ChatCompletion::from_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_completion_always_has_a_choice() {
        for n in 0..4 {
            let messages: Vec<_> = (0..n).map(|i| ChatMessage::user(format!("m{i}"))).collect();
            let completion = mock_completion(&messages);
            assert!(completion.first_content().is_some_and(|c| !c.is_empty()));
        }
    }

    #[test]
    fn mock_preview_truncates_on_char_boundary() {
        let long = "é".repeat(80);
        let completion = mock_completion(&[ChatMessage::user("a"), ChatMessage::user(long)]);
        assert!(completion.first_content().unwrap().contains(&"é".repeat(50)));
    }

    #[test]
    fn new_rejects_missing_fields() {
        let config = GatewayConfig {
            client_id: String::new(),
            ..GatewayConfig::default()
        };
        assert!(matches!(
            GatewayClient::new(config),
            Err(crate::error::GatewayError::MissingFields { .. })
        ));
    }

    #[tokio::test]
    async fn sequence_tokens_increase() {
        let config = GatewayConfig {
            use_mock_data: true,
            ..GatewayConfig::default()
        };
        let client = GatewayClient::new(config).unwrap();
        let (a, _) = client.dispatch_chat(&[ChatMessage::user("x")], false).await;
        let (b, _) = client.dispatch_chat(&[ChatMessage::user("y")], false).await;
        assert!(b > a);
        assert_eq!(a.get(), 1);
    }
}
