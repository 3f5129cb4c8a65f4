//! HTTP transport.
//!
//! One outbound call per [`HttpTransport::execute`]: a deadline wraps the
//! whole send-and-read-body future, and an optional [`CancelHandle`] aborts
//! it early. Every call resolves to exactly one [`RequestOutcome`]; nothing
//! here retries.

use std::time::{Duration, Instant};

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use reqwest::{Client, ClientBuilder, Method};
use serde::Serialize;

use crate::error::{
    ClassifiedError, FailureReason, GatewayError, Result, TransportFailure, classify,
};

/// Default deadline for chat calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for reachability probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for ping measurements.
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Outcomes
// =============================================================================

/// Result of one transport call: exactly one of success or classified failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum RequestOutcome<T> {
    Success(T),
    Failure(ClassifiedError),
}

impl<T> RequestOutcome<T> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Failure(err) => Some(err),
            Self::Success(_) => None,
        }
    }

    /// Transform the success payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RequestOutcome<U> {
        match self {
            Self::Success(value) => RequestOutcome::Success(f(value)),
            Self::Failure(err) => RequestOutcome::Failure(err),
        }
    }

    /// Convert into a `Result` for `?` propagation.
    ///
    /// # Errors
    ///
    /// Returns the classified failure wrapped in [`GatewayError::Request`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(err) => Err(GatewayError::Request(err)),
        }
    }
}

impl<T> From<std::result::Result<T, ClassifiedError>> for RequestOutcome<T> {
    fn from(result: std::result::Result<T, ClassifiedError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err),
        }
    }
}

// =============================================================================
// Requests & Responses
// =============================================================================

/// Request body variants.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A single outbound call.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub deadline: Duration,
    /// Prefix used in failure messages (`OAuth`, `API`, `probe`).
    pub label: &'static str,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            deadline: DEFAULT_TIMEOUT,
            label: "HTTP",
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    #[must_use]
    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url)
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    #[must_use]
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(fields));
        self
    }

    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub const fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

/// A 2xx response with its body read to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}

impl HttpResponse {
    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an `Unknown` classified failure when the body is not valid JSON
    /// for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> std::result::Result<T, ClassifiedError> {
        serde_json::from_str(&self.body).map_err(|e| {
            classify(&TransportFailure::invalid_response(format!(
                "failed to parse response: {e}"
            )))
        })
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Aborts an in-flight [`HttpTransport::execute_cancellable`] call.
#[derive(Debug, Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    /// Create a handle and the registration to pass to the call.
    #[must_use]
    pub fn new() -> (Self, AbortRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        (Self(handle), registration)
    }

    pub fn cancel(&self) {
        self.0.abort();
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Shared HTTP transport. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns error if client construction fails.
    pub fn new() -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(format!("chatgate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    /// Execute a request under its deadline.
    pub async fn execute(&self, request: HttpRequest) -> RequestOutcome<HttpResponse> {
        let (_handle, registration) = CancelHandle::new();
        self.execute_cancellable(request, registration).await
    }

    /// Execute a request that can also be cancelled through a [`CancelHandle`].
    pub async fn execute_cancellable(
        &self,
        request: HttpRequest,
        registration: AbortRegistration,
    ) -> RequestOutcome<HttpResponse> {
        let deadline = request.deadline;
        let label = request.label;
        let method = request.method.clone();
        let url = request.url.clone();
        let start = Instant::now();

        tracing::debug!(%method, %url, deadline_ms = deadline.as_millis(), "Dispatching request");

        let call = Abortable::new(self.send(request), registration);
        let result = match tokio::time::timeout(deadline, call).await {
            Err(_elapsed) => Err(TransportFailure::deadline(deadline)),
            Ok(Err(_aborted)) => Err(TransportFailure::new(
                FailureReason::Cancelled,
                "request cancelled",
            )),
            Ok(Ok(result)) => result,
        };

        let outcome = match result {
            Ok((status, body)) if (200..300).contains(&status) => {
                RequestOutcome::Success(HttpResponse {
                    status,
                    body,
                    elapsed: start.elapsed(),
                })
            }
            Ok((status, body)) => RequestOutcome::Failure(classify(&TransportFailure::http(
                label, status, body,
            ))),
            Err(failure) => RequestOutcome::Failure(classify(&failure)),
        };

        match &outcome {
            RequestOutcome::Success(response) => tracing::debug!(
                %method,
                %url,
                status = response.status,
                elapsed_ms = response.elapsed.as_millis(),
                "Request completed"
            ),
            RequestOutcome::Failure(err) => tracing::warn!(
                %method,
                %url,
                code = %err.code,
                error = %err.raw_message,
                "Request failed"
            ),
        }
        outcome
    }

    async fn send(&self, request: HttpRequest) -> std::result::Result<(u16, String), TransportFailure> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Form(fields)) => builder.form(&fields),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| failure_from_reqwest(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| failure_from_reqwest(&e))?;
        Ok((status, body))
    }
}

fn failure_from_reqwest(err: &reqwest::Error) -> TransportFailure {
    let reason = if err.is_timeout() {
        FailureReason::DeadlineExceeded {
            after: Duration::ZERO,
        }
    } else if err.is_connect() {
        FailureReason::Connect
    } else {
        FailureReason::Other
    };
    TransportFailure::new(reason, err.to_string())
}
