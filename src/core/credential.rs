//! OAuth client credential.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

/// Header carrying the per-exchange request id.
pub const REQUEST_ID_HEADER: &str = "RqUID";

/// The long-lived client credential. Immutable for the process lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    client_id: String,
    scope: String,
}

impl Credential {
    #[must_use]
    pub fn new(client_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            scope: scope.into(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// `Authorization` header value: `Basic base64(client_id + ":")`.
    #[must_use]
    pub fn basic_authorization(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:", self.client_id)))
    }

    /// Fresh request id for one exchange (UUID v4, lowercase hex).
    #[must_use]
    pub fn new_request_id() -> String {
        Uuid::new_v4().to_string()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &format_args!("<{} chars>", self.client_id.len()))
            .field("scope", &self.scope)
            .finish()
    }
}
