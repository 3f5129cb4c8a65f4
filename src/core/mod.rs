//! Request/session core: token cache, transport, probes and diagnostics.

pub mod clock;
pub mod credential;
pub mod doctor;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod ping;
pub mod probe;
pub mod status;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use credential::Credential;
pub use doctor::runner::DiagnosticRunner;
pub use doctor::{CheckStatus, DiagnosticCheck, DiagnosticReport, DiagnosticStep};
pub use gateway::{GatewayClient, SequenceToken};
pub use http::{CancelHandle, HttpRequest, HttpResponse, HttpTransport, RequestOutcome};
pub use models::{ChatCompletion, ChatMessage, Role};
pub use monitor::{Monitor, MonitorHandle};
pub use ping::PingMeter;
pub use probe::NetworkProbe;
pub use status::{ApiStatus, NetworkStatus, PingSample, StatusBoard, StatusSnapshot, TokenStatus};
pub use token::{AccessToken, TokenCache};
