//! chatgate - resilient chat-completion client
//!
//! OAuth token caching with coalesced refresh, deadline-bounded requests,
//! a closed error taxonomy with remediation text, reachability monitoring
//! and a four-step connectivity diagnostic.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod render;
pub mod storage;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ExitCode, GatewayError, Result};
