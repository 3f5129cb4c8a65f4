//! Wall-clock abstraction.
//!
//! Token expiry and status timestamps read time through [`Clock`] so tests
//! can move time without sleeping.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
