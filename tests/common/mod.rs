//! Common test utilities for integration tests.
//!
//! - `logger`: Per-test structured logging with phases and durations

#![allow(dead_code)]

pub mod logger;
