//! Utility functions.

pub mod env;
pub mod time;

pub use time::{format_latency, format_relative_time};
