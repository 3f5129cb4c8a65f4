//! CLI argument parsing and command dispatch.

pub mod args;
pub mod chat;
pub mod doctor;
pub mod explain;
pub mod status;
pub mod watch;

pub use args::{Cli, Commands, OutputFormat};
