//! Configuration storage.

pub mod config;
pub mod paths;

pub use config::{
    Config, ConfigOverrides, ENV_API_URL, ENV_AUTH_URL, ENV_CLIENT_ID, ENV_CONFIG, ENV_DEBUG,
    ENV_MOCK, ENV_MODEL, ENV_SCOPE, GatewayConfig,
};
pub use paths::AppPaths;
