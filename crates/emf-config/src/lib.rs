#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod client;
mod env;
pub mod errors;
mod loader;
pub mod server;
pub mod telemetry;

use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

pub use api::ApiConfig;
pub use client::ClientConfig;
pub use env::{ExpandError, expand_env};
pub use errors::ErrorsConfig;
pub use server::ServerConfig;
pub use telemetry::TelemetryConfig;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listener and debug settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Error template source
    pub errors: ErrorsConfig,
    /// Pagination bounds
    #[serde(default)]
    pub api: ApiConfig,
    /// Component name to base URL of the service owning it
    #[serde(default)]
    pub domains: IndexMap<String, Url>,
    /// Outbound requester settings
    #[serde(default)]
    pub client: ClientConfig,
    /// Log output
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
