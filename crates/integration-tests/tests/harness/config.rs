//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use emf_config::{ApiConfig, ClientConfig, Config, ErrorsConfig, ServerConfig, TelemetryConfig};
use indexmap::IndexMap;
use url::Url;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                errors: ErrorsConfig {
                    config_path: "errors.toml".into(),
                    default_locale: "en".to_owned(),
                },
                api: ApiConfig::default(),
                domains: IndexMap::new(),
                client: ClientConfig::default(),
                telemetry: TelemetryConfig::default(),
            },
        }
    }

    /// Answer every request with full error details
    pub fn debug_mode(mut self) -> Self {
        self.config.server.debug_mode = true;
        self
    }

    /// Route a component to a base URL
    pub fn with_domain(mut self, component: &str, base_url: &str) -> Self {
        let url = Url::parse(base_url).expect("test domain must be a valid URL");
        self.config.domains.insert(component.to_owned(), url);
        self
    }

    /// Send a header with every downstream request
    pub fn with_client_header(mut self, name: &str, value: &str) -> Self {
        self.config.client.headers.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
