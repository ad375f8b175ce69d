use std::net::SocketAddr;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    /// Serve every request in debug mode, regardless of its query string
    #[serde(default)]
    pub debug_mode: bool,
}
