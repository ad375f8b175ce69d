use indexmap::IndexMap;
use serde::Deserialize;

/// Outbound requester settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Headers added to every outbound request
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            headers: IndexMap::new(),
        }
    }
}

const fn default_timeout_seconds() -> u64 {
    30
}
