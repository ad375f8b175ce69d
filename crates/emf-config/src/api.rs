use serde::Deserialize;

/// Request parameter rules applied to list and item endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    #[serde(default = "max_limit")]
    pub max_limit: u64,
    /// Pattern every matched path parameter must satisfy; UUID v4 or a
    /// plain integer when unset
    #[serde(default)]
    pub path_param_pattern: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: max_limit(),
            path_param_pattern: None,
        }
    }
}

const fn default_limit() -> u64 {
    20
}

const fn max_limit() -> u64 {
    50
}
