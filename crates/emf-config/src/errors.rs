use std::path::PathBuf;

use serde::Deserialize;

/// Error template source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorsConfig {
    /// TOML file holding the configured error definitions
    pub config_path: PathBuf,
    /// Locale used when a request expresses no preference
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

fn default_locale() -> String {
    "en".to_string()
}
