use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the template source path is empty, the
    /// pagination bounds contradict each other, the path parameter pattern
    /// is not a valid regex, or a domain has no host
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_errors_config()?;
        self.validate_api_config()?;
        self.validate_domains()?;
        Ok(())
    }

    fn validate_errors_config(&self) -> anyhow::Result<()> {
        if self.errors.config_path.as_os_str().is_empty() {
            anyhow::bail!("errors.config_path must not be empty");
        }

        if self.errors.default_locale.is_empty() {
            anyhow::bail!("errors.default_locale must not be empty");
        }

        Ok(())
    }

    fn validate_api_config(&self) -> anyhow::Result<()> {
        let api = &self.api;

        if api.max_limit == 0 {
            anyhow::bail!("api.max_limit must be greater than 0");
        }

        if api.default_limit == 0 || api.default_limit > api.max_limit {
            anyhow::bail!(
                "api.default_limit must be between 1 and api.max_limit ({}), got {}",
                api.max_limit,
                api.default_limit
            );
        }

        if let Some(ref pattern) = api.path_param_pattern {
            regex::Regex::new(pattern).map_err(|e| anyhow::anyhow!("invalid api.path_param_pattern: {e}"))?;
        }

        Ok(())
    }

    fn validate_domains(&self) -> anyhow::Result<()> {
        for (component, url) in &self.domains {
            if url.cannot_be_a_base() || url.host_str().is_none() {
                anyhow::bail!("domain for component '{component}' must be an absolute URL with a host: {url}");
            }
        }

        Ok(())
    }
}
