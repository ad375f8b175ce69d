use std::path::Path;

use indexmap::IndexMap;

use crate::builtin::BuiltinCode;
use crate::definition::{ErrorDefinition, validate_code};
use crate::error::RegistryError;

/// Merged view of builtin and configured error definitions
///
/// Built once before serving and read-only afterwards, so it can be shared
/// across request tasks behind an `Arc` without locking. Builtin
/// definitions win over configured ones with the same code.
#[derive(Debug, Default, Clone)]
pub struct ErrorRegistry {
    configured: IndexMap<String, ErrorDefinition>,
}

impl ErrorRegistry {
    /// Registry holding only the builtin taxonomy
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load configured definitions from a TOML template source
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any definition in it
    /// is malformed
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let registry = Self::from_toml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            configured = registry.configured.len(),
            "error templates loaded"
        );

        Ok(registry)
    }

    /// Parse configured definitions from TOML text
    ///
    /// Any table holding a `status_code` key is a definition, and its code
    /// is the dotted path of keys leading to it. Nested tables
    /// (`[auth.401.Expired]`) and quoted keys (`["auth.401.Expired"]`) both
    /// work.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML, a misshapen code, or a definition
    /// whose fields or templates do not parse
    pub fn from_toml_str(source: &str) -> Result<Self, RegistryError> {
        let table: toml::Table = toml::from_str(source)?;
        let mut registry = Self::default();
        registry.collect("", table)?;
        Ok(registry)
    }

    fn collect(&mut self, prefix: &str, table: toml::Table) -> Result<(), RegistryError> {
        for (key, value) in table {
            let path = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };

            match value {
                toml::Value::Table(entry) if entry.contains_key("status_code") => {
                    let mut definition: ErrorDefinition =
                        toml::Value::Table(entry)
                            .try_into()
                            .map_err(|e: toml::de::Error| RegistryError::InvalidDefinition {
                                code: path.clone(),
                                reason: e.message().to_owned(),
                            })?;
                    definition.code.clone_from(&path);
                    self.insert(definition)?;
                }
                toml::Value::Table(nested) => self.collect(&path, nested)?,
                _ => {
                    return Err(RegistryError::InvalidDefinition {
                        code: path,
                        reason: "expected a table with a status_code".to_owned(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Add one configured definition
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not `<component>.<status>.<reason>`
    pub fn insert(&mut self, definition: ErrorDefinition) -> Result<(), RegistryError> {
        validate_code(&definition.code)?;

        if BuiltinCode::parse(&definition.code).is_some() {
            tracing::warn!(code = %definition.code, "configured error definition is shadowed by a builtin");
        }

        self.configured.insert(definition.code.clone(), definition);
        Ok(())
    }

    /// Find the definition for a code, builtin first
    pub fn get_definition(&self, code: &str) -> Option<&ErrorDefinition> {
        BuiltinCode::parse(code)
            .map(BuiltinCode::definition)
            .or_else(|| self.configured.get(code))
    }

    /// Like [`Self::get_definition`] but reports a missing code as an error
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the code is in neither source
    pub fn resolve(&self, code: &str) -> Result<&ErrorDefinition, RegistryError> {
        self.get_definition(code)
            .ok_or_else(|| RegistryError::NotFound { code: code.to_owned() })
    }

    /// Every code in the merged view, builtins first, then configured codes
    /// in source order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        let configured = self
            .configured
            .keys()
            .map(String::as_str)
            .filter(|code| BuiltinCode::parse(code).is_none());

        BuiltinCode::ALL
            .into_iter()
            .map(|code| -> &str { code.as_str() })
            .chain(configured)
    }

    /// Number of distinct codes in the merged view
    pub fn len(&self) -> usize {
        self.codes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
