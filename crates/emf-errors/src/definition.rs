use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::template::MessageTemplate;

/// Static description of one error kind
///
/// Definitions come either from the builtin taxonomy or from the external
/// template source. The code is never read from the entry body itself: for
/// configured definitions it is the dotted key path the entry lives under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorDefinition {
    /// Dot-delimited `<component>.<status>.<reason>` code
    #[serde(skip)]
    pub code: String,
    /// HTTP status attached to instances of this definition
    pub status_code: u16,
    /// Documentation for operators
    #[serde(default)]
    pub description: String,
    /// Locale to message template
    #[serde(default, rename = "message")]
    pub messages: IndexMap<String, MessageTemplate>,
    /// Data field name to human description, documentation only
    #[serde(default)]
    pub data: IndexMap<String, String>,
}

impl ErrorDefinition {
    pub fn component(&self) -> &str {
        component_of(&self.code)
    }
}

/// Leading segment of a code, naming the owning component
pub fn component_of(code: &str) -> &str {
    code.split_once('.').map_or(code, |(component, _)| component)
}

/// Status class embedded in the second segment of a code, if numeric
pub fn status_class_of(code: &str) -> Option<u16> {
    code.split('.').nth(1)?.parse().ok()
}

/// Check that a code has the `<component>.<status>.<reason>` shape
///
/// # Errors
///
/// Returns [`RegistryError::InvalidCode`] when a segment is missing or empty,
/// or the status segment is not a number
pub fn validate_code(code: &str) -> Result<(), RegistryError> {
    let mut segments = code.splitn(3, '.');
    let shaped = matches!(
        (segments.next(), segments.next(), segments.next()),
        (Some(component), Some(status), Some(reason))
            if !component.is_empty()
                && !reason.is_empty()
                && !status.is_empty()
                && status.bytes().all(|b| b.is_ascii_digit())
    );

    if shaped {
        Ok(())
    } else {
        Err(RegistryError::InvalidCode { code: code.to_owned() })
    }
}
