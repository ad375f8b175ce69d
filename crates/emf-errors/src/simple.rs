use serde::{Deserialize, Serialize};

use crate::instance::{ErrorInstance, null_as_default};
use crate::matcher::Classified;

/// Reduced client-safe error shape sent in production
///
/// Serializes as `{"error": {"message", "errorCode"}, "statusCode"}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimpleError {
    #[serde(deserialize_with = "null_as_default")]
    pub error: SimpleErrorBody,
    #[serde(deserialize_with = "null_as_default")]
    pub status_code: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimpleErrorBody {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub error_code: String,
}

impl SimpleError {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: SimpleErrorBody {
                message: message.into(),
                error_code: error_code.into(),
            },
            status_code,
        }
    }

    /// Promote into a minimal instance with no data, cause, or stack
    pub fn into_instance(self) -> ErrorInstance {
        ErrorInstance::minimal(self.error.error_code, self.status_code, self.error.message)
    }
}

impl Classified for SimpleError {
    fn error_code(&self) -> &str {
        &self.error.error_code
    }

    fn status_code(&self) -> u16 {
        self.status_code
    }
}

impl From<&ErrorInstance> for SimpleError {
    fn from(instance: &ErrorInstance) -> Self {
        instance.to_simple_error(crate::DEFAULT_LOCALE)
    }
}
