use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while building or querying the error registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Code is neither builtin nor present in the configured source
    #[error("error code not found: {code}")]
    NotFound { code: String },

    /// Template source file could not be read
    #[error("failed to read error template source {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template source is not valid TOML
    #[error("failed to parse error template source: {0}")]
    Parse(#[from] toml::de::Error),

    /// A definition in the source is malformed
    #[error("invalid error definition '{code}': {reason}")]
    InvalidDefinition { code: String, reason: String },

    /// Code does not follow `<component>.<status>.<reason>`
    #[error("invalid error code '{code}': expected <component>.<status>.<reason>")]
    InvalidCode { code: String },
}

/// Failures compiling a message template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// An opening `{{` without a matching `}}`
    #[error("unterminated action in template: {template}")]
    Unterminated { template: String },

    /// Anything other than a `.Data.<Key>` lookup
    #[error("unsupported template action '{{{{{action}}}}}', only '.Data.<Key>' lookups are allowed")]
    UnsupportedAction { action: String },
}

/// Cause attached to the instance produced when a failing downstream body
/// could not be recognized
#[derive(Debug, Error)]
pub enum DownstreamDecodeError {
    /// Body is JSON but matches neither the full nor the simple error shape
    #[error("downstream error response has no recognizable error shape")]
    UnrecognizedShape,

    /// Body is not JSON at all
    #[error("downstream error response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}
