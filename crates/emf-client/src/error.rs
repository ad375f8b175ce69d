/// Failures preparing an outbound request, attached as the cause of the
/// resulting error instance
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No domain is configured for the component
    #[error("component '{component}' was not configured")]
    UnknownComponent { component: String },

    /// Domain and path do not form a valid URL
    #[error("invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
