use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::DEFAULT_LOCALE;
use crate::data::{DataValue, ErrorData};
use crate::definition::{ErrorDefinition, component_of};
use crate::matcher::{Classified, Matcher};
use crate::simple::SimpleError;
use crate::stack::StackTrace;

/// Wrapped failure that caused an error instance
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Wrap any error as a [`Cause`]
pub fn cause<E>(error: E) -> Cause
where
    E: std::error::Error + Send + Sync + 'static,
{
    Arc::new(error)
}

/// Data key auto-populated from the cause's message
pub const ERROR_DATA_KEY: &str = "Error";

/// One rendered failure
///
/// Immutable once built; cloning shares the same instance. The stack trace
/// text is the only lazily computed part.
#[derive(Clone)]
pub struct ErrorInstance {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    code: String,
    status_code: u16,
    timestamp: String,
    messages: IndexMap<String, String>,
    data: ErrorData,
    cause: Option<Cause>,
    stack: StackTrace,
}

/// Current time in the wire timestamp format
pub(crate) fn now_timestamp() -> String {
    jiff::Timestamp::now().strftime("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl ErrorInstance {
    /// Render a definition against bound data
    ///
    /// When a cause is given and `data` has no non-null `Error` entry, the
    /// cause's message is stored there so templates referencing it resolve.
    pub fn render(definition: &ErrorDefinition, mut data: ErrorData, cause: Option<Cause>) -> Self {
        if let Some(cause) = &cause
            && data.get(ERROR_DATA_KEY).is_none_or(DataValue::is_null)
        {
            data.insert(ERROR_DATA_KEY.to_owned(), DataValue::from_error(cause.as_ref()));
        }

        let messages = definition
            .messages
            .iter()
            .map(|(locale, template)| (locale.clone(), template.render(&data)))
            .collect();

        Self::from_inner(Inner {
            code: definition.code.clone(),
            status_code: definition.status_code,
            timestamp: now_timestamp(),
            messages,
            data,
            cause,
            stack: StackTrace::capture(),
        })
    }

    /// Bare instance carrying only a code, status, and one message
    ///
    /// Used when reconstructing a downstream failure from a reduced shape
    pub fn minimal(code: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Self::from_inner(Inner {
            code: code.into(),
            status_code,
            timestamp: now_timestamp(),
            messages: IndexMap::from([(DEFAULT_LOCALE.to_owned(), message.into())]),
            data: ErrorData::new(),
            cause: None,
            stack: StackTrace::empty(),
        })
    }

    fn from_inner(inner: Inner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    pub fn error_code(&self) -> &str {
        &self.inner.code
    }

    pub fn status_code(&self) -> u16 {
        self.inner.status_code
    }

    /// Status as an HTTP status, or 500 when the definition carries a
    /// number outside the valid range
    pub fn http_status(&self) -> http::StatusCode {
        http::StatusCode::from_u16(self.inner.status_code).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn component(&self) -> &str {
        component_of(&self.inner.code)
    }

    /// Creation time, RFC 3339 in UTC
    pub fn timestamp(&self) -> &str {
        &self.inner.timestamp
    }

    pub fn messages(&self) -> &IndexMap<String, String> {
        &self.inner.messages
    }

    /// Rendered message for a locale, falling back to the default locale
    pub fn message(&self, locale: &str) -> &str {
        self.inner
            .messages
            .get(locale)
            .or_else(|| self.inner.messages.get(DEFAULT_LOCALE))
            .or_else(|| self.inner.messages.values().next())
            .map_or("", String::as_str)
    }

    pub fn data(&self) -> &ErrorData {
        &self.inner.data
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.inner.cause.as_ref()
    }

    /// Trimmed stack trace text, computed on first call
    pub fn stack_trace(&self) -> &str {
        self.inner.stack.text()
    }

    /// Whether the status lies in the block of 100 starting at `group`
    pub fn is_status_group(&self, group: u16) -> bool {
        (self.inner.status_code / 100) * 100 == group
    }

    /// Test this instance against a probe
    pub fn is(&self, matcher: &Matcher) -> bool {
        matcher.matches(self)
    }

    /// Reduced client-safe projection in the given locale
    pub fn to_simple_error(&self, locale: &str) -> SimpleError {
        SimpleError::new(self.error_code(), self.message(locale), self.status_code())
    }
}

impl Classified for ErrorInstance {
    fn error_code(&self) -> &str {
        self.error_code()
    }

    fn status_code(&self) -> u16 {
        self.status_code()
    }
}

impl fmt::Debug for ErrorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorInstance")
            .field("code", &self.inner.code)
            .field("status_code", &self.inner.status_code)
            .field("timestamp", &self.inner.timestamp)
            .field("messages", &self.inner.messages)
            .field("data", &self.inner.data)
            .field("cause", &self.inner.cause)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ErrorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message(DEFAULT_LOCALE) {
            "" => f.write_str(&self.inner.code),
            message => f.write_str(message),
        }
    }
}

impl std::error::Error for ErrorInstance {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner
            .cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

// -- Full (debug) wire shape --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FullPayloadRef<'a> {
    error_code: &'a str,
    timestamp: &'a str,
    status_code: u16,
    message: &'a IndexMap<String, String>,
    data: &'a ErrorData,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack_trace: Option<&'a str>,
}

/// Every field defaults so that foreign shapes decode and are then rejected
/// by the empty code check instead of by serde. Explicit `null`s count as
/// absent.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct FullPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) error_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) status_code: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) message: IndexMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub(crate) data: ErrorData,
    pub(crate) stack_trace: Option<String>,
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<FullPayload> for ErrorInstance {
    fn from(payload: FullPayload) -> Self {
        let timestamp = if payload.timestamp.is_empty() { now_timestamp() } else { payload.timestamp };

        Self::from_inner(Inner {
            code: payload.error_code,
            status_code: payload.status_code,
            timestamp,
            messages: payload.message,
            data: payload.data,
            cause: None,
            stack: payload.stack_trace.map_or_else(StackTrace::empty, StackTrace::remote),
        })
    }
}

/// Serializes the full debug shape; the stack trace is included only when
/// something already forced its computation
impl Serialize for ErrorInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FullPayloadRef {
            error_code: &self.inner.code,
            timestamp: &self.inner.timestamp,
            status_code: self.inner.status_code,
            message: &self.inner.messages,
            data: &self.inner.data,
            stack_trace: self.inner.stack.rendered(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ErrorInstance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        FullPayload::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::BuiltinCode;
    use crate::error_data;

    #[derive(Debug, thiserror::Error)]
    #[error("bad int")]
    struct BadInt;

    #[test]
    fn renders_with_cause_populating_error_key() {
        let def = BuiltinCode::QueryParameterInvalid.definition();
        let instance = ErrorInstance::render(def, error_data! { "Param" => "limit" }, Some(cause(BadInt)));

        assert_eq!(instance.status_code(), 400);
        assert_eq!(instance.data()[ERROR_DATA_KEY], DataValue::from("bad int"));
        let message = instance.message("en");
        assert!(message.contains("limit") && message.contains("bad int"), "{message}");
        assert_eq!(instance.to_string(), message);
    }

    #[test]
    fn explicit_error_entry_is_not_overwritten() {
        let def = BuiltinCode::RequesterSendRequestFailure.definition();
        let data = error_data! { "Error" => "connection refused" };
        let instance = ErrorInstance::render(def, data, Some(cause(BadInt)));
        assert_eq!(instance.data()[ERROR_DATA_KEY], DataValue::from("connection refused"));
    }

    #[test]
    fn null_error_entry_is_replaced_by_cause() {
        let def = BuiltinCode::RequesterSendRequestFailure.definition();
        let data = error_data! { "Error" => DataValue::Null };
        let instance = ErrorInstance::render(def, data, Some(cause(BadInt)));
        assert_eq!(instance.data()[ERROR_DATA_KEY], DataValue::from("bad int"));
    }

    #[test]
    fn source_exposes_cause() {
        use std::error::Error as _;

        let def = BuiltinCode::RequesterDecodingFailure.definition();
        let instance = ErrorInstance::render(def, ErrorData::new(), Some(cause(BadInt)));
        assert_eq!(instance.source().map(ToString::to_string).as_deref(), Some("bad int"));
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let instance = ErrorInstance::minimal("http.500.X", 500, "boom");
        let parsed: jiff::Timestamp = instance.timestamp().parse().unwrap();
        assert!(parsed <= jiff::Timestamp::now());
        assert!(instance.timestamp().ends_with('Z'));
    }

    #[test]
    fn message_falls_back_to_default_locale() {
        let instance = ErrorInstance::minimal("http.500.X", 500, "boom");
        assert_eq!(instance.message("fr"), "boom");
    }

    #[test]
    fn status_group_covers_block_of_hundred() {
        let instance = ErrorInstance::minimal("svc.404.Gone", 404, "gone");
        assert!(instance.is_status_group(400));
        assert!(!instance.is_status_group(500));
    }

    #[test]
    fn out_of_range_status_maps_to_internal_error() {
        assert_eq!(ErrorInstance::minimal("svc.404.Gone", 404, "").http_status(), http::StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorInstance::minimal("svc.0.Broken", 0, "").http_status(),
            http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn serializes_full_shape_without_unforced_stack() {
        let def = BuiltinCode::TokenExpired.definition();
        let instance = ErrorInstance::render(def, error_data! { "ExpirationDate" => "2024-01-01" }, None);
        let json = serde_json::to_value(&instance).unwrap();

        assert_eq!(json["errorCode"], "http.401.TokenExpired");
        assert_eq!(json["statusCode"], 401);
        assert_eq!(json["message"]["en"], "The provided access token expired at '2024-01-01'.");
        assert_eq!(json["data"]["ExpirationDate"], "2024-01-01");
        assert!(json.get("stackTrace").is_none());

        let _ = instance.stack_trace();
        let json = serde_json::to_value(&instance).unwrap();
        let forced = !instance.stack_trace().is_empty();
        assert_eq!(json.get("stackTrace").is_some(), forced);
    }

    #[test]
    fn deserializes_full_shape() {
        let body = r#"{"errorCode":"users.404.Missing","timestamp":"2024-05-01T10:00:00Z","statusCode":404,
            "message":{"en":"no such user"},"data":{"Id":7},"stackTrace":"remote"}"#;
        let instance: ErrorInstance = serde_json::from_str(body).unwrap();

        assert_eq!(instance.error_code(), "users.404.Missing");
        assert_eq!(instance.timestamp(), "2024-05-01T10:00:00Z");
        assert_eq!(instance.data()["Id"], DataValue::from(7));
        assert_eq!(instance.stack_trace(), "remote");
        assert!(instance.cause().is_none());
    }
}
