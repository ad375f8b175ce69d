//! Conversion between error instances and their wire shapes at the
//! service edge, in both directions

use serde::Serialize;

use crate::builtin::BuiltinCode;
use crate::data::DataValue;
use crate::error::DownstreamDecodeError;
use crate::handler::ErrorHandler;
use crate::instance::{ErrorInstance, FullPayload, cause};
use crate::simple::SimpleError;

/// Body written to the caller for one error
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorBody<'a> {
    Full(&'a ErrorInstance),
    Simple(SimpleError),
}

/// Pick the outbound shape for an instance
///
/// Debug requests get the full instance; everyone else gets the reduced
/// projection in their locale.
pub fn project<'a>(instance: &'a ErrorInstance, debug: bool, locale: &str) -> ErrorBody<'a> {
    if debug {
        ErrorBody::Full(instance)
    } else {
        ErrorBody::Simple(instance.to_simple_error(locale))
    }
}

/// Data key holding a failing downstream body that could not be recognized
pub const RESPONSE_DATA_KEY: &str = "Response";

/// Reconstruct a typed error from a failing downstream response body
///
/// Tries the full shape, then the reduced shape, and finally wraps whatever
/// was received in `http.500.RequesterErrorResponseFailure`.
pub fn decode_failure_response(handler: &ErrorHandler, body: &[u8]) -> ErrorInstance {
    if let Ok(full) = serde_json::from_slice::<FullPayload>(body)
        && !full.error_code.is_empty()
    {
        return full.into();
    }

    if let Ok(simple) = serde_json::from_slice::<SimpleError>(body)
        && !simple.error.error_code.is_empty()
    {
        return simple.into_instance();
    }

    let (response, failure) = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => (DataValue::from(value), DownstreamDecodeError::UnrecognizedShape),
        Err(e) => (
            DataValue::from(String::from_utf8_lossy(body).into_owned()),
            DownstreamDecodeError::Malformed(e),
        ),
    };

    handler.builtin(
        BuiltinCode::RequesterErrorResponseFailure,
        crate::error_data! { RESPONSE_DATA_KEY => response },
        [cause(failure)],
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error_data;
    use crate::handler::DEFAULT_LOCALE;
    use crate::matcher::Matcher;
    use crate::registry::ErrorRegistry;

    fn handler() -> ErrorHandler {
        ErrorHandler::detached(Arc::new(ErrorRegistry::builtin()))
    }

    fn expired() -> ErrorInstance {
        handler().builtin(
            BuiltinCode::TokenExpired,
            error_data! { "ExpirationDate" => "2024-01-01T00:00:00Z" },
            [],
        )
    }

    #[test]
    fn production_projection_hides_data() {
        let instance = expired();
        let json = serde_json::to_value(project(&instance, false, DEFAULT_LOCALE)).unwrap();

        assert_eq!(json["error"]["errorCode"], "http.401.TokenExpired");
        assert_eq!(json["statusCode"], 401);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn debug_projection_is_full() {
        let instance = expired();
        let json = serde_json::to_value(project(&instance, true, DEFAULT_LOCALE)).unwrap();

        assert_eq!(json["errorCode"], "http.401.TokenExpired");
        assert_eq!(json["data"]["ExpirationDate"], "2024-01-01T00:00:00Z");
        assert!(json["message"][DEFAULT_LOCALE].is_string());
    }

    #[test]
    fn decodes_full_shape() {
        let original = expired();
        let body = serde_json::to_vec(&original).unwrap();
        let decoded = decode_failure_response(&handler(), &body);

        assert!(decoded.is(&Matcher::from(&original)));
        assert_eq!(decoded.timestamp(), original.timestamp());
        assert_eq!(decoded.data(), original.data());
    }

    #[test]
    fn full_shape_with_null_fields_keeps_downstream_code() {
        let body = br#"{"errorCode":"users.404.Missing","statusCode":404,"timestamp":null,"message":null,"data":null}"#;
        let decoded = decode_failure_response(&handler(), body);
        assert_eq!(decoded.error_code(), "users.404.Missing");
        assert_eq!(decoded.status_code(), 404);
        assert!(decoded.data().is_empty());
        assert!(decoded.messages().is_empty());
        assert!(!decoded.timestamp().is_empty());
    }

    #[test]
    fn simple_shape_with_null_message_is_recognized() {
        let body = br#"{"error":{"message":null,"errorCode":"users.404.Missing"},"statusCode":404}"#;
        let decoded = decode_failure_response(&handler(), body);
        assert_eq!(decoded.error_code(), "users.404.Missing");
        assert_eq!(decoded.message(DEFAULT_LOCALE), "");
    }

    #[test]
    fn decodes_simple_shape_with_empty_data() {
        let body = br#"{"error":{"message":"no such user","errorCode":"users.404.Missing"},"statusCode":404}"#;
        let decoded = decode_failure_response(&handler(), body);

        assert_eq!(decoded.error_code(), "users.404.Missing");
        assert_eq!(decoded.status_code(), 404);
        assert_eq!(decoded.message(DEFAULT_LOCALE), "no such user");
        assert!(decoded.data().is_empty());
    }

    #[test]
    fn unrecognized_json_keeps_raw_body() {
        let decoded = decode_failure_response(&handler(), br#"{"foo":"bar"}"#);

        assert!(decoded.is(&Matcher::by_code(BuiltinCode::RequesterErrorResponseFailure.as_str())));
        assert_eq!(decoded.data()[RESPONSE_DATA_KEY].get("foo"), Some(&DataValue::from("bar")));
        let cause = decoded.cause().expect("cause must be set");
        assert!(cause.downcast_ref::<DownstreamDecodeError>().is_some());
    }

    #[test]
    fn non_json_body_is_kept_as_text() {
        let decoded = decode_failure_response(&handler(), b"<html>bad gateway</html>");

        assert_eq!(decoded.data()[RESPONSE_DATA_KEY], DataValue::from("<html>bad gateway</html>"));
        assert!(matches!(
            decoded.cause().and_then(|c| c.downcast_ref::<DownstreamDecodeError>()),
            Some(DownstreamDecodeError::Malformed(_))
        ));
        assert!(decoded.message(DEFAULT_LOCALE).contains("bad gateway"));
    }
}
