use std::sync::Arc;

use crate::builtin::BuiltinCode;
use crate::data::{DataValue, ErrorData};
use crate::definition::ErrorDefinition;
use crate::error::RegistryError;
use crate::instance::{Cause, ErrorInstance};
use crate::registry::ErrorRegistry;

/// Locale every definition is expected to carry
pub const DEFAULT_LOCALE: &str = "en";

/// Request metadata merged into error data in debug mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
    pub query: String,
}

/// Per-request error state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorHandlerContext {
    pub locale: String,
    pub debug: bool,
    pub request: RequestMeta,
}

impl Default for ErrorHandlerContext {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_owned(),
            debug: false,
            request: RequestMeta::default(),
        }
    }
}

/// Builds, renders, and logs error instances for one request
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    registry: Arc<ErrorRegistry>,
    context: ErrorHandlerContext,
}

impl ErrorHandler {
    pub const fn new(registry: Arc<ErrorRegistry>, context: ErrorHandlerContext) -> Self {
        Self { registry, context }
    }

    /// Handler with no request bound, for background work and tests
    pub fn detached(registry: Arc<ErrorRegistry>) -> Self {
        Self::new(registry, ErrorHandlerContext::default())
    }

    pub const fn context(&self) -> &ErrorHandlerContext {
        &self.context
    }

    pub fn registry(&self) -> &ErrorRegistry {
        &self.registry
    }

    pub const fn is_debug(&self) -> bool {
        self.context.debug
    }

    pub fn locale(&self) -> &str {
        &self.context.locale
    }

    /// Construct an instance for a registered code
    ///
    /// Only the first cause is kept.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the code is unknown
    pub fn new_error(
        &self,
        code: &str,
        data: ErrorData,
        causes: impl IntoIterator<Item = Cause>,
    ) -> Result<ErrorInstance, RegistryError> {
        let definition = self.registry.resolve(code)?;
        Ok(self.instantiate(definition, data, causes.into_iter().next()))
    }

    /// Construct an instance for a builtin code, which cannot fail
    pub fn builtin(
        &self,
        code: BuiltinCode,
        data: ErrorData,
        causes: impl IntoIterator<Item = Cause>,
    ) -> ErrorInstance {
        self.instantiate(code.definition(), data, causes.into_iter().next())
    }

    /// Like [`Self::new_error`], but an unknown code degrades to
    /// `http.500.UnknownErrorCode` after logging the resolution failure
    pub fn fail(&self, code: &str, data: ErrorData, causes: impl IntoIterator<Item = Cause>) -> ErrorInstance {
        match self.registry.resolve(code) {
            Ok(definition) => self.instantiate(definition, data, causes.into_iter().next()),
            Err(e) => {
                tracing::error!(error = %e, "failed to construct error");
                self.builtin(
                    BuiltinCode::UnknownErrorCode,
                    crate::error_data! { "Code" => code },
                    causes,
                )
            }
        }
    }

    fn instantiate(&self, definition: &ErrorDefinition, mut data: ErrorData, cause: Option<Cause>) -> ErrorInstance {
        if self.context.debug {
            let request = &self.context.request;
            for (key, value) in [
                ("DebugMode", DataValue::Bool(true)),
                ("Method", DataValue::from(&request.method)),
                ("Path", DataValue::from(&request.path)),
                ("QueryString", DataValue::from(&request.query)),
            ] {
                data.entry(key.to_owned()).or_insert(value);
            }
        }

        let instance = ErrorInstance::render(definition, data, cause);
        self.log(&instance);
        instance
    }

    fn log(&self, instance: &ErrorInstance) {
        let data = serde_json::to_string(instance.data()).unwrap_or_default();
        let cause = instance.cause().map(ToString::to_string);
        let message = instance.message(&self.context.locale);

        if instance.status_code() >= 500 {
            tracing::error!(
                error_code = instance.error_code(),
                status_code = instance.status_code(),
                timestamp = instance.timestamp(),
                data = %data,
                cause = cause.as_deref(),
                "{message}"
            );
        } else {
            tracing::warn!(
                error_code = instance.error_code(),
                status_code = instance.status_code(),
                timestamp = instance.timestamp(),
                data = %data,
                cause = cause.as_deref(),
                "{message}"
            );
        }

        if self.context.debug {
            tracing::debug!(
                error_code = instance.error_code(),
                stack_trace = instance.stack_trace(),
                "error stack trace"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::error_data;
    use crate::instance::cause;
    use crate::matcher::Matcher;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct Failure(&'static str);

    fn handler(debug: bool) -> ErrorHandler {
        let registry = ErrorRegistry::from_toml_str(
            r#"
            [users.404.Missing]
            status_code = 404
            message.en = "User '{{.Data.Id}}' not found at {{.Data.Path}}."
        "#,
        )
        .unwrap();
        ErrorHandler::new(
            Arc::new(registry),
            ErrorHandlerContext {
                locale: DEFAULT_LOCALE.to_owned(),
                debug,
                request: RequestMeta {
                    method: "GET".to_owned(),
                    path: "/users/7".to_owned(),
                    query: "debug_mode=true".to_owned(),
                },
            },
        )
    }

    #[test]
    fn query_parameter_scenario() {
        let instance = handler(false)
            .new_error(
                "http.400.QueryParameterInvalid",
                error_data! { "Param" => "limit" },
                [cause(Failure("bad int"))],
            )
            .unwrap();

        assert_eq!(instance.status_code(), 400);
        let message = instance.message(DEFAULT_LOCALE);
        assert!(message.contains("limit"), "{message}");
        assert!(message.contains("bad int"), "{message}");
    }

    #[test]
    fn first_cause_wins() {
        let instance = handler(false).builtin(
            BuiltinCode::RequesterSendRequestFailure,
            ErrorData::new(),
            [cause(Failure("first")), cause(Failure("second"))],
        );
        assert_eq!(instance.cause().map(ToString::to_string).as_deref(), Some("first"));
        assert!(instance.message(DEFAULT_LOCALE).contains("first"));
    }

    #[test]
    fn unknown_code_is_returned_not_defaulted() {
        let err = handler(false)
            .new_error("users.404.Nope", ErrorData::new(), [])
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn fail_degrades_unknown_code() {
        let instance = handler(false).fail("users.404.Nope", ErrorData::new(), []);
        assert!(instance.is(&Matcher::by_code(BuiltinCode::UnknownErrorCode.as_str())));
        assert!(instance.message(DEFAULT_LOCALE).contains("users.404.Nope"));
    }

    #[test]
    fn missing_template_key_renders_empty() {
        let instance = handler(false)
            .new_error("users.404.Missing", error_data! { "Id" => 7 }, [])
            .unwrap();
        assert_eq!(instance.message(DEFAULT_LOCALE), "User '7' not found at .");
    }

    #[test]
    fn debug_mode_merges_request_metadata() {
        let instance = handler(true)
            .new_error("users.404.Missing", error_data! { "Id" => 7 }, [])
            .unwrap();

        let data = instance.data();
        assert_eq!(data["Method"], DataValue::from("GET"));
        assert_eq!(data["QueryString"], DataValue::from("debug_mode=true"));
        assert_eq!(data["DebugMode"], DataValue::Bool(true));
        assert_eq!(instance.message(DEFAULT_LOCALE), "User '7' not found at /users/7.");
    }

    #[test]
    fn debug_merge_keeps_caller_keys() {
        let instance = handler(true)
            .new_error("users.404.Missing", error_data! { "Path" => "custom" }, [])
            .unwrap();
        assert_eq!(instance.data()["Path"], DataValue::from("custom"));
    }

    #[test]
    fn production_mode_leaves_data_alone() {
        let instance = handler(false)
            .new_error("users.404.Missing", error_data! { "Id" => 7 }, [])
            .unwrap();
        assert_eq!(instance.data().len(), 1);
    }

    #[test]
    #[traced_test]
    fn production_instance_is_logged_with_all_data() {
        handler(false)
            .new_error("users.404.Missing", error_data! { "Id" => "7" }, [cause(Failure("db timeout"))])
            .unwrap();

        assert!(logs_contain("WARN"));
        assert!(logs_contain("users.404.Missing"));
        assert!(logs_contain(r#"data={"Id":"7","Error":"db timeout"}"#));
        assert!(logs_contain("User '7' not found at ."));
        assert!(!logs_contain("error stack trace"));
    }

    #[test]
    #[traced_test]
    fn server_errors_are_logged_at_error_level() {
        handler(false).fail("users.404.Nope", ErrorData::new(), []);

        assert!(logs_contain("ERROR"));
        assert!(logs_contain("http.500.UnknownErrorCode"));
        assert!(logs_contain(r#"data={"Code":"users.404.Nope"}"#));
    }

    #[test]
    #[traced_test]
    fn debug_mode_logs_stack_trace() {
        handler(true).new_error("users.404.Missing", error_data! { "Id" => "7" }, []).unwrap();

        assert!(logs_contain("error stack trace"));
    }
}
