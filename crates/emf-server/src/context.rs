use std::ops::Deref;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request};
use axum::middleware::Next;
use axum::response::Response;
use emf_config::Config;
use emf_errors::{
    BuiltinCode, Cause, ErrorData, ErrorHandler, ErrorHandlerContext, ErrorInstance, ErrorRegistry, RequestMeta,
};
use http::request::Parts;
use http::{HeaderMap, StatusCode};

use crate::response::ErrorResponse;

/// Query parameter that switches a single request into debug mode
pub const DEBUG_QUERY_PARAM: &str = "debug_mode";

/// Shared inputs for building each request's error handler
#[derive(Debug, Clone)]
pub struct ErrorContextSettings {
    pub registry: Arc<ErrorRegistry>,
    /// Force debug mode for every request
    pub debug_mode: bool,
    pub default_locale: String,
}

impl ErrorContextSettings {
    pub fn from_config(config: &Config, registry: Arc<ErrorRegistry>) -> Self {
        Self {
            registry,
            debug_mode: config.server.debug_mode,
            default_locale: config.errors.default_locale.clone(),
        }
    }

    /// Error handler for one incoming request
    pub fn handler_for(&self, method: &http::Method, uri: &http::Uri, headers: &HeaderMap) -> ErrorHandler {
        let query = uri.query().unwrap_or_default();

        let context = ErrorHandlerContext {
            locale: preferred_locale(headers).unwrap_or_else(|| self.default_locale.clone()),
            debug: self.debug_mode || query_requests_debug(query),
            request: RequestMeta {
                method: method.to_string(),
                path: uri.path().to_owned(),
                query: query.to_owned(),
            },
        };

        ErrorHandler::new(Arc::clone(&self.registry), context)
    }
}

/// Middleware that attaches an [`ErrorHandler`] to every request
pub async fn error_context_middleware(settings: ErrorContextSettings, mut request: Request, next: Next) -> Response {
    let handler = settings.handler_for(request.method(), request.uri(), request.headers());

    if handler.is_debug() {
        tracing::debug!(path = %request.uri().path(), "request served in debug mode");
    }

    request.extensions_mut().insert(handler);
    next.run(request).await
}

pub(crate) fn query_requests_debug(query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes()).any(|(key, value)| key == DEBUG_QUERY_PARAM && value == "true")
}

/// Primary subtag of the first `Accept-Language` entry
fn preferred_locale(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(http::header::ACCEPT_LANGUAGE)?.to_str().ok()?;
    let tag = header.split(',').next()?.split(';').next()?.trim();
    let primary = tag.split('-').next()?.trim();

    (!primary.is_empty() && primary != "*").then(|| primary.to_ascii_lowercase())
}

/// Extractor for the current request's error handler
///
/// Requires [`error_context_middleware`] to run first.
#[derive(Debug, Clone)]
pub struct RequestErrors(pub ErrorHandler);

impl RequestErrors {
    /// Build a response for a code, degrading to `http.500.UnknownErrorCode`
    /// when the code is not registered
    pub fn fail(&self, code: &str, data: ErrorData, causes: impl IntoIterator<Item = Cause>) -> ErrorResponse {
        self.respond(self.0.fail(code, data, causes))
    }

    pub fn builtin(
        &self,
        code: BuiltinCode,
        data: ErrorData,
        causes: impl IntoIterator<Item = Cause>,
    ) -> ErrorResponse {
        self.respond(self.0.builtin(code, data, causes))
    }

    /// Project an already-built instance for this request
    pub fn respond(&self, instance: ErrorInstance) -> ErrorResponse {
        ErrorResponse::new(&self.0, instance)
    }
}

impl Deref for RequestErrors {
    type Target = ErrorHandler;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestErrors
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ErrorHandler>()
            .cloned()
            .map(Self)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "error context is not installed"))
    }
}
