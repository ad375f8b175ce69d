use axum::Json;
use axum::response::{IntoResponse, Response};
use emf_errors::{ErrorHandler, ErrorInstance};

/// Error instance bound to the request it is answering
///
/// Converting it into a response applies the outbound projection: the full
/// instance for debug requests, the reduced shape otherwise. The instance is
/// also stored in the response extensions for outer layers.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    instance: ErrorInstance,
    debug: bool,
    locale: String,
}

impl ErrorResponse {
    pub fn new(handler: &ErrorHandler, instance: ErrorInstance) -> Self {
        Self {
            instance,
            debug: handler.is_debug(),
            locale: handler.locale().to_owned(),
        }
    }

    pub const fn instance(&self) -> &ErrorInstance {
        &self.instance
    }

    pub fn into_instance(self) -> ErrorInstance {
        self.instance
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.instance.http_status();
        let body = emf_errors::project(&self.instance, self.debug, &self.locale);

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(self.instance);
        response
    }
}
