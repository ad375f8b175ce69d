use std::sync::LazyLock;

use axum::Extension;
use axum::extract::{FromRequestParts, RawPathParams, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use emf_config::ApiConfig;
use emf_errors::{BuiltinCode, ErrorHandler, ErrorInstance, cause, error_data};
use http::StatusCode;
use http::request::Parts;
use regex::Regex;

use crate::response::ErrorResponse;

static UUID_OR_INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$|^[0-9]+$")
        .expect("must be valid regex")
});

/// Why a request parameter was rejected
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("{param} '{value}' is not a valid integer")]
    NotAnInteger { param: &'static str, value: String },

    #[error("limit '{value}' must be between 1 and {max}")]
    LimitOutOfRange { value: i64, max: u64 },

    #[error("offset '{value}' is not a positive integer")]
    NegativeOffset { value: i64 },

    #[error("parameter '{value}' does not match the expected format")]
    PathParamMismatch { name: String, value: String },
}

/// `limit` and `offset` query parameters after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl Pagination {
    /// Parse pagination from a raw query string
    ///
    /// An absent or zero limit becomes the configured default.
    ///
    /// # Errors
    ///
    /// Returns `http.400.QueryParameterInvalid` naming the offending
    /// parameter when a value is not an integer or is out of range
    pub fn from_query(handler: &ErrorHandler, query: Option<&str>, api: &ApiConfig) -> Result<Self, ErrorInstance> {
        let mut raw_limit = None;
        let mut raw_offset = None;

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "limit" => raw_limit = Some(value.into_owned()),
                "offset" => raw_offset = Some(value.into_owned()),
                _ => {}
            }
        }

        let limit = match raw_limit.as_deref().filter(|v| !v.is_empty()) {
            Some(raw) => {
                let value = parse_integer(handler, "limit", raw)?;
                u64::try_from(value)
                    .ok()
                    .filter(|limit| *limit <= api.max_limit)
                    .ok_or_else(|| {
                        invalid(handler, "limit", ParamError::LimitOutOfRange {
                            value,
                            max: api.max_limit,
                        })
                    })?
            }
            None => 0,
        };

        let offset = match raw_offset.as_deref().filter(|v| !v.is_empty()) {
            Some(raw) => {
                let value = parse_integer(handler, "offset", raw)?;
                u64::try_from(value).map_err(|_| invalid(handler, "offset", ParamError::NegativeOffset { value }))?
            }
            None => 0,
        };

        Ok(Self {
            limit: if limit == 0 { api.default_limit } else { limit },
            offset,
        })
    }
}

fn parse_integer(handler: &ErrorHandler, param: &'static str, raw: &str) -> Result<i64, ErrorInstance> {
    raw.parse().map_err(|_| {
        invalid(handler, param, ParamError::NotAnInteger {
            param,
            value: raw.to_owned(),
        })
    })
}

fn invalid(handler: &ErrorHandler, param: &'static str, error: ParamError) -> ErrorInstance {
    handler.builtin(BuiltinCode::QueryParameterInvalid, error_data! { "Param" => param }, [cause(error)])
}

/// Extractor for validated pagination
///
/// Requires the error context middleware and an `Extension<ApiConfig>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginated(pub Pagination);

impl<S> FromRequestParts<S> for Paginated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(api) = Extension::<ApiConfig>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let Some(handler) = parts.extensions.get::<ErrorHandler>() else {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "error context is not installed").into_response());
        };

        Pagination::from_query(handler, parts.uri.query(), &api)
            .map(Self)
            .map_err(|instance| ErrorResponse::new(handler, instance).into_response())
    }
}

/// Validates every matched path parameter against a pattern
#[derive(Debug, Clone)]
pub struct PathParamChecker {
    pattern: Regex,
}

impl PathParamChecker {
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Checker accepting a lowercase UUID v4 or a plain integer
    pub fn uuid_or_integer() -> Self {
        Self {
            pattern: UUID_OR_INTEGER_RE.clone(),
        }
    }

    /// Checker for the configured pattern, or the default one
    ///
    /// # Errors
    ///
    /// Returns an error if the configured pattern is not a valid regex
    pub fn from_config(api: &ApiConfig) -> Result<Self, regex::Error> {
        api.path_param_pattern
            .as_deref()
            .map_or_else(|| Ok(Self::uuid_or_integer()), Self::new)
    }

    pub fn is_valid(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }

    /// First parameter that fails the check
    fn check<'a>(&self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<(), ParamRejection> {
        for (name, value) in params {
            if value.contains('/') {
                return Err(ParamRejection::NotFound);
            }
            if !self.is_valid(value) {
                return Err(ParamRejection::Invalid(ParamError::PathParamMismatch {
                    name: name.to_owned(),
                    value: value.to_owned(),
                }));
            }
        }
        Ok(())
    }
}

impl Default for PathParamChecker {
    fn default() -> Self {
        Self::uuid_or_integer()
    }
}

enum ParamRejection {
    NotFound,
    Invalid(ParamError),
}

/// Route middleware rejecting requests whose path parameters fail the check
///
/// Must be installed with `route_layer` so parameters are already matched.
/// A value containing `/` is answered with a bare 404; any other mismatch
/// with `http.400.InvalidParametersFailure`.
pub async fn path_param_middleware(checker: PathParamChecker, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let outcome = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(params) => checker.check(params.iter()),
        Err(_) => Ok(()),
    };

    match outcome {
        Ok(()) => next.run(Request::from_parts(parts, body)).await,
        Err(ParamRejection::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(ParamRejection::Invalid(error)) => {
            let Some(handler) = parts.extensions.get::<ErrorHandler>() else {
                return (StatusCode::BAD_REQUEST, error.to_string()).into_response();
            };
            let instance = handler.builtin(BuiltinCode::InvalidParametersFailure, error_data!(), [cause(error)]);
            ErrorResponse::new(handler, instance).into_response()
        }
    }
}
