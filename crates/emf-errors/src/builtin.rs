//! Compiled-in error taxonomy for the shared request pipeline
//!
//! Every service in the mesh knows these codes without loading a template
//! source, so the inter-service requester can always produce a typed error.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::definition::ErrorDefinition;
use crate::template::MessageTemplate;

/// Component owning the builtin codes
pub const BUILTIN_COMPONENT: &str = "http";

/// Builtin error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinCode {
    QueryParameterInvalid,
    InvalidParametersFailure,
    TokenMissing,
    TokenExpired,
    TokenInactive,
    TokenVerificationFailure,
    TokenInvalidProperty,
    Unauthorized,
    UnauthorizedCaller,
    RequesterEncodingFailure,
    RequesterDecodingFailure,
    RequesterErrorResponseFailure,
    RequesterCreateRequestFailure,
    RequesterSendRequestFailure,
    UnknownErrorCode,
}

struct BuiltinEntry {
    status: u16,
    description: &'static str,
    message: &'static str,
    data: &'static [(&'static str, &'static str)],
}

const TARGET_ROLE: &[(&str, &str)] = &[
    ("Role", "Type of authorization access being used."),
    ("Target", "Identity being acted on."),
];

impl BuiltinCode {
    pub const ALL: [Self; 15] = [
        Self::QueryParameterInvalid,
        Self::InvalidParametersFailure,
        Self::TokenMissing,
        Self::TokenExpired,
        Self::TokenInactive,
        Self::TokenVerificationFailure,
        Self::TokenInvalidProperty,
        Self::Unauthorized,
        Self::UnauthorizedCaller,
        Self::RequesterEncodingFailure,
        Self::RequesterDecodingFailure,
        Self::RequesterErrorResponseFailure,
        Self::RequesterCreateRequestFailure,
        Self::RequesterSendRequestFailure,
        Self::UnknownErrorCode,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QueryParameterInvalid => "http.400.QueryParameterInvalid",
            Self::InvalidParametersFailure => "http.400.InvalidParametersFailure",
            Self::TokenMissing => "http.401.TokenMissing",
            Self::TokenExpired => "http.401.TokenExpired",
            Self::TokenInactive => "http.401.TokenInactive",
            Self::TokenVerificationFailure => "http.401.TokenVerificationFailure",
            Self::TokenInvalidProperty => "http.401.TokenInvalidProperty",
            Self::Unauthorized => "http.401.Unauthorized",
            Self::UnauthorizedCaller => "http.401.UnauthorizedCaller",
            Self::RequesterEncodingFailure => "http.500.RequesterEncodingFailure",
            Self::RequesterDecodingFailure => "http.500.RequesterDecodingFailure",
            Self::RequesterErrorResponseFailure => "http.500.RequesterErrorResponseFailure",
            Self::RequesterCreateRequestFailure => "http.500.RequesterCreateRequestFailure",
            Self::RequesterSendRequestFailure => "http.500.RequesterSendRequestFailure",
            Self::UnknownErrorCode => "http.500.UnknownErrorCode",
        }
    }

    /// Look up a builtin by its full code string
    pub fn parse(code: &str) -> Option<Self> {
        static BY_CODE: LazyLock<HashMap<&'static str, BuiltinCode>> =
            LazyLock::new(|| BuiltinCode::ALL.into_iter().map(|c| (c.as_str(), c)).collect());

        BY_CODE.get(code).copied()
    }

    /// Compiled definition for this code
    pub fn definition(self) -> &'static ErrorDefinition {
        static DEFINITIONS: LazyLock<Vec<ErrorDefinition>> =
            LazyLock::new(|| BuiltinCode::ALL.into_iter().map(BuiltinCode::build).collect());

        &DEFINITIONS[self as usize]
    }

    fn build(self) -> ErrorDefinition {
        let entry = self.entry();
        let template = MessageTemplate::parse(entry.message).expect("builtin templates must be valid");

        ErrorDefinition {
            code: self.as_str().to_owned(),
            status_code: entry.status,
            description: entry.description.to_owned(),
            messages: IndexMap::from([(crate::DEFAULT_LOCALE.to_owned(), template)]),
            data: entry
                .data
                .iter()
                .map(|(field, doc)| ((*field).to_owned(), (*doc).to_owned()))
                .collect(),
        }
    }

    #[allow(clippy::too_many_lines)]
    const fn entry(self) -> BuiltinEntry {
        match self {
            Self::QueryParameterInvalid => BuiltinEntry {
                status: 400,
                description: "An invalid query parameter was provided in the request.",
                message: "The incoming request has an invalid query parameter '{{.Data.Param}}'. Error: '{{.Data.Error}}'",
                data: &[
                    ("Param", "The invalid query parameter."),
                    ("Error", "The error raised while validating the query parameters."),
                ],
            },
            Self::InvalidParametersFailure => BuiltinEntry {
                status: 400,
                description: "The request parameters are invalid.",
                message: "The request parameters are invalid. Error: '{{.Data.Error}}'",
                data: &[("Error", "The error raised while parsing the request parameters.")],
            },
            Self::TokenMissing => BuiltinEntry {
                status: 401,
                description: "The request carried no usable token, so it could not be completed.",
                message: "Token is missing or malformed and could not be validated. Error: '{{.Data.Error}}'",
                data: &[("Error", "Error found when extracting the token from the request.")],
            },
            Self::TokenExpired => BuiltinEntry {
                status: 401,
                description: "The token provided with the request is expired.",
                message: "The provided access token expired at '{{.Data.ExpirationDate}}'.",
                data: &[("ExpirationDate", "Expiration date of the given token.")],
            },
            Self::TokenInactive => BuiltinEntry {
                status: 401,
                description: "The token provided with the request is no longer active.",
                message: "The provided token with user '{{.Data.Target}}' and role '{{.Data.Role}}' is no longer active.",
                data: TARGET_ROLE,
            },
            Self::TokenVerificationFailure => BuiltinEntry {
                status: 401,
                description: "Token verification failed, so the request could not be completed.",
                message: "The provided token with user '{{.Data.Target}}' and role '{{.Data.Role}}' could not be verified, please try again. Error: '{{.Data.Error}}'",
                data: &[
                    ("Role", "Type of authorization access being used."),
                    ("Target", "Identity being acted on."),
                    ("Error", "Error returned by the verifier."),
                ],
            },
            Self::TokenInvalidProperty => BuiltinEntry {
                status: 401,
                description: "The token in the request has an invalid property.",
                message: "The provided token has an invalid '{{.Data.Name}}' value '{{.Data.Value}}', please try again. Error: '{{.Data.Error}}'",
                data: &[
                    ("Error", "Error found when retrieving the property from the token."),
                    ("Name", "Name of the token property."),
                    ("Value", "Value associated with the token property."),
                ],
            },
            Self::Unauthorized => BuiltinEntry {
                status: 401,
                description: "The user associated with the token does not have access to this endpoint.",
                message: "User with identifier '{{.Data.Target}}' and role '{{.Data.Role}}' does not have access.",
                data: TARGET_ROLE,
            },
            Self::UnauthorizedCaller => BuiltinEntry {
                status: 401,
                description: "The calling service's user does not have access to this endpoint.",
                message: "Caller with identifier '{{.Data.Target}}' and role '{{.Data.Role}}' does not have access.",
                data: TARGET_ROLE,
            },
            Self::RequesterEncodingFailure => BuiltinEntry {
                status: 500,
                description: "The internal request could not be performed as its payload could not be encoded.",
                message: "Failed to encode request payload. Error: '{{.Data.Error}}'",
                data: &[("Error", "Encoding error.")],
            },
            Self::RequesterDecodingFailure => BuiltinEntry {
                status: 500,
                description: "The internal request succeeded but its response could not be decoded.",
                message: "Failed to decode response payload. Error: '{{.Data.Error}}'",
                data: &[("Error", "Decoding error.")],
            },
            Self::RequesterErrorResponseFailure => BuiltinEntry {
                status: 500,
                description: "A downstream service failed and its error response could not be decoded.",
                message: "Failed to decode failing response payload as an error. Response: '{{.Data.Response}}'",
                data: &[
                    ("Response", "Response sent by the downstream component."),
                    ("Error", "Error encountered while trying to decode 'Response'."),
                ],
            },
            Self::RequesterCreateRequestFailure => BuiltinEntry {
                status: 500,
                description: "The internal request could not be initialized.",
                message: "Failed to initialize request. Error: '{{.Data.Error}}'",
                data: &[("Error", "Error raised while initializing the request.")],
            },
            Self::RequesterSendRequestFailure => BuiltinEntry {
                status: 500,
                description: "The HTTP client failed to execute the internal request.",
                message: "Failed to execute request. Error: '{{.Data.Error}}'",
                data: &[("Error", "HTTP client error.")],
            },
            Self::UnknownErrorCode => BuiltinEntry {
                status: 500,
                description: "An error was raised with a code that is not registered.",
                message: "An internal error occurred while reporting error '{{.Data.Code}}'.",
                data: &[("Code", "The unregistered error code.")],
            },
        }
    }
}

impl std::fmt::Display for BuiltinCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
