//! Structured errors for the request pipeline
//!
//! Error definitions live in an [`ErrorRegistry`] that merges a compiled-in
//! taxonomy with definitions loaded from a TOML template source. A per-request
//! [`ErrorHandler`] turns a code plus bound data into a rendered, logged
//! [`ErrorInstance`], which callers classify with a [`Matcher`] and the
//! service edge projects onto the wire with [`project`] or reconstructs from
//! a downstream response with [`decode_failure_response`].

#![allow(clippy::must_use_candidate)]

mod boundary;
mod builtin;
mod data;
mod definition;
mod error;
mod handler;
mod instance;
mod matcher;
mod registry;
mod simple;
mod stack;
mod template;

pub use boundary::{ErrorBody, RESPONSE_DATA_KEY, decode_failure_response, project};
pub use builtin::{BUILTIN_COMPONENT, BuiltinCode};
pub use data::{DataValue, ErrorData};
pub use definition::{ErrorDefinition, component_of, status_class_of, validate_code};
pub use error::{DownstreamDecodeError, RegistryError, TemplateError};
pub use handler::{DEFAULT_LOCALE, ErrorHandler, ErrorHandlerContext, RequestMeta};
pub use instance::{Cause, ERROR_DATA_KEY, ErrorInstance, cause};
pub use matcher::{Classified, Matcher, matches, matches_error};
pub use registry::ErrorRegistry;
pub use simple::{SimpleError, SimpleErrorBody};
pub use template::MessageTemplate;
