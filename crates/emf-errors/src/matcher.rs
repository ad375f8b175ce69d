use crate::definition::component_of;
use crate::instance::ErrorInstance;

/// Anything carrying an error code and status that a [`Matcher`] can probe
pub trait Classified {
    fn error_code(&self) -> &str;

    fn status_code(&self) -> u16;

    fn component(&self) -> &str {
        component_of(self.error_code())
    }
}

/// Loose classification probe over error instances
///
/// The three variants are orthogonal: a probe for one property never
/// inspects the others.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Exact error code equality
    ByCode(String),
    /// Status code equality, whatever code produced it
    ByStatus(u16),
    /// Leading segment of the error code
    ByComponent(String),
}

impl Matcher {
    pub fn by_code(code: impl Into<String>) -> Self {
        Self::ByCode(code.into())
    }

    pub const fn by_status(status: u16) -> Self {
        Self::ByStatus(status)
    }

    pub fn by_component(component: impl Into<String>) -> Self {
        Self::ByComponent(component.into())
    }

    pub fn matches(&self, target: &(impl Classified + ?Sized)) -> bool {
        match self {
            Self::ByCode(code) => target.error_code() == code,
            Self::ByStatus(status) => target.status_code() == *status,
            Self::ByComponent(component) => target.component() == component,
        }
    }
}

/// Probe matching the same code as an existing instance
impl From<&ErrorInstance> for Matcher {
    fn from(instance: &ErrorInstance) -> Self {
        Self::ByCode(instance.error_code().to_owned())
    }
}

/// Test a classified value against a probe
pub fn matches(target: &(impl Classified + ?Sized), matcher: &Matcher) -> bool {
    matcher.matches(target)
}

/// Test an arbitrary error, walking its source chain for an [`ErrorInstance`]
///
/// Errors that are not instances, and carry none in their chain, never match
pub fn matches_error(error: &(dyn std::error::Error + 'static), matcher: &Matcher) -> bool {
    std::iter::successors(Some(error), |e| e.source())
        .filter_map(|e| e.downcast_ref::<ErrorInstance>())
        .any(|instance| matcher.matches(instance))
}
