//! Python exceptions raised by attribute access.

use std::{borrow::Cow, fmt};

use strum::{Display, EnumString, IntoStaticStr};

use crate::{resource::ResourceError, value::Type};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Python exception types raised by attribute storage.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `AttributeError` -> "AttributeError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ExcType {
    AttributeError,
    /// Raised when a resource limit rejects an allocation or storage growth.
    MemoryError,
}

impl ExcType {
    /// Creates an AttributeError for a missing attribute.
    ///
    /// Matches CPython's format: `AttributeError: 'object' object has no attribute 'x'`
    #[must_use]
    pub(crate) fn attribute_error(type_: Type, attr: &str) -> RunError {
        SimpleException::new_msg(Self::AttributeError, format!("'{type_}' object has no attribute '{attr}'")).into()
    }
}

/// Simple lightweight representation of an exception.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl SimpleException {
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self { exc_type, arg }
    }

    #[must_use]
    pub fn new_msg(exc_type: ExcType, msg: impl Into<String>) -> Self {
        Self::new(exc_type, Some(msg.into()))
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }
}

impl fmt::Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {arg}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

/// Runtime error types that can occur while executing attribute call sites.
///
/// Three variants:
/// - `Internal`: Bug in the storage layer, not in user code (static message)
/// - `Exc`: Python exception that user code can catch
/// - `UncatchableExc`: Python exception from resource limits that CANNOT be caught
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    Internal(Cow<'static, str>),
    Exc(Box<SimpleException>),
    UncatchableExc(Box<SimpleException>),
}

impl RunError {
    /// Returns the exception type, or `None` for internal errors.
    #[must_use]
    pub fn exc_type(&self) -> Option<ExcType> {
        match self {
            Self::Internal(_) => None,
            Self::Exc(exc) | Self::UncatchableExc(exc) => Some(exc.exc_type()),
        }
    }
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(Box::new(exc))
    }
}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::UncatchableExc(Box::new(SimpleException::new_msg(ExcType::MemoryError, err.to_string())))
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Exc(exc) | Self::UncatchableExc(exc) => write!(f, "{exc}"),
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_error_message() {
        let err = ExcType::attribute_error(Type::Object, "missing");
        assert_eq!(err.exc_type(), Some(ExcType::AttributeError));
        assert_eq!(err.to_string(), "AttributeError: 'object' object has no attribute 'missing'");
    }

    #[test]
    fn resource_errors_are_uncatchable_memory_errors() {
        let err = RunError::from(ResourceError::Allocation { limit: 1, count: 2 });
        assert!(matches!(err, RunError::UncatchableExc(_)));
        assert_eq!(err.to_string(), "MemoryError: allocation limit exceeded: 2 > 1");
    }
}
