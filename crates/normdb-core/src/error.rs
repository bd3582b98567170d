use crate::{catalog::CatalogError, decompose::DecomposeError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Crate-level error returned by load-time mutators and `normalize`.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    /// Classify this error into the runtime taxonomy.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Catalog(CatalogError::AttributeNotFound { .. }) => ErrorClass::NotFound,
            Self::Catalog(CatalogError::CapacityExceeded { .. }) => ErrorClass::Unsupported,
            Self::Catalog(CatalogError::DuplicateAttribute { .. } | CatalogError::Frozen) => {
                ErrorClass::Conflict
            }
            Self::Decompose(DecomposeError::EmptyDecomposition { .. }) => {
                ErrorClass::InvariantViolation
            }
            Self::Internal(err) => err.class,
        }
    }

    /// Return the origin of this error.
    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Catalog(_) => ErrorOrigin::Catalog,
            Self::Decompose(_) => ErrorOrigin::Decompose,
            Self::Internal(err) => err.origin,
        }
    }

    /// Returns `true` when the error signals broken engine logic rather than bad input.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::InvariantViolation | ErrorClass::Internal
        )
    }
}

///
/// InternalError
///
/// Structured engine error with a stable internal classification.
/// Raised when closure, key or decomposition bookkeeping disagrees with itself.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a closure-origin invariant violation.
    pub(crate) fn closure_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Closure,
            message,
        )
    }

    /// Construct a decompose-origin invariant violation.
    pub(crate) fn decompose_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Decompose,
            message,
        )
    }

    /// Construct a key-origin invariant violation.
    pub(crate) fn key_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Key, message)
    }

    /// Construct a scheduler-origin internal error.
    pub(crate) fn scheduler_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Scheduler, message)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    Conflict,
    Internal,
    InvariantViolation,
    NotFound,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Engine component that raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Catalog,
    Closure,
    Decompose,
    Key,
    Scheduler,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Catalog => "catalog",
            Self::Closure => "closure",
            Self::Decompose => "decompose",
            Self::Key => "key",
            Self::Scheduler => "scheduler",
        };
        write!(f, "{label}")
    }
}
