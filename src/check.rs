//! # Argument validation helpers.
//!
//! Small guard functions used at the boundary of public constructors and
//! operations. Each guard either returns the checked value unchanged or fails
//! with an [`ArgumentError`] carrying the caller-supplied message.
//!
//! ## Rules
//! - Guards never log; the caller decides how a rejected argument surfaces.
//! - Comparison guards accept any [`PartialOrd`] type. A comparison that is
//!   undefined for the given operands (e.g. a NaN float) fails the check.
//!
//! ## Example
//! ```rust
//! use groundwork::ensure_greater_than;
//!
//! let value = ensure_greater_than(10, 0, "'value' MUST be greater than zero.").unwrap();
//! assert_eq!(value, 10);
//!
//! assert!(ensure_greater_than(0.0, 1.0, "too small").is_err());
//! ```

use thiserror::Error;

/// An argument failed validation at an API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ArgumentError {
    message: String,
}

impl ArgumentError {
    /// Creates a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the validation message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Checks that a predicate evaluation passed.
///
/// Returns silently when `test` is `true`, fails with `message` otherwise.
pub fn ensure_predicate(test: bool, message: &str) -> Result<(), ArgumentError> {
    if test {
        Ok(())
    } else {
        Err(ArgumentError::new(message))
    }
}

/// Checks that `value` is strictly greater than `base`.
pub fn ensure_greater_than<T: PartialOrd>(
    value: T,
    base: T,
    message: &str,
) -> Result<T, ArgumentError> {
    if value > base {
        Ok(value)
    } else {
        Err(ArgumentError::new(message))
    }
}

/// Checks that `value` is greater than or equal to `base`.
pub fn ensure_greater_or_equal<T: PartialOrd>(
    value: T,
    base: T,
    message: &str,
) -> Result<T, ArgumentError> {
    if value >= base {
        Ok(value)
    } else {
        Err(ArgumentError::new(message))
    }
}

/// Checks that `value` is strictly less than `base`.
pub fn ensure_less_than<T: PartialOrd>(
    value: T,
    base: T,
    message: &str,
) -> Result<T, ArgumentError> {
    if value < base {
        Ok(value)
    } else {
        Err(ArgumentError::new(message))
    }
}

/// Checks that `value` is less than or equal to `base`.
pub fn ensure_less_or_equal<T: PartialOrd>(
    value: T,
    base: T,
    message: &str,
) -> Result<T, ArgumentError> {
    if value <= base {
        Ok(value)
    } else {
        Err(ArgumentError::new(message))
    }
}

/// Checks that a string is not empty.
pub fn ensure_not_empty<'a>(value: &'a str, message: &str) -> Result<&'a str, ArgumentError> {
    if value.is_empty() {
        Err(ArgumentError::new(message))
    } else {
        Ok(value)
    }
}
