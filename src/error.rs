//! # Shared error taxonomy.
//!
//! Each component defines its own error types next to its implementation;
//! this module holds the pieces that cut across components:
//!
//! - [`BoxError`]: the type-erased error carried by signal receivers.
//! - [`Retryable`]: classification of errors as transient (worth retrying)
//!   or permanent.
//! - [`TransientError`]: a ready-made transient failure value for callers
//!   that have no richer error taxonomy of their own.

use thiserror::Error;

/// Type-erased error used where callbacks of arbitrary origin can fail.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classifies an error as retry-eligible or not.
///
/// The default retry predicate consults this trait: an error whose
/// [`is_retryable`](Retryable::is_retryable) returns `true` is treated as a
/// temporary condition and retried; anything else fails fast.
///
/// # Example
/// ```
/// use groundwork::{Retryable, TransientError};
///
/// let err = TransientError::new("connection reset");
/// assert!(err.is_retryable());
/// ```
pub trait Retryable {
    /// Indicates whether the error is safe to retry.
    fn is_retryable(&self) -> bool;
}

/// A temporary failure.
///
/// Always [`Retryable`]. Use this when the only thing worth saying about a
/// failure is that trying again later may succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransientError {
    message: String,
}

impl TransientError {
    /// Creates a new transient error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Retryable for TransientError {
    fn is_retryable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_error_is_retryable() {
        let err = TransientError::new("blip");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "blip");
    }
}
