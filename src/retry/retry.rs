//! # Retry policies for transient failures.
//!
//! [`Retry`] wraps a fallible operation so that transient failures are
//! repeated until they succeed, the predicate rejects the failure, or the
//! policy's wall-clock budget runs out.
//!
//! ## Rules
//! - Only failures accepted by the predicate are retried; everything else
//!   propagates on first occurrence (the predicate is an allow-list, not a
//!   catch-all).
//! - Backoff sleeps happen on the calling thread; there is no cancellation
//!   hook beyond the policy's own timeout.
//! - Apply retries to idempotent operations only.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use groundwork::{BackoffPolicy, Retry, TransientError};
//!
//! let policy = BackoffPolicy::new(
//!     Duration::from_millis(1),
//!     Duration::from_millis(5),
//!     None,
//!     2.0,
//! )
//! .unwrap();
//! let retry = Retry::backoff(policy);
//!
//! let mut calls = 0;
//! let value = retry
//!     .retry(|| {
//!         calls += 1;
//!         if calls < 3 {
//!             Err(TransientError::new("connection reset"))
//!         } else {
//!             Ok(calls)
//!         }
//!     })
//!     .unwrap();
//! assert_eq!(value, 3);
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::error::Retryable;

use super::backoff::BackoffPolicy;

/// A retry run that did not produce a success.
#[derive(Debug, Error)]
pub enum RetryError<E: std::error::Error + 'static> {
    /// The predicate rejected the failure; it propagates unchanged.
    #[error(transparent)]
    Rejected(E),

    /// The wall-clock budget elapsed; carries the last failure as its cause.
    #[error("timeout of {timeout:?} exceeded while retrying")]
    Exhausted {
        /// The budget that was exceeded.
        timeout: Duration,
        /// The last failure observed before giving up.
        #[source]
        cause: E,
    },
}

impl<E: std::error::Error + 'static> RetryError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::Rejected(_) => "retry_rejected",
            RetryError::Exhausted { .. } => "retry_exhausted",
        }
    }

    /// Returns the underlying failure.
    pub fn cause(&self) -> &E {
        match self {
            RetryError::Rejected(cause) => cause,
            RetryError::Exhausted { cause, .. } => cause,
        }
    }

    /// Unwraps the underlying failure.
    pub fn into_cause(self) -> E {
        match self {
            RetryError::Rejected(cause) => cause,
            RetryError::Exhausted { cause, .. } => cause,
        }
    }

    /// Returns `true` when the run gave up because its budget elapsed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

/// Retry predicate accepting transient failures.
///
/// Shorthand for consulting [`Retryable::is_retryable`]; this is the default
/// predicate used by [`Retry::retry`].
pub fn if_transient<E: Retryable>(error: &E) -> bool {
    error.is_retryable()
}

/// A retry policy.
///
/// - [`Retry::Backoff`] repeats the operation with jittered exponential
///   delays per the embedded [`BackoffPolicy`].
/// - [`Retry::Noop`] invokes the operation exactly once and never retries;
///   use it as a placeholder where a policy is required or to disable
///   retrying.
#[derive(Clone, Copy, Debug)]
pub enum Retry {
    /// Jittered exponential backoff.
    Backoff(BackoffPolicy),
    /// Pass-through; no retrying.
    Noop,
}

impl Default for Retry {
    /// Returns a backoff policy with default parameters.
    fn default() -> Self {
        Retry::Backoff(BackoffPolicy::default())
    }
}

impl Retry {
    /// Creates a backoff-based policy.
    pub fn backoff(policy: BackoffPolicy) -> Self {
        Retry::Backoff(policy)
    }

    /// Creates the no-op policy.
    pub fn noop() -> Self {
        Retry::Noop
    }

    /// Runs `op` under this policy, retrying failures that are
    /// [`Retryable`].
    ///
    /// On success the result is returned immediately with no further delay.
    /// A non-retryable failure propagates after a single invocation as
    /// [`RetryError::Rejected`]; an elapsed budget surfaces as
    /// [`RetryError::Exhausted`] wrapping the last failure.
    pub fn retry<T, E, F>(&self, op: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + Retryable + 'static,
        F: FnMut() -> Result<T, E>,
    {
        self.retry_if(if_transient, op)
    }

    /// Runs `op` under this policy with a caller-supplied predicate deciding
    /// which failures are worth retrying.
    pub fn retry_if<T, E, P, F>(&self, predicate: P, mut op: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        P: Fn(&E) -> bool,
        F: FnMut() -> Result<T, E>,
    {
        match self {
            Retry::Noop => op().map_err(RetryError::Rejected),
            Retry::Backoff(policy) => policy.run(predicate, op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransientError;
    use std::time::Duration;

    #[derive(Debug, Error)]
    #[error("fatal")]
    struct FatalError;

    impl Retryable for FatalError {
        fn is_retryable(&self) -> bool {
            false
        }
    }

    fn quick_policy(timeout: Option<Duration>) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(4),
            timeout,
            2.0,
        )
        .unwrap()
    }

    #[test]
    fn test_success_after_transient_failures() {
        let retry = Retry::backoff(quick_policy(None));

        let mut calls = 0u32;
        let value = retry
            .retry(|| {
                calls += 1;
                if calls < 3 {
                    Err(TransientError::new("blip"))
                } else {
                    Ok("done")
                }
            })
            .unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls, 3, "two failures plus the succeeding attempt");
    }

    #[test]
    fn test_rejected_failure_propagates_after_one_call() {
        let retry = Retry::backoff(quick_policy(None));

        let mut calls = 0u32;
        let result: Result<(), RetryError<FatalError>> = retry.retry(|| {
            calls += 1;
            Err(FatalError)
        });

        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::Rejected(_)));
        assert_eq!(err.as_label(), "retry_rejected");
        assert_eq!(err.to_string(), "fatal", "rejection is transparent");
        assert_eq!(calls, 1, "a rejected failure must not be retried");
    }

    #[test]
    fn test_custom_predicate_overrides_classification() {
        let retry = Retry::backoff(quick_policy(None));

        // Transient by classification, but the predicate allows nothing.
        let mut calls = 0u32;
        let result: Result<(), _> = retry.retry_if(
            |_: &TransientError| false,
            || {
                calls += 1;
                Err(TransientError::new("blip"))
            },
        );

        assert!(matches!(result, Err(RetryError::Rejected(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_exhausted_after_timeout_wraps_last_cause() {
        let timeout = Duration::from_millis(30);
        let retry = Retry::backoff(quick_policy(Some(timeout)));

        let result: Result<(), RetryError<TransientError>> =
            retry.retry(|| Err(TransientError::new("still down")));

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.as_label(), "retry_exhausted");
        assert_eq!(err.cause().message(), "still down");
        assert!(err.to_string().contains("exceeded while retrying"));
    }

    #[test]
    fn test_deadline_is_computed_per_run() {
        let retry = Retry::backoff(quick_policy(Some(Duration::from_millis(25))));

        assert!(retry.retry(|| Ok::<_, TransientError>(1)).is_ok());
        std::thread::sleep(Duration::from_millis(40));
        // A later run gets a fresh budget; the earlier deadline is not shared.
        assert!(retry.retry(|| Ok::<_, TransientError>(2)).is_ok());
    }

    #[test]
    fn test_noop_invokes_exactly_once() {
        let retry = Retry::noop();

        let mut calls = 0u32;
        let result: Result<(), RetryError<TransientError>> = retry.retry(|| {
            calls += 1;
            Err(TransientError::new("blip"))
        });

        assert!(matches!(result, Err(RetryError::Rejected(_))));
        assert_eq!(calls, 1, "the no-op policy never retries");
    }

    #[test]
    fn test_noop_passes_success_through() {
        let retry = Retry::noop();
        let value: Result<u8, RetryError<TransientError>> = retry.retry(|| Ok(9));
        assert_eq!(value.unwrap(), 9);
    }
}
