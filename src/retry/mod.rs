//! # Retry policies: jittered exponential backoff and a no-op placeholder.
//!
//! ## Contents
//! - [`BackoffPolicy`] validated backoff parameters (delay window, growth
//!   factor, optional wall-clock budget)
//! - [`Retry`] the policy itself: [`Retry::retry`] / [`Retry::retry_if`]
//! - [`RetryError`] rejected vs exhausted outcomes
//! - [`if_transient`] the default predicate
//!
//! See the submodule docs for the delay formula and failure semantics.

mod backoff;
#[allow(clippy::module_inception)]
mod retry;

pub use backoff::BackoffPolicy;
pub use retry::{if_transient, Retry, RetryError};
