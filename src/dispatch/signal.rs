//! # Signal and receiver contracts.
//!
//! A [`Signal`] is an immutable value describing an occurrence of interest.
//! Declare one per event kind and implement the marker trait:
//!
//! ```rust
//! use groundwork::Signal;
//!
//! #[derive(Debug, Clone)]
//! struct CacheFlushed {
//!     entries: usize,
//! }
//!
//! impl Signal for CacheFlushed {}
//! # let _ = CacheFlushed { entries: 0 }.entries;
//! ```
//!
//! A [`Receiver`] consumes signals of exactly one type. Any
//! `Fn(&S) -> Result<(), BoxError>` closure qualifies through the blanket
//! implementation.

use std::any::Any;

use crate::error::BoxError;

/// An occurrence of interest.
///
/// Marker trait for values broadcast through a
/// [`Dispatcher`](crate::Dispatcher). Signals are created by emitters,
/// consumed by receivers, and never mutated.
pub trait Signal: Any + Send + Sync {}

/// A callback subscribed to one signal type.
///
/// Receivers are registered as `Arc` handles; with a weak connection the
/// registration lives exactly as long as the caller's `Arc` does.
pub trait Receiver<S: Signal>: Send + Sync + 'static {
    /// Handles one signal.
    ///
    /// A returned error is logged during robust delivery or propagated to
    /// the sender during strict delivery.
    fn receive(&self, signal: &S) -> Result<(), BoxError>;
}

impl<S, F> Receiver<S> for F
where
    S: Signal,
    F: Fn(&S) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn receive(&self, signal: &S) -> Result<(), BoxError> {
        self(signal)
    }
}

/// How a receiver registration holds its receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectMode {
    /// Hold a weak handle: the registration dies with the caller's `Arc`
    /// and no explicit disconnect is required.
    Weak,
    /// Hold a strong handle: the registration keeps the receiver alive
    /// until it is disconnected or the dispatcher is dropped.
    Strong,
}
