//! # In-process publish/subscribe signal dispatch.
//!
//! ## Contents
//! - [`Signal`] marker for event values, [`Receiver`] the callback contract
//! - [`ConnectMode`] weak vs strong registration
//! - [`Dispatcher`] the broadcast hub, [`DispatcherProxy`] a hot-swappable
//!   handle to one
//! - [`DispatchError`] strict-delivery failure
//!
//! ## Quick reference
//! - **Emitters**: [`Registry`](crate::Registry) mutations, application code.
//! - **Receivers**: closures or types implementing [`Receiver`], registered
//!   per signal type, held weakly by default convention.

mod dispatcher;
mod signal;

pub use dispatcher::{DispatchError, Dispatcher, DispatcherProxy};
pub use signal::{ConnectMode, Receiver, Signal};
