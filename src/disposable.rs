//! # Explicit resource release.
//!
//! [`Disposable`] is the capability contract for resources that must be
//! released deliberately: a disposed flag that transitions once (false to
//! true, never back) and an idempotent [`dispose`](Disposable::dispose).
//!
//! ## Pieces
//! - [`not_disposed`]: guard call placed at the top of every operation that
//!   must not run on a released resource.
//! - [`ResourceDisposedError`]: the hard error raised by such misuse, tagged
//!   with the resource kind.
//! - [`Scoped`]: RAII adapter that disposes the wrapped resource when the
//!   scope ends.
//!
//! ## Example
//! ```rust
//! use groundwork::{not_disposed, Disposable, ResourceDisposedError};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! struct Connection {
//!     closed: AtomicBool,
//! }
//!
//! impl Connection {
//!     fn query(&self) -> Result<&'static str, ResourceDisposedError> {
//!         not_disposed(self, "Connection")?;
//!         Ok("row")
//!     }
//! }
//!
//! impl Disposable for Connection {
//!     fn is_disposed(&self) -> bool {
//!         self.closed.load(Ordering::SeqCst)
//!     }
//!
//!     fn dispose(&self) {
//!         self.closed.store(true, Ordering::SeqCst);
//!     }
//! }
//!
//! let conn = Connection { closed: AtomicBool::new(false) };
//! assert_eq!(conn.query().unwrap(), "row");
//! conn.dispose();
//! assert!(conn.query().is_err());
//! ```

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

use thiserror::Error;

/// An operation was attempted on an already released resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{resource} already disposed")]
pub struct ResourceDisposedError {
    resource: Cow<'static, str>,
}

impl ResourceDisposedError {
    /// Creates a new error naming the resource kind.
    pub fn new(resource: impl Into<Cow<'static, str>>) -> Self {
        Self {
            resource: resource.into(),
        }
    }

    /// Returns the resource kind this error refers to.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Default for ResourceDisposedError {
    fn default() -> Self {
        Self::new("resource")
    }
}

/// A resource that can be explicitly released.
///
/// ## Rules
/// - [`dispose`](Disposable::dispose) is idempotent; only the first call has
///   an effect.
/// - After `dispose` returns, [`is_disposed`](Disposable::is_disposed) is
///   `true` forever.
/// - Operations on a disposed resource fail hard with
///   [`ResourceDisposedError`]; misuse is never silently ignored.
pub trait Disposable {
    /// Returns `true` once the resource has been released.
    fn is_disposed(&self) -> bool;

    /// Releases the resource. Safe to call more than once.
    fn dispose(&self);
}

impl<D: Disposable + ?Sized> Disposable for std::sync::Arc<D> {
    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }

    fn dispose(&self) {
        (**self).dispose();
    }
}

/// Guards an operation against running on a disposed resource.
///
/// Place this at the top of every method that requires a live resource:
/// it fails with a [`ResourceDisposedError`] tagged with `resource` when the
/// target is already disposed.
pub fn not_disposed<D>(disposable: &D, resource: &'static str) -> Result<(), ResourceDisposedError>
where
    D: Disposable + ?Sized,
{
    if disposable.is_disposed() {
        Err(ResourceDisposedError::new(resource))
    } else {
        Ok(())
    }
}

/// Scope-bound ownership of a [`Disposable`].
///
/// Dereferences to the wrapped resource and disposes it when dropped, so a
/// resource acquired at the top of a scope is reliably released at its end,
/// including on early return.
pub struct Scoped<D: Disposable> {
    inner: D,
}

impl<D: Disposable> Scoped<D> {
    /// Wraps the given resource.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

impl<D: Disposable> Deref for Scoped<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.inner
    }
}

impl<D: Disposable> DerefMut for Scoped<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.inner
    }
}

impl<D: Disposable> Drop for Scoped<D> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}
