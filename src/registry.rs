//! # Signal-emitting key/value registry.
//!
//! [`Registry`] stores arbitrary shared values under string keys and
//! broadcasts a signal through its [`Dispatcher`] after every successful
//! mutation:
//!
//! - [`RegistryItemSet`] after a value is stored (including an insert made
//!   by [`get_or_set`](Registry::get_or_set));
//! - [`RegistryItemRemoved`] after a value is removed (an explicit
//!   [`remove`](Registry::remove) or a [`pop`](Registry::pop) that actually
//!   removed something).
//!
//! ## Rules
//! - Exactly one signal per successful mutation, emitted after the mutation
//!   is applied and outside the map lock, so receivers may read the
//!   registry.
//! - A [`get_or_set`](Registry::get_or_set) that finds an existing value
//!   emits nothing.
//! - Lookup failures are typed ([`NoSuchRegistryItemError`]), never silent.
//!
//! ## Example
//! ```rust
//! use groundwork::Registry;
//!
//! let registry = Registry::new();
//! registry.put("db.pool-size", 16u32);
//!
//! let size = registry.get_of::<u32>("db.pool-size").unwrap();
//! assert_eq!(*size, 16);
//! assert!(registry.get_of::<String>("db.pool-size").is_none());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::dispatch::{Dispatcher, Signal};

/// Shared, type-erased registry value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// An item was stored in a [`Registry`].
///
/// Emitted for both fresh inserts and overwrites of an existing key.
#[derive(Clone)]
pub struct RegistryItemSet {
    /// The key of the stored item.
    pub key: String,
    /// The stored value.
    pub value: AnyValue,
}

impl Signal for RegistryItemSet {}

impl fmt::Debug for RegistryItemSet {
    // The value is opaque and may be sensitive; show the key only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryItemSet")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// An item was removed from a [`Registry`].
#[derive(Clone, Debug)]
pub struct RegistryItemRemoved {
    /// The key of the removed item.
    pub key: String,
}

impl Signal for RegistryItemRemoved {}

/// Access or removal of a key that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("item with key '{key}' does not exist in the registry")]
pub struct NoSuchRegistryItemError {
    key: String,
}

impl NoSuchRegistryItemError {
    /// Creates a new error for the given missing key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Returns the missing item's key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Key/value store that announces its mutations.
///
/// The registry shares its [`Dispatcher`]: construct it with
/// [`with_dispatcher`](Registry::with_dispatcher) to emit onto an existing
/// one, and subscribe to [`RegistryItemSet`] / [`RegistryItemRemoved`] to
/// observe changes.
pub struct Registry {
    items: RwLock<HashMap<String, AnyValue>>,
    dispatcher: Arc<Dispatcher>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry with its own private dispatcher.
    pub fn new() -> Self {
        Self::with_dispatcher(Arc::new(Dispatcher::new()))
    }

    /// Creates a registry emitting onto the given dispatcher.
    pub fn with_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            dispatcher,
        }
    }

    /// Returns the dispatcher this registry emits on.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Returns `true` when the registry holds an item under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.items.read().contains_key(key)
    }

    /// Returns the value under `key`, or `None` when absent.
    pub fn get(&self, key: &str) -> Option<AnyValue> {
        self.items.read().get(key).cloned()
    }

    /// Returns the value under `key`, failing when absent.
    pub fn get_required(&self, key: &str) -> Result<AnyValue, NoSuchRegistryItemError> {
        self.get(key).ok_or_else(|| NoSuchRegistryItemError::new(key))
    }

    /// Returns the value under `key` downcast to `T`.
    ///
    /// `None` when the key is absent or holds a value of another type.
    pub fn get_of<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).and_then(|value| value.downcast::<T>().ok())
    }

    /// Stores `value` under `key`, then emits [`RegistryItemSet`].
    pub fn set(&self, key: impl Into<String>, value: AnyValue) {
        let key = key.into();
        self.items
            .write()
            .insert(key.clone(), Arc::clone(&value));
        self.dispatcher.send(&RegistryItemSet { key, value });
    }

    /// Stores a concrete value under `key`, then emits [`RegistryItemSet`].
    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.set(key, Arc::new(value));
    }

    /// Removes the item under `key`, then emits [`RegistryItemRemoved`].
    ///
    /// Returns the removed value; fails when the key is absent (and emits
    /// nothing).
    pub fn remove(&self, key: &str) -> Result<AnyValue, NoSuchRegistryItemError> {
        let removed = self.items.write().remove(key);
        match removed {
            Some(value) => {
                self.dispatcher
                    .send(&RegistryItemRemoved { key: key.to_owned() });
                Ok(value)
            }
            None => Err(NoSuchRegistryItemError::new(key)),
        }
    }

    /// Removes and returns the item under `key`, or `None` when absent.
    ///
    /// [`RegistryItemRemoved`] is emitted only when something was actually
    /// removed.
    pub fn pop(&self, key: &str) -> Option<AnyValue> {
        let removed = self.items.write().remove(key);
        if removed.is_some() {
            self.dispatcher
                .send(&RegistryItemRemoved { key: key.to_owned() });
        }
        removed
    }

    /// Returns the value under `key`, storing `value` first when absent.
    ///
    /// [`RegistryItemSet`] is emitted only when the value was actually
    /// inserted.
    pub fn get_or_set(&self, key: &str, value: AnyValue) -> AnyValue {
        {
            let mut items = self.items.write();
            if let Some(existing) = items.get(key) {
                return Arc::clone(existing);
            }
            items.insert(key.to_owned(), Arc::clone(&value));
        }
        self.dispatcher.send(&RegistryItemSet {
            key: key.to_owned(),
            value: Arc::clone(&value),
        });
        value
    }
}

/// A [`Registry`] handle whose target can be swapped at runtime.
///
/// All operations forward to the current source; replace it with
/// [`set_source`](RegistryProxy::set_source).
pub struct RegistryProxy {
    source: RwLock<Arc<Registry>>,
}

impl RegistryProxy {
    /// Wraps the given registry.
    pub fn new(source: Arc<Registry>) -> Self {
        Self {
            source: RwLock::new(source),
        }
    }

    /// Replaces the wrapped registry.
    pub fn set_source(&self, source: Arc<Registry>) {
        *self.source.write() = source;
    }

    /// Returns the currently wrapped registry.
    pub fn source(&self) -> Arc<Registry> {
        Arc::clone(&self.source.read())
    }

    /// Forwards to [`Registry::dispatcher`] on the current source.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(self.source().dispatcher())
    }

    /// Forwards to [`Registry::contains`] on the current source.
    pub fn contains(&self, key: &str) -> bool {
        self.source().contains(key)
    }

    /// Forwards to [`Registry::get`] on the current source.
    pub fn get(&self, key: &str) -> Option<AnyValue> {
        self.source().get(key)
    }

    /// Forwards to [`Registry::get_required`] on the current source.
    pub fn get_required(&self, key: &str) -> Result<AnyValue, NoSuchRegistryItemError> {
        self.source().get_required(key)
    }

    /// Forwards to [`Registry::get_of`] on the current source.
    pub fn get_of<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.source().get_of(key)
    }

    /// Forwards to [`Registry::set`] on the current source.
    pub fn set(&self, key: impl Into<String>, value: AnyValue) {
        self.source().set(key, value);
    }

    /// Forwards to [`Registry::put`] on the current source.
    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.source().put(key, value);
    }

    /// Forwards to [`Registry::remove`] on the current source.
    pub fn remove(&self, key: &str) -> Result<AnyValue, NoSuchRegistryItemError> {
        self.source().remove(key)
    }

    /// Forwards to [`Registry::pop`] on the current source.
    pub fn pop(&self, key: &str) -> Option<AnyValue> {
        self.source().pop(key)
    }

    /// Forwards to [`Registry::get_or_set`] on the current source.
    pub fn get_or_set(&self, key: &str, value: AnyValue) -> AnyValue {
        self.source().get_or_set(key, value)
    }
}

impl Default for RegistryProxy {
    fn default() -> Self {
        Self::new(Arc::new(Registry::new()))
    }
}
