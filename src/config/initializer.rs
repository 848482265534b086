//! # Setting initializers and their registry.
//!
//! A [`SettingInitializer`] is a [`Task`] tied to one setting name: it takes
//! the raw stored value (`None` when the setting is absent) and produces the
//! final value, validating, remapping, or defaulting along the way. A
//! failing initializer aborts configuration assembly.
//!
//! [`InitializerRegistry`] collects initializer factories ahead of assembly
//! so that components can contribute defaults; the host application builds
//! the registry explicitly during startup composition and hands it to
//! [`ConfigBuilder::registered`](crate::ConfigBuilder::registered).

use parking_lot::Mutex;
use serde_json::Value;

use crate::task::Task;

use super::error::ConfigurationError;

/// A task that initializes or validates one setting.
///
/// Runs exactly once, during configuration assembly. The input is the raw
/// stored value, or `None` when the setting is absent from the raw input;
/// the output becomes the setting's permanent value (or, when several
/// initializers target the same setting, the next initializer's input).
///
/// ## Example
/// ```rust
/// use serde_json::{json, Value};
/// use groundwork::{ConfigurationError, SettingInitializer, Task};
///
/// /// Defaults the port and rejects non-numeric values.
/// struct PortInitializer;
///
/// impl Task<Option<Value>, Result<Value, ConfigurationError>> for PortInitializer {
///     fn execute(&self, raw: Option<Value>) -> Result<Value, ConfigurationError> {
///         match raw {
///             None => Ok(json!(5432)),
///             Some(value) if value.is_u64() => Ok(value),
///             Some(other) => Err(ConfigurationError::improperly_configured(format!(
///                 "PORT must be a number, got {other}"
///             ))),
///         }
///     }
/// }
///
/// impl SettingInitializer for PortInitializer {
///     fn setting(&self) -> &str {
///         "PORT"
///     }
/// }
/// ```
pub trait SettingInitializer:
    Task<Option<Value>, Result<Value, ConfigurationError>>
{
    /// The name of the setting this initializer targets.
    fn setting(&self) -> &str;

    /// Indicates whether the setting's value contains secrets or other
    /// sensitive data.
    ///
    /// When `true`, assembly logs mask the raw value instead of printing it.
    fn has_secrets(&self) -> bool {
        false
    }
}

/// Factory producing fresh [`SettingInitializer`] instances.
pub type InitializerFactory = Box<dyn Fn() -> Box<dyn SettingInitializer> + Send + Sync>;

/// An explicit collection of initializer factories.
///
/// Components register factories during startup composition; configuration
/// assembly instantiates them once via
/// [`build_all`](InitializerRegistry::build_all). The registry is an
/// ordinary value owned by the host application, not ambient global state.
///
/// ## Example
/// ```rust
/// use groundwork::InitializerRegistry;
/// # use serde_json::{json, Value};
/// # use groundwork::{ConfigurationError, SettingInitializer, Task};
/// # struct PortInitializer;
/// # impl Task<Option<Value>, Result<Value, ConfigurationError>> for PortInitializer {
/// #     fn execute(&self, raw: Option<Value>) -> Result<Value, ConfigurationError> {
/// #         Ok(raw.unwrap_or_else(|| json!(5432)))
/// #     }
/// # }
/// # impl SettingInitializer for PortInitializer {
/// #     fn setting(&self) -> &str { "PORT" }
/// # }
///
/// let registry = InitializerRegistry::new();
/// registry.register(|| Box::new(PortInitializer));
/// assert_eq!(registry.len(), 1);
/// assert_eq!(registry.build_all().len(), 1);
/// ```
#[derive(Default)]
pub struct InitializerRegistry {
    factories: Mutex<Vec<InitializerFactory>>,
}

impl InitializerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an initializer factory.
    pub fn register<F>(&self, factory: F)
    where
        F: Fn() -> Box<dyn SettingInitializer> + Send + Sync + 'static,
    {
        self.factories.lock().push(Box::new(factory));
    }

    /// Instantiates every registered factory, in registration order.
    pub fn build_all(&self) -> Vec<Box<dyn SettingInitializer>> {
        self.factories.lock().iter().map(|factory| factory()).collect()
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.lock().len()
    }

    /// Returns `true` when no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.lock().is_empty()
    }
}
