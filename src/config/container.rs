//! # Immutable application settings.
//!
//! [`AppConfig`] holds the finalized settings map. It is assembled once by
//! [`ConfigBuilder`], which runs the per-setting initializer pipelines, and
//! is read-only afterwards: reads need no locking and values never go
//! stale.
//!
//! Two more [`Config`] implementations cover the setup window:
//! - [`AwaitingSetup`] fails every access with a not-set-up error, standing
//!   in for the configuration before assembly completes;
//! - [`ConfigProxy`] forwards to a swappable source, so a handle created at
//!   process start (wrapping [`AwaitingSetup`]) can be redirected to the
//!   real configuration later without any holder re-fetching it.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use groundwork::{AppConfig, Config, ConfigExt};
//!
//! let config = AppConfig::builder()
//!     .setting("HOST", json!("db.internal"))
//!     .setting("PORT", json!(5432))
//!     .build()
//!     .unwrap();
//!
//! assert!(config.contains("HOST").unwrap());
//! assert_eq!(config.typed::<u16>("PORT").unwrap(), 5432);
//! assert!(config.setting("TIMEOUT").is_err());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ConfigurationError;
use super::initializer::{InitializerRegistry, SettingInitializer};

/// Read-only access to application settings.
///
/// Every accessor returns a `Result` so that implementations representing a
/// not-yet-assembled configuration can fail each access uniformly.
pub trait Config: Send + Sync {
    /// Returns whether the given setting is present.
    fn contains(&self, setting: &str) -> Result<bool, ConfigurationError>;

    /// Returns the value of the given setting.
    ///
    /// Fails with [`ConfigurationError::NoSuchSetting`] when the setting is
    /// not present.
    fn setting(&self, setting: &str) -> Result<Value, ConfigurationError>;

    /// Returns the value of the given setting, or `None` when absent.
    fn get(&self, setting: &str) -> Result<Option<Value>, ConfigurationError>;
}

/// Typed convenience accessors over any [`Config`].
pub trait ConfigExt: Config {
    /// Returns the given setting deserialized into `T`.
    ///
    /// Fails with [`ConfigurationError::ImproperlyConfigured`] when the
    /// stored value does not fit the requested shape.
    fn typed<T: DeserializeOwned>(&self, setting: &str) -> Result<T, ConfigurationError> {
        let value = self.setting(setting)?;
        serde_json::from_value(value).map_err(|error| {
            ConfigurationError::improperly_configured(format!(
                "setting '{setting}' has an unexpected shape: {error}"
            ))
        })
    }
}

impl<C: Config + ?Sized> ConfigExt for C {}

/// The finalized, immutable settings container.
#[derive(Debug)]
pub struct AppConfig {
    settings: HashMap<String, Value>,
}

impl AppConfig {
    /// Returns a builder for assembling a configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Returns the names of all settings, in no particular order.
    pub fn setting_names(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }
}

impl Config for AppConfig {
    fn contains(&self, setting: &str) -> Result<bool, ConfigurationError> {
        Ok(self.settings.contains_key(setting))
    }

    fn setting(&self, setting: &str) -> Result<Value, ConfigurationError> {
        self.settings
            .get(setting)
            .cloned()
            .ok_or_else(|| ConfigurationError::no_such_setting(setting))
    }

    fn get(&self, setting: &str) -> Result<Option<Value>, ConfigurationError> {
        Ok(self.settings.get(setting).cloned())
    }
}

/// Assembles an [`AppConfig`] from raw settings and initializers.
///
/// Initializers targeting the same setting form a pipeline in encounter
/// order: the first receives the raw stored value (`None` when absent),
/// each subsequent one receives the previous output, and the final output
/// becomes the setting's permanent value. A setting absent from the raw
/// input but owning an initializer is thereby defaulted into existence.
#[derive(Default)]
pub struct ConfigBuilder {
    settings: HashMap<String, Value>,
    initializers: Vec<Box<dyn SettingInitializer>>,
}

impl ConfigBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds raw settings from an iterator of name/value pairs.
    #[must_use]
    pub fn settings(mut self, settings: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.settings.extend(settings);
        self
    }

    /// Adds one raw setting.
    #[must_use]
    pub fn setting(mut self, name: impl Into<String>, value: Value) -> Self {
        self.settings.insert(name.into(), value);
        self
    }

    /// Adds one initializer.
    #[must_use]
    pub fn initializer(mut self, initializer: Box<dyn SettingInitializer>) -> Self {
        self.initializers.push(initializer);
        self
    }

    /// Adds several initializers, preserving their order.
    #[must_use]
    pub fn initializers(
        mut self,
        initializers: impl IntoIterator<Item = Box<dyn SettingInitializer>>,
    ) -> Self {
        self.initializers.extend(initializers);
        self
    }

    /// Adds every initializer registered in the given registry.
    ///
    /// Skipping this call is how assembly opts out of registered defaults.
    #[must_use]
    pub fn registered(mut self, registry: &InitializerRegistry) -> Self {
        self.initializers.extend(registry.build_all());
        self
    }

    /// Runs all initializer pipelines and produces the immutable container.
    ///
    /// Runs exactly once; a failing initializer aborts assembly with its
    /// error and no container is produced.
    pub fn build(self) -> Result<AppConfig, ConfigurationError> {
        let mut settings = self.settings;

        // Group initializers per setting, keeping encounter order of both
        // the groups and the initializers within each group.
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<Box<dyn SettingInitializer>>> = HashMap::new();
        for initializer in self.initializers {
            let name = initializer.setting().to_owned();
            if !groups.contains_key(&name) {
                order.push(name.clone());
            }
            groups.entry(name).or_default().push(initializer);
        }

        for name in order {
            let group = groups.remove(&name).unwrap_or_default();
            let has_secrets = group.iter().any(|initializer| initializer.has_secrets());

            let raw = settings.get(&name).cloned();
            let raw_display = if has_secrets {
                "******".to_owned()
            } else {
                raw.as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "<absent>".to_owned())
            };

            let mut current = raw;
            for initializer in &group {
                current = Some(initializer.execute(current.take())?);
            }
            if let Some(value) = current {
                settings.insert(name.clone(), value);
            }
            log::debug!("initialized setting '{name}' from raw value {raw_display}");
        }

        Ok(AppConfig { settings })
    }
}

/// Configuration placeholder for the pre-setup window.
///
/// Every access fails with [`ConfigurationError::NotSetup`], carrying the
/// custom message when one was supplied.
#[derive(Debug, Clone, Default)]
pub struct AwaitingSetup {
    message: Option<String>,
}

impl AwaitingSetup {
    /// Creates a placeholder using the default error message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a placeholder with a custom error message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    fn error(&self) -> ConfigurationError {
        match &self.message {
            Some(message) => ConfigurationError::not_setup_with(message.clone()),
            None => ConfigurationError::not_setup(),
        }
    }
}

impl Config for AwaitingSetup {
    fn contains(&self, _setting: &str) -> Result<bool, ConfigurationError> {
        Err(self.error())
    }

    fn setting(&self, _setting: &str) -> Result<Value, ConfigurationError> {
        Err(self.error())
    }

    fn get(&self, _setting: &str) -> Result<Option<Value>, ConfigurationError> {
        Err(self.error())
    }
}

/// A [`Config`] handle whose target can be swapped at runtime.
///
/// Starts out wrapping [`AwaitingSetup`] when created through
/// [`awaiting_setup`](ConfigProxy::awaiting_setup); application bootstrap
/// later installs the real configuration with
/// [`set_source`](ConfigProxy::set_source). Swapping configuration outside
/// of bootstrap is possible but should stay rare; holders expect settings
/// not to change mid-flight.
pub struct ConfigProxy {
    source: RwLock<Arc<dyn Config>>,
}

impl ConfigProxy {
    /// Wraps the given configuration.
    pub fn new(source: Arc<dyn Config>) -> Self {
        Self {
            source: RwLock::new(source),
        }
    }

    /// Creates a proxy wrapping a default [`AwaitingSetup`] placeholder.
    pub fn awaiting_setup() -> Self {
        Self::new(Arc::new(AwaitingSetup::new()))
    }

    /// Creates a proxy wrapping an [`AwaitingSetup`] placeholder with a
    /// custom message.
    pub fn awaiting_setup_with(message: impl Into<String>) -> Self {
        Self::new(Arc::new(AwaitingSetup::with_message(message)))
    }

    /// Replaces the wrapped configuration.
    pub fn set_source(&self, source: Arc<dyn Config>) {
        *self.source.write() = source;
    }

    /// Returns the currently wrapped configuration.
    pub fn source(&self) -> Arc<dyn Config> {
        Arc::clone(&self.source.read())
    }
}

impl Config for ConfigProxy {
    fn contains(&self, setting: &str) -> Result<bool, ConfigurationError> {
        self.source().contains(setting)
    }

    fn setting(&self, setting: &str) -> Result<Value, ConfigurationError> {
        self.source().setting(setting)
    }

    fn get(&self, setting: &str) -> Result<Option<Value>, ConfigurationError> {
        self.source().get(setting)
    }
}

impl Default for ConfigProxy {
    fn default() -> Self {
        Self::awaiting_setup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use serde_json::json;

    struct DefaultPort;

    impl Task<Option<Value>, Result<Value, ConfigurationError>> for DefaultPort {
        fn execute(&self, raw: Option<Value>) -> Result<Value, ConfigurationError> {
            Ok(raw.unwrap_or_else(|| json!(5432)))
        }
    }

    impl SettingInitializer for DefaultPort {
        fn setting(&self) -> &str {
            "PORT"
        }
    }

    struct RequiredToken;

    impl Task<Option<Value>, Result<Value, ConfigurationError>> for RequiredToken {
        fn execute(&self, raw: Option<Value>) -> Result<Value, ConfigurationError> {
            raw.ok_or_else(|| ConfigurationError::setting_required("TOKEN"))
        }
    }

    impl SettingInitializer for RequiredToken {
        fn setting(&self) -> &str {
            "TOKEN"
        }

        fn has_secrets(&self) -> bool {
            true
        }
    }

    /// Appends a marker to a string setting, for pipeline-order checks.
    struct AppendStage(&'static str);

    impl Task<Option<Value>, Result<Value, ConfigurationError>> for AppendStage {
        fn execute(&self, raw: Option<Value>) -> Result<Value, ConfigurationError> {
            let prior = match raw {
                Some(Value::String(text)) => text,
                Some(other) => other.to_string(),
                None => String::new(),
            };
            Ok(Value::String(prior + self.0))
        }
    }

    impl SettingInitializer for AppendStage {
        fn setting(&self) -> &str {
            "STAGES"
        }
    }

    #[test]
    fn test_initializer_defaults_an_absent_setting() {
        let config = AppConfig::builder()
            .initializer(Box::new(DefaultPort))
            .build()
            .unwrap();

        assert_eq!(config.setting("PORT").unwrap(), json!(5432));
    }

    #[test]
    fn test_initializer_keeps_a_present_setting() {
        let config = AppConfig::builder()
            .setting("PORT", json!(9000))
            .initializer(Box::new(DefaultPort))
            .build()
            .unwrap();

        assert_eq!(config.typed::<u16>("PORT").unwrap(), 9000);
    }

    #[test]
    fn test_missing_required_setting_aborts_assembly() {
        let result = AppConfig::builder()
            .initializer(Box::new(RequiredToken))
            .build();

        let err = result.unwrap_err();
        assert_eq!(err.setting(), Some("TOKEN"));
        assert_eq!(err.to_string(), "Setting 'TOKEN' is required.");
    }

    #[test]
    fn test_same_setting_initializers_pipeline_in_order() {
        let config = AppConfig::builder()
            .setting("STAGES", json!("raw"))
            .initializer(Box::new(AppendStage("+first")))
            .initializer(Box::new(AppendStage("+second")))
            .build()
            .unwrap();

        assert_eq!(config.setting("STAGES").unwrap(), json!("raw+first+second"));
    }

    #[test]
    fn test_missing_setting_lookup_is_distinguishable() {
        let config = AppConfig::builder().build().unwrap();

        let err = config.setting("ABSENT").unwrap_err();
        assert!(matches!(err, ConfigurationError::NoSuchSetting { .. }));
        assert_eq!(config.get("ABSENT").unwrap(), None);
        assert!(!config.contains("ABSENT").unwrap());
    }

    #[test]
    fn test_typed_rejects_mismatched_shapes() {
        let config = AppConfig::builder()
            .setting("PORT", json!("not-a-number"))
            .build()
            .unwrap();

        let err = config.typed::<u16>("PORT").unwrap_err();
        assert!(matches!(err, ConfigurationError::ImproperlyConfigured { .. }));
    }

    #[test]
    fn test_awaiting_setup_fails_every_access() {
        let pending = AwaitingSetup::with_message("run setup() first");

        let contains_err = pending.contains("ANY").unwrap_err();
        let setting_err = pending.setting("ANY").unwrap_err();
        let get_err = pending.get("ANY").unwrap_err();

        for err in [contains_err, setting_err, get_err] {
            assert!(matches!(err, ConfigurationError::NotSetup { .. }));
            assert_eq!(err.to_string(), "run setup() first");
        }
    }

    #[test]
    fn test_awaiting_setup_default_message() {
        let pending = AwaitingSetup::new();
        let err = pending.setting("ANY").unwrap_err();
        assert!(err.to_string().starts_with("Application not set up"));
    }

    #[test]
    fn test_proxy_becomes_usable_after_swap() {
        let proxy = ConfigProxy::awaiting_setup_with("still booting");
        let err = proxy.setting("PORT").unwrap_err();
        assert_eq!(err.to_string(), "still booting");

        let real = AppConfig::builder()
            .initializer(Box::new(DefaultPort))
            .build()
            .unwrap();
        proxy.set_source(Arc::new(real));

        assert_eq!(proxy.typed::<u16>("PORT").unwrap(), 5432);
    }

    #[test]
    fn test_registered_initializers_participate_in_assembly() {
        let registry = InitializerRegistry::new();
        registry.register(|| Box::new(DefaultPort));

        let with_registered = AppConfig::builder()
            .registered(&registry)
            .build()
            .unwrap();
        assert!(with_registered.contains("PORT").unwrap());

        // Assembly without the registry skips the registered defaults.
        let without = AppConfig::builder().build().unwrap();
        assert!(!without.contains("PORT").unwrap());
    }
}
