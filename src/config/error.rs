//! Error types for configuration assembly and access.

use thiserror::Error;

const DEFAULT_NOT_SETUP: &str = "Application not set up. Assemble and install the \
                                 configuration before accessing settings.";

/// Errors raised while assembling or reading configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A configuration step failed for an unclassified reason.
    #[error("{message}")]
    Generic {
        /// Description of the failure.
        message: String,
    },

    /// A setting value is present but invalid.
    #[error("{message}")]
    ImproperlyConfigured {
        /// Description of what is wrong with the value.
        message: String,
    },

    /// A required setting was not provided.
    #[error("{message}")]
    SettingRequired {
        /// The name of the missing required setting.
        setting: String,
        /// Human-readable message.
        message: String,
    },

    /// A setting lookup failed.
    ///
    /// Distinct from [`ConfigurationError::NotSetup`]: the configuration is
    /// in place, this particular setting just is not in it.
    #[error("setting '{setting}' does not exist")]
    NoSuchSetting {
        /// The name of the missing setting.
        setting: String,
    },

    /// Settings were accessed before the configuration was assembled.
    #[error("{message}")]
    NotSetup {
        /// Human-readable message.
        message: String,
    },
}

impl ConfigurationError {
    /// Creates a generic configuration error.
    pub fn generic(message: impl Into<String>) -> Self {
        ConfigurationError::Generic {
            message: message.into(),
        }
    }

    /// Creates an invalid-value error.
    pub fn improperly_configured(message: impl Into<String>) -> Self {
        ConfigurationError::ImproperlyConfigured {
            message: message.into(),
        }
    }

    /// Creates a required-setting-missing error with the default message.
    pub fn setting_required(setting: impl Into<String>) -> Self {
        let setting = setting.into();
        let message = format!("Setting '{setting}' is required.");
        ConfigurationError::SettingRequired { setting, message }
    }

    /// Creates a required-setting-missing error with a custom message.
    pub fn setting_required_with(
        setting: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigurationError::SettingRequired {
            setting: setting.into(),
            message: message.into(),
        }
    }

    /// Creates a lookup-failure error for the given setting.
    pub fn no_such_setting(setting: impl Into<String>) -> Self {
        ConfigurationError::NoSuchSetting {
            setting: setting.into(),
        }
    }

    /// Creates a not-set-up error with the default message.
    pub fn not_setup() -> Self {
        ConfigurationError::NotSetup {
            message: DEFAULT_NOT_SETUP.to_owned(),
        }
    }

    /// Creates a not-set-up error with a custom message.
    pub fn not_setup_with(message: impl Into<String>) -> Self {
        ConfigurationError::NotSetup {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigurationError::Generic { .. } => "config_generic",
            ConfigurationError::ImproperlyConfigured { .. } => "config_improperly_configured",
            ConfigurationError::SettingRequired { .. } => "config_setting_required",
            ConfigurationError::NoSuchSetting { .. } => "config_no_such_setting",
            ConfigurationError::NotSetup { .. } => "config_not_setup",
        }
    }

    /// Returns the setting name this error refers to, when it carries one.
    pub fn setting(&self) -> Option<&str> {
        match self {
            ConfigurationError::SettingRequired { setting, .. }
            | ConfigurationError::NoSuchSetting { setting } => Some(setting),
            _ => None,
        }
    }
}
