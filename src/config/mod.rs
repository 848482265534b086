//! # Application configuration.
//!
//! ## Contents
//! - [`Config`] read-only settings access, [`ConfigExt`] typed extraction
//! - [`AppConfig`] / [`ConfigBuilder`] the immutable container and its
//!   assembly (per-setting initializer pipelines run once, at build time)
//! - [`AwaitingSetup`] the pre-setup placeholder, [`ConfigProxy`] a
//!   hot-swappable handle bridging the two
//! - [`SettingInitializer`] / [`InitializerRegistry`] per-setting
//!   initialization tasks and their explicit registry
//! - [`ConfigurationError`] the error taxonomy
//!
//! Settings are stored as `serde_json::Value`, so any JSON-shaped value is
//! a valid setting and typed extraction is one call away.

mod container;
mod error;
mod initializer;

pub use container::{AppConfig, AwaitingSetup, Config, ConfigBuilder, ConfigExt, ConfigProxy};
pub use error::ConfigurationError;
pub use initializer::{InitializerFactory, InitializerRegistry, SettingInitializer};
