//! # groundwork
//!
//! **Groundwork** is a cross-cutting utility toolkit for applications in a
//! shared ecosystem: typed immutable configuration, in-process signal
//! dispatch, a signal-emitting registry, retry policies, and composable
//! tasks. The crate is a building block for application bootstrap and glue
//! code, not a framework.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌─────────────────┐      ┌────────────────────┐
//!   │  ConfigBuilder  │      │ InitializerRegistry │
//!   │ (raw settings)  │◄─────│ (per-setting tasks) │
//!   └────────┬────────┘      └────────────────────┘
//!            ▼ build(): run initializer pipelines once
//!   ┌─────────────────┐
//!   │    AppConfig    │◄──── ConfigProxy (starts as AwaitingSetup,
//!   │   (immutable)   │      swapped in during bootstrap)
//!   └─────────────────┘
//!
//!   ┌─────────────────┐  emits ItemSet /   ┌──────────────┐
//!   │     Registry    │ ──ItemRemoved────► │  Dispatcher  │
//!   │  (key → value)  │                    │ (typed pub/  │
//!   └─────────────────┘                    │  sub hub)    │
//!                                          └──────┬───────┘
//!                         weak / strong receivers ▼ (caller's thread)
//!                                      receiver, receiver, receiver
//!
//!   ┌─────────────────┐      ┌──────────────────────────────┐
//!   │  Retry policy   │      │      ConcurrentExecutor      │
//!   │ (jittered exp.  │      │ task ─┬─► worker pool ─► handle │
//!   │  backoff loop)  │      │ task ─┘   (shared input)       │
//!   └─────────────────┘      └──────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! bootstrap:
//!   ├─► assemble InitializerRegistry (components register factories)
//!   ├─► AppConfig::builder().settings(raw).registered(&registry).build()
//!   ├─► ConfigProxy::set_source(real config)
//!   └─► Registry::with_dispatcher(shared Dispatcher)
//!
//! steady state:
//!   ├─► business code composes Tasks (and_then / Pipe / ConcurrentExecutor)
//!   ├─► flaky operations run under Retry::backoff(policy)
//!   └─► domain events flow through Dispatcher::send to connected receivers
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Configuration** | Immutable settings with per-setting initializer pipelines.    | [`AppConfig`], [`ConfigBuilder`], [`Config`] |
//! | **Dispatch**      | Weak-reference-aware typed publish/subscribe.                 | [`Dispatcher`], [`Signal`], [`Receiver`]     |
//! | **Registry**      | Key/value store announcing every mutation.                    | [`Registry`], [`RegistryItemSet`]            |
//! | **Retry**         | Jittered exponential backoff with a wall-clock budget.        | [`Retry`], [`BackoffPolicy`]                 |
//! | **Tasks**         | Single-input units of work plus structural combinators.       | [`Task`], [`Pipe`], [`ConcurrentExecutor`]   |
//! | **Resources**     | Explicit release with guarded access.                         | [`Disposable`], [`Scoped`]                   |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use serde_json::json;
//! use groundwork::{
//!     AppConfig, BoxError, ConfigExt, ConnectMode, Registry, RegistryItemSet,
//! };
//!
//! // Immutable configuration.
//! let config = AppConfig::builder()
//!     .setting("MAX_SESSIONS", json!(32))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.typed::<usize>("MAX_SESSIONS").unwrap(), 32);
//!
//! // A registry that announces its mutations.
//! let registry = Registry::new();
//! let stored = Arc::new(AtomicUsize::new(0));
//! let receiver = {
//!     let stored = Arc::clone(&stored);
//!     Arc::new(move |_: &RegistryItemSet| -> Result<(), BoxError> {
//!         stored.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     })
//! };
//! registry
//!     .dispatcher()
//!     .connect::<RegistryItemSet, _>(&receiver, ConnectMode::Strong);
//!
//! registry.put("sessions.max", 32usize);
//! assert_eq!(stored.load(Ordering::SeqCst), 1);
//! ```

mod check;
mod config;
mod disposable;
mod dispatch;
mod error;
mod registry;
mod retry;
mod task;

// ---- Public re-exports ----

pub use check::{
    ensure_greater_or_equal, ensure_greater_than, ensure_less_or_equal, ensure_less_than,
    ensure_not_empty, ensure_predicate, ArgumentError,
};
pub use config::{
    AppConfig, AwaitingSetup, Config, ConfigBuilder, ConfigExt, ConfigProxy, ConfigurationError,
    InitializerFactory, InitializerRegistry, SettingInitializer,
};
pub use disposable::{not_disposed, Disposable, ResourceDisposedError, Scoped};
pub use dispatch::{ConnectMode, DispatchError, Dispatcher, DispatcherProxy, Receiver, Signal};
pub use error::{BoxError, Retryable, TransientError};
pub use registry::{
    AnyValue, NoSuchRegistryItemError, Registry, RegistryItemRemoved, RegistryItemSet,
    RegistryProxy,
};
pub use retry::{if_transient, BackoffPolicy, Retry, RetryError};
pub use task::{
    identity, task_fn, AndThen, Chain, Compose, ConcurrentExecutor, ExecuteError,
    ExecutorBuildError, ExecutorBuilder, Pipe, Supplier, Task, TaskFn, TaskHandle, TaskRef,
};
