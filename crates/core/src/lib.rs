//! # cadenza-core
//!
//! Service container, two-phase provider lifecycle and application bootstrap.
//!
//! Providers contribute bindings during `register` and may resolve them from
//! `boot`, which only starts once every provider in the set has registered.
//! The [`Application`] runs a foundational cycle (config, console) first, then
//! the providers listed under `app.providers`.

pub mod config;
pub mod console;
pub mod container;
pub mod errors;
pub mod event;
pub mod foundation;
pub mod log;
pub mod providers;
pub mod schedule;

pub use config::{Config, ConfigBuilder, ConfigError, ConfigServiceProvider, ConfigSource, CONFIG};
pub use console::{Command, CommandContext, Console, ConsoleError, ConsoleServiceProvider, CONSOLE};
pub use container::{Container, ServiceKey};
pub use errors::{BoxError, ContainerError, SharedError};
pub use event::{EventBus, EventError, EventPayload, EventServiceProvider, Listener, EVENT};
pub use foundation::{
    fatal, Application, ApplicationBuilder, ApplicationError, LifecycleState, TIMEZONE,
};
pub use log::{LogServiceProvider, Logger, LoggingConfig, LOGGER};
pub use providers::{
    ProviderCatalog, ProviderError, ProviderLifecycleManager, ProviderRegistry, ServiceProvider,
};
pub use schedule::{Job, Schedule, ScheduleError, ScheduleServiceProvider, SCHEDULE};

pub use async_trait::async_trait;
pub use chrono_tz::Tz;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "cadenza";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

/// Get framework name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}
