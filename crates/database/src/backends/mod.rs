//! Database driver selection
//!
//! `database.default` names the driver; the [`DriverRegistry`] maps that
//! discriminator to a constructor. Backends are added with
//! [`DriverRegistry::register`] rather than by editing the selection logic.

pub mod core;
pub mod postgres;

pub use self::core::*;
pub use postgres::{PostgresDriver, POSTGRES_DRIVER};

use crate::error::{DatabaseError, DatabaseResult};
use cadenza_core::Config;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Configuration key holding the discriminator
pub const DEFAULT_DRIVER_KEY: &str = "database.default";

/// Builds a driver from the configuration and the connection name
pub type DriverConstructor =
    Arc<dyn Fn(&Config, &str) -> DatabaseResult<Box<dyn DatabaseDriver>> + Send + Sync>;

/// Discriminator to driver constructor map
#[derive(Clone, Default)]
pub struct DriverRegistry {
    constructors: BTreeMap<String, DriverConstructor>,
}

impl DriverRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `postgresql` driver
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(POSTGRES_DRIVER, |config, name| {
            Ok(Box::new(PostgresDriver::from_config(config, name)?))
        });
        registry
    }

    /// Add or replace the constructor for `name`
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Config, &str) -> DatabaseResult<Box<dyn DatabaseDriver>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn supports(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Supported discriminators, sorted
    pub fn drivers(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Constructor registered for `name`
    pub fn constructor(&self, name: &str) -> DatabaseResult<DriverConstructor> {
        self.constructors
            .get(name)
            .cloned()
            .ok_or_else(|| DatabaseError::UnsupportedBackend {
                driver: name.to_string(),
                supported: self.drivers(),
            })
    }

    /// Construct the driver selected by `database.default`
    ///
    /// An unknown discriminator fails before any constructor runs.
    pub fn create(&self, config: &Config) -> DatabaseResult<Box<dyn DatabaseDriver>> {
        let name = config.get_optional_string(DEFAULT_DRIVER_KEY).ok_or_else(|| {
            DatabaseError::configuration(format!("'{}' is required", DEFAULT_DRIVER_KEY))
        })?;

        let constructor = self.constructor(&name)?;
        tracing::debug!("Selected database driver '{}'", name);
        constructor(config, &name)
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.drivers())
            .finish()
    }
}
