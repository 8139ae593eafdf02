//! Database service, its service provider and the application facade

use crate::backends::{ConnectionHandle, DatabaseDriver, DriverRegistry};
use crate::error::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use cadenza_core::{
    fatal, Application, Config, ConfigError, Container, ProviderError, ServiceKey, ServiceProvider,
    CONFIG,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Container key of the database service
pub const DATABASE: ServiceKey<Database> = ServiceKey::new("database");

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub idle_timeout: Option<u64>,
    pub max_lifetime: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: Some(600), // 10 minutes
            max_lifetime: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }
}

impl PoolConfig {
    /// Read `database.pool.*`; a zero `idle_timeout` or `max_lifetime` disables it
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let seconds = |key: &str, default: Option<u64>| -> Result<Option<u64>, ConfigError> {
            let value = config.get_u64(key, default.unwrap_or(0))?;
            Ok((value > 0).then_some(value))
        };

        Ok(Self {
            max_connections: config_u32(config, "database.pool.max_connections", defaults.max_connections)?,
            min_connections: config_u32(config, "database.pool.min_connections", defaults.min_connections)?,
            acquire_timeout: config.get_u64("database.pool.acquire_timeout", defaults.acquire_timeout)?,
            idle_timeout: seconds("database.pool.idle_timeout", defaults.idle_timeout)?,
            max_lifetime: seconds("database.pool.max_lifetime", defaults.max_lifetime)?,
            test_before_acquire: config
                .get_bool("database.pool.test_before_acquire", defaults.test_before_acquire)?,
        })
    }
}

fn config_u32(config: &Config, key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = config.get_u64(key, u64::from(default))?;
    u32::try_from(value).map_err(|_| ConfigError::invalid_value(key, value.to_string(), "32-bit unsigned integer"))
}

/// The selected driver and its session
///
/// `connect` opens the session at most once; concurrent callers wait for the
/// same attempt and a failed attempt may be retried.
#[derive(Debug)]
pub struct Database {
    driver: Box<dyn DatabaseDriver>,
    session: OnceCell<ConnectionHandle>,
}

impl Database {
    pub fn new(driver: Box<dyn DatabaseDriver>) -> Self {
        Self {
            driver,
            session: OnceCell::new(),
        }
    }

    pub fn driver(&self) -> &dyn DatabaseDriver {
        self.driver.as_ref()
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    pub fn connection_string(&self) -> String {
        self.driver.connection_string()
    }

    /// Establish the session, or return the established one
    pub async fn connect(&self) -> DatabaseResult<ConnectionHandle> {
        self.session
            .get_or_try_init(|| self.driver.acquire_connection())
            .await
            .cloned()
    }

    /// Established session, if any
    pub fn session(&self) -> Option<ConnectionHandle> {
        self.session.get().cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.session.initialized()
    }

    /// Established session or `NotConnected`
    pub fn handle(&self) -> DatabaseResult<ConnectionHandle> {
        self.session().ok_or(DatabaseError::NotConnected)
    }
}

/// Provider binding the database service
///
/// `register` binds a constructor that selects the driver from
/// `database.default`; `boot` resolves it, so an unsupported backend fails
/// startup, and connects unless `database.connect_on_boot` is false.
#[derive(Debug, Clone)]
pub struct DatabaseServiceProvider {
    registry: DriverRegistry,
}

impl DatabaseServiceProvider {
    pub fn new() -> Self {
        Self::with_registry(DriverRegistry::with_defaults())
    }

    pub fn with_registry(registry: DriverRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }
}

impl Default for DatabaseServiceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceProvider for DatabaseServiceProvider {
    fn name(&self) -> &'static str {
        "database"
    }

    fn register(&self, container: &Container) -> Result<(), ProviderError> {
        let registry = self.registry.clone();
        container.bind(&DATABASE, move |c| {
            let config = c.resolve(&CONFIG)?;
            let driver = registry.create(&config)?;
            Ok(Arc::new(Database::new(driver)))
        });
        Ok(())
    }

    async fn boot(&self, container: &Container) -> Result<(), ProviderError> {
        let database = container.resolve(&DATABASE)?;
        let config = container.resolve(&CONFIG)?;

        let connect_on_boot = config
            .get_bool("database.connect_on_boot", true)
            .map_err(|e| ProviderError::boot(self.name(), e))?;

        if connect_on_boot {
            database
                .connect()
                .await
                .map_err(|e| ProviderError::boot(self.name(), e))?;
            tracing::info!("Database session established ({})", database.driver_name());
        } else {
            tracing::info!("Database driver '{}' selected; connecting on demand", database.driver_name());
        }
        Ok(())
    }

    fn description(&self) -> Option<&'static str> {
        Some("Database driver selection and session")
    }
}

/// Database accessors on [`Application`]
pub trait DatabaseFacade {
    /// Database service, or the error that prevented resolving it
    fn try_database(&self) -> DatabaseResult<Arc<Database>>;

    /// Established session; terminates the process when unavailable
    fn database(&self) -> ConnectionHandle;
}

impl DatabaseFacade for Application {
    fn try_database(&self) -> DatabaseResult<Arc<Database>> {
        Ok(self.try_make(&DATABASE)?)
    }

    fn database(&self) -> ConnectionHandle {
        self.try_database()
            .and_then(|database| database.handle())
            .unwrap_or_else(|err| fatal(DATABASE.name(), err))
    }
}
