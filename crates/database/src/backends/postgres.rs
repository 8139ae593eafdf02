//! PostgreSQL driver backed by a `sqlx` pool

use super::core::*;
use crate::error::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use cadenza_core::Config;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::time::Duration;

/// Discriminator selecting this driver
pub const POSTGRES_DRIVER: &str = "postgresql";

/// PostgreSQL database driver
#[derive(Debug, Clone)]
pub struct PostgresDriver {
    connection: ConnectionConfig,
}

impl PostgresDriver {
    pub fn new(connection: ConnectionConfig) -> Self {
        Self { connection }
    }

    /// Build from `database.connections.<name>`
    pub fn from_config(config: &Config, name: &str) -> DatabaseResult<Self> {
        Ok(Self::new(ConnectionConfig::from_config(config, name)?))
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Connect options carrying the same fields as the connection string
    pub fn connect_options(&self) -> PgConnectOptions {
        let c = &self.connection;
        PgConnectOptions::new()
            .host(&c.host)
            .port(c.port)
            .username(&c.username)
            .password(&c.password)
            .database(&c.database)
            .ssl_mode(PgSslMode::Disable)
            .options([("TimeZone", c.timezone.as_str())])
    }

    /// Pool options from `database.pool.*`
    pub fn pool_options(&self) -> PgPoolOptions {
        let pool = &self.connection.pool;
        PgPoolOptions::new()
            .max_connections(pool.max_connections)
            .min_connections(pool.min_connections)
            .acquire_timeout(Duration::from_secs(pool.acquire_timeout))
            .idle_timeout(pool.idle_timeout.map(Duration::from_secs))
            .max_lifetime(pool.max_lifetime.map(Duration::from_secs))
            .test_before_acquire(pool.test_before_acquire)
    }
}

#[async_trait]
impl DatabaseDriver for PostgresDriver {
    fn name(&self) -> &str {
        POSTGRES_DRIVER
    }

    fn connection_string(&self) -> String {
        self.connection.connection_string()
    }

    async fn acquire_connection(&self) -> DatabaseResult<ConnectionHandle> {
        let timeout = self.connection.connect_timeout;
        tracing::info!(
            "Connecting to PostgreSQL at {}:{}/{} (timeout {:?})",
            self.connection.host,
            self.connection.port,
            self.connection.database,
            timeout
        );

        let connect = self.pool_options().connect_with(self.connect_options());
        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(pool)) => {
                tracing::info!("PostgreSQL pool ready (size: {})", pool.size());
                Ok(ConnectionHandle::Postgres(pool))
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to create PostgreSQL pool: {}", e);
                Err(DatabaseError::connection(POSTGRES_DRIVER, e))
            }
            Err(_) => Err(DatabaseError::Timeout {
                driver: POSTGRES_DRIVER.to_string(),
                timeout,
            }),
        }
    }
}
