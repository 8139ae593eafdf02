//! Driver capability and the connection settings every driver reads

use crate::database::PoolConfig;
use crate::error::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use cadenza_core::Config;
use sqlx::PgPool;
use std::time::Duration;

/// Default connect timeout when `connect_timeout` is not configured
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An established database session
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ConnectionHandle {
    Postgres(PgPool),
}

impl ConnectionHandle {
    /// The PostgreSQL pool, if this is a PostgreSQL session
    pub fn as_postgres(&self) -> Option<&PgPool> {
        match self {
            ConnectionHandle::Postgres(pool) => Some(pool),
        }
    }

    pub async fn close(&self) {
        match self {
            ConnectionHandle::Postgres(pool) => pool.close().await,
        }
    }
}

/// Capability every database driver provides
#[async_trait]
pub trait DatabaseDriver: Send + Sync + std::fmt::Debug {
    /// Discriminator this driver was selected with
    fn name(&self) -> &str;

    /// Connection string understood by the backend
    fn connection_string(&self) -> String;

    /// Open the session
    async fn acquire_connection(&self) -> DatabaseResult<ConnectionHandle>;
}

/// Settings of one entry under `database.connections`
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Name of the connection entry
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub timezone: String,
    pub connect_timeout: Duration,
    pub pool: PoolConfig,
}

impl ConnectionConfig {
    /// Read `database.connections.<name>.*`
    ///
    /// `host`, `port`, `username` and `database` are required, `password`
    /// defaults to empty. The timezone comes from `database.timezone`, then
    /// `app.timezone`, then `UTC`.
    pub fn from_config(config: &Config, name: &str) -> DatabaseResult<Self> {
        let prefix = format!("database.connections.{}", name);
        let required = |field: &str| {
            config
                .get_optional_string(&format!("{}.{}", prefix, field))
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    DatabaseError::configuration(format!("'{}.{}' is required", prefix, field))
                })
        };

        let host = required("host")?;
        let port = required("port")?;
        let port = port.trim().parse::<u16>().map_err(|_| {
            DatabaseError::configuration(format!("'{}.port' must be a port number, got '{}'", prefix, port))
        })?;
        let username = required("username")?;
        let database = required("database")?;
        let password = config.get_string(&format!("{}.password", prefix), "");

        let timezone = config
            .get_optional_string("database.timezone")
            .or_else(|| config.get_optional_string("app.timezone"))
            .unwrap_or_else(|| "UTC".to_string());

        let connect_timeout = Duration::from_secs(config.get_u64(
            &format!("{}.connect_timeout", prefix),
            DEFAULT_CONNECT_TIMEOUT.as_secs(),
        )?);

        Ok(Self {
            name: name.to_string(),
            host,
            port,
            username,
            password,
            database,
            timezone,
            connect_timeout,
            pool: PoolConfig::from_config(config)?,
        })
    }

    /// `host=.. port=.. user=.. password=.. dbname=.. sslmode=disable TimeZone=..`
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode=disable TimeZone={}",
            self.host, self.port, self.username, self.password, self.database, self.timezone
        )
    }
}
