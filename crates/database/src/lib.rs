//! # cadenza-database
//!
//! Database driver selection for cadenza applications. `database.default`
//! picks a driver from the [`DriverRegistry`]; the [`DatabaseServiceProvider`]
//! binds the resulting [`Database`] service and opens its session at boot.

pub mod backends;
pub mod database;
pub mod error;

pub use backends::{
    ConnectionConfig, ConnectionHandle, DatabaseDriver, DriverConstructor, DriverRegistry,
    PostgresDriver, POSTGRES_DRIVER,
};
pub use database::{Database, DatabaseFacade, DatabaseServiceProvider, PoolConfig, DATABASE};
pub use error::{DatabaseError, DatabaseResult};
