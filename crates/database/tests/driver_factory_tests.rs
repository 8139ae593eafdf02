//! Driver selection from the `database.default` discriminator

use cadenza_core::Config;
use cadenza_database::{
    ConnectionHandle, DatabaseDriver, DatabaseError, DatabaseResult, DriverRegistry,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn config(driver: &str) -> Config {
    Config::from_value(json!({
        "database": {
            "default": driver,
            "timezone": "UTC",
            "connections": {
                "postgresql": {
                    "host": "h",
                    "port": 5432,
                    "username": "u",
                    "password": "p",
                    "database": "d"
                }
            }
        }
    }))
    .unwrap()
}

#[derive(Debug)]
struct MemoryDriver;

#[async_trait::async_trait]
impl DatabaseDriver for MemoryDriver {
    fn name(&self) -> &str {
        "memory"
    }

    fn connection_string(&self) -> String {
        "memory://".to_string()
    }

    async fn acquire_connection(&self) -> DatabaseResult<ConnectionHandle> {
        Err(DatabaseError::NotConnected)
    }
}

#[test]
fn postgresql_connection_string_is_exact() {
    let driver = DriverRegistry::with_defaults().create(&config("postgresql")).unwrap();

    assert_eq!(driver.name(), "postgresql");
    assert_eq!(
        driver.connection_string(),
        "host=h port=5432 user=u password=p dbname=d sslmode=disable TimeZone=UTC"
    );
}

#[test]
fn unsupported_discriminator_constructs_nothing() {
    let constructed = Arc::new(AtomicUsize::new(0));

    let mut registry = DriverRegistry::with_defaults();
    let counter = constructed.clone();
    registry.register("memory", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryDriver))
    });

    let err = registry.create(&config("mysql")).unwrap_err();

    assert!(err.is_unsupported_backend());
    assert!(matches!(err, DatabaseError::UnsupportedBackend { ref driver, .. } if driver == "mysql"));
    assert_eq!(
        err.to_string(),
        "Unsupported database backend 'mysql' (supported: memory, postgresql)"
    );
    assert_eq!(constructed.load(Ordering::SeqCst), 0);
}

#[test]
fn registered_drivers_are_selectable() {
    let mut registry = DriverRegistry::with_defaults();
    registry.register("memory", |_, _| Ok(Box::new(MemoryDriver)));

    let driver = registry.create(&config("memory")).unwrap();
    assert_eq!(driver.name(), "memory");
    assert_eq!(driver.connection_string(), "memory://");
}

#[test]
fn missing_connection_fields_are_configuration_errors() {
    let config = Config::from_value(json!({
        "database": {
            "default": "postgresql",
            "connections": { "postgresql": { "host": "h", "port": 5432, "username": "u" } }
        }
    }))
    .unwrap();

    let err = DriverRegistry::with_defaults().create(&config).unwrap_err();
    assert!(matches!(err, DatabaseError::Configuration { .. }));
    assert!(err.to_string().contains("database.connections.postgresql.database"));
}

#[test]
fn database_timezone_wins_over_app_timezone() {
    let mut config = config("postgresql");
    config.set("app.timezone", "Asia/Jakarta");
    config.set("database.timezone", "Europe/Berlin");

    let driver = DriverRegistry::with_defaults().create(&config).unwrap();
    assert!(driver.connection_string().ends_with("TimeZone=Europe/Berlin"));
}
