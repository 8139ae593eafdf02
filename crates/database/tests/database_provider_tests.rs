//! Database provider lifecycle, session single-flight and the facade

use async_trait::async_trait;
use cadenza_core::{
    Application, ConfigBuilder, ConfigServiceProvider, Container, ProviderCatalog, ProviderError,
    ProviderLifecycleManager,
};
use cadenza_database::{
    ConnectionHandle, Database, DatabaseDriver, DatabaseError, DatabaseFacade, DatabaseResult,
    DatabaseServiceProvider, DriverRegistry, DATABASE,
};
use serde_json::json;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct FakeDriver {
    attempts: Arc<AtomicUsize>,
    fail_first: bool,
}

#[async_trait]
impl DatabaseDriver for FakeDriver {
    fn name(&self) -> &str {
        "fake"
    }

    fn connection_string(&self) -> String {
        "fake://".to_string()
    }

    async fn acquire_connection(&self) -> DatabaseResult<ConnectionHandle> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;

        if self.fail_first && attempt == 0 {
            return Err(DatabaseError::connection("fake", "connection refused"));
        }
        Ok(ConnectionHandle::Postgres(
            PgPoolOptions::new().connect_lazy_with(PgConnectOptions::new()),
        ))
    }
}

fn fake_registry(attempts: Arc<AtomicUsize>) -> DriverRegistry {
    let mut registry = DriverRegistry::with_defaults();
    registry.register("fake", move |_, _| {
        Ok(Box::new(FakeDriver {
            attempts: attempts.clone(),
            fail_first: false,
        }))
    });
    registry
}

async fn run_providers(yaml: &str, registry: DriverRegistry) -> (Container, Result<(), ProviderError>) {
    let container = Container::new();
    let mut lifecycle = ProviderLifecycleManager::new();
    lifecycle.register(ConfigServiceProvider::new(ConfigBuilder::new().add_yaml_str(yaml)));
    lifecycle.register(DatabaseServiceProvider::with_registry(registry));
    let result = lifecycle.execute_lifecycle(&container).await;
    (container, result)
}

#[tokio::test]
async fn concurrent_connects_share_one_attempt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let database = Arc::new(Database::new(Box::new(FakeDriver {
        attempts: attempts.clone(),
        fail_first: false,
    })));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let database = database.clone();
            tokio::spawn(async move { database.connect().await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(database.is_connected());
}

#[tokio::test]
async fn failed_connect_can_be_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let database = Database::new(Box::new(FakeDriver {
        attempts: attempts.clone(),
        fail_first: true,
    }));

    let err = database.connect().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Connection { .. }));
    assert!(!database.is_connected());
    assert!(matches!(database.handle(), Err(DatabaseError::NotConnected)));

    assert!(database.connect().await.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unsupported_backend_fails_boot() {
    let yaml = "database:\n  default: mysql\n";
    let (container, result) = run_providers(yaml, DriverRegistry::with_defaults()).await;

    let err = result.unwrap_err();
    assert_eq!(err.provider(), Some("database"));
    assert!(err.to_string().contains("Unsupported database backend 'mysql'"));
    assert!(!container.is_resolved(&DATABASE));
}

#[tokio::test]
async fn lazy_boot_selects_driver_without_connecting() {
    let yaml = r#"
database:
  default: postgresql
  connect_on_boot: false
  timezone: UTC
  connections:
    postgresql:
      host: h
      port: 5432
      username: u
      password: p
      database: d
"#;
    let (container, result) = run_providers(yaml, DriverRegistry::with_defaults()).await;
    result.unwrap();

    let database = container.resolve(&DATABASE).unwrap();
    assert_eq!(database.driver_name(), "postgresql");
    assert_eq!(
        database.connection_string(),
        "host=h port=5432 user=u password=p dbname=d sslmode=disable TimeZone=UTC"
    );
    assert!(!database.is_connected());
}

#[tokio::test]
async fn boot_connects_and_facade_returns_session() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let registry = fake_registry(attempts.clone());

    let mut catalog = ProviderCatalog::with_defaults();
    catalog.insert("database", move || DatabaseServiceProvider::with_registry(registry.clone()));

    let mut app = Application::builder()
        .config(
            ConfigBuilder::new()
                .set("app.providers", json!(["database"]))
                .set("database.default", "fake"),
        )
        .catalog(catalog)
        .build()
        .await
        .unwrap();

    assert!(app.try_database().is_err());
    app.boot().await.unwrap();

    let handle = app.database();
    assert!(handle.as_postgres().is_some());
    assert_eq!(app.try_database().unwrap().driver_name(), "fake");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
