//! Bootstrap sequence: foundational cycle, configured providers, console hand-off

use cadenza_core::{
    async_trait, Application, ApplicationError, ConfigBuilder, Container, LifecycleState,
    ProviderCatalog, ProviderError, ServiceKey, ServiceProvider, CONFIG,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CONFIG_YAML: &str = r#"
app:
  name: inventory
  timezone: Europe/Paris
  providers:
    - log
    - event
    - schedule
logging:
  level: warn
"#;

#[derive(Debug)]
struct Greeting(String);

const GREETING: ServiceKey<Greeting> = ServiceKey::new("greeting");

struct GreetingServiceProvider;

#[async_trait]
impl ServiceProvider for GreetingServiceProvider {
    fn name(&self) -> &'static str {
        "greeting"
    }

    fn register(&self, container: &Container) -> Result<(), ProviderError> {
        container.bind(&GREETING, |c| {
            let name = c.resolve(&CONFIG)?.get_string("app.name", "world");
            Ok(Arc::new(Greeting(format!("hello {}", name))))
        });
        Ok(())
    }
}

struct CountingProvider {
    boots: Arc<AtomicUsize>,
}

#[async_trait]
impl ServiceProvider for CountingProvider {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn register(&self, _container: &Container) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn boot(&self, _container: &Container) -> Result<(), ProviderError> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn build(yaml: &str) -> Application {
    Application::builder()
        .config(ConfigBuilder::new().add_yaml_str(yaml))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn configured_providers_are_booted() {
    let mut app = build(CONFIG_YAML).await;
    assert!(app.try_schedule().unwrap_err().is_binding_not_found());

    app.boot().await.unwrap();

    assert_eq!(app.state(), LifecycleState::Booted);
    assert_eq!(app.timezone().name(), "Europe/Paris");
    assert_eq!(app.logger().channel(), "app");
    assert!(app.schedule().is_empty());
    assert_eq!(app.event().listener_count("user.created"), 0);
    assert_eq!(app.lifecycle_stats().provider_count, 3);
}

#[tokio::test]
async fn timezone_defaults_to_utc() {
    let mut app = build("app:\n  name: bare\n").await;
    app.boot().await.unwrap();

    assert_eq!(app.timezone().name(), "UTC");
    assert!(app.try_logger().is_err());
}

#[tokio::test]
async fn catalog_entries_and_builder_providers_are_booted() {
    let boots = Arc::new(AtomicUsize::new(0));

    let mut catalog = ProviderCatalog::with_defaults();
    catalog.insert("greeting", || GreetingServiceProvider);

    let mut app = Application::builder()
        .config(
            ConfigBuilder::new()
                .add_yaml_str("app:\n  name: shop\n")
                .set("app.providers", json!(["greeting"])),
        )
        .catalog(catalog)
        .provider(CountingProvider {
            boots: boots.clone(),
        })
        .build()
        .await
        .unwrap();

    app.boot().await.unwrap();

    assert_eq!(app.make(&GREETING).0, "hello shop");
    assert_eq!(boots.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn broken_configuration_fails_the_foundational_cycle() {
    let result = Application::builder()
        .config(ConfigBuilder::new().add_yaml_str("app: [unterminated"))
        .build()
        .await;

    assert!(matches!(result, Err(ApplicationError::Provider(ProviderError::BootFailed { .. }))));
}

#[tokio::test]
async fn console_dispatch_returns_exit_codes() {
    let mut app = build(CONFIG_YAML).await;
    app.boot().await.unwrap();

    let args = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    assert_eq!(app.run(args(&["inventory", "about"]), false).await, 0);
    assert_eq!(app.run(args(&["inventory", "schedule:list"]), false).await, 0);
    assert_eq!(app.run(args(&["inventory", "migrate"]), false).await, 2);
}
