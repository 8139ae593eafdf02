use crate::config::{Config, ConfigBuilder, ConfigError, ConfigServiceProvider, CONFIG};
use crate::console::{Console, ConsoleServiceProvider, CONSOLE};
use crate::container::{Container, ServiceKey};
use crate::errors::ContainerError;
use crate::event::{EventBus, EVENT};
use crate::foundation::LifecycleState;
use crate::log::{Logger, LOGGER};
use crate::providers::{
    ProviderCatalog, ProviderError, ProviderLifecycleManager, ProviderLifecycleStats, ServiceProvider,
};
use crate::schedule::{Schedule, SCHEDULE};
use chrono_tz::Tz;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Configuration key holding the ordered list of provider names
pub const PROVIDERS_KEY: &str = "app.providers";

/// Configuration key holding the IANA timezone name
pub const TIMEZONE_KEY: &str = "app.timezone";

/// Container key of the application timezone, bound at boot
pub const TIMEZONE: ServiceKey<Tz> = ServiceKey::new("timezone");

/// Bootstrap errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Application cannot boot from state '{state}'")]
    InvalidState { state: LifecycleState },
}

/// Report an unrecoverable startup failure and terminate the process
pub fn fatal(service: &str, err: impl Display) -> ! {
    tracing::error!("Unable to resolve '{}': {}", service, err);
    eprintln!("Unable to resolve '{}': {}", service, err);
    std::process::exit(1)
}

/// Builder for [`Application`]
pub struct ApplicationBuilder {
    config: ConfigBuilder,
    catalog: ProviderCatalog,
    providers: Vec<Box<dyn ServiceProvider>>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config: ConfigBuilder::new(),
            catalog: ProviderCatalog::with_defaults(),
            providers: Vec::new(),
        }
    }

    /// Configuration sources
    pub fn config(mut self, config: ConfigBuilder) -> Self {
        self.config = config;
        self
    }

    /// Catalog used to resolve `app.providers`
    pub fn catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Provider booted after the configured ones
    pub fn provider<P: ServiceProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Create the container and run the foundational cycle (config, console)
    pub async fn build(self) -> Result<Application, ApplicationError> {
        let container = Arc::new(Container::new());

        let mut foundation = ProviderLifecycleManager::new();
        foundation.register(ConfigServiceProvider::new(self.config));
        foundation.register(ConsoleServiceProvider);
        foundation.execute_lifecycle(&container).await?;

        Ok(Application {
            container,
            catalog: self.catalog,
            pending: self.providers,
            state: LifecycleState::Created,
            timezone: Tz::UTC,
            stats: foundation.lifecycle_stats().clone(),
        })
    }
}

/// Application context
///
/// Owns the container. Built once by the entry point and passed to whatever
/// needs services; nothing about it is process-global.
pub struct Application {
    container: Arc<Container>,
    catalog: ProviderCatalog,
    pending: Vec<Box<dyn ServiceProvider>>,
    state: LifecycleState,
    timezone: Tz,
    stats: ProviderLifecycleStats,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Register and boot the providers named in `app.providers`, then any
    /// providers added on the builder
    pub async fn boot(&mut self) -> Result<(), ApplicationError> {
        if self.state != LifecycleState::Created {
            return Err(ApplicationError::InvalidState { state: self.state });
        }
        self.state = LifecycleState::Booting;

        match self.boot_configured().await {
            Ok(()) => {
                self.state = LifecycleState::Booted;
                tracing::info!(
                    "Application booted ({} bindings, timezone {})",
                    self.container.binding_count(),
                    self.timezone
                );
                Ok(())
            }
            Err(err) => {
                self.state = LifecycleState::Failed;
                tracing::error!("Application boot failed: {}", err);
                Err(err)
            }
        }
    }

    async fn boot_configured(&mut self) -> Result<(), ApplicationError> {
        let config = self.try_config()?;
        let timezone = parse_timezone(&config)?;
        let names = config.get_string_list(PROVIDERS_KEY)?;

        self.timezone = timezone;
        self.container.instance(&TIMEZONE, Arc::new(timezone));

        let mut lifecycle = ProviderLifecycleManager::new();
        for provider in self.catalog.make_all(&names)? {
            lifecycle.register_boxed(provider);
        }
        for provider in std::mem::take(&mut self.pending) {
            lifecycle.register_boxed(provider);
        }
        lifecycle.execute_lifecycle(&self.container).await?;
        self.stats = lifecycle.lifecycle_stats().clone();
        Ok(())
    }

    /// Hand the raw process arguments to the console
    pub async fn run(&self, args: Vec<String>, exit_on_finish: bool) -> i32 {
        let console = self.console();
        console.run(&self.container, args, exit_on_finish).await
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Timezone applied from `app.timezone` at boot
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Timing of the most recent provider cycle
    pub fn lifecycle_stats(&self) -> &ProviderLifecycleStats {
        &self.stats
    }

    /// Resolve any service
    pub fn try_make<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.container.resolve(key)
    }

    /// Resolve any service, terminating the process on failure
    pub fn make<T>(&self, key: &ServiceKey<T>) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.try_make(key).unwrap_or_else(|err| fatal(key.name(), err))
    }

    pub fn try_config(&self) -> Result<Arc<Config>, ContainerError> {
        self.try_make(&CONFIG)
    }

    pub fn config(&self) -> Arc<Config> {
        self.make(&CONFIG)
    }

    pub fn try_console(&self) -> Result<Arc<Console>, ContainerError> {
        self.try_make(&CONSOLE)
    }

    pub fn console(&self) -> Arc<Console> {
        self.make(&CONSOLE)
    }

    pub fn try_event(&self) -> Result<Arc<EventBus>, ContainerError> {
        self.try_make(&EVENT)
    }

    pub fn event(&self) -> Arc<EventBus> {
        self.make(&EVENT)
    }

    pub fn try_logger(&self) -> Result<Arc<Logger>, ContainerError> {
        self.try_make(&LOGGER)
    }

    pub fn logger(&self) -> Arc<Logger> {
        self.make(&LOGGER)
    }

    pub fn try_schedule(&self) -> Result<Arc<Schedule>, ContainerError> {
        self.try_make(&SCHEDULE)
    }

    pub fn schedule(&self) -> Arc<Schedule> {
        self.make(&SCHEDULE)
    }
}

fn parse_timezone(config: &Config) -> Result<Tz, ConfigError> {
    let name = config.get_string(TIMEZONE_KEY, "UTC");
    name.parse::<Tz>()
        .map_err(|_| ConfigError::invalid_value(TIMEZONE_KEY, name.clone(), "IANA timezone name"))
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("state", &self.state)
            .field("timezone", &self.timezone)
            .field("bindings", &self.container.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_foundational_cycle() {
        let app = Application::builder()
            .config(ConfigBuilder::new().add_yaml_str("app:\n  name: demo\n"))
            .build()
            .await
            .unwrap();

        assert_eq!(app.state(), LifecycleState::Created);
        assert_eq!(app.config().get_string("app.name", ""), "demo");
        assert!(app.try_console().is_ok());
        assert!(app.try_event().unwrap_err().is_binding_not_found());
    }

    #[tokio::test]
    async fn test_boot_twice_is_rejected() {
        let mut app = Application::builder().build().await.unwrap();
        app.boot().await.unwrap();

        let err = app.boot().await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState { state: LifecycleState::Booted }));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_boot() {
        let mut app = Application::builder()
            .config(ConfigBuilder::new().add_yaml_str("app:\n  providers: [log, queue]\n"))
            .build()
            .await
            .unwrap();

        let err = app.boot().await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Provider(ProviderError::UnknownProvider { ref name }) if name == "queue"
        ));
        assert_eq!(app.state(), LifecycleState::Failed);
    }

    #[tokio::test]
    async fn test_invalid_timezone_fails_boot() {
        let mut app = Application::builder()
            .config(ConfigBuilder::new().add_yaml_str("app:\n  timezone: Not/AZone\n"))
            .build()
            .await
            .unwrap();

        let err = app.boot().await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Config(ConfigError::InvalidValue { ref field, ref value, .. })
                if field == "app.timezone" && value == "Not/AZone"
        ));
        assert_eq!(app.state(), LifecycleState::Failed);
        assert!(!app.container().has(&TIMEZONE));
    }

    #[tokio::test]
    async fn test_timezone_is_bound_and_applied_to_schedule() {
        let mut app = Application::builder()
            .config(ConfigBuilder::new().add_yaml_str(
                "app:\n  timezone: Asia/Jakarta\n  providers: [schedule]\n",
            ))
            .build()
            .await
            .unwrap();
        app.boot().await.unwrap();

        assert_eq!(app.timezone(), chrono_tz::Asia::Jakarta);
        assert_eq!(*app.make(&TIMEZONE), chrono_tz::Asia::Jakarta);
        assert_eq!(app.schedule().timezone(), chrono_tz::Asia::Jakarta);
    }
}
