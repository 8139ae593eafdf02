//! # cadenza
//!
//! Umbrella package for the cadenza framework: the service container and
//! provider lifecycle from `cadenza-core` plus database driver selection from
//! `cadenza-database`.
//!
//! ```rust,no_run
//! use cadenza::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ConfigBuilder::new().add_yaml_file("config/app.yaml");
//!     let app = cadenza::bootstrap(config).await.unwrap_or_else(|e| fatal("application", e));
//!     let code = app.run(std::env::args().collect(), false).await;
//!     std::process::exit(code);
//! }
//! ```

// Re-export all sub-packages as modules
pub use cadenza_core as core;
pub use cadenza_database as database;

pub use cadenza_core::{
    async_trait, fatal, Application, ApplicationBuilder, ApplicationError, Config, ConfigBuilder,
    Container, ContainerError, ProviderCatalog, ProviderError, ServiceKey, ServiceProvider,
};
pub use cadenza_database::{DatabaseFacade, DatabaseServiceProvider};

pub mod prelude;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CADENZA_CONFIG";

/// Configuration file read when `CADENZA_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

/// Prefix of environment overrides (`CADENZA__APP__NAME=...`)
pub const ENV_PREFIX: &str = "CADENZA";

/// Current version of cadenza
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

/// Catalog with every provider shipped by the framework
///
/// `log`, `event` and `schedule` from core plus `database`.
pub fn default_catalog() -> ProviderCatalog {
    let mut catalog = ProviderCatalog::with_defaults();
    catalog.insert("database", DatabaseServiceProvider::new);
    catalog
}

/// Configuration sources used by the binary
///
/// An explicit `CADENZA_CONFIG` file must exist; the default path is optional.
/// Environment overrides are applied last.
pub fn default_config() -> ConfigBuilder {
    let builder = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => ConfigBuilder::new().add_yaml_file(path),
        Err(_) => ConfigBuilder::new().add_optional_yaml_file(DEFAULT_CONFIG_PATH),
    };
    builder.add_env_overrides(ENV_PREFIX)
}

/// Build the application with the default catalog and boot the configured
/// providers
pub async fn bootstrap(config: ConfigBuilder) -> Result<Application, ApplicationError> {
    let mut app = Application::builder()
        .config(config)
        .catalog(default_catalog())
        .build()
        .await?;
    app.boot().await?;
    Ok(app)
}
