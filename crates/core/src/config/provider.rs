use crate::config::{Config, ConfigBuilder};
use crate::container::{Container, ServiceKey};
use crate::providers::{ProviderError, ServiceProvider};
use async_trait::async_trait;
use std::sync::Arc;

/// Container key of the application configuration
pub const CONFIG: ServiceKey<Config> = ServiceKey::new("config");

/// Foundational provider that makes configuration resolvable
///
/// Sources are only read when `config` is first resolved, which the boot
/// phase forces so a broken configuration fails the foundational cycle.
pub struct ConfigServiceProvider {
    builder: ConfigBuilder,
}

impl ConfigServiceProvider {
    pub fn new(builder: ConfigBuilder) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl ServiceProvider for ConfigServiceProvider {
    fn name(&self) -> &'static str {
        "config"
    }

    fn register(&self, container: &Container) -> Result<(), ProviderError> {
        let builder = self.builder.clone();
        container.bind(&CONFIG, move |_| Ok(Arc::new(builder.build()?)));
        Ok(())
    }

    async fn boot(&self, container: &Container) -> Result<(), ProviderError> {
        let config = container.resolve(&CONFIG)?;
        tracing::info!(
            "Configuration loaded for '{}' ({} sources)",
            config.get_string("app.name", "cadenza"),
            self.builder.sources().len()
        );
        Ok(())
    }

    fn description(&self) -> Option<&'static str> {
        Some("Layered YAML and environment configuration")
    }
}
