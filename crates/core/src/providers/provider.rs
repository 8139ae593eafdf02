use crate::container::Container;
use crate::errors::{BoxError, ContainerError};
use async_trait::async_trait;

/// Provider error type
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Circular dependency detected in provider: {provider}")]
    CircularDependency { provider: String },

    #[error("Missing dependency '{dependency}' for provider '{provider}'")]
    MissingDependency {
        provider: String,
        dependency: String,
    },

    #[error("Unknown provider '{name}'")]
    UnknownProvider { name: String },

    #[error("Failed to register provider '{provider}': {source}")]
    RegistrationFailed {
        provider: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to boot provider '{provider}': {source}")]
    BootFailed {
        provider: String,
        #[source]
        source: BoxError,
    },

    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
}

impl ProviderError {
    /// Wrap any error as a registration failure of `provider`
    pub fn registration(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::RegistrationFailed {
            provider: provider.into(),
            source: source.into(),
        }
    }

    /// Wrap any error as a boot failure of `provider`
    pub fn boot(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::BootFailed {
            provider: provider.into(),
            source: source.into(),
        }
    }

    /// Name of the provider the error is attributed to, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::CircularDependency { provider }
            | Self::MissingDependency { provider, .. }
            | Self::RegistrationFailed { provider, .. }
            | Self::BootFailed { provider, .. } => Some(provider),
            Self::UnknownProvider { name } => Some(name),
            Self::Container(_) => None,
        }
    }
}

/// Service provider wiring one subsystem into the container
///
/// Initialization runs in two passes over the whole provider set:
/// `register` on every provider, then `boot` on every provider in the same
/// order. `register` may only bind; another provider's bindings are not
/// guaranteed to exist yet. `boot` may resolve anything bound during the
/// register pass and perform side effects.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Provider name for identification and dependency resolution
    fn name(&self) -> &'static str;

    /// Contribute bindings to the container
    fn register(&self, container: &Container) -> Result<(), ProviderError>;

    /// Boot the provider after every provider in the set is registered
    async fn boot(&self, container: &Container) -> Result<(), ProviderError> {
        let _ = container;
        Ok(())
    }

    /// Providers that must be registered and booted before this one
    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Provider description
    fn description(&self) -> Option<&'static str> {
        None
    }
}

/// Provider metadata for introspection
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
}

impl ProviderMetadata {
    /// Create metadata from a provider
    pub fn from_provider<P: ServiceProvider + ?Sized>(provider: &P) -> Self {
        Self {
            name: provider.name().to_string(),
            description: provider.description().map(|d| d.to_string()),
            dependencies: provider
                .dependencies()
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct QueueProvider;

    impl ServiceProvider for QueueProvider {
        fn name(&self) -> &'static str {
            "queue"
        }

        fn register(&self, _container: &Container) -> Result<(), ProviderError> {
            Ok(())
        }

        fn dependencies(&self) -> Vec<&'static str> {
            vec!["config", "log"]
        }

        fn description(&self) -> Option<&'static str> {
            Some("Background queue")
        }
    }

    #[test]
    fn test_provider_metadata() {
        let metadata = ProviderMetadata::from_provider(&QueueProvider);

        assert_eq!(metadata.name, "queue");
        assert_eq!(metadata.description, Some("Background queue".to_string()));
        assert_eq!(metadata.dependencies, vec!["config", "log"]);
    }

    #[test]
    fn test_error_attribution() {
        let err = ProviderError::boot("database", "connection refused");
        assert_eq!(err.provider(), Some("database"));
        assert_eq!(
            err.to_string(),
            "Failed to boot provider 'database': connection refused"
        );

        let err = ProviderError::from(ContainerError::binding_not_found("config"));
        assert_eq!(err.provider(), None);
    }
}
