use crate::container::Container;
use crate::providers::{ProviderError, ProviderRegistry, ServiceProvider};
use std::time::{Duration, Instant};

/// Provider lifecycle manager
///
/// Runs one provider set through the register pass and then the boot pass.
pub struct ProviderLifecycleManager {
    registry: ProviderRegistry,
    lifecycle_stats: ProviderLifecycleStats,
}

impl ProviderLifecycleManager {
    /// Create a new provider lifecycle manager
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::new(),
            lifecycle_stats: ProviderLifecycleStats::new(),
        }
    }

    /// Add a provider to the set
    pub fn register<P: ServiceProvider + 'static>(&mut self, provider: P) {
        self.registry.register(provider);
    }

    /// Add an already boxed provider to the set
    pub fn register_boxed(&mut self, provider: Box<dyn ServiceProvider>) {
        self.registry.register_boxed(provider);
    }

    /// Execute the full provider lifecycle against `container`
    ///
    /// No provider is booted until every provider is registered. The first
    /// failure aborts the remaining phase and is returned.
    pub async fn execute_lifecycle(&mut self, container: &Container) -> Result<(), ProviderError> {
        let start_time = Instant::now();

        tracing::info!(
            "Starting provider lifecycle for {} providers...",
            self.registry.provider_count()
        );

        let dep_start = Instant::now();
        self.registry.resolve_dependencies()?;
        self.lifecycle_stats.dependency_resolution_time = dep_start.elapsed();

        let reg_start = Instant::now();
        self.registry.register_all(container)?;
        self.lifecycle_stats.registration_time = reg_start.elapsed();

        let boot_start = Instant::now();
        self.registry.boot_all(container).await?;
        self.lifecycle_stats.boot_time = boot_start.elapsed();

        self.lifecycle_stats.total_time = start_time.elapsed();
        self.lifecycle_stats.provider_count = self.registry.provider_count();

        tracing::info!(
            "Provider lifecycle completed successfully in {:?} with {} providers",
            self.lifecycle_stats.total_time,
            self.lifecycle_stats.provider_count
        );

        Ok(())
    }

    /// Get lifecycle statistics
    pub fn lifecycle_stats(&self) -> &ProviderLifecycleStats {
        &self.lifecycle_stats
    }

    /// Get provider registry
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }
}

impl Default for ProviderLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for provider lifecycle execution
#[derive(Debug, Clone)]
pub struct ProviderLifecycleStats {
    pub provider_count: usize,
    pub total_time: Duration,
    pub dependency_resolution_time: Duration,
    pub registration_time: Duration,
    pub boot_time: Duration,
}

impl ProviderLifecycleStats {
    /// Create new lifecycle stats
    pub fn new() -> Self {
        Self {
            provider_count: 0,
            total_time: Duration::ZERO,
            dependency_resolution_time: Duration::ZERO,
            registration_time: Duration::ZERO,
            boot_time: Duration::ZERO,
        }
    }
}

impl Default for ProviderLifecycleStats {
    fn default() -> Self {
        Self::new()
    }
}
