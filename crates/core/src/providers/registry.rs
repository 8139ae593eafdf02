use crate::container::Container;
use crate::providers::{ProviderError, ProviderMetadata, ServiceProvider};
use std::collections::HashMap;

/// Provider registry holds one provider set and drives its two passes
pub struct ProviderRegistry {
    providers: Vec<Box<dyn ServiceProvider>>,
    order: Vec<usize>,
    metadata_cache: HashMap<String, ProviderMetadata>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            order: Vec::new(),
            metadata_cache: HashMap::new(),
        }
    }

    /// Add a service provider to the set
    pub fn register<P: ServiceProvider + 'static>(&mut self, provider: P) {
        self.register_boxed(Box::new(provider));
    }

    /// Add an already boxed provider to the set
    pub fn register_boxed(&mut self, provider: Box<dyn ServiceProvider>) {
        let metadata = ProviderMetadata::from_provider(provider.as_ref());
        self.metadata_cache.insert(metadata.name.clone(), metadata);
        self.providers.push(provider);
    }

    /// Get the number of providers in the set
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Get provider metadata by name
    pub fn get_metadata(&self, name: &str) -> Option<&ProviderMetadata> {
        self.metadata_cache.get(name)
    }

    /// Provider names in execution order (valid after `resolve_dependencies`)
    pub fn execution_order(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .map(|&index| self.providers[index].name())
            .collect()
    }

    /// Determine execution order
    ///
    /// Providers run in the order they were added; a provider's declared
    /// dependencies are moved ahead of it.
    pub fn resolve_dependencies(&mut self) -> Result<(), ProviderError> {
        let name_to_index: HashMap<&'static str, usize> = self
            .providers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name(), i))
            .collect();

        let provider_count = self.providers.len();
        let mut visited = vec![false; provider_count];
        let mut temp_mark = vec![false; provider_count];
        let mut result = Vec::with_capacity(provider_count);

        for i in 0..provider_count {
            if !visited[i] {
                self.visit_provider(i, &name_to_index, &mut visited, &mut temp_mark, &mut result)?;
            }
        }

        self.order = result;
        Ok(())
    }

    /// Visit provider for dependency resolution
    fn visit_provider(
        &self,
        index: usize,
        name_to_index: &HashMap<&'static str, usize>,
        visited: &mut Vec<bool>,
        temp_mark: &mut Vec<bool>,
        result: &mut Vec<usize>,
    ) -> Result<(), ProviderError> {
        if temp_mark[index] {
            return Err(ProviderError::CircularDependency {
                provider: self.providers[index].name().to_string(),
            });
        }

        if visited[index] {
            return Ok(());
        }

        temp_mark[index] = true;

        for dep_name in self.providers[index].dependencies() {
            match name_to_index.get(dep_name) {
                Some(&dep_index) => {
                    self.visit_provider(dep_index, name_to_index, visited, temp_mark, result)?
                }
                None => {
                    return Err(ProviderError::MissingDependency {
                        provider: self.providers[index].name().to_string(),
                        dependency: dep_name.to_string(),
                    });
                }
            }
        }

        temp_mark[index] = false;
        visited[index] = true;
        result.push(index);

        Ok(())
    }

    /// Run `register` on every provider; stops at the first failure
    pub fn register_all(&self, container: &Container) -> Result<(), ProviderError> {
        for &index in &self.order {
            let provider = &self.providers[index];
            tracing::info!("Registering provider: {}", provider.name());
            provider.register(container).map_err(|e| match e {
                ProviderError::RegistrationFailed { .. } => e,
                other => ProviderError::registration(provider.name(), other),
            })?;
        }
        Ok(())
    }

    /// Run `boot` on every provider in the same order; stops at the first failure
    pub async fn boot_all(&self, container: &Container) -> Result<(), ProviderError> {
        for &index in &self.order {
            let provider = &self.providers[index];
            tracing::info!("Booting provider: {}", provider.name());
            provider.boot(container).await.map_err(|e| match e {
                ProviderError::BootFailed { .. } => e,
                other => ProviderError::boot(provider.name(), other),
            })?;
        }
        Ok(())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
