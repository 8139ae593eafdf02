use crate::providers::{ProviderError, ServiceProvider};
use std::collections::HashMap;
use std::sync::Arc;

type ProviderFactory = Arc<dyn Fn() -> Box<dyn ServiceProvider> + Send + Sync>;

/// Named provider factories
///
/// Configuration lists providers by name (`app.providers`); the catalog turns
/// those names into provider instances. New providers are added with
/// [`ProviderCatalog::insert`].
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the log, event and schedule providers
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.insert("log", || crate::log::LogServiceProvider);
        catalog.insert("event", || crate::event::EventServiceProvider);
        catalog.insert("schedule", || crate::schedule::ScheduleServiceProvider);
        catalog
    }

    /// Add or replace a provider factory
    pub fn insert<P, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        P: ServiceProvider + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.factories
            .insert(name.into(), Arc::new(move || Box::new(factory()) as Box<dyn ServiceProvider>));
        self
    }

    /// Check if a provider name is known
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Sorted list of known provider names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate a provider by name
    pub fn make(&self, name: &str) -> Result<Box<dyn ServiceProvider>, ProviderError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// Instantiate every named provider, keeping order
    pub fn make_all<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Box<dyn ServiceProvider>>, ProviderError> {
        names.iter().map(|name| self.make(name.as_ref())).collect()
    }
}

impl std::fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCatalog")
            .field("providers", &self.names())
            .finish()
    }
}
