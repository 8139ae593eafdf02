use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by constructors, command handlers and jobs
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Shared error so one failed construction can be handed to every waiter
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Errors raised by the service container
#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    #[error("Binding was not found: {key}")]
    BindingNotFound { key: String },

    #[error("Constructor for '{key}' failed: {source}")]
    Factory {
        key: String,
        #[source]
        source: SharedError,
    },

    #[error("Binding '{key}' holds '{found}', but '{expected}' was requested")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Circular dependency detected while resolving: {path}")]
    CircularDependency { path: String },
}

impl ContainerError {
    /// Create a binding not found error
    pub fn binding_not_found(key: impl Into<String>) -> Self {
        Self::BindingNotFound { key: key.into() }
    }

    /// Wrap a constructor failure
    pub fn factory(key: impl Into<String>, source: BoxError) -> Self {
        Self::Factory {
            key: key.into(),
            source: Arc::from(source),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Check if the error is a missing binding
    pub fn is_binding_not_found(&self) -> bool {
        matches!(self, Self::BindingNotFound { .. })
    }

    /// Check if the error came out of a constructor
    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory { .. })
    }

    /// Find a typed error anywhere in the constructor's source chain
    pub fn find_source<E: StdError + 'static>(&self) -> Option<&E> {
        let Self::Factory { source, .. } = self else {
            return None;
        };

        let mut current: Option<&(dyn StdError + 'static)> = Some(&**source);
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<E>() {
                return Some(found);
            }
            if let Some(nested) = err.downcast_ref::<ContainerError>() {
                return nested.find_source::<E>();
            }
            current = err.source();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_factory_error_keeps_source() {
        let error = ContainerError::factory("storage", Box::new(DiskError));

        assert!(error.is_factory());
        assert!(error.to_string().contains("storage"));
        assert!(error.to_string().contains("disk on fire"));
        assert!(error.find_source::<DiskError>().is_some());
    }

    #[test]
    fn test_cloned_factory_error_shares_source() {
        let error = ContainerError::factory("storage", "boom".into());
        let cloned = error.clone();

        match (error, cloned) {
            (
                ContainerError::Factory { source: a, .. },
                ContainerError::Factory { source: b, .. },
            ) => assert!(Arc::ptr_eq(&a, &b)),
            _ => unreachable!(),
        }
    }
}
