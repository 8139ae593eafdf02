use crate::container::key::ServiceKey;
use crate::container::slot::{Instance, InstanceSlot};
use crate::errors::{BoxError, ContainerError};
use parking_lot::RwLock;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

type Constructor = Arc<dyn Fn(&Container) -> Result<Instance, BoxError> + Send + Sync>;

struct Binding {
    constructor: Constructor,
    type_id: TypeId,
    type_name: &'static str,
    slot: Arc<InstanceSlot>,
}

thread_local! {
    // (container address, key) pairs this thread is currently constructing
    static CONSTRUCTING: RefCell<Vec<(usize, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as under construction on this thread for the guard's lifetime
struct ConstructionGuard {
    container: usize,
}

impl ConstructionGuard {
    fn enter(container: usize, key: &'static str) -> Result<Self, ContainerError> {
        CONSTRUCTING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|entry| *entry == (container, key)) {
                let mut path: Vec<&str> = stack
                    .iter()
                    .filter(|(owner, _)| *owner == container)
                    .map(|(_, name)| *name)
                    .collect();
                path.push(key);
                return Err(ContainerError::CircularDependency {
                    path: path.join(" -> "),
                });
            }
            stack.push((container, key));
            Ok(Self { container })
        })
    }
}

impl Drop for ConstructionGuard {
    fn drop(&mut self) {
        CONSTRUCTING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|(owner, _)| *owner == self.container) {
                stack.remove(pos);
            }
        });
    }
}

/// Service container mapping keys to deferred constructors and cached singletons
///
/// `bind` and `resolve` take `&self` and are safe to call from any number of
/// threads. A binding's constructor runs at most once per successful
/// resolution: concurrent first resolutions share one construction, and the
/// resulting instance is cached for the life of the container.
pub struct Container {
    bindings: RwLock<HashMap<&'static str, Binding>>,
}

impl Container {
    /// Create an empty container
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Bind a deferred constructor under `key`
    ///
    /// Replaces any existing binding with the same name. The constructor is
    /// not invoked here. Once a key is resolved its cached instance is never
    /// dropped by `bind`:
    ///
    /// - rebinding with the same service type keeps the cached instance and
    ///   the new constructor is never used;
    /// - rebinding with a different service type is ignored with a warning,
    ///   so resolving the new type reports `TypeMismatch`.
    ///
    /// Use [`Container::instance`] to replace a resolved service.
    pub fn bind<T, F>(&self, key: &ServiceKey<T>, constructor: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(move |container: &Container| {
            let service = constructor(container)?;
            Ok(Arc::new(service) as Instance)
        });

        let type_id = TypeId::of::<T>();
        let mut bindings = self.bindings.write();
        let slot = match bindings.get(key.name()) {
            Some(existing) if existing.slot.is_resolved() => {
                if existing.type_id != type_id {
                    tracing::warn!(
                        "Ignoring rebind of resolved '{}' from {} to {}",
                        key.name(),
                        existing.type_name,
                        key.service_type_name()
                    );
                    return;
                }
                tracing::debug!(
                    "Rebinding '{}' after resolution; cached instance is retained",
                    key.name()
                );
                existing.slot.clone()
            }
            _ => Arc::new(InstanceSlot::vacant()),
        };

        tracing::debug!("Binding '{}' -> {}", key.name(), key.service_type_name());
        bindings.insert(
            key.name(),
            Binding {
                constructor,
                type_id,
                type_name: key.service_type_name(),
                slot,
            },
        );
    }

    /// Bind an already constructed value, replacing any cached instance
    pub fn instance<T>(&self, key: &ServiceKey<T>, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let cached = service.clone();
        let constructor: Constructor =
            Arc::new(move |_: &Container| Ok(Arc::new(cached.clone()) as Instance));

        tracing::debug!("Binding instance '{}' -> {}", key.name(), key.service_type_name());
        self.bindings.write().insert(
            key.name(),
            Binding {
                constructor,
                type_id: TypeId::of::<T>(),
                type_name: key.service_type_name(),
                slot: Arc::new(InstanceSlot::resolved(Arc::new(service) as Instance)),
            },
        );
    }

    /// Resolve the singleton bound under `key`, constructing it on first use
    ///
    /// Fails with `BindingNotFound` when nothing is bound, with `Factory`
    /// when the constructor fails (the key stays unresolved and the next
    /// call retries), and with `CircularDependency` when a constructor
    /// resolves its own key on the same thread.
    ///
    /// Cycle detection only sees constructors running on the calling thread.
    /// If a constructor on one thread waits for a key whose constructor is
    /// running on another thread and waiting in turn for the first key, both
    /// threads block on each other's construction and never return.
    /// Constructors must not hand resolution of their dependencies to other
    /// threads.
    pub fn resolve<T>(&self, key: &ServiceKey<T>) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (constructor, slot) = {
            let bindings = self.bindings.read();
            let binding = bindings
                .get(key.name())
                .ok_or_else(|| ContainerError::binding_not_found(key.name()))?;

            if binding.type_id != TypeId::of::<T>() {
                return Err(ContainerError::type_mismatch(
                    key.name(),
                    key.service_type_name(),
                    binding.type_name,
                ));
            }

            (binding.constructor.clone(), binding.slot.clone())
        };

        let _guard = ConstructionGuard::enter(self.address(), key.name())?;
        let instance = slot.get_or_construct(key.name(), || {
            tracing::debug!("Constructing '{}'", key.name());
            constructor(self)
        })?;

        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| {
                ContainerError::type_mismatch(key.name(), key.service_type_name(), "<unknown>")
            })
    }

    /// Check if a binding exists for `key`
    pub fn has<T: ?Sized>(&self, key: &ServiceKey<T>) -> bool {
        self.bindings.read().contains_key(key.name())
    }

    /// Check if `key` has a cached instance
    pub fn is_resolved<T: ?Sized>(&self, key: &ServiceKey<T>) -> bool {
        self.bindings
            .read()
            .get(key.name())
            .map(|binding| binding.slot.is_resolved())
            .unwrap_or(false)
    }

    /// Get the number of bindings
    pub fn binding_count(&self) -> usize {
        self.bindings.read().len()
    }

    /// Get the names of all bindings, sorted
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = self.bindings.read().keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    fn address(&self) -> usize {
        self as *const Self as usize
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.keys())
            .finish()
    }
}
