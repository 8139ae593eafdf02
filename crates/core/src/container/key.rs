//! Typed service keys
//!
//! A [`ServiceKey`] pairs the name a binding is stored under with the type the
//! binding produces, so `bind` and `resolve` agree on the service type at
//! compile time instead of through a runtime downcast at every call site.
//!
//! ```rust
//! use cadenza_core::container::{Container, ServiceKey};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! const GREETER: ServiceKey<dyn Greeter> = ServiceKey::new("greeter");
//!
//! let container = Container::new();
//! container.bind(&GREETER, |_| Ok(Arc::new(English) as Arc<dyn Greeter>));
//!
//! let greeter = container.resolve(&GREETER).unwrap();
//! assert_eq!(greeter.greet(), "hello");
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Name of a binding together with the type it resolves to
///
/// The service type may be a trait object (`ServiceKey<dyn Listener>`).
pub struct ServiceKey<T: ?Sized> {
    name: &'static str,
    _service: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> ServiceKey<T> {
    /// Create a key; usable in `const` items
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _service: PhantomData,
        }
    }

    /// Name the binding is stored under
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name of the service, for diagnostics
    pub fn service_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: ?Sized> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for ServiceKey<T> {}

impl<T: ?Sized> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceKey")
            .field("name", &self.name)
            .field("service", &self.service_type_name())
            .finish()
    }
}

impl<T: ?Sized> fmt::Display for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}

    #[test]
    fn test_key_is_const_and_copy() {
        const KEY: ServiceKey<String> = ServiceKey::new("greeting");
        let copy = KEY;

        assert_eq!(copy.name(), "greeting");
        assert_eq!(KEY.to_string(), "greeting");
        assert_eq!(copy.service_type_name(), "alloc::string::String");
    }

    #[test]
    fn test_key_for_trait_object() {
        let key: ServiceKey<dyn Marker> = ServiceKey::new("marker");
        assert!(format!("{:?}", key).contains("marker"));
    }
}
