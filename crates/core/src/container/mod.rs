#[allow(clippy::module_inception)]
pub mod container;
pub mod key;
mod slot;

pub use container::Container;
pub use key::ServiceKey;
