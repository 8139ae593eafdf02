pub mod catalog;
pub mod lifecycle;
pub mod provider;
pub mod registry;

pub use catalog::*;
pub use lifecycle::*;
pub use provider::*;
pub use registry::*;
