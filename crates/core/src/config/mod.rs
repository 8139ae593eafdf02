pub mod builder;
pub mod provider;
pub mod repository;
pub mod sources;
pub mod validation;

pub use builder::*;
pub use provider::*;
pub use repository::*;
pub use sources::*;
pub use validation::*;
