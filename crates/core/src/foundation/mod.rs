//! Application context, bootstrap sequence and typed facade accessors

pub mod application;
pub mod lifecycle;

pub use application::*;
pub use lifecycle::*;
