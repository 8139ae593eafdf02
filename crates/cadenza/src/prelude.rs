//! # Prelude
//!
//! ```rust
//! use cadenza::prelude::*;
//! ```

pub use crate::{
    async_trait, fatal, Application, Config, ConfigBuilder, Container, ContainerError,
    ProviderCatalog, ProviderError, ServiceKey, ServiceProvider,
};

pub use cadenza_core::{
    BoxError, Command, CommandContext, EventPayload, Job, Listener, CONFIG, CONSOLE, EVENT, LOGGER,
    SCHEDULE,
};
pub use cadenza_database::{ConnectionHandle, DatabaseDriver, DatabaseFacade, DATABASE};
