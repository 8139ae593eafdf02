use crate::config::CONFIG;
use crate::console::{Command, CommandContext, Console, CONSOLE};
use crate::container::Container;
use crate::errors::BoxError;
use crate::providers::{ProviderError, ServiceProvider};
use async_trait::async_trait;
use std::sync::Arc;

/// Foundational provider for the console dispatcher
pub struct ConsoleServiceProvider;

#[async_trait]
impl ServiceProvider for ConsoleServiceProvider {
    fn name(&self) -> &'static str {
        "console"
    }

    fn register(&self, container: &Container) -> Result<(), ProviderError> {
        container.bind(&CONSOLE, |c| {
            let name = match c.resolve(&CONFIG) {
                Ok(config) => config.get_string("app.name", "cadenza"),
                Err(err) if err.is_binding_not_found() => "cadenza".to_string(),
                Err(err) => return Err(err.into()),
            };
            Ok(Arc::new(Console::new(name)))
        });
        Ok(())
    }

    async fn boot(&self, container: &Container) -> Result<(), ProviderError> {
        let console = container.resolve(&CONSOLE)?;
        console.register(AboutCommand);
        Ok(())
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["config"]
    }
}

/// `about`: print basic facts about the application
pub struct AboutCommand;

#[async_trait]
impl Command for AboutCommand {
    fn name(&self) -> &str {
        "about"
    }

    fn description(&self) -> &str {
        "Display basic information about the application"
    }

    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<(), BoxError> {
        let config = ctx.container.resolve(&CONFIG)?;

        println!("{:<12} {}", "Name", config.get_string("app.name", "cadenza"));
        println!("{:<12} {}", "Environment", config.get_string("app.env", "production"));
        println!("{:<12} {}", "Timezone", config.get_string("app.timezone", "UTC"));
        println!("{:<12} {}", "Bindings", ctx.container.keys().join(", "));
        Ok(())
    }
}
