use crate::container::Container;
use crate::errors::BoxError;
use async_trait::async_trait;
use clap::ArgMatches;

/// A console command dispatched by name
#[async_trait]
pub trait Command: Send + Sync {
    /// Name used on the command line, e.g. `schedule:list`
    fn name(&self) -> &str;

    /// One-line description shown in help output
    fn description(&self) -> &str;

    /// Declare arguments and flags
    fn arguments(&self, command: clap::Command) -> clap::Command {
        command
    }

    /// Run the command
    async fn handle(&self, ctx: &CommandContext<'_>) -> Result<(), BoxError>;
}

/// What a command handler gets to work with
pub struct CommandContext<'a> {
    pub container: &'a Container,
    pub matches: &'a ArgMatches,
}

impl<'a> CommandContext<'a> {
    pub fn new(container: &'a Container, matches: &'a ArgMatches) -> Self {
        Self { container, matches }
    }

    /// String argument by id
    pub fn argument(&self, id: &str) -> Option<&String> {
        self.matches.get_one::<String>(id)
    }

    /// Boolean flag by id
    pub fn flag(&self, id: &str) -> bool {
        self.matches.get_flag(id)
    }
}
