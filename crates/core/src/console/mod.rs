//! Console command registry and dispatcher
//!
//! Commands are registered at runtime (usually from a provider's `boot`) and
//! dispatched from the raw process arguments with `clap`.

pub mod command;
pub mod provider;

pub use command::*;
pub use provider::*;

use crate::container::{Container, ServiceKey};
use crate::errors::BoxError;
use parking_lot::RwLock;
use std::sync::Arc;

/// Container key of the console
pub const CONSOLE: ServiceKey<Console> = ServiceKey::new("console");

/// Console error type
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Arguments(#[from] clap::Error),

    #[error("Command '{name}' is not defined")]
    UnknownCommand { name: String },

    #[error("Command '{command}' failed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: BoxError,
    },
}

impl ConsoleError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ConsoleError::Arguments(err) => err.exit_code(),
            ConsoleError::UnknownCommand { .. } => 2,
            ConsoleError::CommandFailed { .. } => 1,
        }
    }
}

/// Console command registry
pub struct Console {
    name: String,
    commands: RwLock<Vec<Arc<dyn Command>>>,
}

impl Console {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: RwLock::new(Vec::new()),
        }
    }

    /// Register a command, replacing any command with the same name
    pub fn register<C: Command + 'static>(&self, command: C) {
        self.register_arc(Arc::new(command));
    }

    /// Register a shared command
    pub fn register_arc(&self, command: Arc<dyn Command>) {
        let mut commands = self.commands.write();
        commands.retain(|existing| existing.name() != command.name());
        tracing::debug!("Registering console command '{}'", command.name());
        commands.push(command);
    }

    /// Check if a command is registered
    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Registered command names, sorted
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .read()
            .iter()
            .map(|command| command.name().to_string())
            .collect();
        names.sort();
        names
    }

    fn find(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands
            .read()
            .iter()
            .find(|command| command.name() == name)
            .cloned()
    }

    fn cli(&self) -> clap::Command {
        let mut cli = clap::Command::new(self.name.clone())
            .subcommand_required(true)
            .arg_required_else_help(true);

        let mut commands = self.commands.read().clone();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        for command in commands {
            let sub = clap::Command::new(command.name().to_string())
                .about(command.description().to_string());
            cli = cli.subcommand(command.arguments(sub));
        }
        cli
    }

    /// Parse `args` (including the binary name) and run the selected command
    pub async fn call<I, T>(&self, container: &Container, args: I) -> Result<(), ConsoleError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.cli().try_get_matches_from(args)?;
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| ConsoleError::UnknownCommand {
            name: String::new(),
        })?;

        let command = self.find(name).ok_or_else(|| ConsoleError::UnknownCommand {
            name: name.to_string(),
        })?;

        tracing::debug!("Running console command '{}'", name);
        command
            .handle(&CommandContext::new(container, sub_matches))
            .await
            .map_err(|source| ConsoleError::CommandFailed {
                command: name.to_string(),
                source,
            })
    }

    /// Run the console and produce a process exit code
    ///
    /// Help and version output exit with 0, argument errors with 2 and
    /// failing commands with 1. With `exit_on_finish` the process exits with
    /// that code instead of returning it.
    pub async fn run(&self, container: &Container, args: Vec<String>, exit_on_finish: bool) -> i32 {
        let code = match self.call(container, args).await {
            Ok(()) => 0,
            Err(ConsoleError::Arguments(err)) => {
                let code = err.exit_code();
                let _ = err.print();
                code
            }
            Err(err) => {
                tracing::error!("{}", err);
                eprintln!("{}", err);
                err.exit_code()
            }
        };

        if exit_on_finish {
            std::process::exit(code);
        }
        code
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("name", &self.name)
            .field("commands", &self.command_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::Arg;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Greet {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Command for Greet {
        fn name(&self) -> &str {
            "greet"
        }

        fn description(&self) -> &str {
            "Say hello"
        }

        fn arguments(&self, command: clap::Command) -> clap::Command {
            command.arg(Arg::new("who").required(true))
        }

        async fn handle(&self, ctx: &CommandContext<'_>) -> Result<(), BoxError> {
            match ctx.argument("who").map(String::as_str) {
                Some("nobody") => Err("nobody to greet".into()),
                _ => {
                    self.calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        }
    }

    fn console() -> (Console, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let console = Console::new("artisan");
        console.register(Greet {
            calls: calls.clone(),
        });
        (console, calls)
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let (console, calls) = console();
        let container = Container::new();

        let code = console.run(&container, args(&["app", "greet", "world"]), false).await;
        assert_eq!(code, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_command_exits_with_one() {
        let (console, _) = console();
        let container = Container::new();

        let code = console.run(&container, args(&["app", "greet", "nobody"]), false).await;
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_unknown_command_is_an_argument_error() {
        let (console, calls) = console();
        let container = Container::new();

        let code = console.run(&container, args(&["app", "migrate"]), false).await;
        assert_eq!(code, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_help_exits_cleanly() {
        let (console, _) = console();
        let container = Container::new();

        let code = console.run(&container, args(&["app", "--help"]), false).await;
        assert_eq!(code, 0);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let (console, _) = console();
        console.register(Greet {
            calls: Arc::new(AtomicUsize::new(0)),
        });

        assert_eq!(console.command_names(), vec!["greet"]);
        assert!(console.has("greet"));
    }
}
