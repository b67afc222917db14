//! Management command framework.
//!
//! [`ManagementCommand`] defines one CLI subcommand; [`CommandRegistry`]
//! collects them, builds the clap interface and dispatches.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use ctr_reactor_cli::command::ManagementCommand;
//! use ctr_reactor_core::{ReactorError, Settings};
//!
//! struct PingCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for PingCommand {
//!     fn name(&self) -> &str { "ping" }
//!     fn help(&self) -> &str { "Say pong" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _settings: &Settings,
//!     ) -> Result<(), ReactorError> {
//!         tracing::info!("pong");
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use ctr_reactor_core::{ReactorError, Settings};

/// Name of the global option pointing at a TOML settings file.
pub const SETTINGS_ARG: &str = "settings";

/// A subcommand of the `ctr-reactor` binary.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &str;

    /// One-line help text.
    fn help(&self) -> &str;

    /// Adds arguments to the subcommand. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings)
        -> Result<(), ReactorError>;
}

/// Registered management commands, keyed by name.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        let name = command.name().to_string();
        self.commands.insert(name, command);
    }

    /// Returns the command with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns the registered names, sorted.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level clap command with every registered subcommand.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("ctr-reactor")
            .about("ctr-reactor authentication service")
            .subcommand_required(true)
            .arg(
                clap::Arg::new(SETTINGS_ARG)
                    .long(SETTINGS_ARG)
                    .global(true)
                    .value_name("FILE")
                    .help("TOML settings file (CTR_REACTOR_* variables still apply)"),
            );

        let mut entries: Vec<_> = self.commands.iter().collect();
        entries.sort_by_key(|(name, _)| (*name).clone());

        for (name, cmd) in entries {
            // clap needs `&'static str` names; commands are registered once per process.
            let static_name: &'static str = Box::leak(name.clone().into_boxed_str());
            let subcmd = clap::Command::new(static_name).about(cmd.help().to_string());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }

        app
    }

    /// Dispatches to the subcommand named in `matches`.
    pub async fn execute(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), ReactorError> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            ReactorError::ConfigurationError("No subcommand specified".to_string())
        })?;

        let cmd = self.get(name).ok_or_else(|| {
            ReactorError::ConfigurationError(format!("Unknown command: {name}"))
        })?;

        cmd.handle(sub_matches, settings).await
    }
}
