//! # ctr-reactor-cli
//!
//! Management commands for the `ctr-reactor` binary.
//!
//! ```rust
//! use ctr_reactor_cli::command::CommandRegistry;
//! use ctr_reactor_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! let names = registry.list_commands();
//! assert!(names.contains(&"runserver"));
//! assert!(names.contains(&"createuser"));
//! ```

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand};

use std::ffi::OsString;
use std::path::Path;

use ctr_reactor_core::logging::setup_logging;
use ctr_reactor_core::{settings_loader, ReactorError, ReactorResult, Settings};

/// Loads settings from `--settings` when given, otherwise from defaults and
/// the environment.
pub fn load_settings(matches: &clap::ArgMatches) -> ReactorResult<Settings> {
    match matches.get_one::<String>(command::SETTINGS_ARG) {
        Some(path) => settings_loader::from_toml_file_with_env(Path::new(path)),
        None => Ok(settings_loader::from_env()),
    }
}

/// Parses arguments, loads settings, sets up logging and runs the command.
pub async fn execute_from_args<I, T>(args: I) -> ReactorResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut registry = CommandRegistry::new();
    commands::register_builtin_commands(&mut registry);

    let matches = match registry.build_cli().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            e.print()?;
            return Ok(());
        }
        Err(e) => return Err(ReactorError::ConfigurationError(e.to_string())),
    };

    let settings = load_settings(&matches)?;
    setup_logging(&settings);
    registry.execute(&matches, &settings).await
}
