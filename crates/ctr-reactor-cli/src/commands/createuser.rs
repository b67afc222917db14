//! The `createuser` command.

use async_trait::async_trait;
use ctr_reactor_core::{ReactorError, Settings};

use super::open_manager;
use crate::command::ManagementCommand;

/// Creates a user non-interactively. No session is opened.
pub struct CreateuserCommand;

#[async_trait]
impl ManagementCommand for CreateuserCommand {
    fn name(&self) -> &'static str {
        "createuser"
    }

    fn help(&self) -> &'static str {
        "Creates a user account"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("email")
                .long("email")
                .required(true)
                .help("Email address of the new user"),
        )
        .arg(
            clap::Arg::new("password")
                .long("password")
                .required(true)
                .help("Password of the new user"),
        )
        .arg(
            clap::Arg::new("name")
                .long("name")
                .help("Optional display name"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), ReactorError> {
        let email = matches
            .get_one::<String>("email")
            .ok_or_else(|| ReactorError::ConfigurationError("--email is required".to_string()))?;
        let password = matches
            .get_one::<String>("password")
            .ok_or_else(|| ReactorError::ConfigurationError("--password is required".to_string()))?;
        let name = matches.get_one::<String>("name").map(String::as_str);

        let manager = open_manager(settings).await?;
        let user = manager.create_user(name, email, password).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "user created");
        Ok(())
    }
}
