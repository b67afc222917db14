//! The `migrate` command.

use async_trait::async_trait;
use ctr_reactor_core::{ReactorError, Settings};

use super::open_store;
use crate::command::ManagementCommand;

/// Creates the users and sessions tables on the selected backend.
pub struct MigrateCommand;

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Creates tables and indexes on the selected backend"
    }

    async fn handle(
        &self,
        _matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), ReactorError> {
        let store = open_store(settings).await?;
        tracing::info!(backend = store.vendor(), "schema is up to date");
        Ok(())
    }
}
