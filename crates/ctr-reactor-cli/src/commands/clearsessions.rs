//! The `clearsessions` command.

use async_trait::async_trait;
use ctr_reactor_core::{ReactorError, Settings};

use super::open_manager;
use crate::command::ManagementCommand;

/// Deletes expired session rows.
///
/// Expired sessions are already rejected at resolution time; this only
/// reclaims storage.
pub struct ClearsessionsCommand;

#[async_trait]
impl ManagementCommand for ClearsessionsCommand {
    fn name(&self) -> &'static str {
        "clearsessions"
    }

    fn help(&self) -> &'static str {
        "Deletes expired sessions"
    }

    async fn handle(
        &self,
        _matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), ReactorError> {
        let manager = open_manager(settings).await?;
        let removed = manager.clear_expired_sessions().await?;
        println!("{removed}");
        Ok(())
    }
}
