//! The `runserver` command.

use std::sync::Arc;

use async_trait::async_trait;
use ctr_reactor_auth::Argon2Hasher;
use ctr_reactor_core::{ReactorError, Settings};
use ctr_reactor_http::ReactorApp;

use super::open_store;
use crate::command::ManagementCommand;

/// Selects the store, migrates it and serves HTTP until stopped.
///
/// Binds to `--bind` when given, otherwise to `bind_address` from settings.
pub struct RunserverCommand;

#[async_trait]
impl ManagementCommand for RunserverCommand {
    fn name(&self) -> &'static str {
        "runserver"
    }

    fn help(&self) -> &'static str {
        "Starts the HTTP server"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .help("Address to bind to, e.g. 0.0.0.0:3000"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), ReactorError> {
        let addr = matches
            .get_one::<String>("bind")
            .cloned()
            .unwrap_or_else(|| settings.bind_address.clone());

        for problem in settings.check() {
            tracing::warn!(problem = %problem, "configuration problem");
        }

        let store = open_store(settings).await?;
        let app = ReactorApp::new(settings.clone(), store, Arc::new(Argon2Hasher::default()))?;
        tracing::info!(?app, "application ready");
        app.run(&addr).await
    }
}
