//! Built-in management commands.

pub mod check;
pub mod clearsessions;
pub mod createuser;
pub mod migrate;
pub mod runserver;

pub use check::CheckCommand;
pub use clearsessions::ClearsessionsCommand;
pub use createuser::CreateuserCommand;
pub use migrate::MigrateCommand;
pub use runserver::RunserverCommand;

use std::sync::Arc;

use ctr_reactor_auth::{connect_store, Argon2Hasher, SessionManager, UserStore};
use ctr_reactor_core::{ReactorResult, Settings};

use crate::command::CommandRegistry;

/// Registers every built-in command.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(RunserverCommand));
    registry.register(Box::new(MigrateCommand));
    registry.register(Box::new(CreateuserCommand));
    registry.register(Box::new(ClearsessionsCommand));
    registry.register(Box::new(CheckCommand));
}

/// Selects the store and brings its schema up to date.
pub(crate) async fn open_store(settings: &Settings) -> ReactorResult<Arc<dyn UserStore>> {
    let store = connect_store(&settings.database).await?;
    store.migrate().await?;
    Ok(store)
}

/// A session manager over a freshly opened store.
pub(crate) async fn open_manager(settings: &Settings) -> ReactorResult<SessionManager> {
    let store = open_store(settings).await?;
    Ok(SessionManager::from_settings(
        store,
        Arc::new(Argon2Hasher::default()),
        settings,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtin_commands() {
        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry);
        assert_eq!(
            registry.list_commands(),
            vec!["check", "clearsessions", "createuser", "migrate", "runserver"]
        );
    }
}
