//! User and session persistence.
//!
//! [`UserStore`] is the one capability interface callers see. Two
//! implementations exist: [`SqliteUserStore`] for the embedded database file
//! and [`PostgresUserStore`] for a managed Postgres service. [`connect_store`]
//! picks one at startup; nothing else branches on the backend.

#[cfg(test)]
mod contract;
mod postgres;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ctr_reactor_core::settings::DatabaseSettings;
use ctr_reactor_core::ReactorError;

use crate::user::{NewUser, Session, User, UserId};

pub use postgres::PostgresUserStore;
pub use sqlite::SqliteUserStore;

/// Persistence for users and sessions.
///
/// Implementations report a taken email as [`ReactorError::DuplicateEmail`]
/// and every other failure as a storage error variant.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the backend vendor ("sqlite" or "postgresql").
    fn vendor(&self) -> &'static str;

    /// Creates the tables and indexes if they do not exist.
    async fn migrate(&self) -> Result<(), ReactorError>;

    /// Checks that the backing database is reachable.
    async fn ping(&self) -> Result<(), ReactorError>;

    /// Inserts a user. The email must already be normalized.
    async fn create_user(&self, new_user: NewUser) -> Result<User, ReactorError>;

    /// Looks up a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ReactorError>;

    /// Looks up a user by identifier.
    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, ReactorError>;

    /// Replaces a user's credential hash.
    async fn update_password_hash(&self, id: &UserId, hash: &str) -> Result<(), ReactorError>;

    /// Persists a session keyed by its token hash.
    async fn create_session(
        &self,
        user_id: &UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, ReactorError>;

    /// Looks up a session by token hash. Expiry is the caller's concern.
    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, ReactorError>;

    /// Deletes a session. Deleting a missing session is not an error.
    async fn delete_session(&self, token_hash: &str) -> Result<(), ReactorError>;

    /// Deletes every session that expired at or before `now`.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, ReactorError>;
}

/// Maps a unique violation on insert to `DuplicateEmail`.
fn map_insert_user_error(err: ReactorError) -> ReactorError {
    match err {
        ReactorError::IntegrityError(_) => ReactorError::DuplicateEmail,
        other => other,
    }
}

/// Selects the user store for this process.
///
/// When a Postgres URL is configured and the server answers, Postgres is used.
/// Otherwise the embedded `SQLite` file is opened. If neither works the
/// result is [`ReactorError::BackendUnavailable`].
pub async fn connect_store(settings: &DatabaseSettings) -> Result<Arc<dyn UserStore>, ReactorError> {
    if let Some(url) = settings.url.as_deref() {
        match PostgresUserStore::connect(url, settings.pool_size) {
            Ok(store) => match store.ping().await {
                Ok(()) => {
                    tracing::info!(backend = "postgresql", "user store selected");
                    return Ok(Arc::new(store));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "postgres unreachable, falling back to sqlite");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "postgres configuration rejected, falling back to sqlite");
            }
        }
    }

    let store = SqliteUserStore::open(&settings.sqlite_path).map_err(|e| {
        tracing::error!(error = %e, path = %settings.sqlite_path.display(), "sqlite unavailable");
        ReactorError::BackendUnavailable("no user store could be opened".to_string())
    })?;
    store.ping().await.map_err(|e| {
        tracing::error!(error = %e, "sqlite ping failed");
        ReactorError::BackendUnavailable("no user store could be opened".to_string())
    })?;

    tracing::info!(
        backend = "sqlite",
        path = %settings.sqlite_path.display(),
        "user store selected"
    );
    Ok(Arc::new(store))
}
