//! Embedded `SQLite` user store.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ctr_reactor_core::ReactorError;
use ctr_reactor_db::Value;
use ctr_reactor_db_backends::{DatabaseBackend, SqliteBackend};

use super::{map_insert_user_error, UserStore};
use crate::user::{NewUser, Session, User, UserId};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    name TEXT,
    password_hash TEXT NOT NULL,
    avatar TEXT,
    verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email);
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS sessions_user_id_idx ON sessions (user_id);
CREATE INDEX IF NOT EXISTS sessions_expires_at_idx ON sessions (expires_at);
";

/// User store backed by a local `SQLite` file. User ids are integers.
pub struct SqliteUserStore {
    backend: SqliteBackend,
}

impl SqliteUserStore {
    /// Wraps an open backend.
    pub const fn new(backend: SqliteBackend) -> Self {
        Self { backend }
    }

    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ReactorError> {
        SqliteBackend::open(path).map(Self::new)
    }

    /// Opens a private in-memory database.
    pub fn memory() -> Result<Self, ReactorError> {
        SqliteBackend::memory().map(Self::new)
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    fn vendor(&self) -> &'static str {
        self.backend.vendor()
    }

    async fn migrate(&self) -> Result<(), ReactorError> {
        self.backend.execute_batch(SCHEMA).await
    }

    async fn ping(&self) -> Result<(), ReactorError> {
        self.backend.ping().await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, ReactorError> {
        let sql = format!(
            "INSERT INTO users (email, name, password_hash, verified, created_at) \
             VALUES (?1, ?2, ?3, 0, ?4) RETURNING {}",
            User::COLUMNS
        );
        let row = self
            .backend
            .query_one(
                &sql,
                &[
                    Value::from(new_user.email),
                    Value::from(new_user.name),
                    Value::from(new_user.password_hash),
                    Value::from(Utc::now()),
                ],
            )
            .await
            .map_err(map_insert_user_error)?;
        User::from_row(&row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ReactorError> {
        let sql = format!("SELECT {} FROM users WHERE email = ?1", User::COLUMNS);
        self.backend
            .query_opt(&sql, &[Value::from(email)])
            .await?
            .map(|row| User::from_row(&row))
            .transpose()
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, ReactorError> {
        let UserId::Int(_) = id else {
            return Ok(None);
        };
        let sql = format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS);
        self.backend
            .query_opt(&sql, &[Value::from(id)])
            .await?
            .map(|row| User::from_row(&row))
            .transpose()
    }

    async fn update_password_hash(&self, id: &UserId, hash: &str) -> Result<(), ReactorError> {
        self.backend
            .execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                &[Value::from(hash), Value::from(id)],
            )
            .await
            .map(|_| ())
    }

    async fn create_session(
        &self,
        user_id: &UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, ReactorError> {
        let sql = format!(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) \
             VALUES (?1, ?2, ?3, ?4) RETURNING {}",
            Session::COLUMNS
        );
        let row = self
            .backend
            .query_one(
                &sql,
                &[
                    Value::from(token_hash),
                    Value::from(user_id),
                    Value::from(Utc::now()),
                    Value::from(expires_at),
                ],
            )
            .await?;
        Session::from_row(&row)
    }

    async fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, ReactorError> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE token_hash = ?1",
            Session::COLUMNS
        );
        self.backend
            .query_opt(&sql, &[Value::from(token_hash)])
            .await?
            .map(|row| Session::from_row(&row))
            .transpose()
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), ReactorError> {
        self.backend
            .execute(
                "DELETE FROM sessions WHERE token_hash = ?1",
                &[Value::from(token_hash)],
            )
            .await
            .map(|_| ())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, ReactorError> {
        self.backend
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                &[Value::from(now)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    async fn store() -> SqliteUserStore {
        let store = SqliteUserStore::memory().unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_sqlite_store_contract() {
        contract::exercise(&store().await).await;
    }

    #[tokio::test]
    async fn test_sqlite_ids_are_integers() {
        let store = store().await;
        let user = store
            .create_user(NewUser {
                name: None,
                email: "int@b.com".to_string(),
                password_hash: "h".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(user.id, UserId::Int(_)));
    }

    #[tokio::test]
    async fn test_sqlite_uuid_lookup_is_none() {
        let store = store().await;
        let found = store
            .find_user_by_id(&UserId::Uuid(uuid::Uuid::new_v4()))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_migrate_is_idempotent() {
        let store = store().await;
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_file_store_persists_users() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.sqlite3");
        {
            let store = SqliteUserStore::open(&path).unwrap();
            store.migrate().await.unwrap();
            store
                .create_user(NewUser {
                    name: Some("Ada".to_string()),
                    email: "ada@b.com".to_string(),
                    password_hash: "h".to_string(),
                })
                .await
                .unwrap();
        }
        let store = SqliteUserStore::open(&path).unwrap();
        let user = store.find_user_by_email("ada@b.com").await.unwrap().unwrap();
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }
}
