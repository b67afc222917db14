//! User and session records.

use std::fmt;

use chrono::{DateTime, Utc};
use ctr_reactor_db::{Row, Value};
use ctr_reactor_core::ReactorError;
use serde::Serialize;

/// Opaque user identifier.
///
/// The embedded store assigns integers; the managed store assigns UUIDs.
/// Serialized as a bare number or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum UserId {
    /// Integer key (embedded `SQLite` store).
    Int(i64),
    /// UUID key (managed `PostgreSQL` store).
    Uuid(uuid::Uuid),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Uuid(id) => write!(f, "{id}"),
        }
    }
}

impl From<&UserId> for Value {
    fn from(id: &UserId) -> Self {
        match id {
            UserId::Int(id) => Self::Int(*id),
            UserId::Uuid(id) => Self::Uuid(*id),
        }
    }
}

impl UserId {
    /// Reads an identifier column, accepting either representation.
    pub fn from_row(row: &Row, column: &str) -> Result<Self, ReactorError> {
        match row.get_value(column) {
            Some(Value::Int(id)) => Ok(Self::Int(*id)),
            Some(Value::Uuid(id)) => Ok(Self::Uuid(*id)),
            Some(other) => Err(ReactorError::DatabaseError(format!(
                "Unexpected id value in column '{column}': {other:?}"
            ))),
            None => Err(ReactorError::DatabaseError(format!(
                "Column '{column}' not found in row"
            ))),
        }
    }
}

/// A registered user.
///
/// The password hash is never serialized and is redacted from `Debug`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Normalized (trimmed, lowercase) email, unique per store.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
    /// PHC-encoded credential hash.
    #[serde(skip)]
    pub password_hash: String,
    /// Optional avatar reference (URL or storage key).
    pub avatar: Option<String>,
    /// Whether the email address has been verified.
    pub verified: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("avatar", &self.avatar)
            .field("verified", &self.verified)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl User {
    /// Column list shared by every user query.
    pub const COLUMNS: &'static str = "id, email, name, password_hash, avatar, verified, created_at";

    /// Builds a user from a row selected with [`User::COLUMNS`].
    pub fn from_row(row: &Row) -> Result<Self, ReactorError> {
        Ok(Self {
            id: UserId::from_row(row, "id")?,
            email: row.get("email")?,
            name: row.get("name")?,
            password_hash: row.get("password_hash")?,
            avatar: row.get("avatar")?,
            verified: row.get("verified")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Input for creating a user.
pub struct NewUser {
    /// Optional display name.
    pub name: Option<String>,
    /// Normalized email.
    pub email: String,
    /// PHC-encoded credential hash.
    pub password_hash: String,
}

/// A persisted session, keyed by the hash of its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// SHA-256 hex of the raw token.
    pub token_hash: String,
    /// Owning user.
    pub user_id: UserId,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Column list shared by every session query.
    pub const COLUMNS: &'static str = "token_hash, user_id, created_at, expires_at";

    /// Builds a session from a row selected with [`Session::COLUMNS`].
    pub fn from_row(row: &Row) -> Result<Self, ReactorError> {
        Ok(Self {
            token_hash: row.get("token_hash")?,
            user_id: UserId::from_row(row, "user_id")?,
            created_at: row.get("created_at")?,
            expires_at: row.get("expires_at")?,
        })
    }

    /// A session is valid strictly before its expiry instant.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Normalizes an email for storage and lookup: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
