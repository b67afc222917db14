//! Error types for ctr-reactor.
//!
//! [`ReactorError`] is the single taxonomy used across the workspace. The
//! authentication variants (`DuplicateEmail`, `InvalidCredentials`, ...) are
//! what HTTP callers see; the storage variants (`DatabaseError`,
//! `IntegrityError`, ...) are produced by the backends and translated by the
//! session layer before they reach a response.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A validation failure on a single input.
///
/// # Examples
///
/// ```
/// use ctr_reactor_core::error::ValidationError;
///
/// let err = ValidationError::new("Enter a valid email address.", "invalid_email")
///     .for_field("email");
/// assert_eq!(err.field.as_deref(), Some("email"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The human-readable message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "password_too_short").
    pub code: String,
    /// The input field the error refers to, if any.
    pub field: Option<String>,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field: None,
            params: HashMap::new(),
        }
    }

    /// Attaches the name of the offending field.
    #[must_use]
    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for ctr-reactor.
///
/// Each variant maps to an HTTP status code via [`ReactorError::status_code`]
/// and to a client-safe message via [`ReactorError::public_message`].
#[derive(Error, Debug)]
pub enum ReactorError {
    // ── Authentication ───────────────────────────────────────────────

    /// Malformed input: bad email, weak or empty password, bad JSON.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    /// A user with this email already exists.
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password. Deliberately undifferentiated.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session token, or the token is unknown or expired.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The caller is identified but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The resource does not exist, or the caller must not learn that it does.
    #[error("Not found")]
    NotFound,

    /// No user store could be reached.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    // ── Storage ──────────────────────────────────────────────────────

    /// A query expected one row and found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// An operational database error (connection failure, pool timeout).
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Configuration and plumbing ───────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A signed value failed verification or has expired.
    #[error("Bad signature: {0}")]
    BadSignature(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Anything else that should surface as a 500.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReactorError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `ValidationError` -> 400
    /// - `InvalidCredentials`, `Unauthenticated` -> 401
    /// - `Forbidden`, `BadSignature` -> 403
    /// - `NotFound`, `DoesNotExist` -> 404
    /// - `DuplicateEmail` -> 409
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) => 400,
            Self::InvalidCredentials | Self::Unauthenticated => 401,
            Self::Forbidden(_) | Self::BadSignature(_) => 403,
            Self::NotFound | Self::DoesNotExist(_) => 404,
            Self::DuplicateEmail => 409,
            Self::BackendUnavailable(_)
            | Self::DatabaseError(_)
            | Self::IntegrityError(_)
            | Self::OperationalError(_)
            | Self::ConfigurationError(_)
            | Self::SerializationError(_)
            | Self::InternalServerError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns the message that may be shown to an HTTP client.
    ///
    /// Never contains storage details and never reveals whether an email
    /// is registered beyond what `DuplicateEmail` itself implies.
    pub fn public_message(&self) -> String {
        match self {
            Self::ValidationError(err) => err.message.clone(),
            Self::DuplicateEmail => "An account with this email already exists".to_string(),
            Self::InvalidCredentials => "invalid credentials".to_string(),
            Self::Unauthenticated => "not authenticated".to_string(),
            Self::Forbidden(_) | Self::BadSignature(_) => "forbidden".to_string(),
            Self::NotFound | Self::DoesNotExist(_) => "not found".to_string(),
            Self::BackendUnavailable(_)
            | Self::DatabaseError(_)
            | Self::IntegrityError(_)
            | Self::OperationalError(_)
            | Self::ConfigurationError(_)
            | Self::SerializationError(_)
            | Self::InternalServerError(_)
            | Self::IoError(_) => "internal server error".to_string(),
        }
    }

    /// Whether this error originated in the storage layer.
    pub const fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_)
                | Self::IntegrityError(_)
                | Self::OperationalError(_)
                | Self::DoesNotExist(_)
                | Self::BackendUnavailable(_)
        )
    }
}

impl From<ValidationError> for ReactorError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, ReactorError>`.
pub type ReactorResult<T> = Result<T, ReactorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_simple() {
        let err = ValidationError::new("This field is required.", "required");
        assert_eq!(err.to_string(), "This field is required.");
    }

    #[test]
    fn test_validation_error_display_with_field() {
        let err = ValidationError::new("Enter a valid email address.", "invalid_email")
            .for_field("email");
        assert_eq!(err.to_string(), "email: Enter a valid email address.");
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Too short.", "password_too_short").with_param("min", "8");
        assert_eq!(err.params.get("min").unwrap(), "8");
    }

    #[test]
    fn test_reactor_error_status_codes() {
        assert_eq!(
            ReactorError::ValidationError(ValidationError::new("x", "y")).status_code(),
            400
        );
        assert_eq!(ReactorError::DuplicateEmail.status_code(), 409);
        assert_eq!(ReactorError::InvalidCredentials.status_code(), 401);
        assert_eq!(ReactorError::Unauthenticated.status_code(), 401);
        assert_eq!(ReactorError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(ReactorError::NotFound.status_code(), 404);
        assert_eq!(ReactorError::BackendUnavailable("x".into()).status_code(), 500);
        assert_eq!(ReactorError::DatabaseError("x".into()).status_code(), 500);
        assert_eq!(ReactorError::IntegrityError("x".into()).status_code(), 500);
        assert_eq!(ReactorError::DoesNotExist("x".into()).status_code(), 404);
    }

    #[test]
    fn test_public_message_hides_storage_details() {
        let err = ReactorError::DatabaseError("relation \"users\" does not exist".into());
        assert_eq!(err.public_message(), "internal server error");
        let err = ReactorError::BackendUnavailable("connection refused to 10.0.0.5".into());
        assert!(!err.public_message().contains("10.0.0.5"));
    }

    #[test]
    fn test_public_message_invalid_credentials_is_generic() {
        assert_eq!(ReactorError::InvalidCredentials.public_message(), "invalid credentials");
    }

    #[test]
    fn test_is_storage() {
        assert!(ReactorError::IntegrityError("x".into()).is_storage());
        assert!(ReactorError::OperationalError("x".into()).is_storage());
        assert!(!ReactorError::InvalidCredentials.is_storage());
    }

    #[test]
    fn test_from_validation_error() {
        let err: ReactorError = ValidationError::new("bad", "invalid").into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.public_message(), "bad");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ReactorError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }
}
