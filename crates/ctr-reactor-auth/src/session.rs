//! Session manager: signup, login, session resolution and logout.
//!
//! The manager owns the translation from storage failures to the public
//! error taxonomy. Callers only ever see `ValidationError`,
//! `DuplicateEmail`, `InvalidCredentials`, `Unauthenticated` or
//! `BackendUnavailable` from here, plus `ConfigurationError` when the
//! session lifetime cannot be represented.
//!
//! Plaintext passwords and raw tokens are never logged.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ctr_reactor_core::settings::MAX_AGE_LIMIT_SECS;
use ctr_reactor_core::{ReactorError, ReactorResult, Settings};

use crate::hashers::CredentialHasher;
use crate::store::UserStore;
use crate::tokens::{generate_token, hash_token};
use crate::user::{normalize_email, NewUser, User};
use crate::validators::{validate_email, validate_name, validate_password};

/// A freshly issued session. The raw token exists only here.
#[derive(Clone)]
pub struct IssuedSession {
    /// The raw bearer token to hand to the client.
    pub token: String,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedSession")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of a signup.
///
/// `session` is `None` when the user was created but the session could not
/// be stored; the caller should treat the signup as successful and let the
/// user log in.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    /// The created user.
    pub user: User,
    /// The session issued alongside, if it could be stored.
    pub session: Option<IssuedSession>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated user.
    pub user: User,
    /// The new session.
    pub session: IssuedSession,
}

/// Creates, validates and revokes sessions over a [`UserStore`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    max_age: Duration,
    min_password_length: usize,
}

impl SessionManager {
    /// Creates a manager with an explicit session lifetime.
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        max_age: Duration,
        min_password_length: usize,
    ) -> Self {
        Self {
            store,
            hasher,
            max_age,
            min_password_length,
        }
    }

    /// Creates a manager configured from settings.
    ///
    /// The session lifetime is capped at [`MAX_AGE_LIMIT_SECS`].
    pub fn from_settings(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        settings: &Settings,
    ) -> Self {
        let secs = settings.session.max_age_secs.min(MAX_AGE_LIMIT_SECS);
        Self::new(
            store,
            hasher,
            Duration::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX))
                .unwrap_or_else(|| Duration::days(7)),
            settings.session.min_password_length,
        )
    }

    /// The store this manager writes to.
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// The configured session lifetime.
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Registers a user and, when possible, opens a first session.
    pub async fn signup(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> ReactorResult<SignupOutcome> {
        let user = self.create_user(name, email, password).await?;
        tracing::info!(user_id = %user.id, "user signed up");

        let session = match self.issue_session(&user).await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    user_id = %user.id,
                    error = %e,
                    "user created but session could not be stored"
                );
                None
            }
        };

        Ok(SignupOutcome { user, session })
    }

    /// Validates input and stores a new user without opening a session.
    pub async fn create_user(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> ReactorResult<User> {
        let email = normalize_email(email);
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        validate_email(&email)?;
        validate_name(name)?;
        validate_password(password, self.min_password_length)?;

        let password_hash = self.hasher.hash(password).await?;
        self.store
            .create_user(NewUser {
                name: name.map(String::from),
                email,
                password_hash,
            })
            .await
            .map_err(|e| storage_failure("create user", e))
    }

    /// Authenticates by email and password and opens a new session.
    ///
    /// Unknown emails and wrong passwords produce the same error, and both
    /// paths spend one key-derivation evaluation.
    pub async fn login(&self, email: &str, password: &str) -> ReactorResult<LoginOutcome> {
        let email = normalize_email(email);
        let found = self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(|e| storage_failure("find user", e))?;

        let Some(user) = found else {
            // Equalize timing with the found-user path; the result is irrelevant.
            let _ = self.hasher.hash(password).await;
            tracing::warn!("login failed");
            return Err(ReactorError::InvalidCredentials);
        };

        if password.is_empty() || !self.hasher.verify(password, &user.password_hash).await {
            tracing::warn!(user_id = %user.id, "login failed");
            return Err(ReactorError::InvalidCredentials);
        }

        if self.hasher.must_update(&user.password_hash) {
            self.upgrade_hash(&user, password).await;
        }

        let session = self
            .issue_session(&user)
            .await
            .map_err(|e| storage_failure("create session", e))?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok(LoginOutcome { user, session })
    }

    /// Maps a raw bearer token to its user.
    ///
    /// Empty, unknown, garbled or expired tokens all yield `Unauthenticated`.
    pub async fn resolve_session(&self, token: &str) -> ReactorResult<User> {
        self.resolve_session_at(token, Utc::now()).await
    }

    /// Like [`resolve_session`](Self::resolve_session) with an explicit clock.
    pub async fn resolve_session_at(&self, token: &str, now: DateTime<Utc>) -> ReactorResult<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ReactorError::Unauthenticated);
        }

        let session = self
            .store
            .find_session_by_token_hash(&hash_token(token))
            .await
            .map_err(|e| storage_failure("find session", e))?
            .ok_or(ReactorError::Unauthenticated)?;

        if !session.is_valid(now) {
            tracing::debug!(user_id = %session.user_id, "session expired");
            return Err(ReactorError::Unauthenticated);
        }

        self.store
            .find_user_by_id(&session.user_id)
            .await
            .map_err(|e| storage_failure("find user", e))?
            .ok_or(ReactorError::Unauthenticated)
    }

    /// Revokes the session for a raw token. Idempotent.
    pub async fn logout(&self, token: &str) -> ReactorResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(());
        }
        self.store
            .delete_session(&hash_token(token))
            .await
            .map_err(|e| storage_failure("delete session", e))?;
        tracing::info!("session revoked");
        Ok(())
    }

    /// Physically removes expired sessions. Returns the number removed.
    pub async fn clear_expired_sessions(&self) -> ReactorResult<u64> {
        let removed = self
            .store
            .delete_expired_sessions(Utc::now())
            .await
            .map_err(|e| storage_failure("clear sessions", e))?;
        tracing::info!(removed, "expired sessions cleared");
        Ok(removed)
    }

    async fn issue_session(&self, user: &User) -> ReactorResult<IssuedSession> {
        let token = generate_token();
        let expires_at = Utc::now().checked_add_signed(self.max_age).ok_or_else(|| {
            ReactorError::ConfigurationError("session lifetime out of range".to_string())
        })?;
        self.store
            .create_session(&user.id, &hash_token(&token), expires_at)
            .await?;
        Ok(IssuedSession { token, expires_at })
    }

    async fn upgrade_hash(&self, user: &User, password: &str) {
        let result = match self.hasher.hash(password).await {
            Ok(new_hash) => self.store.update_password_hash(&user.id, &new_hash).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::info!(user_id = %user.id, "credential hash upgraded"),
            Err(e) => tracing::warn!(user_id = %user.id, error = %e, "credential hash upgrade failed"),
        }
    }
}

/// Logs a storage error and replaces it with its public counterpart.
fn storage_failure(operation: &str, err: ReactorError) -> ReactorError {
    if err.is_storage() {
        tracing::error!(operation, error = %err, "user store failure");
        ReactorError::BackendUnavailable(format!("{operation} failed"))
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashers::Argon2Hasher;
    use crate::store::SqliteUserStore;
    use crate::user::{Session, UserId};
    use async_trait::async_trait;

    async fn manager_with_max_age(max_age: Duration) -> SessionManager {
        let store = SqliteUserStore::memory().unwrap();
        store.migrate().await.unwrap();
        SessionManager::new(
            Arc::new(store),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()),
            max_age,
            8,
        )
    }

    async fn manager() -> SessionManager {
        manager_with_max_age(Duration::days(7)).await
    }

    #[tokio::test]
    async fn test_signup_login_resolve_same_user() {
        let mgr = manager().await;
        let signup = mgr
            .signup(Some("Ada"), "Ada@Example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(signup.user.email, "ada@example.com");
        assert!(signup.session.is_some());

        let login = mgr.login("ada@example.com", "correct horse").await.unwrap();
        assert_eq!(login.user.id, signup.user.id);

        let resolved = mgr.resolve_session(&login.session.token).await.unwrap();
        assert_eq!(resolved.id, signup.user.id);
        assert_eq!(resolved.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_signup_session_resolves() {
        let mgr = manager().await;
        let signup = mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        let token = signup.session.unwrap().token;
        assert_eq!(mgr.resolve_session(&token).await.unwrap().id, signup.user.id);
    }

    #[tokio::test]
    async fn test_create_user_opens_no_session() {
        let mgr = manager_with_max_age(Duration::seconds(-1)).await;
        mgr.create_user(Some("  "), "Ops@B.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(mgr.clear_expired_sessions().await.unwrap(), 0);
        let user = mgr.login("ops@b.com", "correct horse").await.unwrap().user;
        assert_eq!(user.name, None);
    }

    #[tokio::test]
    async fn test_password_hash_is_stored_not_plaintext() {
        let mgr = manager().await;
        let signup = mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        assert_ne!(signup.user.password_hash, "correct horse");
        assert!(signup.user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_duplicate_signup_keeps_first_session() {
        let mgr = manager().await;
        let first = mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        let token = first.session.unwrap().token;

        let err = mgr.signup(None, "A@B.com ", "another pass").await.unwrap_err();
        assert!(matches!(err, ReactorError::DuplicateEmail));

        assert_eq!(mgr.resolve_session(&token).await.unwrap().id, first.user.id);
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let mgr = manager().await;
        let err = mgr.signup(None, "not-an-email", "correct horse").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = mgr.signup(None, "a@b.com", "short").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = mgr.signup(None, "a@b.com", "").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_are_identical() {
        let mgr = manager().await;
        mgr.signup(None, "a@b.com", "correct horse").await.unwrap();

        let wrong = mgr.login("a@b.com", "wrong horse").await.unwrap_err();
        let unknown = mgr.login("nobody@b.com", "correct horse").await.unwrap_err();
        assert!(matches!(wrong, ReactorError::InvalidCredentials));
        assert!(matches!(unknown, ReactorError::InvalidCredentials));
        assert_eq!(wrong.public_message(), unknown.public_message());
    }

    #[tokio::test]
    async fn test_login_empty_password() {
        let mgr = manager().await;
        mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        let err = mgr.login("a@b.com", "").await.unwrap_err();
        assert!(matches!(err, ReactorError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_issues_distinct_sessions() {
        let mgr = manager().await;
        mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        let one = mgr.login("a@b.com", "correct horse").await.unwrap();
        let two = mgr.login("a@b.com", "correct horse").await.unwrap();
        assert_ne!(one.session.token, two.session.token);
        assert!(mgr.resolve_session(&one.session.token).await.is_ok());
        assert!(mgr.resolve_session(&two.session.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_garbage_tokens() {
        let mgr = manager().await;
        for token in ["", "   ", "not-a-token", "zzzz\u{0}zz"] {
            let err = mgr.resolve_session(token).await.unwrap_err();
            assert!(matches!(err, ReactorError::Unauthenticated), "token {token:?}");
        }
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthenticated_but_row_remains() {
        let mgr = manager_with_max_age(Duration::seconds(1)).await;
        let signup = mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        let session = signup.session.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;

        let err = mgr.resolve_session(&session.token).await.unwrap_err();
        assert!(matches!(err, ReactorError::Unauthenticated));

        let row = mgr
            .store()
            .find_session_by_token_hash(&hash_token(&session.token))
            .await
            .unwrap();
        assert!(row.is_some());
    }

    #[tokio::test]
    async fn test_resolve_at_expiry_boundary() {
        let mgr = manager().await;
        let signup = mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        let session = signup.session.unwrap();
        let just_before = session.expires_at - Duration::milliseconds(1);
        assert!(mgr.resolve_session_at(&session.token, just_before).await.is_ok());
        assert!(mgr
            .resolve_session_at(&session.token, session.expires_at)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let mgr = manager().await;
        let signup = mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        let token = signup.session.unwrap().token;

        mgr.logout(&token).await.unwrap();
        mgr.logout(&token).await.unwrap();
        mgr.logout("").await.unwrap();
        assert!(matches!(
            mgr.resolve_session(&token).await,
            Err(ReactorError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_clear_expired_sessions() {
        let mgr = manager_with_max_age(Duration::seconds(-1)).await;
        mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        mgr.login("a@b.com", "correct horse").await.unwrap();
        assert_eq!(mgr.clear_expired_sessions().await.unwrap(), 2);
        assert_eq!(mgr.clear_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_login_upgrades_outdated_hash() {
        let store = SqliteUserStore::memory().unwrap();
        store.migrate().await.unwrap();
        let store: Arc<dyn UserStore> = Arc::new(store);

        let weak = SessionManager::new(
            store.clone(),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()),
            Duration::days(1),
            8,
        );
        let user = weak.signup(None, "a@b.com", "correct horse").await.unwrap().user;

        let stronger = SessionManager::new(
            store.clone(),
            Arc::new(Argon2Hasher::with_params(2048, 1, 1).unwrap()),
            Duration::days(1),
            8,
        );
        stronger.login("a@b.com", "correct horse").await.unwrap();

        let reloaded = store.find_user_by_id(&user.id).await.unwrap().unwrap();
        assert_ne!(reloaded.password_hash, user.password_hash);
        assert!(reloaded.password_hash.contains("m=2048"));
        stronger.login("a@b.com", "correct horse").await.unwrap();
    }

    #[tokio::test]
    async fn test_from_settings_caps_session_lifetime() {
        let store = SqliteUserStore::memory().unwrap();
        let mut settings = Settings::default();
        settings.session.max_age_secs = 1_000_000_000_000_000;
        let mgr = SessionManager::from_settings(
            Arc::new(store),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()),
            &settings,
        );
        assert_eq!(
            mgr.max_age(),
            Duration::seconds(i64::try_from(MAX_AGE_LIMIT_SECS).unwrap())
        );
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_an_error_not_a_panic() {
        let mgr = manager_with_max_age(Duration::milliseconds(i64::MAX)).await;

        let signup = mgr.signup(None, "far@future.com", "correct horse").await.unwrap();
        assert!(signup.session.is_none());

        let err = mgr.login("far@future.com", "correct horse").await.unwrap_err();
        assert!(matches!(err, ReactorError::ConfigurationError(_)));
    }

    #[test]
    fn test_issued_session_debug_redacts_token() {
        let issued = IssuedSession {
            token: "deadbeef".to_string(),
            expires_at: Utc::now(),
        };
        assert!(!format!("{issued:?}").contains("deadbeef"));
    }

    /// A store whose session table is broken.
    struct NoSessionStore {
        inner: SqliteUserStore,
    }

    #[async_trait]
    impl UserStore for NoSessionStore {
        fn vendor(&self) -> &'static str {
            "sqlite"
        }
        async fn migrate(&self) -> ReactorResult<()> {
            self.inner.migrate().await
        }
        async fn ping(&self) -> ReactorResult<()> {
            self.inner.ping().await
        }
        async fn create_user(&self, new_user: NewUser) -> ReactorResult<User> {
            self.inner.create_user(new_user).await
        }
        async fn find_user_by_email(&self, email: &str) -> ReactorResult<Option<User>> {
            self.inner.find_user_by_email(email).await
        }
        async fn find_user_by_id(&self, id: &UserId) -> ReactorResult<Option<User>> {
            self.inner.find_user_by_id(id).await
        }
        async fn update_password_hash(&self, id: &UserId, hash: &str) -> ReactorResult<()> {
            self.inner.update_password_hash(id, hash).await
        }
        async fn create_session(
            &self,
            _user_id: &UserId,
            _token_hash: &str,
            _expires_at: DateTime<Utc>,
        ) -> ReactorResult<Session> {
            Err(ReactorError::OperationalError("disk full".to_string()))
        }
        async fn find_session_by_token_hash(&self, _: &str) -> ReactorResult<Option<Session>> {
            Err(ReactorError::OperationalError("disk full".to_string()))
        }
        async fn delete_session(&self, _: &str) -> ReactorResult<()> {
            Err(ReactorError::OperationalError("disk full".to_string()))
        }
        async fn delete_expired_sessions(&self, _: DateTime<Utc>) -> ReactorResult<u64> {
            Ok(0)
        }
    }

    async fn broken_session_manager() -> SessionManager {
        let inner = SqliteUserStore::memory().unwrap();
        inner.migrate().await.unwrap();
        SessionManager::new(
            Arc::new(NoSessionStore { inner }),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()),
            Duration::days(1),
            8,
        )
    }

    #[tokio::test]
    async fn test_signup_succeeds_without_session_when_session_store_fails() {
        let mgr = broken_session_manager().await;
        let outcome = mgr.signup(None, "a@b.com", "correct horse").await.unwrap();
        assert!(outcome.session.is_none());
        assert!(mgr
            .store()
            .find_user_by_email("a@b.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_storage_failures_become_backend_unavailable() {
        let mgr = broken_session_manager().await;
        mgr.signup(None, "a@b.com", "correct horse").await.unwrap();

        let err = mgr.login("a@b.com", "correct horse").await.unwrap_err();
        assert!(matches!(err, ReactorError::BackendUnavailable(_)));
        assert!(!err.public_message().contains("disk full"));

        let err = mgr.resolve_session("sometoken").await.unwrap_err();
        assert!(matches!(err, ReactorError::BackendUnavailable(_)));

        let err = mgr.logout("sometoken").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
