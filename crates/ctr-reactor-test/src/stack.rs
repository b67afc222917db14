//! A complete application wired for tests.
//!
//! [`TestStack`] builds the router over a fresh in-memory `SQLite` store with
//! cheap Argon2 parameters, so each test owns an isolated database.

use std::sync::Arc;

use axum::Router;
use ctr_reactor_auth::{Argon2Hasher, CredentialHasher, SqliteUserStore, UserStore};
use ctr_reactor_core::{ReactorResult, Settings};
use ctr_reactor_http::{AppState, ReactorApp};

use crate::client::TestClient;

/// Secret key used by test settings.
pub const TEST_SECRET_KEY: &str = "ctr-reactor-test-secret-key";

/// Settings suitable for tests: debug mode and a fixed secret key.
pub fn test_settings() -> Settings {
    Settings {
        debug: true,
        secret_key: TEST_SECRET_KEY.to_string(),
        ..Settings::default()
    }
}

/// A hasher with minimal Argon2 cost.
pub fn cheap_hasher() -> Arc<dyn CredentialHasher> {
    Arc::new(Argon2Hasher::with_params(1024, 1, 1).expect("valid argon2 parameters"))
}

/// An application with its state, ready for requests.
pub struct TestStack {
    state: AppState,
}

impl TestStack {
    /// Builds a stack with [`test_settings`].
    pub async fn new() -> ReactorResult<Self> {
        Self::with_settings(test_settings()).await
    }

    /// Builds a stack with the given settings over a migrated in-memory store.
    pub async fn with_settings(settings: Settings) -> ReactorResult<Self> {
        let store = SqliteUserStore::memory()?;
        store.migrate().await?;
        Self::with_store(settings, Arc::new(store))
    }

    /// Builds a stack over an existing store.
    pub fn with_store(settings: Settings, store: Arc<dyn UserStore>) -> ReactorResult<Self> {
        let state = AppState::new(settings, store, cheap_hasher())?;
        Ok(Self { state })
    }

    /// The shared application state.
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// A fresh router over this stack's state.
    pub fn router(&self) -> Router {
        ReactorApp::from_state(self.state.clone()).into_axum_router()
    }

    /// A client with an empty cookie jar.
    pub fn client(&self) -> TestClient {
        TestClient::new(self.router())
    }
}
