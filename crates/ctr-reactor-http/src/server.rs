//! Application state, router assembly and the HTTP server.
//!
//! [`ReactorApp`] combines settings, the selected user store and the hasher
//! into one axum router. The store is resolved once by the caller and then
//! shared by every request.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use ctr_reactor_auth::{connect_store, Argon2Hasher};
//! use ctr_reactor_core::Settings;
//! use ctr_reactor_http::ReactorApp;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let store = connect_store(&settings.database).await?;
//! store.migrate().await?;
//! let app = ReactorApp::new(settings, store, Arc::new(Argon2Hasher::default()))?;
//! // app.run("127.0.0.1:3000").await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ctr_reactor_auth::{AdminGate, CredentialHasher, SessionManager, UserStore};
use ctr_reactor_core::{ReactorError, ReactorResult, Settings};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::{admin, auth, health};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Immutable process settings.
    pub settings: Arc<Settings>,
    /// Session manager over the selected store.
    pub sessions: SessionManager,
    /// The admin gate.
    pub admin: Arc<AdminGate>,
}

impl AppState {
    /// Builds the state from settings, a store and a hasher.
    pub fn new(
        settings: Settings,
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> ReactorResult<Self> {
        let admin = AdminGate::from_settings(&settings)?;
        let sessions = SessionManager::from_settings(store, hasher, &settings);
        Ok(Self {
            settings: Arc::new(settings),
            sessions,
            admin: Arc::new(admin),
        })
    }

    /// Whether cookies carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.settings.secure_cookies()
    }
}

/// The ctr-reactor HTTP application.
pub struct ReactorApp {
    state: AppState,
}

impl ReactorApp {
    /// Creates the application.
    pub fn new(
        settings: Settings,
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> ReactorResult<Self> {
        AppState::new(settings, store, hasher).map(Self::from_state)
    }

    /// Creates the application from prepared state.
    pub const fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Returns the shared state.
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Converts the application into an axum router.
    ///
    /// The admin filter wraps the whole router so that it also sees
    /// `/admin/*` paths that match no route.
    pub fn into_axum_router(self) -> Router {
        let state = self.state;
        Router::new()
            .route("/signup", post(auth::signup))
            .route("/login", post(auth::login))
            .route("/logout", post(auth::logout))
            .route("/me", get(auth::me))
            .route("/admin-access", get(admin::access_by_query))
            .route("/admin-access/{secret}", get(admin::access_by_path))
            .route("/admin", get(admin::index))
            .route("/admin/logout", post(admin::logout))
            .route("/health", get(health::health))
            .fallback(not_found)
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                admin::admin_filter,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Binds to `addr` and serves until the process is stopped.
    pub async fn run(self, addr: &str) -> ReactorResult<()> {
        let debug = self.state.settings.debug;
        let router = self.into_axum_router();
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ReactorError::ConfigurationError(format!("Failed to bind to {addr}: {e}"))
        })?;

        if debug {
            tracing::info!("Starting development server at http://{addr}/");
        } else {
            tracing::info!(addr, "listening");
        }

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| ReactorError::InternalServerError(format!("Server error: {e}")))
    }
}

impl std::fmt::Debug for ReactorApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactorApp")
            .field("backend", &self.state.sessions.store().vendor())
            .field("admin_enabled", &self.state.admin.is_enabled())
            .field("debug", &self.state.settings.debug)
            .finish_non_exhaustive()
    }
}

async fn not_found() -> ApiError {
    ApiError(ReactorError::NotFound)
}
