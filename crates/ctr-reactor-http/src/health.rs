//! `GET /health`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::server::AppState;

/// Reports whether the user store answers.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let store = state.sessions.store();
    let backend = store.vendor();
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "backend": backend })),
        ),
        Err(e) => {
            tracing::error!(error = %e, backend, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable", "backend": backend })),
            )
        }
    }
}
