//! Auth endpoints: signup, login, logout and the current user.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ctr_reactor_auth::{IssuedSession, User};
use ctr_reactor_core::{ReactorError, ReactorResult};
use serde::{Deserialize, Serialize};

use crate::cookies::{bearer_token, get_cookie, Cookie};
use crate::error::ApiError;
use crate::server::AppState;

/// Body of `POST /signup`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Body of `POST /login`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by signup and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub session_token: Option<String>,
}

/// Body returned by `GET /me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

/// `POST /signup`
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let outcome = state
        .sessions
        .signup(payload.name.as_deref(), &payload.email, &payload.password)
        .await?;

    let mut headers = HeaderMap::new();
    if let Some(session) = &outcome.session {
        headers.insert(SET_COOKIE, session_cookie(&state, session)?);
    }
    let body = AuthResponse {
        user: outcome.user,
        session_token: outcome.session.map(|s| s.token),
    };
    Ok((StatusCode::CREATED, headers, Json(body)).into_response())
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let outcome = state
        .sessions
        .login(&payload.email, &payload.password)
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie(&state, &outcome.session)?);
    let body = AuthResponse {
        user: outcome.user,
        session_token: Some(outcome.session.token),
    };
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// `POST /logout`
///
/// Always answers 200 and clears the cookie, even when revocation fails.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = presented_token(&state, &headers) {
        if let Err(e) = state.sessions.logout(&token).await {
            tracing::warn!(error = %e, "session revocation failed during logout");
        }
    }

    let cleared = Cookie::cleared(&state.settings.session.cookie_name, state.secure_cookies());
    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cleared.to_set_cookie_header()) {
        response_headers.insert(SET_COOKIE, value);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(serde_json::json!({ "message": "logged out" })),
    )
        .into_response()
}

/// `GET /me`
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(MeResponse { user }))
}

/// Resolves the user behind the request's session cookie or bearer token.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> ReactorResult<User> {
    let token = presented_token(state, headers).ok_or(ReactorError::Unauthenticated)?;
    state.sessions.resolve_session(&token).await
}

/// The session cookie wins over the `Authorization` header.
fn presented_token(state: &AppState, headers: &HeaderMap) -> Option<String> {
    get_cookie(headers, &state.settings.session.cookie_name)
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(headers))
}

fn session_cookie(state: &AppState, session: &IssuedSession) -> ReactorResult<HeaderValue> {
    let cookie = Cookie::auth(
        &state.settings.session.cookie_name,
        &session.token,
        state.settings.session.max_age_secs,
        state.secure_cookies(),
    );
    HeaderValue::from_str(&cookie.to_set_cookie_header())
        .map_err(|e| ReactorError::InternalServerError(format!("invalid cookie header: {e}")))
}
