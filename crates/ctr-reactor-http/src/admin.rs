//! Admin gate routes and the `/admin` request filter.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Path, Query, Request, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ctr_reactor_auth::AdminRequest;
use serde::Deserialize;

use crate::auth::current_user;
use crate::cookies::{get_cookie, Cookie};
use crate::error::ApiError;
use crate::server::AppState;

const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Query of `GET /admin-access?key=`.
#[derive(Debug, Default, Deserialize)]
pub struct AccessQuery {
    pub key: Option<String>,
}

/// `GET /admin-access/{secret}`
pub async fn access_by_path(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    grant(&state, Some(&secret), &request)
}

/// `GET /admin-access?key=`
pub async fn access_by_query(
    State(state): State<AppState>,
    Query(query): Query<AccessQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    grant(&state, query.key.as_deref(), &request)
}

fn grant(state: &AppState, secret: Option<&str>, request: &Request) -> Result<Response, ApiError> {
    let password = request
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok());
    let value = state.admin.authorize(&AdminRequest {
        secret,
        client_ip: client_ip(request, state.admin.trust_forwarded_for()),
        password,
    })?;

    let cookie = Cookie::auth(
        state.admin.cookie_name(),
        value,
        state.admin.cookie_max_age_secs(),
        state.secure_cookies(),
    );
    Ok(redirect_with_cookie("/admin", Some(&cookie)))
}

/// `GET /admin`
pub async fn index(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "admin": true,
        "backend": state.sessions.store().vendor(),
    }))
}

/// `POST /admin/logout`
pub async fn logout(State(state): State<AppState>) -> Response {
    let cleared = Cookie::cleared(state.admin.cookie_name(), state.secure_cookies());
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cleared.to_set_cookie_header()) {
        headers.insert(SET_COOKIE, value);
    }
    (
        StatusCode::OK,
        headers,
        Json(serde_json::json!({ "message": "logged out" })),
    )
        .into_response()
}

/// Lets `/admin` and `/admin/*` through only with a valid admin cookie.
///
/// Everything else on those paths is redirected to `/`. Other paths pass
/// untouched.
pub async fn admin_filter(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !is_admin_path(request.uri().path()) {
        return next.run(request).await;
    }

    let cookie = get_cookie(request.headers(), state.admin.cookie_name());
    if !state.admin.verify_cookie(cookie.as_deref()) {
        tracing::debug!(path = request.uri().path(), "admin filter redirect: no admin cookie");
        return redirect_with_cookie("/", None);
    }

    if state.admin.require_session() && current_user(&state, request.headers()).await.is_err() {
        tracing::debug!(path = request.uri().path(), "admin filter redirect: no user session");
        return redirect_with_cookie("/", None);
    }

    next.run(request).await
}

fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

/// Resolves the client address.
///
/// With `trust_forwarded_for` the right-most `X-Forwarded-For` hop is used:
/// it is the one appended by the proxy in front of us, while earlier hops are
/// whatever the client sent. Otherwise only the socket peer counts.
pub fn client_ip(request: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .last()
            .and_then(|v| v.rsplit(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Builds a `302 Found` response.
fn redirect_with_cookie(location: &'static str, cookie: Option<&Cookie>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, HeaderValue::from_static(location));
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c.to_set_cookie_header()).ok()) {
        headers.insert(SET_COOKIE, value);
    }
    (StatusCode::FOUND, headers).into_response()
}
