//! Cookie parsing and `Set-Cookie` formatting.
//!
//! Both the session cookie and the admin cookie share one contract:
//! `HttpOnly`, `SameSite=Lax`, `Path=/`, `Secure` outside debug mode and an
//! explicit `Max-Age`. Clearing a cookie sets `Max-Age=0`.

use std::collections::HashMap;

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;

/// An auth cookie to be set on a response.
#[derive(Debug, Clone)]
pub struct Cookie {
    /// The cookie name.
    pub name: String,
    /// The cookie value.
    pub value: String,
    /// Maximum age in seconds. Zero tells the client to drop the cookie.
    pub max_age: u64,
    /// Whether the cookie is only sent over HTTPS.
    pub secure: bool,
}

impl Cookie {
    /// Creates a cookie following the auth cookie contract.
    pub fn auth(name: impl Into<String>, value: impl Into<String>, max_age: u64, secure: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age,
            secure,
        }
    }

    /// Creates an empty auth cookie that tells the client to drop it.
    pub fn cleared(name: impl Into<String>, secure: bool) -> Self {
        Self::auth(name, "", 0, secure)
    }

    /// Formats this cookie as a `Set-Cookie` header value.
    pub fn to_set_cookie_header(&self) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, self.value),
            format!("Max-Age={}", self.max_age),
            "Path=/".to_string(),
        ];
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.push("HttpOnly".to_string());
        parts.push("SameSite=Lax".to_string());
        parts.join("; ")
    }
}

/// Parses a `Cookie` header value into name-value pairs.
///
/// Malformed entries are skipped.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for part in header.split(';') {
        let trimmed = part.trim();
        if let Some((name, value)) = trimmed.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    cookies
}

/// Returns the value of the named cookie across all `Cookie` headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|header| parse_cookie_header(header).remove(name))
        .last()
}

/// Returns the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
