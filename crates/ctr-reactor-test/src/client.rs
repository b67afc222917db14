//! In-process HTTP test client.
//!
//! [`TestClient`] sends requests through an axum router with
//! `tower::ServiceExt::oneshot`, keeping a cookie jar between requests.
//!
//! ```rust,no_run
//! use ctr_reactor_test::client::TestClient;
//! use axum::Router;
//! use axum::routing::get;
//!
//! async fn example() {
//!     let app = Router::new().route("/hello", get(|| async { "Hello" }));
//!     let mut client = TestClient::new(app);
//!     let response = client.get("/hello").await;
//!     assert_eq!(response.status_code(), 200);
//! }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::Router;
use bytes::Bytes;
use ctr_reactor_core::ReactorError;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// A test client for simulated requests against a router.
///
/// Cookies set by responses are replayed on later requests; a
/// `Max-Age=0` cookie removes the entry.
pub struct TestClient {
    app: Router,
    cookies: HashMap<String, String>,
    headers: Vec<(String, String)>,
    peer: Option<SocketAddr>,
}

impl TestClient {
    /// Creates a client wrapping the given router.
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookies: HashMap::new(),
            headers: Vec::new(),
            peer: None,
        }
    }

    /// Sets the socket peer address seen by the server.
    #[must_use]
    pub const fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Adds a header sent with every subsequent request.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Removes every default header.
    pub fn clear_headers(&mut self) {
        self.headers.clear();
    }

    /// Sends a GET request.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None, &[]).await
    }

    /// Sends a GET request with extra headers.
    pub async fn get_with_headers(&mut self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request(Method::GET, path, None, headers).await
    }

    /// Sends a POST request with an empty body.
    pub async fn post(&mut self, path: &str) -> TestResponse {
        self.request(Method::POST, path, None, &[]).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post_json(&mut self, path: &str, body: &serde_json::Value) -> TestResponse {
        self.request(Method::POST, path, Some(body.to_string().into_bytes()), &[])
            .await
    }

    /// Sends a POST request with a raw body and content type.
    pub async fn post_raw(&mut self, path: &str, body: &str, content_type: &str) -> TestResponse {
        self.request(
            Method::POST,
            path,
            Some(body.as_bytes().to_vec()),
            &[("content-type", content_type)],
        )
        .await
    }

    /// Sets a cookie for subsequent requests.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    /// Returns a cookie from the jar.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Clears all cookies.
    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        extra_headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if body.is_some() && !extra_headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("content-type")) {
            builder = builder.header("content-type", "application/json");
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header("cookie", cookie);
        }

        let mut req = builder
            .body(axum::body::Body::from(body.unwrap_or_default()))
            .expect("request builder should not fail");
        if let Some(peer) = self.peer {
            req.extensions_mut().insert(ConnectInfo(peer));
        }

        self.send(req).await
    }

    async fn send(&mut self, req: Request<axum::body::Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(req)
            .await
            .expect("router should not error");

        let status = response.status();
        let headers = response.headers().clone();

        let mut set_cookies = Vec::new();
        for value in headers.get_all(http::header::SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                if let Some(cookie) = SetCookie::parse(raw) {
                    if cookie.is_removal() {
                        self.cookies.remove(&cookie.name);
                    } else {
                        self.cookies.insert(cookie.name.clone(), cookie.value.clone());
                    }
                    set_cookies.push(cookie);
                }
            }
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
            set_cookies,
        }
    }
}

/// A parsed `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Attributes after the name-value pair, as written.
    pub attributes: Vec<String>,
}

impl SetCookie {
    /// Parses `name=value; Attr; Attr=x`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';').map(str::trim);
        let (name, value) = parts.next()?.split_once('=')?;
        Some(Self {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            attributes: parts.filter(|p| !p.is_empty()).map(String::from).collect(),
        })
    }

    /// Returns true if the attribute (case-insensitive, without value) is present.
    pub fn has(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| {
            a.split('=')
                .next()
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(attribute))
        })
    }

    /// Returns the value of an attribute like `Max-Age`.
    pub fn attribute(&self, attribute: &str) -> Option<&str> {
        self.attributes.iter().find_map(|a| {
            let (name, value) = a.split_once('=')?;
            name.trim().eq_ignore_ascii_case(attribute).then_some(value.trim())
        })
    }

    /// Whether this header tells the client to drop the cookie.
    pub fn is_removal(&self) -> bool {
        self.attribute("Max-Age").is_some_and(|v| v == "0")
    }
}

/// The response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Vec<u8>,
    /// Cookies set by the response.
    pub set_cookies: Vec<SetCookie>,
}

impl TestResponse {
    /// Returns the body as a UTF-8 string.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ReactorError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ReactorError::SerializationError(e.to_string()))
    }

    /// Returns the numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the value of a header by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Set-Cookie` entry for a cookie name.
    pub fn set_cookie(&self, name: &str) -> Option<&SetCookie> {
        self.set_cookies.iter().find(|c| c.name == name)
    }
}
