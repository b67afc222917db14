//! Conversion of [`ReactorError`] into HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ctr_reactor_core::{ReactorError, ValidationError};

/// An error returned from a handler. Renders as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub ReactorError);

impl From<ReactorError> for ApiError {
    fn from(err: ReactorError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(
            ValidationError::new(
                format!("Invalid request body: {}", rejection.body_text()),
                "invalid_body",
            )
            .into(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(serde_json::json!({ "message": self.0.public_message() })),
        )
            .into_response()
    }
}
