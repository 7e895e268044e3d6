//! Error replies of the sink.
//!
//! Every failure is answered the same way: HTTP 500 with `{status:"error", message}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::sync::Ack;

#[derive(Debug)]
pub enum ApiError {
    /// The body was not JSON.
    MalformedBody(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::MalformedBody(msg) => format!("malformed request body: {msg}"),
        };
        error!(target: "linkpilot::server", %message, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(Ack::error(message))).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedBody(err.to_string())
    }
}
