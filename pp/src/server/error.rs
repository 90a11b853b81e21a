//! HTTP error mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::plan::RequestError;

/// Errors a handler can return to the client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Request(#[from] RequestError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(error = %self, "ApiError::into_response: called");
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
