//! Error types for the Lectern server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::search::SearchError;
use crate::viewer::ViewerError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

/// Startup errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Viewer mount point must be a non-root path starting with '/', got {0:?}")]
    MissingMountPoint(String),

    #[error("Unknown bridge provider: {0}")]
    UnknownBridgeProvider(String),

    #[error("BRIDGE_URL is required for the http bridge")]
    MissingBridgeUrl,
}

/// Normalize the mount point the viewer router is nested under
pub fn validate_mount_point(mount: &str) -> std::result::Result<String, BootstrapError> {
    let trimmed = mount.trim().trim_end_matches('/');
    if trimmed.is_empty() || !trimmed.starts_with('/') {
        return Err(BootstrapError::MissingMountPoint(mount.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Viewer(ViewerError::Search(e)) => {
                let (status, error_type) = match e {
                    SearchError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "search_unavailable"),
                    SearchError::EmptyQuery => (StatusCode::BAD_REQUEST, "empty_query"),
                    SearchError::NoDocument => (StatusCode::CONFLICT, "no_document"),
                    SearchError::InFlight => (StatusCode::CONFLICT, "search_in_flight"),
                    _ => (StatusCode::BAD_GATEWAY, "search_failed"),
                };
                (status, error_type, e.to_string())
            }
            AppError::Viewer(ViewerError::Closed) => {
                tracing::error!("Viewer runtime is gone");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "viewer_stopped",
                    "The viewer is not running".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
