//! HTTP routes

pub mod viewer;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::viewer::ViewerHandle;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Full application: health check plus the viewer nested at `mount`.
///
/// `mount` must already be validated (see [`crate::error::validate_mount_point`]).
pub fn app(viewer: ViewerHandle, mount: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest(mount, viewer::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(viewer)
}
