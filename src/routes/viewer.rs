//! Viewer API endpoints
//!
//! Host control surface for the running viewer:
//! - Load catalog papers
//! - Navigate, zoom and fit
//! - Report thumbnail visibility and fetch rendered thumbnails
//! - Run smart searches

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::document::download_file_name;
use crate::error::{AppError, Result};
use crate::viewer::{Panel, SearchSnapshot, ThumbnailState, ThumbnailViewport, ViewerHandle, ViewerSnapshot};

/// Go-to-page request
#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: i64,
}

/// Fit-to-width request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitRequest {
    pub container_width: f64,
}

/// Container and/or natural page width report
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRequest {
    #[serde(default)]
    pub container_width: Option<f64>,
    #[serde(default)]
    pub page_width: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Where to download the current document from
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub url: String,
    pub file_name: String,
}

pub fn router() -> Router<ViewerHandle> {
    Router::new()
        .route("/", get(get_snapshot))
        .route("/papers/:id", post(load_paper))
        .route("/page", post(set_page))
        .route("/page/next", post(next_page))
        .route("/page/previous", post(previous_page))
        .route("/zoom/in", post(zoom_in))
        .route("/zoom/out", post(zoom_out))
        .route("/fit", post(fit_to_width))
        .route("/viewport", post(report_viewport))
        .route("/panels/:panel/toggle", post(toggle_panel))
        .route("/thumbnails/viewport", post(thumbnails_scrolled))
        .route("/thumbnails/:page", get(get_thumbnail))
        .route("/thumbnails/:page/visible", post(thumbnail_visible))
        .route("/search", get(get_search).post(run_search))
        .route("/source", get(open_source))
        .route("/download", get(download))
}

async fn get_snapshot(State(viewer): State<ViewerHandle>) -> Json<ViewerSnapshot> {
    Json(viewer.snapshot())
}

/// Load a paper by catalog id. Unknown ids leave the viewer as it is.
async fn load_paper(
    State(viewer): State<ViewerHandle>,
    Path(id): Path<String>,
) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.load_paper(&id).await?))
}

async fn set_page(
    State(viewer): State<ViewerHandle>,
    Json(request): Json<PageRequest>,
) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.set_page(request.page).await?))
}

async fn next_page(State(viewer): State<ViewerHandle>) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.next_page().await?))
}

async fn previous_page(State(viewer): State<ViewerHandle>) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.previous_page().await?))
}

async fn zoom_in(State(viewer): State<ViewerHandle>) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.zoom_in().await?))
}

async fn zoom_out(State(viewer): State<ViewerHandle>) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.zoom_out().await?))
}

async fn fit_to_width(
    State(viewer): State<ViewerHandle>,
    Json(request): Json<FitRequest>,
) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.fit_to_width(request.container_width).await?))
}

async fn report_viewport(
    State(viewer): State<ViewerHandle>,
    Json(request): Json<ViewportRequest>,
) -> Result<Json<ViewerSnapshot>> {
    let snapshot = viewer
        .execute(crate::viewer::ViewerCommand::Viewport {
            container_width: request.container_width,
            page_width: request.page_width,
        })
        .await?;
    Ok(Json(snapshot))
}

async fn toggle_panel(
    State(viewer): State<ViewerHandle>,
    Path(panel): Path<String>,
) -> Result<Json<ViewerSnapshot>> {
    let panel: Panel = panel.parse().map_err(AppError::BadRequest)?;
    Ok(Json(viewer.toggle_panel(panel).await?))
}

async fn thumbnails_scrolled(
    State(viewer): State<ViewerHandle>,
    Json(viewport): Json<ThumbnailViewport>,
) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.thumbnails_scrolled(viewport).await?))
}

async fn thumbnail_visible(
    State(viewer): State<ViewerHandle>,
    Path(page): Path<u32>,
) -> Result<Json<ViewerSnapshot>> {
    Ok(Json(viewer.thumbnail_visible(page).await?))
}

/// Rendered thumbnail bytes.
///
/// 202 while the render is pending, 204 before the placeholder was ever
/// visible, 404 for pages outside the document.
async fn get_thumbnail(
    State(viewer): State<ViewerHandle>,
    Path(page): Path<u32>,
) -> Result<Response> {
    let state = viewer
        .thumbnail(page)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {} has no thumbnail", page)))?;

    let response = match state {
        ThumbnailState::Absent => StatusCode::NO_CONTENT.into_response(),
        ThumbnailState::Pending => StatusCode::ACCEPTED.into_response(),
        ThumbnailState::Ready(image) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, image.format.mime_type()),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            image.data.clone(),
        )
            .into_response(),
    };

    Ok(response)
}

async fn run_search(
    State(viewer): State<ViewerHandle>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchSnapshot>> {
    let snapshot = viewer.search(&request.query).await?;
    Ok(Json(snapshot.search))
}

async fn get_search(State(viewer): State<ViewerHandle>) -> Json<SearchSnapshot> {
    Json(viewer.snapshot().search)
}

/// Fallback for hosts that cannot render: open the source directly
async fn open_source(State(viewer): State<ViewerHandle>) -> Result<Redirect> {
    let source = viewer
        .snapshot()
        .source
        .ok_or_else(|| AppError::NotFound("No document has been requested".to_string()))?;
    Ok(Redirect::temporary(&source))
}

async fn download(State(viewer): State<ViewerHandle>) -> Result<Json<DownloadResponse>> {
    let url = viewer
        .snapshot()
        .source
        .ok_or_else(|| AppError::NotFound("No document has been requested".to_string()))?;
    let file_name = download_file_name(&url);
    Ok(Json(DownloadResponse { url, file_name }))
}
