//! Axum route handlers for the Slide Image API.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::imaging::controller::{ImageView, SlideImageController};
use crate::imaging::state::MediaSource;
use crate::models::slide::SlideContent;
use crate::state::AppState;

/// Upper bound for `wait_secs`.
const MAX_WAIT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
pub struct PickRequest {
    pub source: MediaSource,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageQuery {
    /// Hold the request until the state changes or this many seconds pass.
    pub wait_secs: Option<u64>,
    /// The last `version` the caller saw. Defaults to the current one.
    pub after_version: Option<u64>,
}

fn find_slide(state: &AppState, slide_id: Uuid) -> Result<SlideImageController, AppError> {
    state
        .slides
        .get(slide_id)
        .ok_or_else(|| AppError::NotFound(format!("Slide {slide_id} not found")))
}

/// PUT /api/v1/slides/:id
///
/// Registers the slide (or updates its image prompt) and returns its image state.
pub async fn handle_register_slide(
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
    Json(content): Json<SlideContent>,
) -> Result<Json<ImageView>, AppError> {
    let controller = state.slides.register(slide_id, content.image_prompt);
    Ok(Json(controller.view()))
}

/// DELETE /api/v1/slides/:id
///
/// Discards the slide. Outstanding image work is cancelled and its result dropped.
pub async fn handle_discard_slide(
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.slides.discard(slide_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Slide {slide_id} not found")))
    }
}

/// GET /api/v1/slides/:id/image[?wait_secs=N&after_version=V]
///
/// Without `wait_secs` this is a snapshot. With it, the request is held until the state
/// moves past `after_version` so the editor can redraw on each change.
pub async fn handle_get_image(
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
    Query(query): Query<ImageQuery>,
) -> Result<Json<ImageView>, AppError> {
    let controller = find_slide(&state, slide_id)?;
    let view = match query.wait_secs {
        Some(secs) if secs > 0 => {
            let timeout = Duration::from_secs(secs.min(MAX_WAIT_SECS));
            controller.wait_for_change(query.after_version, timeout).await
        }
        _ => controller.view(),
    };
    Ok(Json(view))
}

/// POST /api/v1/slides/:id/image/pick
///
/// Accepted immediately; poll the image state for the outcome. 409 while busy.
pub async fn handle_pick_image(
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
    Json(request): Json<PickRequest>,
) -> Result<(StatusCode, Json<ImageView>), AppError> {
    let controller = find_slide(&state, slide_id)?;
    controller.request_pick(request.source)?;
    Ok((StatusCode::ACCEPTED, Json(controller.view())))
}

/// POST /api/v1/slides/:id/image/generate
///
/// Accepted with the slide already in `generating`. 409 while busy.
pub async fn handle_generate_image(
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ImageView>), AppError> {
    let controller = find_slide(&state, slide_id)?;
    controller.request_generate()?;
    Ok((StatusCode::ACCEPTED, Json(controller.view())))
}

/// DELETE /api/v1/slides/:id/image
pub async fn handle_clear_image(
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
) -> Result<Json<ImageView>, AppError> {
    let controller = find_slide(&state, slide_id)?;
    controller.clear();
    Ok(Json(controller.view()))
}
