//! Axum route handlers for the Fit API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::budget::FitBudget;
use crate::layout::fit::{assess_fit, does_content_fit, FitAssessment};
use crate::layout::prompts::prompt_constraints;
use crate::layout::refit::{refit_slide, RefitResult};
use crate::models::slide::{SlideContent, SlideGeometry};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FitCheckRequest {
    pub content: SlideContent,
    pub width: f64,
}

#[derive(Debug, Serialize)]
pub struct FitCheckResponse {
    pub fits: bool,
    /// Rendered slide height for the requested width (16:9).
    pub slide_height: f64,
    pub assessment: FitAssessment,
}

#[derive(Debug, Deserialize)]
pub struct ConstraintsRequest {
    pub width: f64,
    #[serde(default)]
    pub has_image: bool,
}

#[derive(Debug, Serialize)]
pub struct ConstraintsResponse {
    pub budget: FitBudget,
    pub prompt: String,
}

fn validate_width(width: f64) -> Result<(), AppError> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "width must be a positive number".to_string(),
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/fit/check
///
/// Reports whether the content fits a slide of the given width, and which rule it breaks.
pub async fn handle_fit_check(
    State(state): State<AppState>,
    Json(request): Json<FitCheckRequest>,
) -> Result<Json<FitCheckResponse>, AppError> {
    validate_width(request.width)?;

    let content = &request.content;
    let geometry = SlideGeometry::for_content(content, request.width);
    let fits = does_content_fit(
        &content.title,
        &content.paragraphs,
        geometry.width,
        geometry.has_image,
        &state.calibration,
    );
    let assessment = assess_fit(
        &content.title,
        &content.paragraphs,
        &geometry,
        &state.calibration,
    );

    Ok(Json(FitCheckResponse {
        fits,
        slide_height: geometry.height(),
        assessment,
    }))
}

/// POST /api/v1/fit/constraints
///
/// Returns the budget and the instruction block for steering content generation.
pub async fn handle_constraints(
    State(state): State<AppState>,
    Json(request): Json<ConstraintsRequest>,
) -> Result<Json<ConstraintsResponse>, AppError> {
    validate_width(request.width)?;

    let geometry = SlideGeometry::new(request.width, request.has_image);
    let budget = FitBudget::for_geometry(&geometry, &state.calibration);

    Ok(Json(ConstraintsResponse {
        budget,
        prompt: prompt_constraints(request.width, request.has_image, &state.calibration),
    }))
}

/// POST /api/v1/fit/refit
///
/// Shortens overflowing content via the content writer, re-checking after each rewrite.
pub async fn handle_refit(
    State(state): State<AppState>,
    Json(request): Json<FitCheckRequest>,
) -> Result<Json<RefitResult>, AppError> {
    validate_width(request.width)?;

    let result = refit_slide(
        request.content,
        request.width,
        &state.calibration,
        state.writer.as_ref(),
    )
    .await;

    Ok(Json(result))
}
