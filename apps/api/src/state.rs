use std::sync::Arc;

use crate::imaging::SlideRegistry;
use crate::layout::refit::ContentWriter;
use crate::layout::FitCalibration;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// One image controller per live slide.
    pub slides: Arc<SlideRegistry>,
    /// Rewrites overflowing slide text. Default: `LlmClient`.
    pub writer: Arc<dyn ContentWriter>,
    /// Budget ratios, possibly overridden from the environment.
    pub calibration: FitCalibration,
}
