pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::imaging::handlers as image_handlers;
use crate::layout::handlers as fit_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Fit API
        .route("/api/v1/fit/check", post(fit_handlers::handle_fit_check))
        .route(
            "/api/v1/fit/constraints",
            post(fit_handlers::handle_constraints),
        )
        .route("/api/v1/fit/refit", post(fit_handlers::handle_refit))
        // Slide Image API
        .route(
            "/api/v1/slides/:id",
            put(image_handlers::handle_register_slide).delete(image_handlers::handle_discard_slide),
        )
        .route(
            "/api/v1/slides/:id/image",
            get(image_handlers::handle_get_image).delete(image_handlers::handle_clear_image),
        )
        .route(
            "/api/v1/slides/:id/image/pick",
            post(image_handlers::handle_pick_image),
        )
        .route(
            "/api/v1/slides/:id/image/generate",
            post(image_handlers::handle_generate_image),
        )
        .with_state(state)
}
