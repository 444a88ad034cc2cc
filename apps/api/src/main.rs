mod config;
mod errors;
mod imaging;
mod layout;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::imaging::clients::{HttpImageGenerator, HttpMediaPicker};
use crate::imaging::SlideRegistry;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting slidefit API v{}", env!("CARGO_PKG_VERSION"));

    // External collaborators
    let picker = HttpMediaPicker::new(&config.media_picker_url)
        .context("Failed to build media picker client")?;
    let generator = HttpImageGenerator::new(&config.image_generator_url)
        .context("Failed to build image generator client")?;
    info!(
        picker = %config.media_picker_url,
        generator = %config.image_generator_url,
        "Image collaborators initialized"
    );

    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    info!(
        font_size_ratio = config.calibration.font_size_ratio,
        glyph_advance_ratio = config.calibration.glyph_advance_ratio,
        slack_factor = config.calibration.slack_factor,
        "Fit calibration loaded"
    );

    let state = AppState {
        slides: Arc::new(SlideRegistry::new(Arc::new(picker), Arc::new(generator))),
        writer: Arc::new(llm),
        calibration: config.calibration,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the deck editor's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
