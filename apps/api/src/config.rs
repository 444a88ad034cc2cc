use anyhow::{Context, Result};

use crate::layout::FitCalibration;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub image_generator_url: String,
    pub media_picker_url: String,
    pub port: u16,
    pub rust_log: String,
    pub calibration: FitCalibration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            image_generator_url: require_env("IMAGE_GENERATOR_URL")?,
            media_picker_url: require_env("MEDIA_PICKER_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            calibration: calibration_from_env()?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads calibration overrides, falling back to the tuned defaults.
fn calibration_from_env() -> Result<FitCalibration> {
    let defaults = FitCalibration::default();
    Ok(FitCalibration {
        font_size_ratio: ratio_env("FIT_FONT_SIZE_RATIO", defaults.font_size_ratio)?,
        glyph_advance_ratio: ratio_env("FIT_GLYPH_ADVANCE_RATIO", defaults.glyph_advance_ratio)?,
        slack_factor: ratio_env("FIT_SLACK_FACTOR", defaults.slack_factor)?,
    })
}

fn ratio_env(key: &str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(raw) => parse_ratio(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_ratio(key: &str, raw: &str) -> Result<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{key} must be a number, got '{raw}'"))?;
    if !value.is_finite() || value <= 0.0 {
        anyhow::bail!("{key} must be a positive number, got {value}");
    }
    Ok(value)
}
