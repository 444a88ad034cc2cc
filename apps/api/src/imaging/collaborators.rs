//! Seams to the external media picker and image generator.
//!
//! Both are carried as `Arc<dyn ...>` so the HTTP clients can be swapped for stubs in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::imaging::state::{ImageRef, MediaSource};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("{0}")]
    Rejected(String),
}

/// Lets a user pick an existing image.
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// `Ok(None)` means the user cancelled. That is not a failure.
    async fn pick(&self, source: MediaSource) -> Result<Option<ImageRef>, CollaboratorError>;
}

/// Produces a new illustration, optionally steered by the slide's image prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: Option<&str>) -> Result<ImageRef, CollaboratorError>;
}
