//! HTTP clients for the external media picker and image generator services.
//!
//! Picker:    POST {base}/pick      {"source": "camera"|"gallery"}
//!            → 200 {"image_ref": "..."} or 204 when the user made no selection.
//! Generator: POST {base}/generate  {"prompt": "..."|null}
//!            → 200 {"image_ref": "..."}
//!
//! Both retry 429 and 5xx responses with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::imaging::collaborators::{CollaboratorError, ImageGenerator, MediaPicker};
use crate::imaging::state::{ImageRef, MediaSource};

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;
/// Picking waits on a human; generation waits on a model.
const PICK_TIMEOUT_SECS: u64 = 300;
const GENERATE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct PickRequest {
    source: MediaSource,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ImageRefBody {
    image_ref: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Media picker
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpMediaPicker {
    client: Client,
    endpoint: String,
}

impl HttpMediaPicker {
    pub fn new(base_url: &str) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: build_client(PICK_TIMEOUT_SECS)?,
            endpoint: join_endpoint(base_url, "pick"),
        })
    }
}

#[async_trait]
impl MediaPicker for HttpMediaPicker {
    async fn pick(&self, source: MediaSource) -> Result<Option<ImageRef>, CollaboratorError> {
        let body = PickRequest { source };
        let response = send_with_retry(|| self.client.post(&self.endpoint).json(&body)).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body: ImageRefBody = response.json().await?;
        Ok(Some(ImageRef::new(body.image_ref)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Image generator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpImageGenerator {
    client: Client,
    endpoint: String,
}

impl HttpImageGenerator {
    pub fn new(base_url: &str) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: build_client(GENERATE_TIMEOUT_SECS)?,
            endpoint: join_endpoint(base_url, "generate"),
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, prompt: Option<&str>) -> Result<ImageRef, CollaboratorError> {
        let body = GenerateRequest { prompt };
        let response = send_with_retry(|| self.client.post(&self.endpoint).json(&body)).await?;
        let body: ImageRefBody = response.json().await?;
        let image = ImageRef::new(body.image_ref);
        if image.as_str().trim().is_empty() {
            return Err(CollaboratorError::Rejected(
                "generator returned an empty image reference".to_string(),
            ));
        }
        debug!(image_ref = %image, "Image generated");
        Ok(image)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

fn build_client(timeout_secs: u64) -> Result<Client, CollaboratorError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

fn join_endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS * (1 << attempt.saturating_sub(1)))
}

/// Sends the request built by `build`, retrying transport errors, 429 and 5xx.
/// Any other non-success status is returned immediately as `Upstream`.
async fn send_with_retry<F>(build: F) -> Result<Response, CollaboratorError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<CollaboratorError> = None;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Collaborator call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(CollaboratorError::Http(e));
                continue;
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let error = CollaboratorError::Upstream {
            status: status.as_u16(),
            message,
        };
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            last_error = Some(error);
            continue;
        }
        return Err(error);
    }

    Err(last_error.unwrap_or(CollaboratorError::Exhausted {
        attempts: MAX_ATTEMPTS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_endpoint_tolerates_trailing_slash() {
        assert_eq!(
            join_endpoint("http://media.local/", "pick"),
            "http://media.local/pick"
        );
        assert_eq!(
            join_endpoint("http://gen.local/v1", "generate"),
            "http://gen.local/v1/generate"
        );
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_pick_request_serializes_source() {
        let body = serde_json::to_value(PickRequest {
            source: MediaSource::Camera,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"source": "camera"}));
    }

    #[test]
    fn test_image_ref_body_parses_opaque_handle() {
        let body: ImageRefBody =
            serde_json::from_str(r#"{"image_ref": "s3://decks/42/hero.png"}"#).unwrap();
        assert_eq!(body.image_ref, "s3://decks/42/hero.png");
    }
}
