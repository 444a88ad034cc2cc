use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to an illustration held by the external media/storage service.
/// The service never owns image bytes, only this reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a manually picked image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    Camera,
    Gallery,
}

/// Lifecycle of the optional illustration attached to one slide.
///
/// `Resolved` and `Failed` end one attempt; a new pick or generate may follow either.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ImageState {
    #[default]
    Empty,
    Generating,
    Resolved(ImageRef),
    Failed(String),
}

impl ImageState {
    pub fn label(&self) -> &'static str {
        match self {
            ImageState::Empty => "empty",
            ImageState::Generating => "generating",
            ImageState::Resolved(_) => "resolved",
            ImageState::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_serializes_as_tagged_variant() {
        let resolved = ImageState::Resolved(ImageRef::new("img_42"));
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({"status": "resolved", "detail": "img_42"})
        );
        assert_eq!(
            serde_json::to_value(ImageState::Empty).unwrap(),
            json!({"status": "empty"})
        );
    }

    #[test]
    fn test_labels_match_serialized_status() {
        for state in [
            ImageState::Empty,
            ImageState::Generating,
            ImageState::Resolved(ImageRef::new("img_1")),
            ImageState::Failed("quota".to_string()),
        ] {
            let value = serde_json::to_value(&state).unwrap();
            assert_eq!(value["status"], state.label());
        }
    }

    #[test]
    fn test_media_source_uses_snake_case() {
        let source: MediaSource = serde_json::from_str("\"gallery\"").unwrap();
        assert_eq!(source, MediaSource::Gallery);
    }
}
