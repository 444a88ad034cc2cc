use serde::{Deserialize, Serialize};

/// Slides are always rendered at 16:9. Not configurable per slide.
pub const SLIDE_ASPECT_RATIO: f64 = 9.0 / 16.0;

/// Text content of a single generated slide.
///
/// `paragraphs` order is meaningful; each entry is an independent markdown block.
/// A present `image_prompt` means the slide reserves on-slide space for an illustration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
}

impl SlideContent {
    pub fn has_image(&self) -> bool {
        self.image_prompt.is_some()
    }
}

/// Derived geometry of a slide. Never stored alongside content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideGeometry {
    /// Authored slide width, independent of screen pixels.
    pub width: f64,
    pub has_image: bool,
}

impl SlideGeometry {
    pub fn new(width: f64, has_image: bool) -> Self {
        Self { width, has_image }
    }

    pub fn for_content(content: &SlideContent, width: f64) -> Self {
        Self::new(width, content.has_image())
    }

    pub fn height(&self) -> f64 {
        self.width * SLIDE_ASPECT_RATIO
    }
}
