//! Slide registry — at most one `SlideImageController` per slide id.
//!
//! Controllers are created on first registration and detached when their slide is
//! discarded, so results arriving afterwards never touch the discarded slide.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;
use uuid::Uuid;

use crate::imaging::collaborators::{ImageGenerator, MediaPicker};
use crate::imaging::controller::SlideImageController;

pub struct SlideRegistry {
    picker: Arc<dyn MediaPicker>,
    generator: Arc<dyn ImageGenerator>,
    slides: Mutex<HashMap<Uuid, SlideImageController>>,
}

impl SlideRegistry {
    pub fn new(picker: Arc<dyn MediaPicker>, generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            picker,
            generator,
            slides: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the slide's controller, creating it if needed, with `image_prompt` applied.
    pub fn register(&self, slide_id: Uuid, image_prompt: Option<String>) -> SlideImageController {
        let mut slides = self.slides();
        if let Some(existing) = slides.get(&slide_id) {
            existing.set_image_prompt(image_prompt);
            return existing.clone();
        }

        let controller = SlideImageController::new(
            slide_id,
            image_prompt,
            Arc::clone(&self.picker),
            Arc::clone(&self.generator),
        );
        slides.insert(slide_id, controller.clone());
        info!(%slide_id, "Slide registered");
        controller
    }

    pub fn get(&self, slide_id: Uuid) -> Option<SlideImageController> {
        self.slides().get(&slide_id).cloned()
    }

    /// Removes and detaches the slide's controller. Returns false for unknown slides.
    pub fn discard(&self, slide_id: Uuid) -> bool {
        let removed = self.slides().remove(&slide_id);
        match removed {
            Some(controller) => {
                controller.detach();
                info!(%slide_id, "Slide discarded");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slides().len()
    }

    fn slides(&self) -> MutexGuard<'_, HashMap<Uuid, SlideImageController>> {
        self.slides.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::imaging::collaborators::CollaboratorError;
    use crate::imaging::state::{ImageRef, ImageState, MediaSource};

    struct FixedPicker;

    #[async_trait]
    impl MediaPicker for FixedPicker {
        async fn pick(&self, _source: MediaSource) -> Result<Option<ImageRef>, CollaboratorError> {
            Ok(Some(ImageRef::new("photo")))
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl ImageGenerator for EchoGenerator {
        async fn generate(&self, prompt: Option<&str>) -> Result<ImageRef, CollaboratorError> {
            Ok(ImageRef::new(prompt.unwrap_or("untitled")))
        }
    }

    fn registry() -> SlideRegistry {
        SlideRegistry::new(Arc::new(FixedPicker), Arc::new(EchoGenerator))
    }

    #[tokio::test]
    async fn test_register_twice_returns_same_controller() {
        let registry = registry();
        let id = Uuid::new_v4();

        let first = registry.register(id, None);
        first
            .request_pick(MediaSource::Gallery)
            .unwrap()
            .settled()
            .await;

        let second = registry.register(id, Some("sunrise".to_string()));
        assert_eq!(second.state(), ImageState::Resolved(ImageRef::new("photo")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_reregistering_updates_image_prompt() {
        let registry = registry();
        let id = Uuid::new_v4();
        registry.register(id, Some("old prompt".to_string()));
        let controller = registry.register(id, Some("new prompt".to_string()));

        controller.request_generate().unwrap().settled().await;
        assert_eq!(
            controller.state(),
            ImageState::Resolved(ImageRef::new("new prompt"))
        );
    }

    #[tokio::test]
    async fn test_discard_detaches_and_forgets() {
        let registry = registry();
        let id = Uuid::new_v4();
        let controller = registry.register(id, None);

        assert!(registry.discard(id));
        assert!(controller.is_detached());
        assert!(registry.get(id).is_none());
        assert!(!registry.discard(id));
    }

    #[tokio::test]
    async fn test_slides_are_independent() {
        let registry = registry();
        let a = registry.register(Uuid::new_v4(), Some("a".to_string()));
        let b = registry.register(Uuid::new_v4(), Some("b".to_string()));

        let pending = a.request_generate().unwrap();
        assert!(b.request_generate().is_ok(), "one slide's work never blocks another");
        pending.settled().await;
        assert_eq!(a.state(), ImageState::Resolved(ImageRef::new("a")));
    }
}
