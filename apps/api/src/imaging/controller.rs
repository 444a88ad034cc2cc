//! Slide image controller — owns one slide's `ImageState`.
//!
//! # Rules
//! - At most one pick or generate is outstanding per slide. A second request is rejected
//!   synchronously with `ImageError::OperationInProgress`, never queued.
//! - `request_generate` enters `Generating` before it returns, ahead of the external call.
//! - A cancelled pick (`Ok(None)` from the picker) leaves the state untouched.
//! - `clear` works from any state and cancels whatever is outstanding.
//! - `detach` is called when the slide is discarded. Late results are then dropped.
//!
//! # Completion
//! Collaborator calls run on spawned tokio tasks. Each accepted request takes a fresh epoch;
//! a task applies its result only if the controller is still alive (weak handle), not
//! detached, and still on that epoch. `clear` and `detach` bump the epoch and abort the task.
//! The state mutex is never held across an `.await`.
//!
//! # Watching
//! Every transition bumps `version` and is published on a watch channel. `wait_for_change`
//! lets a caller that last saw version `v` park until the state moves past it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::imaging::collaborators::{ImageGenerator, MediaPicker};
use crate::imaging::state::{ImageState, MediaSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("an image operation is already in progress for this slide")]
    OperationInProgress,

    #[error("slide has been discarded")]
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOperation {
    Pick,
    Generate,
}

/// Snapshot of a controller for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub slide_id: Uuid,
    pub state: ImageState,
    /// Bumped on every state change.
    pub version: u64,
    /// The outstanding operation, if any.
    pub busy: Option<ImageOperation>,
    pub updated_at: DateTime<Utc>,
}

/// Awaitable handle for an accepted pick or generate.
pub struct PendingImage {
    #[cfg_attr(not(test), allow(dead_code))]
    handle: JoinHandle<()>,
}

impl PendingImage {
    /// Resolves once the result has been applied, dropped as stale, or the task aborted.
    #[cfg(test)]
    pub async fn settled(self) {
        let _ = self.handle.await;
    }
}

struct InFlight {
    operation: ImageOperation,
    abort: Option<AbortHandle>,
}

struct Slot {
    state: ImageState,
    version: u64,
    image_prompt: Option<String>,
    epoch: u64,
    in_flight: Option<InFlight>,
    detached: bool,
    updated_at: DateTime<Utc>,
}

impl Slot {
    fn cancel_in_flight(&mut self) -> Option<ImageOperation> {
        let in_flight = self.in_flight.take()?;
        if let Some(abort) = in_flight.abort {
            abort.abort();
        }
        Some(in_flight.operation)
    }
}

struct Inner {
    slide_id: Uuid,
    picker: Arc<dyn MediaPicker>,
    generator: Arc<dyn ImageGenerator>,
    slot: Mutex<Slot>,
    notifier: watch::Sender<ImageState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        slot.cancel_in_flight();
    }
}

/// Per-slide image state machine. Cheap to clone; clones share the same slide.
#[derive(Clone)]
pub struct SlideImageController {
    inner: Arc<Inner>,
}

impl SlideImageController {
    pub fn new(
        slide_id: Uuid,
        image_prompt: Option<String>,
        picker: Arc<dyn MediaPicker>,
        generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        let (notifier, _) = watch::channel(ImageState::Empty);
        Self {
            inner: Arc::new(Inner {
                slide_id,
                picker,
                generator,
                slot: Mutex::new(Slot {
                    state: ImageState::Empty,
                    version: 0,
                    image_prompt,
                    epoch: 0,
                    in_flight: None,
                    detached: false,
                    updated_at: Utc::now(),
                }),
                notifier,
            }),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ImageState {
        self.slot().state.clone()
    }

    pub fn view(&self) -> ImageView {
        let slot = self.slot();
        ImageView {
            slide_id: self.inner.slide_id,
            state: slot.state.clone(),
            version: slot.version,
            busy: slot.in_flight.as_ref().map(|f| f.operation),
            updated_at: slot.updated_at,
        }
    }

    /// Receives the new state on every transition.
    pub fn subscribe(&self) -> watch::Receiver<ImageState> {
        self.inner.notifier.subscribe()
    }

    /// Prompt passed to the generator on the next `request_generate`.
    pub fn set_image_prompt(&self, prompt: Option<String>) {
        self.slot().image_prompt = prompt;
    }

    #[cfg(test)]
    pub fn is_detached(&self) -> bool {
        self.slot().detached
    }

    /// Waits up to `timeout` for the state to move past `after_version` (default: the
    /// current version) and returns a snapshot. Returns at once if it already has.
    pub async fn wait_for_change(&self, after_version: Option<u64>, timeout: Duration) -> ImageView {
        let mut rx = self.subscribe();
        let current = self.view();
        if current.version != after_version.unwrap_or(current.version) {
            return current;
        }
        if tokio::time::timeout(timeout, rx.changed()).await.is_err() {
            debug!(
                slide_id = %self.inner.slide_id,
                version = current.version,
                "No image change before timeout"
            );
        }
        self.view()
    }

    /// Asks the media picker for an image from `source`.
    pub fn request_pick(&self, source: MediaSource) -> Result<PendingImage, ImageError> {
        let mut slot = self.slot();
        let epoch = self.begin(&mut slot, ImageOperation::Pick)?;

        let picker = Arc::clone(&self.inner.picker);
        let weak = Arc::downgrade(&self.inner);
        let slide_id = self.inner.slide_id;
        let handle = tokio::spawn(async move {
            let outcome = match picker.pick(source).await {
                Ok(Some(image)) => Some(ImageState::Resolved(image)),
                Ok(None) => {
                    info!(%slide_id, ?source, "Image pick cancelled by user");
                    None
                }
                Err(e) => {
                    warn!(%slide_id, ?source, "Image pick failed: {e}");
                    Some(ImageState::Failed(e.to_string()))
                }
            };
            deliver(weak, epoch, outcome);
        });

        Ok(attach(&mut slot, handle))
    }

    /// Starts generating an illustration. The state is `Generating` when this returns `Ok`.
    pub fn request_generate(&self) -> Result<PendingImage, ImageError> {
        let mut slot = self.slot();
        let epoch = self.begin(&mut slot, ImageOperation::Generate)?;
        self.transition(&mut slot, ImageState::Generating);

        let generator = Arc::clone(&self.inner.generator);
        let prompt = slot.image_prompt.clone();
        let weak = Arc::downgrade(&self.inner);
        let slide_id = self.inner.slide_id;
        let handle = tokio::spawn(async move {
            let outcome = match generator.generate(prompt.as_deref()).await {
                Ok(image) => ImageState::Resolved(image),
                Err(e) => {
                    warn!(%slide_id, "Image generation failed: {e}");
                    ImageState::Failed(e.to_string())
                }
            };
            deliver(weak, epoch, Some(outcome));
        });

        Ok(attach(&mut slot, handle))
    }

    /// Returns to `Empty`, dropping any image reference and cancelling outstanding work.
    pub fn clear(&self) {
        let mut slot = self.slot();
        if slot.detached {
            return;
        }
        slot.epoch += 1;
        if let Some(operation) = slot.cancel_in_flight() {
            info!(slide_id = %self.inner.slide_id, ?operation, "Image operation cancelled by clear");
        }
        self.transition(&mut slot, ImageState::Empty);
    }

    /// Disconnects the controller from its discarded slide. No further state changes occur.
    pub fn detach(&self) {
        let mut slot = self.slot();
        if slot.detached {
            return;
        }
        slot.detached = true;
        slot.epoch += 1;
        let cancelled = slot.cancel_in_flight();
        info!(slide_id = %self.inner.slide_id, ?cancelled, "Slide image controller detached");
    }

    // ── internals ──────────────────────────────────────────────────────────

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, slot: &mut Slot, operation: ImageOperation) -> Result<u64, ImageError> {
        if slot.detached {
            return Err(ImageError::Detached);
        }
        if let Some(in_flight) = &slot.in_flight {
            debug!(
                slide_id = %self.inner.slide_id,
                requested = ?operation,
                outstanding = ?in_flight.operation,
                "Rejecting image request while another is outstanding"
            );
            return Err(ImageError::OperationInProgress);
        }
        slot.epoch += 1;
        slot.in_flight = Some(InFlight {
            operation,
            abort: None,
        });
        Ok(slot.epoch)
    }

    fn complete(&self, epoch: u64, outcome: Option<ImageState>) {
        let mut slot = self.slot();
        if slot.detached || slot.epoch != epoch {
            debug!(slide_id = %self.inner.slide_id, epoch, "Dropping stale image result");
            return;
        }
        slot.in_flight = None;
        if let Some(next) = outcome {
            self.transition(&mut slot, next);
        }
    }

    fn transition(&self, slot: &mut Slot, next: ImageState) {
        if slot.state == next {
            return;
        }
        debug!(
            slide_id = %self.inner.slide_id,
            from = slot.state.label(),
            to = next.label(),
            "Image state changed"
        );
        slot.state = next.clone();
        slot.version += 1;
        slot.updated_at = Utc::now();
        self.inner.notifier.send_replace(next);
    }
}

fn attach(slot: &mut Slot, handle: JoinHandle<()>) -> PendingImage {
    if let Some(in_flight) = slot.in_flight.as_mut() {
        in_flight.abort = Some(handle.abort_handle());
    }
    PendingImage { handle }
}

fn deliver(weak: Weak<Inner>, epoch: u64, outcome: Option<ImageState>) {
    match weak.upgrade() {
        Some(inner) => SlideImageController { inner }.complete(epoch, outcome),
        None => debug!(epoch, "Slide dropped before image result arrived"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
