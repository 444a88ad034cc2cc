// Per-slide illustration lifecycle: pick or generate, resolve, clear, discard.
// Collaborator calls are async and run on spawned tasks; see controller.rs.

pub mod clients;
pub mod collaborators;
pub mod controller;
pub mod handlers;
pub mod registry;
pub mod state;

pub use controller::{ImageError, SlideImageController};
pub use registry::SlideRegistry;
