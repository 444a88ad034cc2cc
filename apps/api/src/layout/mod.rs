// Slide fit estimation: character/line budgets, the fit predicate, generation prompts,
// and the rewrite loop for overflowing slides.
// Budgets, the fit predicate and prompt rendering are pure and synchronous.

pub mod budget;
pub mod fit;
pub mod handlers;
pub mod prompts;
pub mod refit;

// Re-export the public API consumed by other modules (config, state).
pub use budget::FitCalibration;
