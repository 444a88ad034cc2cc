//! Refit loop — shortens overflowing slide text until it fits its slide.
//!
//! # Flow
//! - Assess the current content against the slide's budget.
//! - On overflow, ask a `ContentWriter` for a rewrite built from `prompt_constraints`.
//! - Re-check. Max 3 rewrite passes; content that still overflows is flagged for review.
//!
//! A failed rewrite keeps the previous text and counts as a spent pass. The loop never
//! truncates content itself. `image_prompt` is never handed to the writer and survives
//! every rewrite unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::layout::budget::FitCalibration;
use crate::layout::fit::{assess_fit, FitAssessment};
use crate::layout::prompts::{build_rewrite_prompt, REWRITE_SYSTEM};
use crate::llm_client::prompts::with_shared_rules;
use crate::models::slide::{SlideContent, SlideGeometry};

const MAX_PASSES: u8 = 3;

/// Title and body proposed by a content writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDraft {
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

/// Produces shortened slide text. Implemented by `LlmClient`; stubbed in tests.
#[async_trait]
pub trait ContentWriter: Send + Sync {
    async fn rewrite(&self, prompt: &str, system: &str) -> Result<SlideDraft, AppError>;
}

/// Outcome of a refit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefitResult {
    pub content: SlideContent,
    pub assessment: FitAssessment,
    pub rewrites_requested: u32,
    /// True if at least one rewrite replaced the text.
    pub was_adjusted: bool,
    /// True if the content still overflows after all passes.
    pub flagged_for_review: bool,
}

/// Rewrites `content` until it fits a slide of `width`, or passes run out.
pub async fn refit_slide(
    content: SlideContent,
    width: f64,
    calibration: &FitCalibration,
    writer: &dyn ContentWriter,
) -> RefitResult {
    let geometry = SlideGeometry::for_content(&content, width);
    let mut content = content;
    let mut assessment = assess_fit(&content.title, &content.paragraphs, &geometry, calibration);
    let mut rewrites_requested = 0u32;
    let mut was_adjusted = false;

    for pass in 1..=MAX_PASSES {
        if assessment.fits() {
            break;
        }

        rewrites_requested += 1;
        let prompt = build_rewrite_prompt(&content, &assessment);
        match writer.rewrite(&prompt, &with_shared_rules(REWRITE_SYSTEM)).await {
            Ok(draft) => {
                if draft.title != content.title || draft.paragraphs != content.paragraphs {
                    content.title = draft.title;
                    content.paragraphs = draft.paragraphs;
                    was_adjusted = true;
                }
            }
            Err(e) => warn!(pass, "Slide rewrite failed, keeping previous text: {e}"),
        }

        assessment = assess_fit(&content.title, &content.paragraphs, &geometry, calibration);
    }

    let flagged_for_review = !assessment.fits();
    if flagged_for_review {
        warn!(
            rewrites = rewrites_requested,
            verdict = ?assessment.verdict,
            "Slide still overflows after max refit passes"
        );
    } else if was_adjusted {
        info!(rewrites = rewrites_requested, "Slide refitted");
    }

    RefitResult {
        content,
        assessment,
        rewrites_requested,
        was_adjusted,
        flagged_for_review,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted replies in order; errors once the script runs out.
    struct ScriptedWriter {
        replies: Mutex<VecDeque<Result<SlideDraft, AppError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedWriter {
        fn new(replies: Vec<Result<SlideDraft, AppError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ContentWriter for ScriptedWriter {
        async fn rewrite(&self, prompt: &str, _system: &str) -> Result<SlideDraft, AppError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Llm("script exhausted".to_string())))
        }
    }

    fn draft(title: &str, body: &str) -> SlideDraft {
        SlideDraft {
            title: title.to_string(),
            paragraphs: vec![body.to_string()],
        }
    }

    fn overflowing(image: bool) -> SlideContent {
        SlideContent {
            title: "Quarterly results".to_string(),
            paragraphs: vec!["x".repeat(500)],
            image_prompt: image.then(|| "bar chart trending up".to_string()),
        }
    }

    #[tokio::test]
    async fn test_fitting_content_makes_no_calls() {
        let writer = ScriptedWriter::new(vec![]);
        let content = SlideContent {
            title: "Intro".to_string(),
            paragraphs: vec!["Short body.".to_string()],
            image_prompt: None,
        };
        let result = refit_slide(content.clone(), 375.0, &FitCalibration::default(), &writer).await;

        assert_eq!(writer.calls(), 0);
        assert_eq!(result.content, content);
        assert!(!result.was_adjusted);
        assert!(!result.flagged_for_review);
    }

    #[tokio::test]
    async fn test_overflow_rewritten_until_fit() {
        let writer = ScriptedWriter::new(vec![
            Ok(draft("Quarterly results", &"y".repeat(460))),
            Ok(draft("Q3 results", "Revenue up 14%, churn down to 2.1%.")),
        ]);
        let result =
            refit_slide(overflowing(false), 375.0, &FitCalibration::default(), &writer).await;

        assert_eq!(writer.calls(), 2);
        assert_eq!(result.rewrites_requested, 2);
        assert!(result.was_adjusted);
        assert!(!result.flagged_for_review);
        assert_eq!(result.content.title, "Q3 results");
        assert!(writer.prompts.lock().unwrap()[0].contains("at most 448 characters"));
    }

    #[tokio::test]
    async fn test_image_prompt_survives_rewrite() {
        let writer = ScriptedWriter::new(vec![Ok(draft("Q3", "Revenue up."))]);
        let result =
            refit_slide(overflowing(true), 375.0, &FitCalibration::default(), &writer).await;

        assert_eq!(
            result.content.image_prompt.as_deref(),
            Some("bar chart trending up")
        );
        assert!(writer.prompts.lock().unwrap()[0].contains("at most 336 characters"));
    }

    #[tokio::test]
    async fn test_flagged_after_max_passes() {
        let writer = ScriptedWriter::new(vec![
            Err(AppError::Llm("upstream timeout".to_string())),
            Ok(draft("Quarterly results", &"z".repeat(600))),
        ]);
        let result =
            refit_slide(overflowing(false), 375.0, &FitCalibration::default(), &writer).await;

        assert_eq!(writer.calls(), MAX_PASSES as usize);
        assert!(result.flagged_for_review);
        assert!(result.was_adjusted);
        assert!(!result.assessment.fits());
    }
}
