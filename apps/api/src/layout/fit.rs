//! Fit predicate — does a candidate title/body fit the slide's budget?
//!
//! # Rules
//! - Title longer than 40 chars: fails regardless of body.
//! - More than 2 paragraphs: fails regardless of length.
//! - Body chars (paragraphs joined by a single space) must not exceed `max_content_chars`.
//! - Body lines (paragraphs joined by newlines, then split on newlines) must not exceed
//!   `max_lines`. Embedded newlines inside a paragraph consume extra lines.
//!
//! Overflow is a normal outcome, not an error. Nothing here truncates content.
//! Lengths are counted in Unicode scalar values.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::budget::{FitBudget, FitCalibration};
use crate::models::slide::SlideGeometry;

/// The first rule a candidate violates, or `Fits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitVerdict {
    Fits,
    TitleTooLong { chars: usize, max: usize },
    TooManyParagraphs { count: usize, max: usize },
    TooManyChars { chars: usize, max: u32 },
    TooManyLines { lines: usize, max: u32 },
}

/// Full measurement of one candidate against one budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitAssessment {
    pub budget: FitBudget,
    pub title_chars: usize,
    pub paragraph_count: usize,
    /// Zero when an earlier rule already rejected the candidate.
    pub total_chars: usize,
    pub line_count: usize,
    pub verdict: FitVerdict,
}

impl FitAssessment {
    pub fn fits(&self) -> bool {
        matches!(self.verdict, FitVerdict::Fits)
    }
}

/// Returns true when the title and paragraphs fit a slide of `width`.
pub fn does_content_fit(
    title: &str,
    paragraphs: &[String],
    width: f64,
    has_image: bool,
    calibration: &FitCalibration,
) -> bool {
    assess_fit(
        title,
        paragraphs,
        &SlideGeometry::new(width, has_image),
        calibration,
    )
    .fits()
}

/// Measures a candidate and reports which rule, if any, it breaks.
pub fn assess_fit(
    title: &str,
    paragraphs: &[String],
    geometry: &SlideGeometry,
    calibration: &FitCalibration,
) -> FitAssessment {
    let budget = FitBudget::for_geometry(geometry, calibration);
    let title_chars = title.chars().count();
    let paragraph_count = paragraphs.len();

    let mut assessment = FitAssessment {
        budget,
        title_chars,
        paragraph_count,
        total_chars: 0,
        line_count: 0,
        verdict: FitVerdict::Fits,
    };

    if title_chars > budget.max_title_chars {
        assessment.verdict = FitVerdict::TitleTooLong {
            chars: title_chars,
            max: budget.max_title_chars,
        };
        return traced(assessment);
    }
    if paragraph_count > budget.max_paragraphs {
        assessment.verdict = FitVerdict::TooManyParagraphs {
            count: paragraph_count,
            max: budget.max_paragraphs,
        };
        return traced(assessment);
    }

    assessment.total_chars = paragraphs.join(" ").chars().count();
    assessment.line_count = paragraphs.join("\n").split('\n').count();

    if assessment.total_chars > budget.max_content_chars as usize {
        assessment.verdict = FitVerdict::TooManyChars {
            chars: assessment.total_chars,
            max: budget.max_content_chars,
        };
    } else if assessment.line_count > budget.max_lines as usize {
        assessment.verdict = FitVerdict::TooManyLines {
            lines: assessment.line_count,
            max: budget.max_lines,
        };
    }

    traced(assessment)
}

fn traced(assessment: FitAssessment) -> FitAssessment {
    debug!(
        max_chars_per_line = assessment.budget.max_chars_per_line,
        max_content_chars = assessment.budget.max_content_chars,
        max_lines = assessment.budget.max_lines,
        title_chars = assessment.title_chars,
        paragraphs = assessment.paragraph_count,
        total_chars = assessment.total_chars,
        lines = assessment.line_count,
        verdict = ?assessment.verdict,
        "slide fit assessed"
    );
    assessment
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cal() -> FitCalibration {
        FitCalibration::default()
    }

    fn paras(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_title_of_forty_chars_passes_title_check() {
        let title = "t".repeat(40);
        assert!(does_content_fit(&title, &paras(&["short body"]), 375.0, false, &cal()));
    }

    #[test]
    fn test_title_of_forty_one_chars_fails_regardless_of_body() {
        let title = "t".repeat(41);
        assert!(!does_content_fit(&title, &[], 375.0, false, &cal()));
        assert!(!does_content_fit(&title, &[], 4096.0, false, &cal()));

        let assessment = assess_fit(&title, &[], &SlideGeometry::new(375.0, false), &cal());
        assert_eq!(
            assessment.verdict,
            FitVerdict::TitleTooLong { chars: 41, max: 40 }
        );
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        // 40 × 'é' is 80 bytes but 40 chars.
        let title = "é".repeat(40);
        assert!(does_content_fit(&title, &[], 375.0, false, &cal()));
    }

    #[test]
    fn test_three_paragraphs_fail() {
        let body = paras(&["a", "b", "c"]);
        let assessment = assess_fit("Title", &body, &SlideGeometry::new(375.0, false), &cal());
        assert_eq!(
            assessment.verdict,
            FitVerdict::TooManyParagraphs { count: 3, max: 2 }
        );
        assert!(!assessment.fits());
    }

    #[test]
    fn test_four_hundred_chars_fit_at_phone_width() {
        let body = vec!["x".repeat(400)];
        assert!(does_content_fit("Title", &body, 375.0, false, &cal()));
    }

    #[test]
    fn test_five_hundred_chars_overflow_at_phone_width() {
        let body = vec!["x".repeat(500)];
        let assessment = assess_fit("Title", &body, &SlideGeometry::new(375.0, false), &cal());
        assert_eq!(
            assessment.verdict,
            FitVerdict::TooManyChars { chars: 500, max: 448 }
        );
    }

    #[test]
    fn test_separator_space_counts_toward_total() {
        // 224 + 1 + 223 = 448 fits exactly; one more char overflows.
        let fits = vec!["a".repeat(224), "b".repeat(223)];
        assert!(does_content_fit("Title", &fits, 375.0, false, &cal()));

        let overflows = vec!["a".repeat(224), "b".repeat(224)];
        assert!(!does_content_fit("Title", &overflows, 375.0, false, &cal()));
    }

    #[test]
    fn test_embedded_newlines_consume_line_budget() {
        // 2 paragraphs × 4 lines = 8 lines: fits a text-only slide, not an image slide.
        let body = paras(&["one\ntwo\nthree\nfour", "five\nsix\nseven\neight"]);
        assert!(does_content_fit("Title", &body, 375.0, false, &cal()));

        let assessment = assess_fit("Title", &body, &SlideGeometry::new(375.0, true), &cal());
        assert_eq!(assessment.line_count, 8);
        assert_eq!(assessment.verdict, FitVerdict::TooManyLines { lines: 8, max: 6 });
    }

    #[test]
    fn test_empty_body_fits() {
        let assessment = assess_fit("Title", &[], &SlideGeometry::new(375.0, true), &cal());
        assert!(assessment.fits());
        assert_eq!(assessment.total_chars, 0);
        assert_eq!(assessment.line_count, 1);
    }

    #[test]
    fn test_image_budget_rejects_text_only_fit() {
        // 400 chars: within 448 (text only) but over 336 (with image).
        let body = vec!["x".repeat(400)];
        assert!(does_content_fit("Title", &body, 375.0, false, &cal()));
        assert!(!does_content_fit("Title", &body, 375.0, true, &cal()));
    }

    #[test]
    fn test_fit_is_monotonic_in_width() {
        let body = paras(&["Quarterly revenue grew 14% on strong enterprise renewals.", "Churn fell to 2.1%."]);
        let widths = [120.0, 375.0, 768.0, 1280.0, 1920.0];
        for has_image in [true, false] {
            let mut seen_fit = false;
            for width in widths {
                let fits = does_content_fit("Q3 review", &body, width, has_image, &cal());
                assert!(!(seen_fit && !fits), "fit must not regress as width grows");
                seen_fit |= fits;
            }
        }
    }

    #[test]
    fn test_degenerate_width_rejects_any_body() {
        assert!(!does_content_fit("Title", &paras(&["x"]), 0.0, false, &cal()));
    }
}
