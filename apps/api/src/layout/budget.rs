//! Character and line budgets for a single slide.
//!
//! The budget is a heuristic, not a text-measurement oracle. Average glyph advance is
//! modelled as a fixed fraction of an estimated body font size, which itself scales with
//! the slide width. No real font metrics are consulted.
//!
//! The ratios in `FitCalibration` were tuned against one rendering engine. Renderers with
//! different text metrics should override them (see `Config`) rather than edit the formulas.

use serde::{Deserialize, Serialize};

use crate::models::slide::SlideGeometry;

// ────────────────────────────────────────────────────────────────────────────
// Fixed limits
// ────────────────────────────────────────────────────────────────────────────

/// Body line budget when the slide reserves space for an illustration.
pub const MAX_LINES_WITH_IMAGE: u32 = 6;
/// Body line budget for a text-only slide.
pub const MAX_LINES_TEXT_ONLY: u32 = 8;
pub const MAX_PARAGRAPHS: usize = 2;
pub const MAX_TITLE_CHARS: usize = 40;
/// Target line density handed to content generation.
pub const TARGET_WORDS_PER_LINE: u32 = 8;

// ────────────────────────────────────────────────────────────────────────────
// Calibration
// ────────────────────────────────────────────────────────────────────────────

/// Empirically tuned ratios behind the budget formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitCalibration {
    /// Estimated body font size as a fraction of slide width.
    pub font_size_ratio: f64,
    /// Average glyph advance as a fraction of font size.
    pub glyph_advance_ratio: f64,
    /// Fraction of the theoretical character capacity actually offered to content.
    /// The remainder absorbs wrapping overhead.
    pub slack_factor: f64,
}

impl Default for FitCalibration {
    fn default() -> Self {
        Self {
            font_size_ratio: 0.022,
            glyph_advance_ratio: 0.65,
            slack_factor: 0.8,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Budget
// ────────────────────────────────────────────────────────────────────────────

/// Derived text limits for one slide geometry. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitBudget {
    pub max_chars_per_line: u32,
    pub max_content_chars: u32,
    pub max_lines: u32,
    pub max_paragraphs: usize,
    pub max_title_chars: usize,
}

impl FitBudget {
    pub fn for_geometry(geometry: &SlideGeometry, calibration: &FitCalibration) -> Self {
        Self {
            max_chars_per_line: max_chars_per_line(geometry.width, calibration),
            max_content_chars: max_content_chars(geometry.width, geometry.has_image, calibration),
            max_lines: max_lines(geometry.has_image),
            max_paragraphs: MAX_PARAGRAPHS,
            max_title_chars: MAX_TITLE_CHARS,
        }
    }
}

/// Estimated characters that fit on one body line.
///
/// Returns 0 for a non-positive or non-finite width; callers are expected to pass a
/// positive slide width.
pub fn max_chars_per_line(width: f64, calibration: &FitCalibration) -> u32 {
    if !width.is_finite() || width <= 0.0 {
        return 0;
    }
    let font_size = width * calibration.font_size_ratio;
    let glyph_advance = font_size * calibration.glyph_advance_ratio;
    if glyph_advance <= 0.0 {
        return 0;
    }
    round_to_u32(width / glyph_advance)
}

pub fn max_lines(has_image: bool) -> u32 {
    if has_image {
        MAX_LINES_WITH_IMAGE
    } else {
        MAX_LINES_TEXT_ONLY
    }
}

/// Total body characters a slide may carry, after the slack reservation.
pub fn max_content_chars(width: f64, has_image: bool, calibration: &FitCalibration) -> u32 {
    let capacity = max_chars_per_line(width, calibration) as f64 * max_lines(has_image) as f64;
    round_to_u32(capacity * calibration.slack_factor)
}

fn round_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else {
        value.round().min(u32::MAX as f64) as u32
    }
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

    #[test]
    fn test_phone_width_chars_per_line() {
        // 375 / ((375 * 0.022) * 0.65) = 375 / 5.3625 ≈ 69.9
        assert_eq!(max_chars_per_line(375.0, &cal()), 70);
    }

    #[test]
    fn test_phone_width_content_chars_text_only() {
        // round(70 * 8 * 0.8) = 448
        assert_eq!(max_content_chars(375.0, false, &cal()), 448);
    }

    #[test]
    fn test_phone_width_content_chars_with_image() {
        // round(70 * 6 * 0.8) = 336
        assert_eq!(max_content_chars(375.0, true, &cal()), 336);
    }

    #[test]
    fn test_non_positive_width_is_degenerate() {
        assert_eq!(max_chars_per_line(0.0, &cal()), 0);
        assert_eq!(max_chars_per_line(-120.0, &cal()), 0);
        assert_eq!(max_chars_per_line(f64::NAN, &cal()), 0);
        assert_eq!(max_content_chars(0.0, false, &cal()), 0);
    }

    #[test]
    fn test_image_never_increases_budget() {
        for width in [1.0, 37.5, 320.0, 375.0, 768.0, 1280.0, 1920.0, 4096.0] {
            assert!(
                max_content_chars(width, true, &cal()) <= max_content_chars(width, false, &cal()),
                "image slide must not get a larger budget at width {width}"
            );
        }
    }

    #[test]
    fn test_budget_non_decreasing_in_width() {
        let widths = [1.0, 10.0, 100.0, 375.0, 1000.0, 2560.0];
        for has_image in [true, false] {
            for pair in widths.windows(2) {
                assert!(
                    max_content_chars(pair[0], has_image, &cal())
                        <= max_content_chars(pair[1], has_image, &cal())
                );
            }
        }
    }

    #[test]
    fn test_max_lines_by_image_presence() {
        assert_eq!(max_lines(true), 6);
        assert_eq!(max_lines(false), 8);
    }

    #[test]
    fn test_calibration_override_changes_budget() {
        let wide_glyphs = FitCalibration {
            glyph_advance_ratio: 1.0,
            ..FitCalibration::default()
        };
        // 1 / (0.022 * 1.0) ≈ 45.45
        assert_eq!(max_chars_per_line(375.0, &wide_glyphs), 45);
        assert!(max_content_chars(375.0, false, &wide_glyphs) < 448);
    }

    #[test]
    fn test_budget_for_geometry_carries_fixed_limits() {
        let budget = FitBudget::for_geometry(&SlideGeometry::new(375.0, true), &cal());
        assert_eq!(budget.max_chars_per_line, 70);
        assert_eq!(budget.max_content_chars, 336);
        assert_eq!(budget.max_lines, 6);
        assert_eq!(budget.max_paragraphs, 2);
        assert_eq!(budget.max_title_chars, 40);
    }
}
