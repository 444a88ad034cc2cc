//! Prompt text that steers content generation toward a slide's fit budget.
//!
//! Every number in these prompts comes from `FitBudget`. Nothing here restates a limit.
//! The rewrite prompt instructs the model to return `{"title": "...", "paragraphs": [...]}`.

use crate::layout::budget::{FitBudget, FitCalibration, TARGET_WORDS_PER_LINE};
use crate::layout::fit::FitAssessment;
use crate::models::slide::{SlideContent, SlideGeometry};

// ────────────────────────────────────────────────────────────────────────────
// Constraint block
// ────────────────────────────────────────────────────────────────────────────

pub const CONSTRAINTS_TEMPLATE: &str = "\
SLIDE CONTENT CONSTRAINTS:\n\
- Title: at most {max_title_chars} characters\n\
- Body: at most {max_paragraphs} paragraphs\n\
- Body: at most {max_content_chars} characters in total\n\
- Body: at most {max_lines} lines, counting every line break\n\
- Aim for about {words_per_line} words per line\n\
Content that exceeds these limits will not be shown on the slide.";

/// Renders the budget for `width` as an instruction block for a content generator.
pub fn prompt_constraints(width: f64, has_image: bool, calibration: &FitCalibration) -> String {
    let budget = FitBudget::for_geometry(&SlideGeometry::new(width, has_image), calibration);
    render_constraints(&budget)
}

pub fn render_constraints(budget: &FitBudget) -> String {
    CONSTRAINTS_TEMPLATE
        .replace("{max_title_chars}", &budget.max_title_chars.to_string())
        .replace("{max_paragraphs}", &budget.max_paragraphs.to_string())
        .replace("{max_content_chars}", &budget.max_content_chars.to_string())
        .replace("{max_lines}", &budget.max_lines.to_string())
        .replace("{words_per_line}", &TARGET_WORDS_PER_LINE.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Rewrite prompt (content overflows its slide)
// ────────────────────────────────────────────────────────────────────────────

pub const REWRITE_SYSTEM: &str = "\
You are a presentation editor. Your task is to shorten slide text that does not fit \
on its slide. Keep the key message, numbers and names. Drop filler, hedging and \
repetition. Do not invent facts.\n\
\n\
Respond with valid JSON only: {\"title\": \"...\", \"paragraphs\": [\"...\"]}\n\
Do NOT use markdown code fences. Do NOT add any explanation outside the JSON object.";

pub const REWRITE_PROMPT_TEMPLATE: &str = "\
A slide's text is too long for the slide and must be shortened.\n\
\n\
{slide}\n\
\n\
MEASURED: {title_chars} title characters, {paragraph_count} paragraphs, \
{total_chars} body characters, {line_count} lines\n\
\n\
{constraints}\n\
\n\
Return JSON only: {\"title\": \"shortened title\", \"paragraphs\": [\"shortened paragraph\"]}";

pub fn build_rewrite_prompt(content: &SlideContent, measured: &FitAssessment) -> String {
    let paragraphs = content
        .paragraphs
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] {}", i + 1, p))
        .collect::<Vec<_>>()
        .join("\n");

    // Rejected candidates skip body measurement, so measure here for the model.
    let total_chars = content.paragraphs.join(" ").chars().count();
    let line_count = content.paragraphs.join("\n").split('\n').count();

    REWRITE_PROMPT_TEMPLATE
        .replace("{title_chars}", &measured.title_chars.to_string())
        .replace("{paragraph_count}", &measured.paragraph_count.to_string())
        .replace("{total_chars}", &total_chars.to_string())
        .replace("{line_count}", &line_count.to_string())
        .replace("{constraints}", &render_constraints(&measured.budget))
        // Author text goes in last and in one piece, so braces in it are never expanded.
        .replace(
            "{slide}",
            &format!("CURRENT TITLE: {}\nCURRENT PARAGRAPHS:\n{}", content.title, paragraphs),
        )
}
