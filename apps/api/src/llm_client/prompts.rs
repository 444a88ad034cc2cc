// Cross-cutting prompt fragments. Feature prompts live next to their feature
// (see layout/prompts.rs).

/// Appended to every system prompt that expects a JSON reply.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps rewritten slides faithful to the original content.
pub const FIDELITY_INSTRUCTION: &str = "\
    CRITICAL: Every statement in the rewritten slide must come from the original slide. \
    Do NOT add claims, numbers, names or examples that are not in the original. \
    If something must go to meet the limits, remove it rather than paraphrase it into something new.";

/// Combines a feature system prompt with the shared fragments.
pub fn with_shared_rules(system: &str) -> String {
    format!("{system}\n\n{FIDELITY_INSTRUCTION}\n\n{JSON_ONLY_SYSTEM}")
}
