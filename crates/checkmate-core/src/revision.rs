//! Text revision helpers.

/// Append `suggestion` to `text` under a marker naming the requirement.
///
/// An empty or whitespace-only suggestion leaves the text unchanged.
pub fn apply_suggestion(text: &str, requirement_index: u32, suggestion: &str) -> String {
    if suggestion.trim().is_empty() {
        return text.to_string();
    }
    format!("{text}\n\n/* 수정(조건 {requirement_index}) */\n{suggestion}")
}
