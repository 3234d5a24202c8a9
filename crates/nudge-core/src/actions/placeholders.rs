//! `{{token}}` placeholders in action text.
//!
//! Substitution happens where the action is delivered; here tokens are only
//! discovered and checked against the known set.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::Action;

/// Tokens the delivery side knows how to fill in.
pub const PLACEHOLDER_TOKENS: &[&str] = &[
    "steps",
    "steps_goal",
    "remaining_steps",
    "remaining_steps_minutes",
    "remaining_steps_km",
    "steps_percent",
    "habits_completed_today",
    "habits_total_today",
    "habits_remaining",
    "habits_percent",
    "recovery_percent",
    "recovery_status",
    "sleep_hours",
    "current_time",
];

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid"));

/// Tokens referenced in `text`, in order of appearance, without duplicates.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            if !found.iter().any(|t| t == m.as_str()) {
                found.push(m.as_str().to_string());
            }
        }
    }
    found
}

pub fn is_known_placeholder(token: &str) -> bool {
    PLACEHOLDER_TOKENS.contains(&token)
}

impl Action {
    /// Tokens referenced anywhere in this action's text.
    pub fn placeholders(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for (_, text) in self.text_fields() {
            for token in extract_placeholders(text) {
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        tokens
    }

    /// Referenced tokens outside [`PLACEHOLDER_TOKENS`].
    pub fn unknown_placeholders(&self) -> Vec<String> {
        self.placeholders()
            .into_iter()
            .filter(|t| !is_known_placeholder(t))
            .collect()
    }
}
