//! Rule id checks and collision-free id derivation.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::TriggerRule;

static RULE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("rule id pattern is valid"));

/// Lowercase letters, digits and underscores, starting with a letter.
pub fn is_valid_rule_id(id: &str) -> bool {
    RULE_ID.is_match(id)
}

/// `base` if unused, otherwise the first of `base_1`, `base_2`, ... that is.
pub fn normalize_rule_id(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Copy of `rule` under a fresh `<id>_copy` id.
pub fn duplicate_rule(rule: &TriggerRule, existing: &HashSet<String>) -> TriggerRule {
    let id = normalize_rule_id(&format!("{}_copy", rule.id), existing);
    TriggerRule {
        id,
        name: format!("{} (copy)", rule.name),
        ..rule.clone()
    }
}
