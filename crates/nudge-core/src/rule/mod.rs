//! The trigger rule document: types, identity, validation and summaries.

mod identity;
mod summary;
mod types;
mod validation;

pub use identity::{duplicate_rule, is_valid_rule_id, normalize_rule_id};
pub use summary::{describe_group, describe_rule};
pub use types::{
    RuleRow, TriggerRule, DEFAULT_COOLDOWN, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY, SEED_RULE_ID,
};
pub use validation::{
    RuleState, RuleValidator, Strictness, ValidationReport, Violation, ViolationKind,
};
