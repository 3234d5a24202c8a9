//! Actions a rule performs when it fires.

mod placeholders;
mod types;

pub use placeholders::{extract_placeholders, is_known_placeholder, PLACEHOLDER_TOKENS};
pub use types::{
    validate_background_compatibility, Action, ActionPriority, ActionType, AlertStyle, TargetView,
    BACKGROUND_ACTIONS,
};
