//! Condition trees: nested AND/OR groups over typed leaf predicates.

mod tree;
mod types;

pub(crate) use tree::scalar_of;
pub use types::{ConditionGroup, ConditionNode, ConditionRule, ConditionValue, Connector, Literal};
