//! nudge-core - Core library for nudge.
//!
//! This crate provides the trigger-rule schema for health nudges: the
//! variable and operator registries, condition trees, actions, cooldown and
//! schedule constraints, validation, evaluation, persistence and the editor
//! working set.
//!
//! # Example
//!
//! ```ignore
//! use nudge_core::{Principal, Role, RuleValidator, RuleWorkspace, SqliteRuleStore};
//!
//! let store = SqliteRuleStore::new("rules.db")?;
//! let workspace = RuleWorkspace::new(store, RuleValidator::default());
//! workspace.load().await?;
//!
//! let rule = workspace.add_rule();
//! let admin = Principal::new("user-1", Some(Role::Admin));
//! workspace.save_rule(&admin, &rule.id).await?;
//! ```

pub mod actions;
pub mod conditions;
pub mod config;
pub mod constraints;
pub mod error;
pub mod evaluation;
pub mod generation;
pub mod registry;
pub mod rule;
pub mod store;
pub mod traits;
pub mod workspace;

// Re-export commonly used types
pub use actions::{Action, ActionType};
pub use conditions::{ConditionGroup, ConditionNode, ConditionRule, ConditionValue, Connector, Literal};
pub use config::{LlmProvider, LlmProviderConfig, NudgeConfig};
pub use constraints::{Cooldown, Schedule};
pub use error::{ErrorCode, NudgeError, NudgeResult};
pub use evaluation::{select_firing, FireDecision, VariableSnapshot};
pub use generation::{GeneratedRule, RuleGenerator};
pub use registry::{DataType, OperatorKey, VariableKey};
pub use rule::{
    describe_rule, RuleRow, RuleState, RuleValidator, Strictness, TriggerRule, ValidationReport,
    Violation,
};
pub use store::{InMemoryRuleStore, SqliteRuleStore};
pub use traits::{Llm, LlmConfig, Message, MessageRole, Principal, Role, RuleStore};
pub use workspace::RuleWorkspace;
