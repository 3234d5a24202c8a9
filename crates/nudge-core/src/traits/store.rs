//! Persistence collaborator for rule documents.

use async_trait::async_trait;

use crate::error::NudgeResult;
use crate::rule::{RuleRow, TriggerRule};

/// Storage of trigger rules keyed by rule id.
///
/// Implementations must not partially apply a failed write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All rows, most recently updated first.
    async fn list(&self) -> NudgeResult<Vec<RuleRow>>;

    /// Insert or replace the row for `rule.id`.
    async fn upsert(&self, rule: &TriggerRule) -> NudgeResult<RuleRow>;

    /// Delete the row for `rule_id`. Deleting a missing id is not an error.
    async fn remove(&self, rule_id: &str) -> NudgeResult<()>;
}
