//! In-process rule store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::NudgeResult;
use crate::rule::{RuleRow, TriggerRule};
use crate::traits::RuleStore;

/// Rule store kept in memory. Contents are lost on drop.
#[derive(Default)]
pub struct InMemoryRuleStore {
    rows: RwLock<HashMap<String, RuleRow>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given rules.
    pub async fn with_rules(rules: impl IntoIterator<Item = TriggerRule>) -> NudgeResult<Self> {
        let store = Self::new();
        for rule in rules {
            store.upsert(&rule).await?;
        }
        Ok(store)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Stored document for one rule id.
    pub async fn get(&self, rule_id: &str) -> Option<TriggerRule> {
        self.rows.read().await.get(rule_id).map(|row| row.rule.clone())
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list(&self) -> NudgeResult<Vec<RuleRow>> {
        let rows = self.rows.read().await;
        let mut listed: Vec<RuleRow> = rows.values().cloned().collect();
        listed.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        Ok(listed)
    }

    async fn upsert(&self, rule: &TriggerRule) -> NudgeResult<RuleRow> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let (row_id, created_at) = rows
            .get(&rule.id)
            .map(|existing| (existing.row_id.clone(), existing.created_at))
            .unwrap_or_else(|| (Uuid::new_v4().to_string(), now));

        let row = RuleRow {
            row_id,
            rule_id: rule.id.clone(),
            name: rule.name.clone(),
            enabled: rule.enabled,
            rule: rule.clone(),
            created_at,
            updated_at: now,
        };
        rows.insert(rule.id.clone(), row.clone());
        Ok(row)
    }

    async fn remove(&self, rule_id: &str) -> NudgeResult<()> {
        self.rows.write().await.remove(rule_id);
        Ok(())
    }
}
