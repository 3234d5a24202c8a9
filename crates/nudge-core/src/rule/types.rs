//! The trigger rule aggregate and its persisted row form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::conditions::{ConditionGroup, ConditionRule, Connector};
use crate::constraints::{parse_cooldown, Cooldown, Schedule};
use crate::registry::{OperatorKey, VariableKey};

pub const DEFAULT_PRIORITY: i64 = 50;
pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 100;
pub const DEFAULT_COOLDOWN: &str = "24h";
pub const SEED_RULE_ID: &str = "steps_reminder_evening";

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// A named automation: when the conditions hold inside the schedule and
/// outside the cooldown, run the actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Higher fires first. Valid range is 1..=100.
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub conditions: ConditionGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub background_enabled: bool,
}

impl TriggerRule {
    /// Blank rule as created by "add rule": empty AND root, 24h cooldown and
    /// one empty notification.
    pub fn new_empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "New rule".to_string(),
            enabled: true,
            priority: DEFAULT_PRIORITY,
            conditions: ConditionGroup::new(Connector::And),
            cooldown: Some(DEFAULT_COOLDOWN.to_string()),
            schedule: None,
            actions: vec![Action::notification("", "")],
            background_enabled: false,
        }
    }

    /// Id for a freshly added rule.
    pub fn fresh_id(now: DateTime<Utc>) -> String {
        format!("new_rule_{}", now.timestamp_millis())
    }

    /// Rule installed when the store holds no rules yet.
    pub fn seed() -> Self {
        Self {
            id: SEED_RULE_ID.to_string(),
            name: "Evening steps reminder".to_string(),
            enabled: true,
            priority: 70,
            conditions: ConditionGroup::all(vec![
                ConditionRule::literal(VariableKey::CurrentHour, OperatorKey::Gte, 18).into(),
                ConditionRule::literal(VariableKey::CurrentHour, OperatorKey::Lte, 21).into(),
                ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal).into(),
                ConditionRule::unary(VariableKey::IsWeekend, OperatorKey::IsFalse).into(),
            ]),
            cooldown: Some(DEFAULT_COOLDOWN.to_string()),
            schedule: None,
            actions: vec![Action::notification(
                "Steps goal at risk",
                "You are {{remaining_steps}} steps short. How about a short walk?",
            )],
            background_enabled: false,
        }
    }

    /// Parsed cooldown; `None` when the rule has none.
    pub fn cooldown(&self) -> Option<Cooldown> {
        self.cooldown.as_deref().map(|raw| parse_cooldown(Some(raw)))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A stored rule with its denormalized listing columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRow {
    #[serde(rename = "id")]
    pub row_id: String,
    pub rule_id: String,
    pub name: String,
    pub enabled: bool,
    pub rule: TriggerRule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RuleRow {
    /// The stored rule, with non-empty listing columns taking precedence
    /// over the embedded document.
    pub fn into_rule(self) -> TriggerRule {
        let mut rule = self.rule;
        if !self.rule_id.is_empty() {
            rule.id = self.rule_id;
        }
        if !self.name.is_empty() {
            rule.name = self.name;
        }
        rule.enabled = self.enabled;
        rule
    }
}
