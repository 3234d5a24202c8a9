//! Runtime interpretation of rules against a snapshot of variable values.
//!
//! Semantics:
//! * an empty AND group is true, an empty OR group is false
//! * a leaf whose variable (or referenced variable) is missing is false
//! * `between` is inclusive on both bounds and false when lower > upper
//! * `is_true` / `is_false` ignore any value or reference
//! * ordering operators only compare numbers

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::conditions::{scalar_of, ConditionGroup, ConditionNode, ConditionRule, ConditionValue, Connector, Literal};
use crate::registry::{OperatorKey, VariableKey};
use crate::rule::TriggerRule;

/// Values of the variables at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSnapshot {
    values: HashMap<VariableKey, Literal>,
}

impl VariableSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot with the time-context variables filled from `at`.
    pub fn at<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        let weekday = at.weekday().number_from_monday();
        Self::new()
            .with(VariableKey::CurrentHour, i64::from(at.hour()))
            .with(VariableKey::CurrentMinute, i64::from(at.minute()))
            .with(VariableKey::DayOfWeek, i64::from(weekday))
            .with(VariableKey::IsWeekend, weekday >= 6)
    }

    pub fn with(mut self, key: VariableKey, value: impl Into<Literal>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: VariableKey, value: impl Into<Literal>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: VariableKey) -> Option<&Literal> {
        self.values.get(&key)
    }

    /// Merge `other` over this snapshot.
    pub fn extend(&mut self, other: VariableSnapshot) {
        self.values.extend(other.values);
    }
}

fn numeric(lit: &Literal) -> Option<f64> {
    lit.as_f64()
}

fn equals(a: &Literal, b: &Literal) -> Option<bool> {
    match (a, b) {
        (Literal::Number(_), Literal::Number(_)) => Some(numeric(a)? == numeric(b)?),
        (Literal::Bool(x), Literal::Bool(y)) => Some(x == y),
        (Literal::Text(x), Literal::Text(y)) => Some(x == y),
        _ => None,
    }
}

fn order(a: &Literal, b: &Literal) -> Option<Ordering> {
    numeric(a)?.partial_cmp(&numeric(b)?)
}

impl ConditionRule {
    /// Whether this leaf holds for `snapshot`.
    pub fn evaluate(&self, snapshot: &VariableSnapshot) -> bool {
        let Some(actual) = snapshot.get(self.field) else {
            return false;
        };

        match self.op {
            OperatorKey::IsTrue => return actual.as_bool() == Some(true),
            OperatorKey::IsFalse => return actual.as_bool() == Some(false),
            OperatorKey::Between => {
                return match (&self.value, numeric(actual)) {
                    (Some(ConditionValue::Range([lower, upper])), Some(x)) => {
                        match (lower.as_f64(), upper.as_f64()) {
                            (Some(lo), Some(hi)) => lo <= x && x <= hi,
                            _ => false,
                        }
                    }
                    _ => false,
                };
            }
            _ => {}
        }

        let operand = match self.ref_field {
            Some(other) => snapshot.get(other),
            None => scalar_of(self),
        };
        let Some(operand) = operand else {
            return false;
        };

        let result = match self.op {
            OperatorKey::Eq => equals(actual, operand),
            OperatorKey::Neq => equals(actual, operand).map(|eq| !eq),
            OperatorKey::Lt => order(actual, operand).map(Ordering::is_lt),
            OperatorKey::Lte => order(actual, operand).map(Ordering::is_le),
            OperatorKey::Gt => order(actual, operand).map(Ordering::is_gt),
            OperatorKey::Gte => order(actual, operand).map(Ordering::is_ge),
            OperatorKey::Between | OperatorKey::IsTrue | OperatorKey::IsFalse => None,
        };
        result.unwrap_or(false)
    }
}

impl ConditionNode {
    pub fn evaluate(&self, snapshot: &VariableSnapshot) -> bool {
        match self {
            Self::Rule(rule) => rule.evaluate(snapshot),
            Self::Group(group) => group.evaluate(snapshot),
        }
    }
}

impl ConditionGroup {
    /// Short-circuit evaluation of the group.
    pub fn evaluate(&self, snapshot: &VariableSnapshot) -> bool {
        match self.operator {
            Connector::And => self.rules.iter().all(|node| node.evaluate(snapshot)),
            Connector::Or => self.rules.iter().any(|node| node.evaluate(snapshot)),
        }
    }
}

/// Outcome of asking whether a rule should fire now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum FireDecision {
    Fire,
    Disabled,
    OutsideSchedule,
    CoolingDown { remaining_secs: i64 },
    ConditionsNotMet,
}

impl FireDecision {
    pub fn fires(&self) -> bool {
        matches!(self, Self::Fire)
    }
}

impl TriggerRule {
    /// Check the enabled flag, schedule, cooldown and conditions, in that order.
    pub fn check_fire<Tz: TimeZone>(
        &self,
        snapshot: &VariableSnapshot,
        now: &DateTime<Tz>,
        last_fired: Option<DateTime<Utc>>,
    ) -> FireDecision {
        if !self.enabled {
            return FireDecision::Disabled;
        }
        if let Some(schedule) = &self.schedule {
            if !schedule.allows_at(now) {
                return FireDecision::OutsideSchedule;
            }
        }
        if let (Some(cooldown), Some(last)) = (self.cooldown(), last_fired) {
            if let Some(remaining) = cooldown.remaining(last, now.with_timezone(&Utc)) {
                return FireDecision::CoolingDown {
                    remaining_secs: remaining.num_seconds(),
                };
            }
        }
        if self.conditions.evaluate(snapshot) {
            FireDecision::Fire
        } else {
            FireDecision::ConditionsNotMet
        }
    }
}

/// Rules that fire now, highest priority first. Ties keep input order.
pub fn select_firing<'a, Tz: TimeZone>(
    rules: &'a [TriggerRule],
    snapshot: &VariableSnapshot,
    now: &DateTime<Tz>,
    last_fired: &HashMap<String, DateTime<Utc>>,
) -> Vec<&'a TriggerRule> {
    let mut firing: Vec<&TriggerRule> = rules
        .iter()
        .filter(|rule| {
            rule.check_fire(snapshot, now, last_fired.get(&rule.id).copied())
                .fires()
        })
        .collect();
    firing.sort_by(|a, b| b.priority.cmp(&a.priority));
    firing
}
