//! Draft to Valid checks for trigger rules.
//!
//! Validation never rewrites the rule. Errors block saving and acceptance
//! of generated rules; warnings are surfaced to the author but do not block.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use super::identity::is_valid_rule_id;
use super::types::{TriggerRule, MAX_PRIORITY, MIN_PRIORITY};
use crate::actions::{validate_background_compatibility, ActionType};
use crate::conditions::{ConditionGroup, ConditionNode, ConditionRule, ConditionValue, Connector, Literal};
use crate::constraints::{Cooldown, Schedule, MAX_COOLDOWN_DAYS, MAX_HOUR};
use crate::error::{NudgeError, NudgeResult};
use crate::registry::{DataType, ValueArity, VariableKey};

/// How background-mode violations are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Strictness {
    /// Background violations are errors.
    #[default]
    Strict,
    /// Background violations are warnings.
    Advisory,
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    InvalidId,
    DuplicateId,
    PriorityOutOfRange,
    MissingActions,
    OperatorTypeMismatch,
    ValueAndRef,
    UnexpectedOperand,
    MissingOperand,
    ArityMismatch,
    RefNotAllowed,
    LiteralTypeMismatch,
    RefTypeMismatch,
    ValueNotAllowed,
    HourOutOfRange,
    DayOutOfRange,
    BackgroundVariable { field: VariableKey },
    BackgroundAction { index: usize, action_type: ActionType },
    EmptyName,
    EmptyGroup,
    InvertedRange,
    InvalidCooldown,
    ExcessiveCooldown,
    DuplicateDay,
    NoDays,
    EmptyActionText,
    UnknownPlaceholder,
}

/// One finding, located by a dotted path into the wire document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors and warnings for one rule or a collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Violation>,
    pub warnings: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) {
        self.errors.push(Violation::new(path, kind, message));
    }

    fn warn(&mut self, path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) {
        self.warnings.push(Violation::new(path, kind, message));
    }

    fn all(&self) -> impl Iterator<Item = &Violation> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Variables that a background rule may not read, whatever their severity.
    pub fn background_offending_fields(&self) -> Vec<VariableKey> {
        self.all()
            .filter_map(|v| match &v.kind {
                ViolationKind::BackgroundVariable { field } => Some(*field),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Actions that a background rule may not run, by position.
    pub fn background_offending_actions(&self) -> Vec<(usize, ActionType)> {
        self.all()
            .filter_map(|v| match &v.kind {
                ViolationKind::BackgroundAction { index, action_type } => Some((*index, *action_type)),
                _ => None,
            })
            .collect()
    }

    /// Warnings on success, a schema violation carrying the errors otherwise.
    pub fn into_result(self) -> NudgeResult<Vec<Violation>> {
        if self.errors.is_empty() {
            return Ok(self.warnings);
        }
        let summary = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(NudgeError::schema(
            format!("{} problem(s): {}", self.errors.len(), summary),
            self.errors,
        ))
    }

    fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Authoring state of one rule in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RuleState {
    /// Edited since the last save and failing validation.
    Draft,
    /// Edited since the last save and ready to be saved.
    Valid,
    /// A save is in flight.
    Saving,
    /// Matches what the store holds.
    Saved,
}

/// Checks rule documents against the schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator {
    strictness: Strictness,
}

impl RuleValidator {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Validate one rule.
    pub fn validate(&self, rule: &TriggerRule) -> ValidationReport {
        let mut report = ValidationReport::default();

        if !is_valid_rule_id(&rule.id) {
            report.error(
                "id",
                ViolationKind::InvalidId,
                format!(
                    "'{}' must start with a lowercase letter and contain only lowercase letters, digits and underscores",
                    rule.id
                ),
            );
        }
        if rule.name.trim().is_empty() {
            report.warn("name", ViolationKind::EmptyName, "rule has no display name");
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&rule.priority) {
            report.error(
                "priority",
                ViolationKind::PriorityOutOfRange,
                format!("{} is outside {}..={}", rule.priority, MIN_PRIORITY, MAX_PRIORITY),
            );
        }

        if rule.conditions.is_empty() {
            report.warn(
                "conditions",
                ViolationKind::EmptyGroup,
                match rule.conditions.operator {
                    Connector::And => "no conditions; the rule matches whenever its constraints allow",
                    Connector::Or => "no conditions; an empty OR group never matches",
                },
            );
        }
        self.check_group(&rule.conditions, "conditions", &mut report);

        if let Some(raw) = &rule.cooldown {
            match Cooldown::parse_strict(raw) {
                None => report.warn(
                    "cooldown",
                    ViolationKind::InvalidCooldown,
                    format!("'{}' is not of the form <amount><m|h|d>; 24h is used", raw),
                ),
                Some(cooldown) if cooldown.is_excessive() => report.warn(
                    "cooldown",
                    ViolationKind::ExcessiveCooldown,
                    format!(
                        "'{}' is longer than {} days; the rule will rarely fire again",
                        raw, MAX_COOLDOWN_DAYS
                    ),
                ),
                Some(_) => {}
            }
        }
        if let Some(schedule) = &rule.schedule {
            check_schedule(schedule, &mut report);
        }

        self.check_actions(rule, &mut report);

        if rule.background_enabled {
            self.check_background(rule, &mut report);
        }

        debug!(
            rule_id = %rule.id,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated rule"
        );
        report
    }

    /// Validate every rule and check ids are unique across the collection.
    pub fn validate_collection(&self, rules: &[TriggerRule]) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (idx, rule) in rules.iter().enumerate() {
            let mut single = self.validate(rule);
            for v in single.errors.iter_mut().chain(single.warnings.iter_mut()) {
                v.path = format!("rules[{}].{}", idx, v.path);
            }
            report.merge(single);

            if let Some(first) = seen.insert(rule.id.as_str(), idx) {
                report.error(
                    format!("rules[{}].id", idx),
                    ViolationKind::DuplicateId,
                    format!("'{}' is already used by rules[{}]", rule.id, first),
                );
            }
        }
        report
    }

    fn check_group(&self, group: &ConditionGroup, path: &str, report: &mut ValidationReport) {
        for (idx, node) in group.rules.iter().enumerate() {
            let child_path = format!("{}.rules[{}]", path, idx);
            match node {
                ConditionNode::Rule(rule) => check_leaf(rule, &child_path, report),
                ConditionNode::Group(sub) => {
                    if sub.is_empty() {
                        report.warn(
                            child_path.as_str(),
                            ViolationKind::EmptyGroup,
                            format!("empty {} group", sub.operator),
                        );
                    }
                    self.check_group(sub, &child_path, report);
                }
            }
        }
    }

    fn check_actions(&self, rule: &TriggerRule, report: &mut ValidationReport) {
        if rule.actions.is_empty() {
            report.error("actions", ViolationKind::MissingActions, "a rule needs at least one action");
            return;
        }
        for (idx, action) in rule.actions.iter().enumerate() {
            for field in action.empty_text_fields() {
                report.warn(
                    format!("actions[{}].{}", idx, field),
                    ViolationKind::EmptyActionText,
                    format!("{} is empty", field),
                );
            }
            for token in action.unknown_placeholders() {
                report.warn(
                    format!("actions[{}]", idx),
                    ViolationKind::UnknownPlaceholder,
                    format!("unknown placeholder {{{{{}}}}}", token),
                );
            }
        }
    }

    fn check_background(&self, rule: &TriggerRule, report: &mut ValidationReport) {
        let mut findings = Vec::new();

        for field in rule.conditions.collect_referenced_fields() {
            if !field.is_background_safe() {
                findings.push(Violation::new(
                    "conditions",
                    ViolationKind::BackgroundVariable { field },
                    format!("'{}' is not available to background rules", field),
                ));
            }
        }
        if let Err(offending) = validate_background_compatibility(&rule.actions) {
            for (index, action_type) in offending {
                findings.push(Violation::new(
                    format!("actions[{}]", index),
                    ViolationKind::BackgroundAction { index, action_type },
                    format!("background rules may only send notifications, not {}", action_type),
                ));
            }
        }

        match self.strictness {
            Strictness::Strict => report.errors.extend(findings),
            Strictness::Advisory => report.warnings.extend(findings),
        }
    }
}

fn check_leaf(rule: &ConditionRule, path: &str, report: &mut ValidationReport) {
    let field_type = rule.field.data_type();
    let def = rule.op.definition();

    if !def.accepts(field_type) {
        report.error(
            format!("{}.op", path),
            ViolationKind::OperatorTypeMismatch,
            format!("'{}' cannot be applied to {} variable '{}'", rule.op, field_type, rule.field),
        );
        return;
    }

    if rule.value.is_some() && rule.ref_field.is_some() {
        report.error(
            path,
            ViolationKind::ValueAndRef,
            "a condition compares against either a value or a variable, not both",
        );
    }

    if def.arity == ValueArity::None {
        if rule.value.is_some() || rule.ref_field.is_some() {
            report.error(
                path,
                ViolationKind::UnexpectedOperand,
                format!("'{}' takes no value", rule.op),
            );
        }
        return;
    }

    if let Some(other) = rule.ref_field {
        if !def.allows_ref {
            report.error(
                format!("{}.ref", path),
                ViolationKind::RefNotAllowed,
                format!("'{}' cannot compare against another variable", rule.op),
            );
        } else if other.data_type() != field_type {
            report.error(
                format!("{}.ref", path),
                ViolationKind::RefTypeMismatch,
                format!(
                    "'{}' is {} but '{}' is {}",
                    rule.field,
                    field_type,
                    other,
                    other.data_type()
                ),
            );
        }
    }

    let value_path = format!("{}.value", path);
    match (def.arity, &rule.value) {
        (ValueArity::Single, None) if rule.ref_field.is_none() => {
            report.error(
                value_path,
                ViolationKind::MissingOperand,
                format!("'{}' needs a value or a variable", rule.op),
            );
        }
        (ValueArity::Single, Some(ConditionValue::Range(_))) => {
            report.error(
                value_path,
                ViolationKind::ArityMismatch,
                format!("'{}' takes a single value, not a range", rule.op),
            );
        }
        (ValueArity::Single, Some(ConditionValue::Scalar(lit))) => {
            if lit.data_type() != field_type {
                report.error(
                    value_path,
                    ViolationKind::LiteralTypeMismatch,
                    format!("'{}' expects a {} value, got {}", rule.field, field_type, lit),
                );
            } else if let (Some(allowed), Literal::Text(text)) =
                (rule.field.definition().allowed_values, lit)
            {
                if !allowed.contains(&text.as_str()) {
                    report.error(
                        value_path,
                        ViolationKind::ValueNotAllowed,
                        format!("'{}' must be one of {}", rule.field, allowed.join(", ")),
                    );
                }
            }
        }
        (ValueArity::Range, None) if rule.ref_field.is_none() => {
            report.error(
                value_path,
                ViolationKind::MissingOperand,
                format!("'{}' needs a [lower, upper] range", rule.op),
            );
        }
        (ValueArity::Range, Some(ConditionValue::Scalar(_))) => {
            report.error(
                value_path,
                ViolationKind::ArityMismatch,
                format!("'{}' takes a [lower, upper] range", rule.op),
            );
        }
        (ValueArity::Range, Some(ConditionValue::Range([lower, upper]))) => {
            if field_type != DataType::Number {
                report.error(
                    value_path.as_str(),
                    ViolationKind::LiteralTypeMismatch,
                    format!("'{}' is not numeric", rule.field),
                );
            }
            if let (Some(lo), Some(hi)) = (lower.as_f64(), upper.as_f64()) {
                if lo > hi {
                    report.warn(
                        value_path,
                        ViolationKind::InvertedRange,
                        format!("lower bound {} is above upper bound {}; the condition never matches", lower, upper),
                    );
                }
            }
        }
        _ => {}
    }
}

fn check_schedule(schedule: &Schedule, report: &mut ValidationReport) {
    if let Some(window) = schedule.hours {
        for (name, hour) in [("from", window.from), ("to", window.to)] {
            if !(0..=MAX_HOUR).contains(&hour) {
                report.error(
                    format!("schedule.hours.{}", name),
                    ViolationKind::HourOutOfRange,
                    format!("{} is outside 0..=23", hour),
                );
            }
        }
    }

    if let Some(days) = &schedule.days {
        if days.is_empty() {
            report.warn(
                "schedule.days",
                ViolationKind::NoDays,
                "no days selected; the rule can never fire",
            );
        }
        let mut seen = BTreeSet::new();
        for (idx, day) in days.iter().enumerate() {
            if !(1..=7).contains(day) {
                report.error(
                    format!("schedule.days[{}]", idx),
                    ViolationKind::DayOutOfRange,
                    format!("{} is outside 1..=7", day),
                );
            } else if !seen.insert(*day) {
                report.warn(
                    format!("schedule.days[{}]", idx),
                    ViolationKind::DuplicateDay,
                    format!("day {} is listed twice", day),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::constraints::HourWindow;
    use crate::registry::OperatorKey;

    fn rule_with(conditions: Vec<ConditionNode>) -> TriggerRule {
        TriggerRule {
            conditions: ConditionGroup::all(conditions),
            ..TriggerRule::seed()
        }
    }

    fn kinds(violations: &[Violation]) -> Vec<&ViolationKind> {
        violations.iter().map(|v| &v.kind).collect()
    }

    #[test]
    fn test_seed_rule_is_valid_without_warnings() {
        let report = RuleValidator::default().validate(&TriggerRule::seed());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_identity_priority_and_actions() {
        let rule = TriggerRule {
            id: "Bad-Id".to_string(),
            priority: 0,
            actions: vec![],
            ..TriggerRule::seed()
        };
        let report = RuleValidator::default().validate(&rule);
        assert_eq!(
            kinds(&report.errors),
            vec![
                &ViolationKind::InvalidId,
                &ViolationKind::PriorityOutOfRange,
                &ViolationKind::MissingActions,
            ]
        );
    }

    #[test]
    fn test_operator_type_mismatch() {
        let rule = rule_with(vec![
            ConditionRule::literal(VariableKey::UserPlan, OperatorKey::Gt, "free").into(),
        ]);
        let report = RuleValidator::default().validate(&rule);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ViolationKind::OperatorTypeMismatch);
        assert_eq!(report.errors[0].path, "conditions.rules[0].op");
    }

    #[test]
    fn test_value_and_ref_exclusive() {
        let mut leaf = ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal);
        leaf.value = Some(Literal::int(3).into());
        let report = RuleValidator::default().validate(&rule_with(vec![leaf.into()]));
        assert!(kinds(&report.errors).contains(&&ViolationKind::ValueAndRef));
    }

    #[test]
    fn test_operand_for_arity_none() {
        let mut leaf = ConditionRule::unary(VariableKey::IsWeekend, OperatorKey::IsTrue);
        leaf.value = Some(Literal::Bool(true).into());
        let report = RuleValidator::default().validate(&rule_with(vec![leaf.into()]));
        assert_eq!(kinds(&report.errors), vec![&ViolationKind::UnexpectedOperand]);
    }

    #[test]
    fn test_literal_and_ref_types() {
        let report = RuleValidator::default().validate(&rule_with(vec![
            ConditionRule::literal(VariableKey::Steps, OperatorKey::Eq, "many").into(),
            ConditionRule::reference(VariableKey::Steps, OperatorKey::Eq, VariableKey::IsWeekend).into(),
            ConditionRule::literal(VariableKey::UserPlan, OperatorKey::Eq, "enterprise").into(),
        ]));
        assert_eq!(
            kinds(&report.errors),
            vec![
                &ViolationKind::LiteralTypeMismatch,
                &ViolationKind::RefTypeMismatch,
                &ViolationKind::ValueNotAllowed,
            ]
        );
    }

    #[test]
    fn test_range_checks() {
        let scalar_between = ConditionRule::literal(VariableKey::SleepHours, OperatorKey::Between, 7);
        let inverted = ConditionRule::between(VariableKey::SleepHours, 9, 6);
        let mut range_lt = ConditionRule::between(VariableKey::Steps, 1, 2);
        range_lt.op = OperatorKey::Lt;

        let report = RuleValidator::default().validate(&rule_with(vec![
            scalar_between.into(),
            inverted.into(),
            range_lt.into(),
        ]));
        assert_eq!(
            kinds(&report.errors),
            vec![&ViolationKind::ArityMismatch, &ViolationKind::ArityMismatch]
        );
        assert_eq!(kinds(&report.warnings), vec![&ViolationKind::InvertedRange]);
    }

    #[test]
    fn test_ref_on_between_rejected() {
        let leaf = ConditionRule {
            field: VariableKey::Steps,
            op: OperatorKey::Between,
            value: None,
            ref_field: Some(VariableKey::StepsGoal),
        };
        let report = RuleValidator::default().validate(&rule_with(vec![leaf.into()]));
        assert_eq!(kinds(&report.errors), vec![&ViolationKind::RefNotAllowed]);
    }

    #[test]
    fn test_empty_groups_warn() {
        let rule = rule_with(vec![ConditionGroup::default().into()]);
        let report = RuleValidator::default().validate(&rule);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "conditions.rules[0]");

        let rule = rule_with(vec![]);
        let report = RuleValidator::default().validate(&rule);
        assert_eq!(report.warnings[0].kind, ViolationKind::EmptyGroup);
    }

    #[test]
    fn test_schedule_checks() {
        let rule = TriggerRule {
            schedule: Some(Schedule {
                hours: Some(HourWindow { from: 8, to: 24 }),
                days: Some(vec![1, 1, 9]),
                exclude_weekends: None,
            }),
            ..TriggerRule::seed()
        };
        let report = RuleValidator::default().validate(&rule);
        assert_eq!(
            kinds(&report.errors),
            vec![&ViolationKind::HourOutOfRange, &ViolationKind::DayOutOfRange]
        );
        assert_eq!(kinds(&report.warnings), vec![&ViolationKind::DuplicateDay]);

        let stored: TriggerRule = serde_json::from_value(serde_json::json!({
            "id": "odd_schedule",
            "name": "Odd schedule",
            "conditions": {"operator": "AND", "rules": [{"field": "steps", "op": "gt", "value": 0}]},
            "schedule": {"hours": {"from": -1, "to": 10}, "days": [300]},
            "actions": [{"type": "notification", "title": "Hi", "body": "there"}]
        }))
        .unwrap();
        let report = RuleValidator::default().validate(&stored);
        assert_eq!(
            kinds(&report.errors),
            vec![&ViolationKind::HourOutOfRange, &ViolationKind::DayOutOfRange]
        );
        assert_eq!(report.errors[0].path, "schedule.hours.from");
        assert_eq!(report.errors[1].path, "schedule.days[0]");

        let never = TriggerRule {
            schedule: Some(Schedule {
                days: Some(vec![]),
                ..Schedule::default()
            }),
            ..TriggerRule::seed()
        };
        let report = RuleValidator::default().validate(&never);
        assert_eq!(kinds(&report.warnings), vec![&ViolationKind::NoDays]);
    }

    #[test]
    fn test_cooldown_and_placeholder_warnings() {
        let rule = TriggerRule {
            cooldown: Some("soon".to_string()),
            actions: vec![Action::notification("Hi {{first_name}}", "")],
            ..TriggerRule::seed()
        };
        let report = RuleValidator::default().validate(&rule);
        assert!(report.is_valid());
        assert_eq!(
            kinds(&report.warnings),
            vec![
                &ViolationKind::InvalidCooldown,
                &ViolationKind::EmptyActionText,
                &ViolationKind::UnknownPlaceholder,
            ]
        );
    }

    #[test]
    fn test_background_single_offending_field() {
        let rule = TriggerRule {
            background_enabled: true,
            ..rule_with(vec![
                ConditionRule::literal(VariableKey::SleepHours, OperatorKey::Lt, 6).into(),
            ])
        };
        let report = RuleValidator::default().validate(&rule);
        assert_eq!(report.background_offending_fields(), vec![VariableKey::SleepHours]);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_background_advisory_mode() {
        let rule = TriggerRule {
            background_enabled: true,
            actions: vec![
                Action::notification("a", "b"),
                Action::create_default(ActionType::InAppAlert),
            ],
            ..rule_with(vec![
                ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal).into(),
            ])
        };
        let report = RuleValidator::new(Strictness::Advisory).validate(&rule);
        assert!(report.is_valid());
        assert_eq!(
            report.background_offending_actions(),
            vec![(1, ActionType::InAppAlert)]
        );
        assert!(report.background_offending_fields().is_empty());
    }

    #[test]
    fn test_collection_duplicate_ids() {
        let rules = vec![TriggerRule::seed(), TriggerRule::seed()];
        let report = RuleValidator::default().validate_collection(&rules);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ViolationKind::DuplicateId);
        assert_eq!(report.errors[0].path, "rules[1].id");
    }

    #[test]
    fn test_into_result() {
        let bad = TriggerRule {
            actions: vec![],
            ..TriggerRule::seed()
        };
        let err = RuleValidator::default().validate(&bad).into_result().unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert!(RuleValidator::default()
            .validate(&TriggerRule::seed())
            .into_result()
            .is_ok());
    }

    #[test]
    fn test_violation_serializes_flat() {
        let v = Violation::new(
            "conditions",
            ViolationKind::BackgroundVariable {
                field: VariableKey::SleepHours,
            },
            "nope",
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "background_variable");
        assert_eq!(json["field"], "sleep_hours");
        assert_eq!(json["path"], "conditions");
    }
}
