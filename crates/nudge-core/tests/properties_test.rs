//! Integration tests for the rule model invariants.
//!
//! Edit sequences are enumerated over the whole variable and operator
//! catalogues rather than sampled.

use std::collections::{HashMap, HashSet};

use chrono::{TimeZone, Utc};

use nudge_core::actions::{Action, ActionType, TargetView};
use nudge_core::conditions::{ConditionGroup, ConditionNode, ConditionRule, ConditionValue, Connector, Literal};
use nudge_core::constraints::{format_cooldown, parse_cooldown, Cooldown, CooldownUnit, HourWindow, Schedule};
use nudge_core::registry::{
    operators_valid_for, DataType, OperatorKey, ValueArity, VariableKey, BACKGROUND_VARIABLES, OPERATORS,
};
use nudge_core::rule::{normalize_rule_id, RuleValidator, Strictness, TriggerRule, ViolationKind};
use nudge_core::{select_firing, FireDecision, VariableSnapshot};

fn all_operators() -> Vec<OperatorKey> {
    OPERATORS.iter().map(|def| def.key).collect()
}

/// Every leaf reachable from the default leaf by one field change, one
/// operator change, an optional reference toggle and a second field change.
fn reachable_leaves() -> Vec<ConditionRule> {
    let mut leaves = Vec::new();
    for first in VariableKey::all() {
        for op in all_operators() {
            let base = ConditionRule::create_default().replace_field(first).replace_operator(op);
            let toggled = base.clone().toggle_reference_mode();
            for second in [VariableKey::Steps, VariableKey::UserPlan, VariableKey::IsWeekend] {
                leaves.push(base.clone().replace_field(second));
                leaves.push(toggled.clone().replace_field(second));
            }
            leaves.push(base);
            leaves.push(toggled);
        }
    }
    leaves
}

fn assert_leaf_invariants(leaf: &ConditionRule) {
    assert!(
        operators_valid_for(leaf.field.data_type()).contains(&leaf.op),
        "{} not valid for {}",
        leaf.op,
        leaf.field
    );
    assert!(
        !(leaf.value.is_some() && leaf.ref_field.is_some()),
        "value and ref both set on {:?}",
        leaf
    );
    match leaf.op.arity() {
        ValueArity::None => assert!(leaf.value.is_none() && leaf.ref_field.is_none()),
        ValueArity::Single => assert!(leaf.value.as_ref().map_or(true, |v| !v.is_range())),
        ValueArity::Range => assert!(leaf.value.as_ref().map_or(false, ConditionValue::is_range)),
    }
    if let Some(other) = leaf.ref_field {
        assert_eq!(other.data_type(), leaf.field.data_type());
    }
}

#[test]
fn test_operator_always_valid_for_field_type() {
    for leaf in reachable_leaves() {
        assert_leaf_invariants(&leaf);
    }
}

#[test]
fn test_reachable_leaves_validate_cleanly() {
    let validator = RuleValidator::default();
    for leaf in reachable_leaves() {
        let rule = TriggerRule {
            conditions: ConditionGroup::all(vec![leaf.clone().into()]),
            ..TriggerRule::new_empty("reachable_leaf")
        };
        let report = validator.validate(&rule);
        let condition_errors: Vec<_> = report
            .errors
            .iter()
            .filter(|v| v.path.starts_with("conditions"))
            .collect();
        assert!(condition_errors.is_empty(), "{:?} -> {:?}", leaf, condition_errors);
    }
}

#[test]
fn test_replace_operator_and_field_are_idempotent() {
    for leaf in reachable_leaves() {
        for op in all_operators() {
            let once = leaf.clone().replace_operator(op);
            assert_eq!(once.clone().replace_operator(op), once);
        }
        for field in VariableKey::all() {
            let once = leaf.clone().replace_field(field);
            assert_eq!(once.clone().replace_field(field), once);
        }
    }
}

#[test]
fn test_group_edits_keep_leaves_consistent() {
    let mut group = ConditionGroup::new(Connector::And);
    group.add_default_rule();
    group.add_default_group();
    group.insert_child(ConditionRule::between(VariableKey::SleepHours, 6, 9), Some(0));
    group.toggle_connector();

    group
        .update_rule_at(&[1], |rule| rule.replace_field(VariableKey::UserPlan))
        .unwrap();
    group
        .update_rule_at(&[2, 0], |rule| rule.replace_operator(OperatorKey::Between))
        .unwrap();
    group.reorder_child(0, 2).unwrap();

    assert_eq!(group.operator, Connector::Or);
    assert_eq!(group.flatten().len(), 3);
    for leaf in group.flatten() {
        assert_leaf_invariants(leaf);
    }
    assert!(group.remove_child(3).is_err());
}

#[test]
fn test_background_gate_flags_counter_examples() {
    let validator = RuleValidator::default();
    let safe = TriggerRule {
        background_enabled: true,
        conditions: ConditionGroup::all(
            BACKGROUND_VARIABLES
                .iter()
                .map(|key| ConditionRule::create_default().replace_field(*key).into())
                .collect(),
        ),
        ..TriggerRule::seed()
    };
    let report = validator.validate(&safe);
    assert!(report.is_valid(), "{:?}", report.errors);
    assert!(safe
        .conditions
        .collect_referenced_fields()
        .iter()
        .all(|key| BACKGROUND_VARIABLES.contains(key)));

    for action_type in [ActionType::InAppAlert, ActionType::AddMemory, ActionType::AddInsight] {
        let mut rule = safe.clone();
        rule.actions.push(Action::create_default(action_type));
        let report = validator.validate(&rule);
        assert_eq!(report.background_offending_actions(), vec![(1, action_type)]);
        assert!(!report.is_valid());
    }

    // a reference counts as a use of the variable
    let mut by_ref = safe.clone();
    by_ref.conditions.insert_child(
        ConditionRule::reference(VariableKey::Steps, OperatorKey::Gte, VariableKey::ActiveCalories),
        None,
    );
    let report = validator.validate(&by_ref);
    assert_eq!(report.background_offending_fields(), vec![VariableKey::ActiveCalories]);

    let advisory = RuleValidator::new(Strictness::Advisory).validate(&by_ref);
    assert!(advisory.is_valid());
    assert!(advisory
        .warnings
        .iter()
        .any(|v| matches!(v.kind, ViolationKind::BackgroundVariable { .. })));
}

#[test]
fn test_normalized_id_is_never_taken() {
    let mut existing: HashSet<String> = HashSet::new();
    assert_eq!(normalize_rule_id("fresh_base", &existing), "fresh_base");

    for _ in 0..25 {
        let id = normalize_rule_id("morning_check", &existing);
        assert!(!existing.contains(&id));
        existing.insert(id);
    }
    assert!(existing.contains("morning_check_24"));
}

fn rich_rule() -> TriggerRule {
    let mut nested = ConditionGroup::new(Connector::Or);
    nested.insert_child(ConditionRule::unary(VariableKey::BreakfastLogged, OperatorKey::IsFalse), None);
    nested.insert_child(ConditionRule::literal(VariableKey::UserPlan, OperatorKey::Neq, "free"), None);
    nested.insert_child(ConditionRule::literal(VariableKey::SleepHours, OperatorKey::Lt, Literal::float(6.5).unwrap()), None);

    let mut schedule = Schedule::default_window();
    schedule.hours = Some(HourWindow { from: 22, to: 6 });
    schedule.toggle_exclude_weekends();

    TriggerRule {
        id: "rich_rule".to_string(),
        name: "Everything at once".to_string(),
        enabled: false,
        priority: 12,
        conditions: ConditionGroup::all(vec![
            ConditionRule::reference(VariableKey::Steps, OperatorKey::Lt, VariableKey::StepsGoal).into(),
            ConditionRule::between(VariableKey::CurrentHour, 18, 22).into(),
            nested.into(),
            ConditionGroup::new(Connector::And).into(),
        ]),
        cooldown: Some(format_cooldown(90, CooldownUnit::Minutes)),
        schedule: Some(schedule),
        actions: vec![
            Action::Notification {
                title: "Walk".to_string(),
                body: "{{remaining_steps}} to go".to_string(),
                target_view: Some(TargetView::Habits),
            },
            Action::create_default(ActionType::InAppAlert),
            Action::create_default(ActionType::AddMemory),
            Action::create_default(ActionType::AddInsight),
        ],
        background_enabled: false,
    }
}

#[test]
fn test_wire_round_trip_preserves_structure() {
    let rule = rich_rule();
    let json = rule.to_json().unwrap();
    let parsed: TriggerRule = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, rule);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["conditions"]["operator"], "AND");
    assert_eq!(value["conditions"]["rules"][0]["ref"], "steps_goal");
    assert!(value["conditions"]["rules"][0].get("value").is_none());
    assert_eq!(value["conditions"]["rules"][1]["value"], serde_json::json!([18, 22]));
    assert_eq!(value["conditions"]["rules"][2]["operator"], "OR");
    assert_eq!(value["conditions"]["rules"][3]["rules"], serde_json::json!([]));
    assert_eq!(value["schedule"]["excludeWeekends"], true);
    assert_eq!(value["actions"][0]["targetView"], "/habits");
    assert_eq!(value["actions"][1]["type"], "in_app_alert");
    assert_eq!(value["cooldown"], "90m");
    assert_eq!(value["backgroundEnabled"], false);
}

#[test]
fn test_parses_sparse_documents() {
    let rule: TriggerRule = serde_json::from_str(
        r#"{"id": "sparse", "conditions": {"rules": [{"field": "is_weekend", "op": "is_true"}]},
            "actions": [{"type": "notification", "title": "Hi", "body": "there"}]}"#,
    )
    .unwrap();
    assert!(rule.enabled);
    assert_eq!(rule.priority, 50);
    assert_eq!(rule.conditions.operator, Connector::And);
    assert!(!rule.background_enabled);
    assert!(matches!(
        &rule.conditions.rules[0],
        ConditionNode::Rule(leaf) if leaf.op == OperatorKey::IsTrue
    ));

    let bad = serde_json::from_str::<TriggerRule>(
        r#"{"id": "bad", "conditions": {"operator": "AND", "rules": [{"op": "eq"}]}, "actions": []}"#,
    );
    assert!(bad.is_err());
}

#[test]
fn test_added_condition_is_steps_gt_zero() {
    let leaf = ConditionRule::create_default();
    assert_eq!(leaf.field, VariableKey::Steps);
    assert_eq!(leaf.op, OperatorKey::Gt);
    assert_eq!(leaf.value, Some(ConditionValue::Scalar(Literal::int(0))));
    assert!(operators_valid_for(DataType::Number).contains(&leaf.op));
}

#[test]
fn test_field_change_resets_operand() {
    let leaf = ConditionRule::literal(VariableKey::UserPlan, OperatorKey::Eq, "free");
    let leaf = leaf.replace_field(VariableKey::IsWeekend);
    assert_eq!(leaf.op, OperatorKey::Eq);
    assert_eq!(leaf.value, Some(ConditionValue::Scalar(Literal::Bool(true))));
    assert_eq!(leaf.ref_field, None);
}

#[test]
fn test_connector_toggle_keeps_children() {
    let first = ConditionRule::create_default();
    let second = ConditionRule::literal(VariableKey::CurrentHour, OperatorKey::Gte, 18);
    let mut group = ConditionGroup::new(Connector::And);
    group.insert_child(first.clone(), None);
    group.insert_child(second.clone(), None);
    group.toggle_connector();

    assert_eq!(group, ConditionGroup::any(vec![first.into(), second.into()]));
}

#[test]
fn test_copy_ids_count_up() {
    let mut existing: HashSet<String> = ["daily_reminder_copy".to_string()].into_iter().collect();
    assert_eq!(normalize_rule_id("daily_reminder_copy", &existing), "daily_reminder_copy_1");
    existing.insert("daily_reminder_copy_1".to_string());
    assert_eq!(normalize_rule_id("daily_reminder_copy", &existing), "daily_reminder_copy_2");
}

#[test]
fn test_cooldown_parse_and_format() {
    assert_eq!(parse_cooldown(Some("12h")), Cooldown::new(12, CooldownUnit::Hours));
    assert_eq!(format_cooldown(7, CooldownUnit::Days), "7d");
    assert_eq!(parse_cooldown(Some("abc")), Cooldown::new(24, CooldownUnit::Hours));
    assert_eq!(parse_cooldown(None), Cooldown::default());
}

#[test]
fn test_background_rule_reports_single_offending_field() {
    let rule = TriggerRule {
        background_enabled: true,
        conditions: ConditionGroup::all(vec![
            ConditionRule::literal(VariableKey::SleepHours, OperatorKey::Lt, 6).into(),
        ]),
        ..TriggerRule::seed()
    };
    let report = RuleValidator::default().validate(&rule);
    assert_eq!(report.background_offending_fields(), vec![VariableKey::SleepHours]);
    assert!(report.background_offending_actions().is_empty());
}

#[test]
fn test_huge_cooldown_warns_and_blocks_firing() {
    let rule = TriggerRule {
        cooldown: Some("4294967295d".to_string()),
        ..TriggerRule::seed()
    };
    let report = RuleValidator::default().validate(&rule);
    assert!(report.is_valid());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.kind == ViolationKind::ExcessiveCooldown));

    let now = Utc.with_ymd_and_hms(2024, 1, 8, 19, 0, 0).unwrap();
    assert!(matches!(
        rule.check_fire(&VariableSnapshot::new(), &now, Some(now)),
        FireDecision::CoolingDown { .. }
    ));

    let last_fired: HashMap<String, _> = [(rule.id.clone(), now)].into_iter().collect();
    let rules = vec![rule];
    assert!(select_firing(&rules, &VariableSnapshot::new(), &now, &last_fired).is_empty());
}
