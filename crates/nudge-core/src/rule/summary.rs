//! Plain-text description of a rule, for listings and review.

use crate::actions::{Action, ActionPriority, AlertStyle};
use crate::conditions::{ConditionGroup, ConditionNode, ConditionRule, ConditionValue, Connector};
use crate::constraints::Schedule;
use crate::registry::ValueArity;

use super::types::TriggerRule;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn describe_condition(rule: &ConditionRule) -> String {
    let field = rule.field.definition().label;
    let op = rule.op.definition().label.to_lowercase();
    let base = format!("{} {}", field, op);

    if let Some(other) = rule.ref_field {
        return format!("{} {}", base, other.definition().label);
    }
    if rule.op.arity() == ValueArity::None {
        return base;
    }
    match &rule.value {
        Some(ConditionValue::Range([lower, upper])) => format!("{} {} - {}", base, lower, upper),
        Some(ConditionValue::Scalar(lit)) => format!("{} {}", base, lit),
        None => base,
    }
}

/// Conditions as one line, subgroups parenthesized.
pub fn describe_group(group: &ConditionGroup) -> String {
    if group.is_empty() {
        return match group.operator {
            Connector::And => "always".to_string(),
            Connector::Or => "never".to_string(),
        };
    }
    let connector = match group.operator {
        Connector::And => " and ",
        Connector::Or => " or ",
    };
    group
        .rules
        .iter()
        .map(|node| match node {
            ConditionNode::Rule(rule) => describe_condition(rule),
            ConditionNode::Group(sub) => format!("({})", describe_group(sub)),
        })
        .collect::<Vec<_>>()
        .join(connector)
}

fn day_name(day: i64) -> String {
    match day {
        1..=7 => DAY_NAMES[(day - 1) as usize].to_string(),
        other => other.to_string(),
    }
}

fn describe_schedule(schedule: Option<&Schedule>) -> String {
    let Some(schedule) = schedule else {
        return "No time restrictions.".to_string();
    };
    let days = match &schedule.days {
        None => "Every day".to_string(),
        Some(days) if days.is_empty() => "On no day".to_string(),
        Some(days) => format!(
            "On {}",
            days.iter().map(|d| day_name(*d)).collect::<Vec<_>>().join(", ")
        ),
    };
    let hours = match schedule.hours {
        Some(window) => format!("between {}:00 and {}:00", window.from, window.to),
        None => "all day".to_string(),
    };
    let weekends = if schedule.excludes_weekends() {
        ", excluding weekends"
    } else {
        ""
    };
    format!("{}, {}{}.", days, hours, weekends)
}

fn title_or_untitled(title: &str) -> &str {
    if title.trim().is_empty() {
        "untitled"
    } else {
        title
    }
}

fn describe_action(action: &Action) -> String {
    match action {
        Action::Notification { title, .. } => {
            format!("send notification \"{}\"", title_or_untitled(title))
        }
        Action::InAppAlert { title, style, .. } => format!(
            "show alert \"{}\" ({})",
            title_or_untitled(title),
            style.unwrap_or(AlertStyle::Info)
        ),
        Action::AddMemory { category, .. } => format!("add memory ({})", category),
        Action::AddInsight { title, priority, .. } => format!(
            "add insight \"{}\" ({})",
            title_or_untitled(title),
            priority.unwrap_or(ActionPriority::Medium)
        ),
    }
}

/// Multi-line English summary of a rule.
pub fn describe_rule(rule: &TriggerRule) -> String {
    let status = if rule.enabled { "enabled" } else { "disabled" };
    let actions = if rule.actions.is_empty() {
        "do nothing".to_string()
    } else {
        rule.actions
            .iter()
            .map(describe_action)
            .collect::<Vec<_>>()
            .join(", then ")
    };
    let cooldown = rule.cooldown().map_or_else(|| "none".to_string(), |c| c.to_string());

    let mut out = format!(
        "{} ({}) [{}, priority {}]\nIf {}, then {}.\nConstraints: cooldown {}. {}",
        rule.name,
        rule.id,
        status,
        rule.priority,
        describe_group(&rule.conditions),
        actions,
        cooldown,
        describe_schedule(rule.schedule.as_ref()),
    );
    if rule.background_enabled {
        out.push_str("\nRuns in background mode.");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::HourWindow;

    #[test]
    fn test_describe_seed_rule() {
        let text = describe_rule(&TriggerRule::seed());
        assert!(text.starts_with("Evening steps reminder (steps_reminder_evening) [enabled, priority 70]"));
        assert!(text.contains(
            "If Current hour greater than or equal 18 and Current hour less than or equal 21 and Steps today less than Steps goal and Weekend is false"
        ));
        assert!(text.contains("then send notification \"Steps goal at risk\""));
        assert!(text.contains("cooldown 24h. No time restrictions."));
    }

    #[test]
    fn test_describe_nested_and_range() {
        let group = ConditionGroup::any(vec![
            ConditionRule::between(crate::registry::VariableKey::SleepHours, 6, 9).into(),
            ConditionGroup::default().into(),
        ]);
        assert_eq!(describe_group(&group), "Sleep (hours) between 6 - 9 or (always)");
    }

    #[test]
    fn test_describe_schedule() {
        let schedule = Schedule {
            hours: Some(HourWindow { from: 22, to: 6 }),
            days: Some(vec![6, 7]),
            exclude_weekends: Some(true),
        };
        assert_eq!(
            describe_schedule(Some(&schedule)),
            "On Saturday, Sunday, between 22:00 and 6:00, excluding weekends."
        );
        assert_eq!(
            describe_schedule(Some(&Schedule {
                days: Some(vec![]),
                ..Schedule::default()
            })),
            "On no day, all day."
        );
    }
}
