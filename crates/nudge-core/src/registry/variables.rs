//! Catalogue of signals a trigger rule can read at evaluation time.
//!
//! The catalogue is static data: it is defined at build time and never
//! mutated, so lookups need no synchronization.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::conditions::Literal;

/// Data type of a variable or of an operator operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    Number,
    Boolean,
    String,
}

/// UI grouping of variables. Not semantically load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VariableCategory {
    Health,
    Time,
    AppState,
    TimeContext,
}

/// Stable identifier of a readable signal.
///
/// Declaration order is the catalogue order and matches [`VARIABLES`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VariableKey {
    Steps,
    StepsGoal,
    SleepHours,
    RecoveryPercent,
    RestingHeartRate,
    ActiveCalories,
    WorkoutMinutesToday,
    MinutesSinceWakeUp,
    MinutesSinceLastWorkout,
    MinutesSinceAppOpen,
    HabitsCompletedToday,
    HabitsTotalToday,
    HabitsCompletionPercent,
    JournalWrittenToday,
    BreakfastLogged,
    WaterGlasses,
    UserPlan,
    CurrentHour,
    CurrentMinute,
    DayOfWeek,
    IsWeekend,
}

/// Static description of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDefinition {
    pub key: VariableKey,
    pub label: &'static str,
    pub description: &'static str,
    pub data_type: DataType,
    pub category: VariableCategory,
    /// Display hint only.
    pub unit: Option<&'static str>,
    /// Closed set of string values, when the variable is an enumeration.
    pub allowed_values: Option<&'static [&'static str]>,
}

const fn var(
    key: VariableKey,
    label: &'static str,
    description: &'static str,
    data_type: DataType,
    category: VariableCategory,
    unit: Option<&'static str>,
) -> VariableDefinition {
    VariableDefinition {
        key,
        label,
        description,
        data_type,
        category,
        unit,
        allowed_values: None,
    }
}

/// Values accepted by `user_plan`.
pub const USER_PLANS: &[&str] = &["free", "premium", "pro"];

use DataType::{Boolean, Number};
use VariableCategory::{AppState, Health, Time, TimeContext};

/// The variable catalogue, indexed by `VariableKey as usize`.
pub static VARIABLES: [VariableDefinition; 21] = [
    var(VariableKey::Steps, "Steps today", "Number of steps taken today.", Number, Health, Some("steps")),
    var(VariableKey::StepsGoal, "Steps goal", "The user's daily step target.", Number, Health, Some("steps")),
    var(VariableKey::SleepHours, "Sleep (hours)", "Total sleep time last night.", Number, Health, Some("h")),
    var(VariableKey::RecoveryPercent, "Recovery (%)", "Recovery score on a 0-100 scale.", Number, Health, Some("%")),
    var(VariableKey::RestingHeartRate, "Resting heart rate", "Resting heart rate in bpm.", Number, Health, Some("bpm")),
    var(VariableKey::ActiveCalories, "Active calories", "Active calories burned today.", Number, Health, Some("kcal")),
    var(VariableKey::WorkoutMinutesToday, "Workout minutes", "Total workout time today in minutes.", Number, Health, Some("min")),
    var(VariableKey::MinutesSinceWakeUp, "Minutes since wake-up", "Minutes since the user woke up.", Number, Time, Some("min")),
    var(VariableKey::MinutesSinceLastWorkout, "Minutes since workout", "Time since the last workout ended.", Number, Time, Some("min")),
    var(VariableKey::MinutesSinceAppOpen, "Minutes since app open", "Time since the app was last opened.", Number, Time, Some("min")),
    var(VariableKey::HabitsCompletedToday, "Habits completed", "Habits completed today.", Number, AppState, Some("pcs")),
    var(VariableKey::HabitsTotalToday, "Habits planned", "Habits scheduled for today.", Number, AppState, Some("pcs")),
    var(VariableKey::HabitsCompletionPercent, "Habits completed (%)", "Share of today's habits completed.", Number, AppState, Some("%")),
    var(VariableKey::JournalWrittenToday, "Journal written", "Whether the journal was filled in today.", Boolean, AppState, None),
    var(VariableKey::BreakfastLogged, "Breakfast logged", "Whether breakfast was logged.", Boolean, AppState, None),
    var(VariableKey::WaterGlasses, "Water glasses", "Glasses of water logged today.", Number, AppState, Some("glasses")),
    VariableDefinition {
        key: VariableKey::UserPlan,
        label: "User plan",
        description: "Subscription plan of the user.",
        data_type: DataType::String,
        category: AppState,
        unit: None,
        allowed_values: Some(USER_PLANS),
    },
    var(VariableKey::CurrentHour, "Current hour", "Hour of the day (0-23).", Number, TimeContext, Some("h")),
    var(VariableKey::CurrentMinute, "Current minute", "Minute of the hour (0-59).", Number, TimeContext, Some("min")),
    var(VariableKey::DayOfWeek, "Day of week", "1 = Monday, 7 = Sunday.", Number, TimeContext, None),
    var(VariableKey::IsWeekend, "Weekend", "Whether today is Saturday or Sunday.", Boolean, TimeContext, None),
];

/// Variables readable by rules that run in background mode.
pub const BACKGROUND_VARIABLES: &[VariableKey] = &[
    VariableKey::Steps,
    VariableKey::StepsGoal,
    VariableKey::CurrentHour,
    VariableKey::CurrentMinute,
    VariableKey::DayOfWeek,
    VariableKey::IsWeekend,
];

impl VariableKey {
    /// Static definition of this variable.
    pub fn definition(self) -> &'static VariableDefinition {
        &VARIABLES[self as usize]
    }

    /// Data type of this variable.
    pub fn data_type(self) -> DataType {
        self.definition().data_type
    }

    /// Whether background-mode rules may read this variable.
    pub fn is_background_safe(self) -> bool {
        BACKGROUND_VARIABLES.contains(&self)
    }

    /// Type-appropriate default literal used when a value has to be re-derived.
    pub fn default_literal(self) -> Literal {
        let def = self.definition();
        match def.data_type {
            DataType::Boolean => Literal::Bool(true),
            DataType::Number => Literal::int(0),
            DataType::String => Literal::Text(
                def.allowed_values
                    .and_then(|values| values.first())
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            ),
        }
    }

    /// All keys in catalogue order.
    pub fn all() -> impl Iterator<Item = VariableKey> {
        Self::iter()
    }
}

/// Look up a variable by its wire key.
pub fn lookup_variable(key: &str) -> Option<&'static VariableDefinition> {
    key.parse::<VariableKey>().ok().map(VariableKey::definition)
}

/// The full catalogue in order.
pub fn variables() -> &'static [VariableDefinition] {
    &VARIABLES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_matches_key_order() {
        for (idx, key) in VariableKey::iter().enumerate() {
            assert_eq!(VARIABLES[idx].key, key, "catalogue out of order at {}", idx);
        }
        assert_eq!(VariableKey::iter().count(), VARIABLES.len());
    }

    #[test]
    fn test_lookup_variable() {
        let def = lookup_variable("sleep_hours").unwrap();
        assert_eq!(def.key, VariableKey::SleepHours);
        assert_eq!(def.data_type, DataType::Number);
        assert!(lookup_variable("heart_rate_variability").is_none());
    }

    #[test]
    fn test_key_wire_names() {
        assert_eq!(VariableKey::MinutesSinceWakeUp.to_string(), "minutes_since_wake_up");
        let json = serde_json::to_string(&VariableKey::IsWeekend).unwrap();
        assert_eq!(json, "\"is_weekend\"");
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(VariableKey::IsWeekend.default_literal(), Literal::Bool(true));
        assert_eq!(VariableKey::Steps.default_literal(), Literal::int(0));
        assert_eq!(VariableKey::UserPlan.default_literal(), Literal::Text("free".to_string()));
    }

    #[test]
    fn test_background_allow_list() {
        assert!(VariableKey::Steps.is_background_safe());
        assert!(VariableKey::IsWeekend.is_background_safe());
        assert!(!VariableKey::SleepHours.is_background_safe());
        assert!(!VariableKey::UserPlan.is_background_safe());
    }
}
