//! Day-of-week and hour-of-day gating.
//!
//! Days are numbered 1 (Monday) to 7 (Sunday). An absent `days` list means
//! every day; an empty list means no day. Hour windows are inclusive on both
//! ends and wrap past midnight when `from > to`.
//!
//! Hours and days are held as plain integers so an out-of-range value in a
//! stored document still parses and is reported by the validator.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub const MAX_HOUR: i64 = 23;
pub const WEEKDAYS: &[i64] = &[1, 2, 3, 4, 5];
pub const WEEKEND: &[i64] = &[6, 7];
pub const ALL_DAYS: &[i64] = &[1, 2, 3, 4, 5, 6, 7];

/// Inclusive hour range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HourWindow {
    pub from: i64,
    pub to: i64,
}

impl Default for HourWindow {
    fn default() -> Self {
        Self { from: 9, to: 21 }
    }
}

impl HourWindow {
    /// Whether the window spans midnight.
    pub fn is_overnight(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, hour: i64) -> bool {
        if self.is_overnight() {
            hour >= self.from || hour <= self.to
        } else {
            hour >= self.from && hour <= self.to
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourBound {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayPreset {
    All,
    Weekdays,
    Weekend,
}

impl DayPreset {
    pub fn days(self) -> Vec<i64> {
        match self {
            Self::All => ALL_DAYS.to_vec(),
            Self::Weekdays => WEEKDAYS.to_vec(),
            Self::Weekend => WEEKEND.to_vec(),
        }
    }
}

/// When a rule is allowed to fire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<HourWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_weekends: Option<bool>,
}

impl Schedule {
    /// Schedule created when the author switches scheduling on:
    /// weekdays, 9 to 21.
    pub fn default_window() -> Self {
        Self {
            hours: Some(HourWindow::default()),
            days: Some(WEEKDAYS.to_vec()),
            exclude_weekends: Some(false),
        }
    }

    pub fn apply_preset(&mut self, preset: DayPreset) {
        self.days = Some(preset.days());
    }

    /// Add the day if missing, remove it if present.
    pub fn toggle_day(&mut self, day: i64) {
        let days = self.days.get_or_insert_with(Vec::new);
        if let Some(pos) = days.iter().position(|d| *d == day) {
            days.remove(pos);
        } else {
            days.push(day);
        }
    }

    /// Set one bound of the hour window, clamped to 0..=23.
    pub fn set_hour(&mut self, bound: HourBound, value: i64) {
        let clamped = value.clamp(0, MAX_HOUR);
        let window = self.hours.get_or_insert_with(HourWindow::default);
        match bound {
            HourBound::From => window.from = clamped,
            HourBound::To => window.to = clamped,
        }
    }

    /// Drop the hour window so the rule may fire at any hour.
    pub fn set_all_day(&mut self) {
        self.hours = None;
    }

    pub fn is_all_day(&self) -> bool {
        self.hours.is_none()
    }

    pub fn toggle_exclude_weekends(&mut self) {
        self.exclude_weekends = Some(!self.excludes_weekends());
    }

    pub fn excludes_weekends(&self) -> bool {
        self.exclude_weekends.unwrap_or(false)
    }

    /// Whether the schedule admits the given ISO weekday (1..=7) and hour.
    pub fn allows(&self, weekday: i64, hour: i64) -> bool {
        if let Some(days) = &self.days {
            if !days.contains(&weekday) {
                return false;
            }
        }
        if self.excludes_weekends() && WEEKEND.contains(&weekday) {
            return false;
        }
        self.hours.map_or(true, |window| window.contains(hour))
    }

    /// [`Schedule::allows`] for a local timestamp.
    pub fn allows_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        let weekday = i64::from(at.weekday().number_from_monday());
        let hour = i64::from(at.hour());
        self.allows(weekday, hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_presets() {
        let mut schedule = Schedule::default();
        schedule.apply_preset(DayPreset::Weekend);
        assert_eq!(schedule.days, Some(vec![6, 7]));
        schedule.apply_preset(DayPreset::All);
        assert_eq!(schedule.days.as_ref().map(Vec::len), Some(7));
    }

    #[test]
    fn test_toggle_day() {
        let mut schedule = Schedule::default_window();
        schedule.toggle_day(3);
        assert_eq!(schedule.days, Some(vec![1, 2, 4, 5]));
        schedule.toggle_day(7);
        assert_eq!(schedule.days, Some(vec![1, 2, 4, 5, 7]));
    }

    #[test]
    fn test_set_hour_clamps_and_creates_window() {
        let mut schedule = Schedule::default();
        schedule.set_hour(HourBound::To, 30);
        assert_eq!(schedule.hours, Some(HourWindow { from: 9, to: 23 }));
        schedule.set_hour(HourBound::From, -4);
        assert_eq!(schedule.hours, Some(HourWindow { from: 0, to: 23 }));
        schedule.set_all_day();
        assert!(schedule.is_all_day());
    }

    #[test]
    fn test_absent_days_vs_empty_days() {
        let every_day = Schedule::default();
        assert!(every_day.allows(6, 12));

        let no_day = Schedule {
            days: Some(vec![]),
            ..Schedule::default()
        };
        for day in 1..=7 {
            assert!(!no_day.allows(day, 12));
        }
    }

    #[test]
    fn test_exclude_weekends() {
        let mut schedule = Schedule {
            days: Some(ALL_DAYS.to_vec()),
            ..Schedule::default()
        };
        schedule.toggle_exclude_weekends();
        assert!(schedule.allows(5, 10));
        assert!(!schedule.allows(6, 10));
        assert!(!schedule.allows(7, 10));
    }

    #[test]
    fn test_hour_window_inclusive() {
        let window = HourWindow { from: 9, to: 21 };
        assert!(window.contains(9));
        assert!(window.contains(21));
        assert!(!window.contains(22));
        assert!(!window.contains(8));
    }

    #[test]
    fn test_overnight_window() {
        let window = HourWindow { from: 22, to: 6 };
        assert!(window.is_overnight());
        assert!(window.contains(23));
        assert!(window.contains(0));
        assert!(window.contains(6));
        assert!(!window.contains(7));
        assert!(!window.contains(21));
    }

    #[test]
    fn test_allows_at() {
        // 2024-01-06 is a Saturday
        let saturday_noon = Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap();
        assert!(!Schedule::default_window().allows_at(&saturday_noon));
        let monday_noon = Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap();
        assert!(Schedule::default_window().allows_at(&monday_noon));
    }

    #[test]
    fn test_out_of_range_values_parse() {
        let schedule: Schedule =
            serde_json::from_str(r#"{"hours": {"from": -1, "to": 30}, "days": [300, 0]}"#).unwrap();
        assert_eq!(schedule.hours, Some(HourWindow { from: -1, to: 30 }));
        assert_eq!(schedule.days, Some(vec![300, 0]));
        assert!(!schedule.allows(1, 12));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(Schedule::default_window()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hours": {"from": 9, "to": 21}, "days": [1, 2, 3, 4, 5], "excludeWeekends": false})
        );
    }
}
