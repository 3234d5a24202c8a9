//! Cooldown and schedule constraints.

mod cooldown;
mod schedule;

pub use cooldown::{format_cooldown, parse_cooldown, Cooldown, CooldownUnit, MAX_COOLDOWN_DAYS};
pub use schedule::{DayPreset, HourBound, HourWindow, Schedule, ALL_DAYS, MAX_HOUR, WEEKDAYS, WEEKEND};
