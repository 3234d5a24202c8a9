//! Minimum spacing between two firings of the same rule.
//!
//! Wire form is `<amount><unit>` such as `30m`, `12h` or `7d`. A missing or
//! malformed cooldown never fails a rule; it reads as the 24 hour default.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Longest cooldown the validator accepts without a warning.
pub const MAX_COOLDOWN_DAYS: i64 = 365;

static COOLDOWN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([mhd])$").expect("cooldown pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum CooldownUnit {
    #[serde(rename = "m")]
    #[strum(serialize = "m")]
    Minutes,
    #[serde(rename = "h")]
    #[strum(serialize = "h")]
    Hours,
    #[serde(rename = "d")]
    #[strum(serialize = "d")]
    Days,
}

/// Parsed cooldown. `amount` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cooldown {
    pub amount: u32,
    pub unit: CooldownUnit,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self {
            amount: 24,
            unit: CooldownUnit::Hours,
        }
    }
}

impl Cooldown {
    /// Build a cooldown, clamping `amount` to at least 1.
    pub fn new(amount: u32, unit: CooldownUnit) -> Self {
        Self {
            amount: amount.max(1),
            unit,
        }
    }

    /// Parse the wire form. `None` for anything malformed or zero.
    pub fn parse_strict(value: &str) -> Option<Self> {
        let caps = COOLDOWN.captures(value)?;
        let amount: u32 = caps.get(1)?.as_str().parse().ok()?;
        let unit: CooldownUnit = caps.get(2)?.as_str().parse().ok()?;
        if amount == 0 {
            return None;
        }
        Some(Self { amount, unit })
    }

    pub fn duration(&self) -> Duration {
        let amount = i64::from(self.amount);
        match self.unit {
            CooldownUnit::Minutes => Duration::minutes(amount),
            CooldownUnit::Hours => Duration::hours(amount),
            CooldownUnit::Days => Duration::days(amount),
        }
    }

    /// Whether the cooldown is longer than [`MAX_COOLDOWN_DAYS`].
    pub fn is_excessive(&self) -> bool {
        self.duration() > Duration::days(MAX_COOLDOWN_DAYS)
    }

    /// Time left before the rule may fire again, if any.
    ///
    /// A cooldown that ends past the representable calendar never ends.
    pub fn remaining(&self, last_fired: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
        match last_fired.checked_add_signed(self.duration()) {
            Some(ready_at) => (ready_at > now).then(|| ready_at - now),
            None => Some(Duration::MAX),
        }
    }

    /// Whether a firing at `last_fired` still blocks a firing at `now`.
    pub fn is_active(&self, last_fired: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.remaining(last_fired, now).is_some()
    }
}

impl fmt::Display for Cooldown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

/// Lenient parse: absent, malformed or zero input yields the default.
pub fn parse_cooldown(value: Option<&str>) -> Cooldown {
    value.and_then(Cooldown::parse_strict).unwrap_or_default()
}

/// Wire form of a cooldown. `amount` below 1 is raised to 1.
pub fn format_cooldown(amount: i64, unit: CooldownUnit) -> String {
    format!("{}{}", amount.max(1), unit)
}
