//! Schedule — the time-of-day gate of a rule.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minutes either side of a scheduled time during which the rule may fire.
pub const SCHEDULE_TOLERANCE_MINUTES: u32 = 5;

/// When a rule is allowed to fire.
///
/// Serialized as `"immediate"` or `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Schedule {
    /// Any time of day.
    #[default]
    Immediate,
    /// Within [`SCHEDULE_TOLERANCE_MINUTES`] of `hour:minute`, same hour only.
    At { hour: u32, minute: u32 },
}

impl Schedule {
    /// Build an `At` schedule, checking the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSchedule`] if `hour >= 24` or
    /// `minute >= 60`.
    pub fn at(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        let schedule = Self::At { hour, minute };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Check the bounds of an `At` schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSchedule`] when out of range.
    pub fn validate(self) -> Result<(), ValidationError> {
        match self {
            Self::At { hour, minute } if hour >= 24 || minute >= 60 => Err(
                ValidationError::InvalidSchedule(format!("{hour:02}:{minute:02}")),
            ),
            _ => Ok(()),
        }
    }

    /// Whether the gate is open at `time`.
    ///
    /// The window does not wrap across hours: `At(9, 58)` is closed at 10:01.
    #[must_use]
    pub fn is_due(self, time: NaiveTime) -> bool {
        match self {
            Self::Immediate => true,
            Self::At { hour, minute } => {
                time.hour() == hour && time.minute().abs_diff(minute) <= SCHEDULE_TOLERANCE_MINUTES
            }
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => f.write_str("immediate"),
            Self::At { hour, minute } => write!(f, "{hour:02}:{minute:02}"),
        }
    }
}

impl FromStr for Schedule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("immediate") {
            return Ok(Self::Immediate);
        }
        let invalid = || ValidationError::InvalidSchedule(s.to_string());
        let (hour, minute) = trimmed.split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::at(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Schedule {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Schedule> for String {
    fn from(value: Schedule) -> Self {
        value.to_string()
    }
}
