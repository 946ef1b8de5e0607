//! Security activity log entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::EntryId;
use crate::time::{Timestamp, now};

/// Maximum number of entries kept in the activity log.
pub const ACTIVITY_LOG_CAPACITY: usize = 50;

/// Category of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Motion,
    Door,
    Camera,
    Alarm,
    System,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Motion => "motion",
            Self::Door => "door",
            Self::Camera => "camera",
            Self::Alarm => "alarm",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub timestamp: Timestamp,
    pub message: String,
}

impl ActivityLogEntry {
    #[must_use]
    pub fn new(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            kind,
            timestamp: now(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn motion(location: Option<&str>) -> Self {
        Self::new(
            ActivityKind::Motion,
            format!("Motion detected at {}", location.unwrap_or("unknown location")),
        )
    }

    #[must_use]
    pub fn door(action: Option<&str>, location: Option<&str>) -> Self {
        Self::new(
            ActivityKind::Door,
            format!(
                "Door {} at {}",
                action.unwrap_or("activity"),
                location.unwrap_or("main entrance")
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_kind_as_type() {
        let entry = ActivityLogEntry::new(ActivityKind::System, "Alarm system armed");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "system");
        assert_eq!(value["message"], "Alarm system armed");
    }

    #[test]
    fn should_describe_motion_with_fallback_location() {
        assert_eq!(
            ActivityLogEntry::motion(Some("Backyard")).message,
            "Motion detected at Backyard"
        );
        assert_eq!(
            ActivityLogEntry::motion(None).message,
            "Motion detected at unknown location"
        );
    }

    #[test]
    fn should_describe_door_event() {
        let entry = ActivityLogEntry::door(Some("opened"), Some("Front Door"));
        assert_eq!(entry.kind, ActivityKind::Door);
        assert_eq!(entry.message, "Door opened at Front Door");
        assert_eq!(
            ActivityLogEntry::door(Some("closed"), None).message,
            "Door closed at main entrance"
        );
    }
}
