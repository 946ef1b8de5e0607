//! Topics (hierarchical routing keys) and subscription patterns.
//!
//! Levels are separated by `/`. A pattern may use two wildcards:
//!
//! - `+` as a whole level matches exactly one level (`home/+/motion`)
//! - a trailing `#` matches every topic that starts with the text before
//!   it (`home/energy/#` matches `home/energy/current`, not `home/energy`)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Single-level wildcard.
pub const SINGLE_LEVEL: &str = "+";

/// Multi-level (prefix) wildcard, only meaningful as the last character.
pub const MULTI_LEVEL: char = '#';

/// Fixed topics of the home.
pub mod topics {
    pub const LIGHT: &str = "home/light";
    pub const TEMPERATURE: &str = "home/temperature";
    pub const DOOR_LOCK: &str = "home/door";
    pub const MOTION: &str = "home/motion";
    pub const BLINDS: &str = "home/blinds";
    pub const SECURITY_MOTION: &str = "home/security/motion";
    pub const SECURITY_DOOR: &str = "home/security/door";
    pub const CAMERA: &str = "home/security/camera";
    pub const ALARM: &str = "home/security/alarm";
    pub const WEATHER_CURRENT: &str = "home/weather/current";
    pub const WEATHER_FORECAST: &str = "home/weather/forecast";
    pub const WEATHER_LOCATION: &str = "home/weather/location";
    pub const ENERGY_CURRENT: &str = "home/energy/current";
    pub const ENERGY_HISTORY: &str = "home/energy/history";

    /// Everything under `home/`.
    pub const HOME_ALL: &str = "home/#";
}

/// A concrete topic a message is published on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self(topic.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the `/`-separated levels.
    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subscription pattern: an exact topic or one using wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicPattern(String);

impl TopicPattern {
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if the pattern contains a wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0.ends_with(MULTI_LEVEL) || self.0.split('/').any(|level| level == SINGLE_LEVEL)
    }

    /// Check whether `topic` is routed to this pattern.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let Some(prefix) = self.0.strip_suffix(MULTI_LEVEL) else {
            let mut pattern = self.0.split('/');
            let mut levels = topic.split('/');
            return loop {
                match (pattern.next(), levels.next()) {
                    (None, None) => break true,
                    (Some(p), Some(level)) if p == SINGLE_LEVEL || p == level => {}
                    _ => break false,
                }
            };
        };

        // The last segment of the prefix is a text prefix of the matching
        // level; earlier segments match level-for-level.
        let mut pattern = prefix.split('/').peekable();
        let mut levels = topic.split('/');
        while let Some(p) = pattern.next() {
            let Some(level) = levels.next() else {
                return false;
            };
            if pattern.peek().is_none() {
                return level.starts_with(p);
            }
            if p != SINGLE_LEVEL && p != level {
                return false;
            }
        }
        false
    }
}

impl From<&str> for TopicPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TopicPattern {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<Topic> for TopicPattern {
    fn from(value: Topic) -> Self {
        Self(value.0)
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
