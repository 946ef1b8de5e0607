//! User session preferences passed to components at construction.

use serde::{Deserialize, Serialize};

/// Initial security preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityPreferences {
    pub camera_on: bool,
    pub alarm_armed: bool,
}

/// Preferences of the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub username: String,
    pub weather_location: String,
    /// Thermostat setpoint before any reading arrives, °C.
    pub default_temperature: i32,
    /// Target reduction of daily consumption, percent.
    pub energy_savings_goal: u8,
    pub security: SecurityPreferences,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            username: "guest".to_string(),
            weather_location: "New York".to_string(),
            default_temperature: 22,
            energy_savings_goal: 15,
            security: SecurityPreferences::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let session: Session =
            serde_json::from_str(r#"{"username": "ada", "security": {"alarmArmed": true}}"#)
                .unwrap();
        assert_eq!(session.username, "ada");
        assert_eq!(session.weather_location, "New York");
        assert_eq!(session.default_temperature, 22);
        assert!(session.security.alarm_armed);
        assert!(!session.security.camera_on);
    }
}
