//! Condition — the weather predicate a rule waits for.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::weather::{CurrentWeather, SkyCondition};

/// Wind speed above which a day counts as windy, km/h.
pub const WINDY_ABOVE: f64 = 20.0;

/// Temperature below which a day counts as cold, °C.
pub const COLD_BELOW: f64 = 10.0;

/// Temperature above which a day counts as hot, °C.
pub const HOT_ABOVE: f64 = 30.0;

/// Weather situation a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    Sunny,
    Cloudy,
    Rainy,
    Windy,
    Cold,
    Hot,
}

impl RuleCondition {
    /// Check the condition against a weather reading.
    ///
    /// `sunny` and `cloudy` look at the reported sky, the others at the
    /// measured values.
    #[must_use]
    pub fn matches(self, weather: &CurrentWeather) -> bool {
        match self {
            Self::Sunny => matches!(weather.condition, SkyCondition::Sunny | SkyCondition::Hot),
            Self::Cloudy => matches!(
                weather.condition,
                SkyCondition::Cloudy | SkyCondition::PartlyCloudy
            ),
            Self::Rainy => weather.condition == SkyCondition::Rainy,
            Self::Windy => weather.wind_speed > WINDY_ABOVE,
            Self::Cold => weather.temp < COLD_BELOW,
            Self::Hot => weather.temp > HOT_ABOVE,
        }
    }
}

impl fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Windy => "windy",
            Self::Cold => "cold",
            Self::Hot => "hot",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(temp: f64, condition: SkyCondition) -> CurrentWeather {
        CurrentWeather {
            temp,
            condition,
            ..CurrentWeather::default()
        }
    }

    #[test]
    fn should_match_hot_on_temperature_only() {
        assert!(RuleCondition::Hot.matches(&weather(32.0, SkyCondition::Hot)));
        assert!(!RuleCondition::Hot.matches(&weather(20.0, SkyCondition::Sunny)));
        assert!(!RuleCondition::Hot.matches(&weather(30.0, SkyCondition::Hot)));
    }

    #[test]
    fn should_treat_hot_sky_as_sunny() {
        assert!(RuleCondition::Sunny.matches(&weather(32.0, SkyCondition::Hot)));
        assert!(RuleCondition::Sunny.matches(&weather(26.0, SkyCondition::Sunny)));
        assert!(!RuleCondition::Sunny.matches(&weather(26.0, SkyCondition::Cloudy)));
    }

    #[test]
    fn should_treat_partly_cloudy_as_cloudy() {
        assert!(RuleCondition::Cloudy.matches(&weather(20.0, SkyCondition::PartlyCloudy)));
        assert!(RuleCondition::Cloudy.matches(&weather(15.0, SkyCondition::Cloudy)));
        assert!(!RuleCondition::Cloudy.matches(&weather(8.0, SkyCondition::Rainy)));
    }

    #[test]
    fn should_match_windy_above_threshold() {
        let mut reading = weather(15.0, SkyCondition::Windy);
        reading.wind_speed = 20.0;
        assert!(!RuleCondition::Windy.matches(&reading));
        reading.wind_speed = 21.0;
        assert!(RuleCondition::Windy.matches(&reading));
    }

    #[test]
    fn should_match_cold_below_threshold() {
        assert!(RuleCondition::Cold.matches(&weather(9.0, SkyCondition::Rainy)));
        assert!(!RuleCondition::Cold.matches(&weather(10.0, SkyCondition::Rainy)));
    }

    #[test]
    fn should_use_snake_case_names() {
        let json = serde_json::to_string(&RuleCondition::Cold).unwrap();
        assert_eq!(json, "\"cold\"");
        assert_eq!(RuleCondition::Windy.to_string(), "windy");
    }
}
