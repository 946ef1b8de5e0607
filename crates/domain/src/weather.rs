//! Weather readings and forecast.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sky condition reported by the weather feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyCondition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
    Windy,
    Cold,
    Hot,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SkyCondition {
    /// Classify a temperature the way the synthetic feed does.
    #[must_use]
    pub fn from_temperature(celsius: f64) -> Self {
        if celsius > 30.0 {
            Self::Hot
        } else if celsius > 25.0 {
            Self::Sunny
        } else if celsius > 18.0 {
            Self::PartlyCloudy
        } else if celsius > 12.0 {
            Self::Cloudy
        } else if celsius > 5.0 {
            Self::Rainy
        } else {
            Self::Cold
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Sunny => "\u{2600}\u{fe0f}",
            Self::PartlyCloudy => "\u{26c5}",
            Self::Cloudy => "\u{2601}\u{fe0f}",
            Self::Rainy => "\u{1f327}\u{fe0f}",
            Self::Stormy => "\u{26c8}\u{fe0f}",
            Self::Snowy => "\u{2744}\u{fe0f}",
            Self::Foggy => "\u{1f32b}\u{fe0f}",
            Self::Windy => "\u{1f4a8}",
            Self::Cold => "\u{1f976}",
            Self::Hot => "\u{1f975}",
            Self::Unknown => "\u{2753}",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
            Self::Snowy => "snowy",
            Self::Foggy => "foggy",
            Self::Windy => "windy",
            Self::Cold => "cold",
            Self::Hot => "hot",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest weather observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    /// Temperature in °C.
    pub temp: f64,
    pub condition: SkyCondition,
    pub icon: String,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
}

impl Default for CurrentWeather {
    fn default() -> Self {
        Self {
            temp: 0.0,
            condition: SkyCondition::Unknown,
            icon: SkyCondition::Unknown.icon().to_string(),
            humidity: 0.0,
            wind_speed: 0.0,
        }
    }
}

/// One day of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Display label, e.g. `Tue, Oct 20`.
    pub date: String,
    pub temp: f64,
    pub condition: SkyCondition,
    pub icon: String,
}
