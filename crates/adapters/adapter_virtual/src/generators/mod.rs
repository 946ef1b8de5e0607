//! Synthetic sensor feeds — temperature, motion, energy, weather.
//!
//! Each generator turns a random source and the current wall-clock time
//! into the payloads of one tick. Generators never publish themselves; the
//! [`SensorSimulator`](crate::SensorSimulator) drives them on a timer.

mod energy;
mod motion;
mod temperature;
mod weather;

use std::fmt;
use std::time::Duration;

pub use energy::{EnergyGenerator, base_watts};
pub use motion::MotionGenerator;
pub use temperature::TemperatureGenerator;
pub use weather::WeatherGenerator;

use chrono::Timelike;
use homebus_domain::payload::Payload;
use homebus_domain::time::WallClock;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Which feed a generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Temperature,
    Motion,
    Energy,
    Weather,
}

impl GeneratorKind {
    pub const ALL: [Self; 4] = [Self::Temperature, Self::Motion, Self::Energy, Self::Weather];

    #[must_use]
    pub fn default_period(self) -> Duration {
        match self {
            Self::Temperature | Self::Motion | Self::Energy => Duration::from_secs(5),
            Self::Weather => Duration::from_secs(60),
        }
    }

    /// Energy and weather publish once at start so consumers are not empty
    /// for a full period.
    #[must_use]
    pub fn fires_on_start(self) -> bool {
        matches!(self, Self::Energy | Self::Weather)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Motion => "motion",
            Self::Energy => "energy",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of the day used to bias readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    /// 22:00 to 05:59
    Night,
    /// 17:00 to 21:59
    Evening,
    Day,
}

impl DayPeriod {
    #[must_use]
    pub fn of_hour(hour: u32) -> Self {
        if hour >= 22 || hour < 6 {
            Self::Night
        } else if hour >= 17 {
            Self::Evening
        } else {
            Self::Day
        }
    }

    #[must_use]
    pub fn of(at: WallClock) -> Self {
        Self::of_hour(at.hour())
    }
}

/// Wrapper enum for the concrete generator types.
#[derive(Debug, Clone)]
pub enum Generator {
    Temperature(TemperatureGenerator),
    Motion(MotionGenerator),
    Energy(EnergyGenerator),
    Weather(WeatherGenerator),
}

impl Generator {
    /// A fresh generator of the given kind. `motion_probability` only
    /// applies to [`GeneratorKind::Motion`].
    #[must_use]
    pub fn new(kind: GeneratorKind, motion_probability: f64) -> Self {
        match kind {
            GeneratorKind::Temperature => Self::Temperature(TemperatureGenerator),
            GeneratorKind::Motion => Self::Motion(MotionGenerator::new(motion_probability)),
            GeneratorKind::Energy => Self::Energy(EnergyGenerator::default()),
            GeneratorKind::Weather => Self::Weather(WeatherGenerator),
        }
    }

    #[must_use]
    pub fn kind(&self) -> GeneratorKind {
        match self {
            Self::Temperature(_) => GeneratorKind::Temperature,
            Self::Motion(_) => GeneratorKind::Motion,
            Self::Energy(_) => GeneratorKind::Energy,
            Self::Weather(_) => GeneratorKind::Weather,
        }
    }

    /// Produce the payloads of one tick, one per owned channel.
    pub fn tick(&mut self, rng: &mut StdRng, now: WallClock) -> Vec<Payload> {
        match self {
            Self::Temperature(g) => vec![g.tick(rng, now)],
            Self::Motion(g) => vec![g.tick(rng)],
            Self::Energy(g) => g.tick(rng, now),
            Self::Weather(g) => Vec::from(g.tick(rng, now)),
        }
    }
}
