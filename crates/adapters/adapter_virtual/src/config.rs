//! Sensor simulator configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::generators::GeneratorKind;

/// Settings for a single generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub enabled: bool,
    /// Tick period in seconds. Falls back to the generator's own default.
    pub period_secs: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_secs: None,
        }
    }
}

/// Configuration for the sensor simulator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Master switch; when off no generator runs.
    pub enabled: bool,
    /// Seed for reproducible feeds. Each generator derives its own stream.
    pub seed: Option<u64>,
    /// Chance that a motion tick reports presence.
    pub motion_probability: f64,
    pub temperature: GeneratorConfig,
    pub motion: GeneratorConfig,
    pub energy: GeneratorConfig,
    pub weather: GeneratorConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
            motion_probability: 0.5,
            temperature: GeneratorConfig::default(),
            motion: GeneratorConfig::default(),
            energy: GeneratorConfig::default(),
            weather: GeneratorConfig::default(),
        }
    }
}

/// A simulator setting that cannot be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidSimulatorConfig {
    #[error("{kind} period must be at least one second")]
    ZeroPeriod { kind: GeneratorKind },
    #[error("motion probability must be between 0 and 1, got {0}")]
    Probability(f64),
}

impl SimulatorConfig {
    #[must_use]
    pub fn generator(&self, kind: GeneratorKind) -> &GeneratorConfig {
        match kind {
            GeneratorKind::Temperature => &self.temperature,
            GeneratorKind::Motion => &self.motion,
            GeneratorKind::Energy => &self.energy,
            GeneratorKind::Weather => &self.weather,
        }
    }

    /// Whether `kind` runs when the simulator starts.
    #[must_use]
    pub fn is_enabled(&self, kind: GeneratorKind) -> bool {
        self.enabled && self.generator(kind).enabled
    }

    #[must_use]
    pub fn period(&self, kind: GeneratorKind) -> Duration {
        self.generator(kind)
            .period_secs
            .map_or_else(|| kind.default_period(), Duration::from_secs)
    }

    /// Check periods and probability.
    ///
    /// # Errors
    ///
    /// Returns the first unusable setting found.
    pub fn validate(&self) -> Result<(), InvalidSimulatorConfig> {
        if !(0.0..=1.0).contains(&self.motion_probability) {
            return Err(InvalidSimulatorConfig::Probability(self.motion_probability));
        }
        for kind in GeneratorKind::ALL {
            if self.generator(kind).period_secs == Some(0) {
                return Err(InvalidSimulatorConfig::ZeroPeriod { kind });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = SimulatorConfig::default();
        assert!(config.enabled);
        assert_eq!(config.seed, None);
        assert!((config.motion_probability - 0.5).abs() < f64::EPSILON);
        for kind in GeneratorKind::ALL {
            assert!(config.is_enabled(kind));
            assert_eq!(config.period(kind), kind.default_period());
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r"
            seed = 42
            motion_probability = 0.25

            [weather]
            period_secs = 300

            [motion]
            enabled = false
        ";
        let config: SimulatorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.seed, Some(42));
        assert!((config.motion_probability - 0.25).abs() < f64::EPSILON);
        assert_eq!(
            config.period(GeneratorKind::Weather),
            Duration::from_secs(300)
        );
        assert!(!config.is_enabled(GeneratorKind::Motion));
        assert!(config.is_enabled(GeneratorKind::Energy));
    }

    #[test]
    fn should_disable_every_generator_with_master_switch() {
        let config: SimulatorConfig = toml::from_str("enabled = false").unwrap();
        assert!(GeneratorKind::ALL.iter().all(|k| !config.is_enabled(*k)));
    }

    #[test]
    fn should_reject_zero_period() {
        let config: SimulatorConfig = toml::from_str("[energy]\nperiod_secs = 0").unwrap();
        assert_eq!(
            config.validate(),
            Err(InvalidSimulatorConfig::ZeroPeriod {
                kind: GeneratorKind::Energy
            })
        );
    }

    #[test]
    fn should_reject_probability_above_one() {
        let config = SimulatorConfig {
            motion_probability: 1.5,
            ..SimulatorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(InvalidSimulatorConfig::Probability(1.5))
        );
    }
}
