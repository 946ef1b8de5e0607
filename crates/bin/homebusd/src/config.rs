//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `homebus.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use homebus_adapter_mqtt::MqttConfig;
use homebus_adapter_virtual::SimulatorConfig;
use homebus_domain::endpoint::Endpoint;
use homebus_domain::session::Session;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event bus transport.
    pub bus: BusConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Preferences handed to every component at start.
    pub session: Session,
    /// Automation engine settings.
    pub automation: AutomationConfig,
    /// Synthetic sensor feeds.
    pub simulator: SimulatorConfig,
    /// Optional broker bridge.
    pub mqtt: MqttConfig,
}

/// Event bus configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Endpoint URL, e.g. `memory://home`.
    pub endpoint: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Automation engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Seconds between scheduled evaluations.
    pub tick_secs: u64,
    /// Install the stock weather rules on start.
    pub seed_defaults: bool,
}

impl Config {
    /// Load configuration from `homebus.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homebus.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMEBUS_ENDPOINT") {
            self.bus.endpoint = val;
        }
        if let Ok(val) = std::env::var("HOMEBUS_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("HOMEBUS_MQTT_HOST") {
            self.mqtt.broker_host = val;
            self.mqtt.enabled = true;
        }
        if let Ok(val) = std::env::var("HOMEBUS_MQTT_PORT")
            && let Ok(port) = val.parse()
        {
            self.mqtt.broker_port = port;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;
        if self.automation.tick_secs == 0 {
            return Err(ConfigError::Validation(
                "automation tick must be at least one second".to_string(),
            ));
        }
        self.simulator
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.mqtt.enabled {
            self.mqtt
                .validate()
                .map_err(|err| ConfigError::Validation(err.to_string()))?;
        }
        Ok(())
    }

    /// Parse the bus endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the endpoint is malformed.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        self.bus
            .endpoint
            .parse::<Endpoint>()
            .map_err(|err| ConfigError::Validation(err.to_string()))
    }
}

impl AutomationConfig {
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            endpoint: "memory://home".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homebusd=info,homebus=info,rumqttc=warn".to_string(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            tick_secs: 60,
            seed_defaults: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.bus.endpoint, "memory://home");
        assert_eq!(config.automation.tick(), Duration::from_secs(60));
        assert!(config.automation.seed_defaults);
        assert!(config.simulator.enabled);
        assert!(!config.mqtt.enabled);
        assert_eq!(config.session.weather_location, "New York");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.bus.endpoint, "memory://home");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [bus]
            endpoint = 'memory://lab'

            [logging]
            filter = 'debug'

            [session]
            username = 'ada'
            weather_location = 'Lisbon'
            default_temperature = 20

            [session.security]
            alarmArmed = true

            [automation]
            tick_secs = 30
            seed_defaults = false

            [simulator]
            seed = 7

            [simulator.weather]
            period_secs = 120

            [mqtt]
            enabled = true
            broker_host = 'broker.local'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bus.endpoint, "memory://lab");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.session.username, "ada");
        assert_eq!(config.session.weather_location, "Lisbon");
        assert_eq!(config.session.default_temperature, 20);
        assert!(config.session.security.alarm_armed);
        assert_eq!(config.automation.tick_secs, 30);
        assert!(!config.automation.seed_defaults);
        assert_eq!(config.simulator.seed, Some(7));
        assert_eq!(config.simulator.weather.period_secs, Some(120));
        assert!(config.mqtt.enabled);
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.bus.endpoint, "memory://home");
    }

    #[test]
    fn should_reject_malformed_endpoint() {
        let mut config = Config::default();
        config.bus.endpoint = "no-scheme-here".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_reject_zero_tick() {
        let mut config = Config::default();
        config.automation.tick_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_invalid_simulator_settings() {
        let toml = "
            [simulator]
            motion_probability = 2.0
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_skip_mqtt_validation_when_disabled() {
        let mut config = Config::default();
        config.mqtt.client_id = String::new();
        assert!(config.validate().is_ok());
        config.mqtt.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
