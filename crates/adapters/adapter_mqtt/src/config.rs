//! MQTT bridge configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::MqttError;

/// Configuration for the MQTT bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Start the bridge with the daemon.
    pub enabled: bool,
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Broker-side prefix that mirrors the local `home` tree.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// How long to wait for the broker to accept the connection, in seconds.
    pub connect_timeout_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "homebus".to_string(),
            base_topic: "home".to_string(),
            keep_alive_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

impl MqttConfig {
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }

    /// Check the settings rumqttc would otherwise reject or panic on.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), MqttError> {
        if self.broker_host.trim().is_empty() {
            return Err(MqttError::InvalidConfig("broker_host must not be empty"));
        }
        if self.client_id.trim().is_empty() {
            return Err(MqttError::InvalidConfig("client_id must not be empty"));
        }
        let base = self.base_topic.trim_matches('/');
        if base.is_empty() || base.contains(['+', '#']) {
            return Err(MqttError::InvalidConfig(
                "base_topic must be a plain, non-empty topic",
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(MqttError::InvalidConfig(
                "connect_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}
