//! MQTT adapter error types.

use std::time::Duration;

use homebus_domain::error::{ConnectionError, HubError};

/// Errors specific to the MQTT bridge.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// A configuration value cannot be used.
    #[error("invalid MQTT configuration: {0}")]
    InvalidConfig(&'static str),

    /// The broker did not acknowledge the connection in time.
    #[error("MQTT broker did not answer within {0:?}")]
    ConnectTimeout(Duration),

    /// The connection to the broker failed.
    #[error("MQTT connection failed")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// A domain-level error (bus not connected, etc.).
    #[error("domain error")]
    Domain(#[source] HubError),
}

impl MqttError {
    /// Convert into a [`HubError::Connection`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubError {
        match self {
            Self::Domain(err) => err,
            other => HubError::Connection(ConnectionError::Unavailable(Box::new(other))),
        }
    }
}

impl From<MqttError> for HubError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_timeout_error() {
        let err = MqttError::ConnectTimeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "MQTT broker did not answer within 5s");
    }

    #[test]
    fn should_convert_timeout_to_connection_error() {
        let err: HubError = MqttError::ConnectTimeout(Duration::from_secs(1)).into();
        assert!(matches!(
            err,
            HubError::Connection(ConnectionError::Unavailable(_))
        ));
    }

    #[test]
    fn should_convert_domain_error_back_to_domain() {
        let mqtt_err = MqttError::Domain(ConnectionError::NotConnected.into());
        let back: HubError = mqtt_err.into();
        assert!(matches!(
            back,
            HubError::Connection(ConnectionError::NotConnected)
        ));
    }

    #[test]
    fn should_display_invalid_config_error() {
        let err = MqttError::InvalidConfig("client_id must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid MQTT configuration: client_id must not be empty"
        );
    }
}
