//! Bus endpoints — where a connection points to.
//!
//! Written as `scheme://authority`, e.g. `memory://home` for the in-process
//! bus or `mqtt://broker.local:1883` for a remote broker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConnectionError;

/// Transport family of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// In-process bus, no network.
    Memory,
    /// MQTT over TCP.
    Mqtt,
    /// MQTT over WebSocket.
    Ws,
    /// MQTT over secure WebSocket.
    Wss,
}

impl Scheme {
    /// Port used when the authority does not name one.
    #[must_use]
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::Memory => None,
            Self::Mqtt => Some(1883),
            Self::Ws => Some(80),
            Self::Wss => Some(443),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Mqtt => "mqtt",
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }
}

impl FromStr for Scheme {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "mqtt" | "tcp" => Ok(Self::Mqtt),
            "ws" => Ok(Self::Ws),
            "wss" => Ok(Self::Wss),
            _ => Err(ConnectionError::UnsupportedScheme(s.to_string())),
        }
    }
}

/// A parsed `scheme://authority` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    scheme: Scheme,
    authority: String,
}

impl Endpoint {
    /// In-process endpoint with the given bus name.
    #[must_use]
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Memory,
            authority: name.into(),
        }
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Host part of the authority (path and port stripped).
    #[must_use]
    pub fn host(&self) -> &str {
        let without_path = self.host_and_port();
        match without_path.rsplit_once(':') {
            Some((host, port)) if port.parse::<u16>().is_ok() => host,
            _ => without_path,
        }
    }

    /// Port named in the authority, falling back to the scheme default.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.host_and_port()
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
            .or_else(|| self.scheme.default_port())
    }

    fn host_and_port(&self) -> &str {
        self.authority
            .split_once('/')
            .map_or(self.authority.as_str(), |(head, _)| head)
    }
}

impl FromStr for Endpoint {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, authority) = s
            .split_once("://")
            .ok_or_else(|| ConnectionError::InvalidEndpoint(s.to_string()))?;
        if authority.is_empty() {
            return Err(ConnectionError::InvalidEndpoint(s.to_string()));
        }
        Ok(Self {
            scheme: scheme.parse()?,
            authority: authority.to_string(),
        })
    }
}

impl TryFrom<String> for Endpoint {
    type Error = ConnectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.authority)
    }
}
