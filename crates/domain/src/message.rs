//! Bus messages.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::payload::Payload;
use crate::time::{Timestamp, now};
use crate::topic::Topic;

/// Where a message entered the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Published by a component of this process.
    #[default]
    Local,
    /// Injected by a bridge from a remote broker.
    Remote,
}

/// A message as delivered to subscribers. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    topic: Topic,
    payload: Vec<u8>,
    received_at: Timestamp,
    origin: Origin,
}

impl Message {
    /// Build a local message stamped with the current time.
    #[must_use]
    pub fn new(topic: impl Into<Topic>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: now(),
            origin: Origin::Local,
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn with_received_at(mut self, received_at: Timestamp) -> Self {
        self.received_at = received_at;
        self
    }

    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }

    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Decode the body according to the topic's schema.
    ///
    /// # Errors
    ///
    /// See [`Payload::decode`].
    pub fn decode(&self) -> Result<Payload, DecodeError> {
        Payload::decode(self.topic.as_str(), &self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::LightPayload;
    use crate::topic::topics;

    #[test]
    fn should_default_to_local_origin() {
        let message = Message::new(topics::LIGHT, b"{}".to_vec());
        assert_eq!(message.origin(), Origin::Local);
    }

    #[test]
    fn should_keep_payload_bytes_untouched() {
        let body = br#"{"light":true, "x": [1,2]}"#;
        let message = Message::new(topics::LIGHT, body.to_vec());
        assert_eq!(message.payload(), body);
    }

    #[test]
    fn should_decode_by_topic() {
        let message = Message::new(topics::LIGHT, br#"{"light":true}"#.to_vec())
            .with_origin(Origin::Remote);
        assert_eq!(
            message.decode().unwrap(),
            Payload::Light(LightPayload { light: Some(true) })
        );
        assert_eq!(message.origin(), Origin::Remote);
    }
}
