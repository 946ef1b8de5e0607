//! Event bus port — publish typed payloads onto their fixed topics.

use homebus_domain::error::HubError;
use homebus_domain::payload::Payload;

/// Publishes typed payloads on the bus.
///
/// Publishing only enqueues: it never waits for subscribers to run.
pub trait EventPublisher {
    /// Publish `payload` on its topic.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Connection`] when the transport is not connected.
    fn publish(&self, payload: &Payload) -> Result<(), HubError>;
}

impl<T: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, payload: &Payload) -> Result<(), HubError> {
        (**self).publish(payload)
    }
}
