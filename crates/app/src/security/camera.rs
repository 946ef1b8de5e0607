//! Camera control — switches the security camera and takes snapshots.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use homebus_domain::activity::{ActivityKind, ActivityLogEntry};
use homebus_domain::camera::{CameraLocation, Snapshot};
use homebus_domain::error::{HubError, TransitionError};
use homebus_domain::payload::{CameraPayload, Payload};

use crate::ports::EventPublisher;
use crate::security::ActivityLog;

pub struct CameraControl<P> {
    publisher: P,
    enabled: AtomicBool,
    log: Arc<ActivityLog>,
}

impl<P: EventPublisher> CameraControl<P> {
    #[must_use]
    pub fn new(publisher: P, enabled: bool, log: Arc<ActivityLog>) -> Self {
        Self {
            publisher,
            enabled: AtomicBool::new(enabled),
            log,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Switch the camera on or off and announce it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Connection`] if the announcement cannot be
    /// published; the camera keeps its previous state.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), HubError> {
        self.publisher.publish(&Payload::Camera(CameraPayload {
            enabled: Some(enabled),
        }))?;
        self.enabled.store(enabled, Ordering::SeqCst);
        let message = if enabled {
            "Camera activated"
        } else {
            "Camera deactivated"
        };
        self.log
            .push(ActivityLogEntry::new(ActivityKind::System, message));
        Ok(())
    }

    /// Capture a still from the camera at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::CameraOff`] while the camera is off.
    pub fn take_snapshot(&self, location: CameraLocation) -> Result<Snapshot, HubError> {
        if !self.is_enabled() {
            return Err(TransitionError::CameraOff.into());
        }
        let snapshot = Snapshot::capture(location);
        tracing::info!(%location, id = %snapshot.id, "snapshot taken");
        self.log.push(ActivityLogEntry::new(
            ActivityKind::Camera,
            format!("Snapshot taken from {location}"),
        ));
        Ok(snapshot)
    }
}
