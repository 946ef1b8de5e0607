//! Command service — the write path for user commands.
//!
//! Every bus-facing command maps to exactly one publish on a fixed topic.
//! Alarm, camera and automation commands go through their owning
//! components so state and logs stay consistent.

use std::sync::Arc;

use tokio::task::JoinHandle;

use homebus_domain::activity::ActivityLogEntry;
use homebus_domain::alarm::AlarmPhase;
use homebus_domain::automation::{AutomationLogEntry, AutomationRule};
use homebus_domain::camera::{CameraLocation, Snapshot};
use homebus_domain::channel::{HomeSnapshot, validate_setpoint};
use homebus_domain::error::{HubError, ValidationError};
use homebus_domain::id::RuleId;
use homebus_domain::payload::{
    DoorLockPayload, LightPayload, LocationPayload, Payload, ThermostatPayload,
};
use homebus_domain::time::WallClock;

use crate::automation_engine::AutomationEngine;
use crate::ports::{Clock, EventPublisher};
use crate::security::{ActivityLog, AlarmStateMachine, CameraControl};
use crate::state_store::StateStore;

/// A pending one-shot light toggle.
#[derive(Debug)]
pub struct ScheduledToggle {
    at: WallClock,
    handle: JoinHandle<()>,
}

impl ScheduledToggle {
    #[must_use]
    pub fn at(&self) -> WallClock {
        self.at
    }

    /// Cancel the toggle if it has not run yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Everything the command service drives.
pub struct CommandService<P, C> {
    publisher: P,
    clock: C,
    store: Arc<StateStore>,
    alarm: Arc<AlarmStateMachine<P>>,
    camera: Arc<CameraControl<P>>,
    automations: Arc<AutomationEngine<P, C>>,
    activity: Arc<ActivityLog>,
}

impl<P, C> CommandService<P, C>
where
    P: EventPublisher + Clone + Send + Sync + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    /// Build the security and automation components on top of `store`.
    pub fn new(publisher: P, clock: C, store: Arc<StateStore>) -> Self {
        let activity = Arc::new(ActivityLog::default());
        let alarm = Arc::new(AlarmStateMachine::new(
            publisher.clone(),
            Arc::clone(&store),
            Arc::clone(&activity),
        ));
        let camera = Arc::new(CameraControl::new(
            publisher.clone(),
            store.session().security.camera_on,
            Arc::clone(&activity),
        ));
        let automations = Arc::new(AutomationEngine::new(
            publisher.clone(),
            clock.clone(),
            Arc::clone(&store),
        ));
        Self {
            publisher,
            clock,
            store,
            alarm,
            camera,
            automations,
            activity,
        }
    }

    /// # Errors
    ///
    /// Returns [`HubError::Connection`] when the bus is not connected.
    #[tracing::instrument(skip(self))]
    pub fn toggle_light(&self, on: bool) -> Result<(), HubError> {
        self.publisher
            .publish(&Payload::Light(LightPayload { light: Some(on) }))
    }

    /// Publish a thermostat setpoint in `16..=30` °C.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] outside the range, or
    /// [`HubError::Connection`] when the bus is not connected.
    #[tracing::instrument(skip(self))]
    pub fn set_temperature(&self, celsius: i32) -> Result<(), HubError> {
        let celsius = validate_setpoint(celsius)?;
        self.publisher
            .publish(&Payload::Thermostat(ThermostatPayload::setpoint(celsius)))
    }

    /// # Errors
    ///
    /// Returns [`HubError::Connection`] when the bus is not connected.
    #[tracing::instrument(skip(self))]
    pub fn toggle_door_lock(&self, locked: bool) -> Result<(), HubError> {
        self.publisher.publish(&Payload::DoorLock(DoorLockPayload {
            locked: Some(locked),
        }))
    }

    /// # Errors
    ///
    /// Returns [`HubError::Connection`] when the bus is not connected.
    #[tracing::instrument(skip(self))]
    pub fn toggle_camera(&self, enabled: bool) -> Result<(), HubError> {
        self.camera.set_enabled(enabled)
    }

    /// # Errors
    ///
    /// Returns [`HubError::InvalidTransition`] while the camera is off.
    #[tracing::instrument(skip(self))]
    pub fn take_snapshot(&self, location: CameraLocation) -> Result<Snapshot, HubError> {
        self.camera.take_snapshot(location)
    }

    /// # Errors
    ///
    /// Returns [`HubError::Connection`] when the bus is not connected.
    #[tracing::instrument(skip(self))]
    pub fn arm_alarm(&self) -> Result<AlarmPhase, HubError> {
        self.alarm.arm()
    }

    /// # Errors
    ///
    /// Returns [`HubError::InvalidTransition`] while triggered.
    #[tracing::instrument(skip(self))]
    pub fn disarm_alarm(&self) -> Result<AlarmPhase, HubError> {
        self.alarm.disarm()
    }

    /// # Errors
    ///
    /// Returns [`HubError::InvalidTransition`] when not triggered.
    #[tracing::instrument(skip(self))]
    pub fn reset_alarm(&self) -> Result<AlarmPhase, HubError> {
        self.alarm.reset()
    }

    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the rule is invalid.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name))]
    pub fn add_automation(&self, rule: AutomationRule) -> Result<RuleId, HubError> {
        self.automations.add(rule)
    }

    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown id.
    #[tracing::instrument(skip(self))]
    pub fn toggle_automation(&self, id: RuleId) -> Result<bool, HubError> {
        self.automations.toggle(id)
    }

    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown id.
    #[tracing::instrument(skip(self))]
    pub fn delete_automation(&self, id: RuleId) -> Result<(), HubError> {
        self.automations.delete(id).map(|_| ())
    }

    /// Follow the weather of another place.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyLocation`] for a blank name, or
    /// [`HubError::Connection`] when the bus is not connected.
    #[tracing::instrument(skip(self))]
    pub fn set_location(&self, location: &str) -> Result<(), HubError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ValidationError::EmptyLocation.into());
        }
        self.publisher.publish(&Payload::Location(LocationPayload {
            location: Some(location.to_string()),
        }))
    }

    /// Flip the light at a future local time.
    ///
    /// The light state is read when the timer fires, not now.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScheduleInPast`] if `at` is not in the
    /// future.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[tracing::instrument(skip(self))]
    pub fn schedule_light_toggle(&self, at: WallClock) -> Result<ScheduledToggle, HubError> {
        let delay = (at - self.clock.now())
            .to_std()
            .ok()
            .filter(|delay| !delay.is_zero())
            .ok_or(ValidationError::ScheduleInPast)?;
        let publisher = self.publisher.clone();
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let light = !store.light();
            if let Err(err) = publisher.publish(&Payload::Light(LightPayload { light: Some(light) }))
            {
                tracing::warn!(%err, "scheduled light toggle failed");
            }
        });
        Ok(ScheduledToggle { at, handle })
    }

    // ── Read side ──────────────────────────────────────────────────

    #[must_use]
    pub fn home(&self) -> HomeSnapshot {
        self.store.home()
    }

    #[must_use]
    pub fn activity_log(&self) -> Vec<ActivityLogEntry> {
        self.activity.entries()
    }

    #[must_use]
    pub fn automation_log(&self) -> Vec<AutomationLogEntry> {
        self.automations.log()
    }

    #[must_use]
    pub fn automations(&self) -> Vec<AutomationRule> {
        self.automations.rules()
    }

    #[must_use]
    pub fn alarm(&self) -> &AlarmStateMachine<P> {
        &self.alarm
    }

    #[must_use]
    pub fn engine(&self) -> &AutomationEngine<P, C> {
        &self.automations
    }

    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }
}
