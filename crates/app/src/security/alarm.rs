//! Alarm state machine — arms, disarms, triggers and resets the alarm.
//!
//! Reacts to state-store updates: security motion and door events are logged
//! and trigger an armed alarm. Alarm flags published by remote clients are
//! adopted as they are, and a `{reset: true}` seen on the alarm topic resets
//! a triggered alarm. Commands publish first and commit only once the publish
//! went through, so a failed publish leaves the state unchanged.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use homebus_domain::activity::{ActivityKind, ActivityLogEntry};
use homebus_domain::alarm::{AlarmCommand, AlarmPhase, AlarmState};
use homebus_domain::error::{HubError, TransitionError};
use homebus_domain::message::Origin;
use homebus_domain::payload::{AlarmPayload, Payload};

use crate::ports::EventPublisher;
use crate::security::ActivityLog;
use crate::state_store::{ObserverId, StateStore, StateUpdate};

struct Inner<P> {
    publisher: P,
    state: Mutex<AlarmState>,
    log: Arc<ActivityLog>,
}

/// The security alarm.
pub struct AlarmStateMachine<P> {
    inner: Arc<Inner<P>>,
    store: Arc<StateStore>,
    observer: ObserverId,
}

impl<P> AlarmStateMachine<P>
where
    P: EventPublisher + Send + Sync + 'static,
{
    /// Start in the state given by the session and watch `store`.
    pub fn new(publisher: P, store: Arc<StateStore>, log: Arc<ActivityLog>) -> Self {
        let initial = AlarmState::new(store.session().security.alarm_armed);
        let inner = Arc::new(Inner {
            publisher,
            state: Mutex::new(initial),
            log,
        });
        let weak: Weak<Inner<P>> = Arc::downgrade(&inner);
        let observer = store.observe(move |update: &StateUpdate| {
            if let Some(inner) = weak.upgrade() {
                inner.on_update(update);
            }
        });
        Self {
            inner,
            store,
            observer,
        }
    }

    #[must_use]
    pub fn state(&self) -> AlarmState {
        *self.inner.lock()
    }

    #[must_use]
    pub fn phase(&self) -> AlarmPhase {
        self.state().phase()
    }

    /// `Disarmed → Armed`. No-op when already armed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Connection`] if the announcement cannot be
    /// published.
    pub fn arm(&self) -> Result<AlarmPhase, HubError> {
        self.inner.command(AlarmCommand::Arm)
    }

    /// `Armed → Disarmed`. No-op when already disarmed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidTransition`] while triggered, or
    /// [`HubError::Connection`] if the announcement cannot be published.
    pub fn disarm(&self) -> Result<AlarmPhase, HubError> {
        self.inner.command(AlarmCommand::Disarm)
    }

    /// `Armed → Triggered`. No-op when already triggered.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidTransition`] while disarmed, or
    /// [`HubError::Connection`] if the announcement cannot be published.
    pub fn trigger(&self) -> Result<AlarmPhase, HubError> {
        self.inner.command(AlarmCommand::Trigger)
    }

    /// `Triggered → Armed`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidTransition`] when not triggered, or
    /// [`HubError::Connection`] if the announcement cannot be published.
    pub fn reset(&self) -> Result<AlarmPhase, HubError> {
        self.inner.command(AlarmCommand::Reset)
    }

    /// The shared security activity log.
    #[must_use]
    pub fn log(&self) -> &Arc<ActivityLog> {
        &self.inner.log
    }
}

impl<P> Drop for AlarmStateMachine<P> {
    fn drop(&mut self) {
        self.store.unobserve(self.observer);
    }
}

impl<P: EventPublisher> Inner<P> {
    fn lock(&self) -> std::sync::MutexGuard<'_, AlarmState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn command(&self, command: AlarmCommand) -> Result<AlarmPhase, HubError> {
        let mut state = self.lock();
        let Some(next) = state.apply(command)? else {
            tracing::debug!(%command, phase = %state.phase(), "alarm command is a no-op");
            return Ok(state.phase());
        };
        self.publisher
            .publish(&Payload::Alarm(command.payload()))?;
        *state = next;
        drop(state);
        self.record(command, next);
        Ok(next.phase())
    }

    /// Apply a transition announced by someone else; nothing is published.
    fn follow(&self, command: AlarmCommand) {
        let mut state = self.lock();
        if let Ok(Some(next)) = state.apply(command) {
            *state = next;
            drop(state);
            self.record(command, next);
        }
    }

    /// Take over the flags announced by a remote client; nothing is published.
    fn adopt(&self, payload: &AlarmPayload) {
        let mut state = self.lock();
        let mut next = *state;
        next.merge(payload);
        let previous = std::mem::replace(&mut *state, next);
        drop(state);
        if let Some(command) = AlarmCommand::between(previous.phase(), next.phase()) {
            self.record(command, next);
        }
    }

    fn record(&self, command: AlarmCommand, next: AlarmState) {
        tracing::info!(%command, phase = %next.phase(), "alarm transition");
        let kind = match command {
            AlarmCommand::Trigger => ActivityKind::Alarm,
            AlarmCommand::Arm | AlarmCommand::Disarm | AlarmCommand::Reset => ActivityKind::System,
        };
        self.log.push(ActivityLogEntry::new(kind, command.describe()));
    }

    fn intrusion(&self) {
        match self.command(AlarmCommand::Trigger) {
            Ok(_) | Err(HubError::InvalidTransition(TransitionError::TriggerWhileDisarmed)) => {}
            Err(err) => tracing::warn!(%err, "failed to raise the alarm"),
        }
    }

    fn on_update(&self, update: &StateUpdate) {
        match &update.payload {
            Payload::SecurityMotion(motion) if motion.detected == Some(true) => {
                self.log
                    .push(ActivityLogEntry::motion(motion.location.as_deref()));
                self.intrusion();
            }
            Payload::SecurityDoor(door) if door.action.is_some() => {
                self.log.push(ActivityLogEntry::door(
                    door.action.as_deref(),
                    door.location.as_deref(),
                ));
                if door.is_opened() {
                    self.intrusion();
                }
            }
            Payload::Alarm(alarm) if update.origin == Origin::Remote => self.adopt(alarm),
            Payload::Alarm(alarm) if alarm.reset == Some(true) => {
                self.follow(AlarmCommand::Reset);
            }
            _ => {}
        }
    }
}
