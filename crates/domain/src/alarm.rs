//! Security alarm state and its transitions.
//!
//! ```text
//!            arm                 motion / door / trigger
//! Disarmed ───────▶ Armed ─────────────────────────────▶ Triggered
//!          ◀───────        ◀─────────────────────────────
//!            disarm                     reset
//! ```
//!
//! Disarming a triggered alarm is rejected; it must be reset first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::payload::AlarmPayload;

/// Raw alarm flags as carried on the alarm topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmState {
    pub armed: bool,
    pub triggered: bool,
}

impl AlarmState {
    #[must_use]
    pub fn new(armed: bool) -> Self {
        Self {
            armed,
            triggered: false,
        }
    }

    #[must_use]
    pub fn phase(self) -> AlarmPhase {
        if self.triggered {
            AlarmPhase::Triggered
        } else if self.armed {
            AlarmPhase::Armed
        } else {
            AlarmPhase::Disarmed
        }
    }

    /// Merge an alarm payload field by field.
    ///
    /// A `reset` without an explicit `triggered` clears the trigger.
    pub fn merge(&mut self, payload: &AlarmPayload) {
        if let Some(armed) = payload.armed {
            self.armed = armed;
        }
        match (payload.triggered, payload.reset) {
            (Some(triggered), _) => self.triggered = triggered,
            (None, Some(true)) => self.triggered = false,
            _ => {}
        }
    }

    /// Compute the state reached by `command`.
    ///
    /// Returns `Ok(None)` when the command leaves the state as it is.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the command is not allowed from the
    /// current phase.
    pub fn apply(self, command: AlarmCommand) -> Result<Option<Self>, TransitionError> {
        match (self.phase(), command) {
            (AlarmPhase::Disarmed, AlarmCommand::Arm) => Ok(Some(Self::new(true))),
            (AlarmPhase::Armed | AlarmPhase::Triggered, AlarmCommand::Arm)
            | (AlarmPhase::Disarmed, AlarmCommand::Disarm)
            | (AlarmPhase::Triggered, AlarmCommand::Trigger) => Ok(None),
            (AlarmPhase::Armed, AlarmCommand::Disarm) => Ok(Some(Self::new(false))),
            (AlarmPhase::Triggered, AlarmCommand::Disarm) => {
                Err(TransitionError::DisarmWhileTriggered)
            }
            (AlarmPhase::Armed, AlarmCommand::Trigger) => Ok(Some(Self {
                armed: true,
                triggered: true,
            })),
            (AlarmPhase::Disarmed, AlarmCommand::Trigger) => {
                Err(TransitionError::TriggerWhileDisarmed)
            }
            (AlarmPhase::Triggered, AlarmCommand::Reset) => Ok(Some(Self::new(self.armed))),
            (AlarmPhase::Disarmed | AlarmPhase::Armed, AlarmCommand::Reset) => {
                Err(TransitionError::NotTriggered)
            }
        }
    }
}

/// The three observable phases of the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmPhase {
    Disarmed,
    Armed,
    Triggered,
}

impl fmt::Display for AlarmPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disarmed => f.write_str("disarmed"),
            Self::Armed => f.write_str("armed"),
            Self::Triggered => f.write_str("triggered"),
        }
    }
}

/// Commands accepted by the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmCommand {
    Arm,
    Disarm,
    Trigger,
    Reset,
}

impl AlarmCommand {
    /// The command that moves the alarm from one phase to another, if any.
    #[must_use]
    pub fn between(from: AlarmPhase, to: AlarmPhase) -> Option<Self> {
        match (from, to) {
            (from, to) if from == to => None,
            (_, AlarmPhase::Triggered) => Some(Self::Trigger),
            (AlarmPhase::Triggered, AlarmPhase::Armed) => Some(Self::Reset),
            (_, AlarmPhase::Armed) => Some(Self::Arm),
            (_, AlarmPhase::Disarmed) => Some(Self::Disarm),
        }
    }

    /// Payload announcing the transition on the alarm topic.
    #[must_use]
    pub fn payload(self) -> AlarmPayload {
        match self {
            Self::Arm => AlarmPayload {
                armed: Some(true),
                triggered: Some(false),
                reset: None,
            },
            Self::Disarm => AlarmPayload {
                armed: Some(false),
                ..AlarmPayload::default()
            },
            Self::Trigger => AlarmPayload {
                triggered: Some(true),
                ..AlarmPayload::default()
            },
            Self::Reset => AlarmPayload {
                armed: None,
                triggered: Some(false),
                reset: Some(true),
            },
        }
    }

    /// Activity log line for the transition.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Arm => "Alarm system armed",
            Self::Disarm => "Alarm system disarmed",
            Self::Trigger => "ALARM TRIGGERED!",
            Self::Reset => "Alarm reset",
        }
    }
}

impl fmt::Display for AlarmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm => f.write_str("arm"),
            Self::Disarm => f.write_str("disarm"),
            Self::Trigger => f.write_str("trigger"),
            Self::Reset => f.write_str("reset"),
        }
    }
}
