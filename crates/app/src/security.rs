//! Security — alarm state machine, camera control and the shared activity log.

pub mod alarm;
pub mod camera;

pub use alarm::AlarmStateMachine;
pub use camera::CameraControl;

use std::sync::{Mutex, PoisonError};

use homebus_domain::activity::{ACTIVITY_LOG_CAPACITY, ActivityKind, ActivityLogEntry};
use homebus_domain::bounded_log::BoundedLog;

/// Security activity log, newest first, capped at [`ACTIVITY_LOG_CAPACITY`].
#[derive(Debug)]
pub struct ActivityLog {
    entries: Mutex<BoundedLog<ActivityLogEntry>>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(ACTIVITY_LOG_CAPACITY)
    }
}

impl ActivityLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(BoundedLog::new(capacity)),
        }
    }

    pub fn push(&self, entry: ActivityLogEntry) {
        tracing::debug!(kind = %entry.kind, message = %entry.message, "activity");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Copy of the entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    /// Number of entries of one kind.
    #[must_use]
    pub fn count(&self, kind: ActivityKind) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_cap_log_at_fifty_entries() {
        let log = ActivityLog::default();
        for i in 0..55 {
            log.push(ActivityLogEntry::new(ActivityKind::System, format!("entry {i}")));
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].message, "entry 54");
        assert_eq!(entries[49].message, "entry 5");
    }

    #[test]
    fn should_count_entries_by_kind() {
        let log = ActivityLog::default();
        log.push(ActivityLogEntry::motion(Some("Garage")));
        log.push(ActivityLogEntry::new(ActivityKind::System, "Camera activated"));
        log.push(ActivityLogEntry::motion(None));
        assert_eq!(log.count(ActivityKind::Motion), 2);
        assert_eq!(log.count(ActivityKind::Door), 0);
    }
}
