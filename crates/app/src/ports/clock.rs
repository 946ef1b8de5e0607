//! Clock port — local wall-clock time.

use std::sync::{Mutex, PoisonError};

use chrono::TimeDelta;
use homebus_domain::time::{WallClock, local_now};

/// Source of local wall-clock time.
pub trait Clock {
    fn now(&self) -> WallClock;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> WallClock {
        (**self).now()
    }
}

/// The host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> WallClock {
        local_now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<WallClock>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: WallClock) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: WallClock) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> WallClock {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
