//! Time and timestamp helpers.
//!
//! Two notions of time coexist: [`Timestamp`] (UTC instant, used for
//! `received_at` and log entries) and [`WallClock`] (local date/time, used
//! for schedule gates and time-of-day bias).

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// UTC timestamp used for message arrival, log entries, etc.
pub type Timestamp = DateTime<Utc>;

/// Local wall-clock date and time, without timezone.
pub type WallClock = NaiveDateTime;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current local wall-clock time.
#[must_use]
pub fn local_now() -> WallClock {
    Local::now().naive_local()
}
