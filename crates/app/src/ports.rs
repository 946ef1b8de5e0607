//! Port definitions — traits that adapters implement or consume.
//!
//! Ports are the boundaries between the application core and the outside
//! world. Components publish through [`EventPublisher`] and read wall-clock
//! time through [`Clock`], so tests can swap both for in-memory fakes.

pub mod clock;
pub mod event_bus;

pub use clock::{Clock, FixedClock, SystemClock};
pub use event_bus::EventPublisher;
