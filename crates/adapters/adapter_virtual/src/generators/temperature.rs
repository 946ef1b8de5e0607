//! Thermostat reading feed.

use homebus_domain::payload::{Payload, ThermostatPayload};
use homebus_domain::time::WallClock;
use rand::Rng;
use rand::rngs::StdRng;

use super::DayPeriod;

/// Whole-degree readings between 20 and 25 °C, two degrees warmer in the
/// evening.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemperatureGenerator;

impl TemperatureGenerator {
    pub const MIN: i32 = 20;
    pub const MAX: i32 = 25;
    pub const EVENING_OFFSET: i32 = 2;

    pub fn reading(self, rng: &mut StdRng, now: WallClock) -> i32 {
        let base = rng.gen_range(Self::MIN..=Self::MAX);
        if DayPeriod::of(now) == DayPeriod::Evening {
            base + Self::EVENING_OFFSET
        } else {
            base
        }
    }

    pub fn tick(self, rng: &mut StdRng, now: WallClock) -> Payload {
        Payload::Thermostat(ThermostatPayload::setpoint(self.reading(rng, now)))
    }
}
