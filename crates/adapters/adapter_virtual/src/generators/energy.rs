//! Whole-home power draw feed.

use chrono::TimeDelta;
use homebus_domain::energy::{
    DEVICE_SHARES, EnergyHistory, HISTORY_LEN, PowerSample, default_devices,
};
use homebus_domain::payload::{DevicePatch, EnergyPayload, Payload, PowerSamplePayload};
use homebus_domain::time::WallClock;
use rand::Rng;
use rand::rngs::StdRng;

use super::DayPeriod;

/// Random base draw in watts for a part of the day, rounded to whole watts.
pub fn base_watts(rng: &mut StdRng, period: DayPeriod) -> f64 {
    let (low, spread): (f64, f64) = match period {
        DayPeriod::Night => (100.0, 100.0),
        DayPeriod::Evening => (300.0, 150.0),
        DayPeriod::Day => (200.0, 100.0),
    };
    (low + rng.gen_range(0.0..spread)).round()
}

/// Publishes the current draw split over the device table, and the power
/// history: backfilled on the first tick, then rolled by one sample each time
/// the minute changes.
#[derive(Debug, Clone, Default)]
pub struct EnergyGenerator {
    history: Option<EnergyHistory>,
    last_minute: Option<i64>,
}

impl EnergyGenerator {
    pub fn tick(&mut self, rng: &mut StdRng, now: WallClock) -> Vec<Payload> {
        let watts = base_watts(rng, DayPeriod::of(now));
        let mut payloads = vec![Self::current(watts)];
        let minute = now.and_utc().timestamp().div_euclid(60);
        if self.last_minute == Some(minute) {
            return payloads;
        }
        self.last_minute = Some(minute);
        match &mut self.history {
            Some(history) => history.push(PowerSample {
                time: now.format("%H:%M").to_string(),
                watts,
            }),
            None => self.history = Some(Self::backfill(rng, now)),
        }
        if let Some(history) = &self.history {
            payloads.push(Self::history_payload(history));
        }
        payloads
    }

    fn current(watts: f64) -> Payload {
        let devices = default_devices()
            .into_iter()
            .zip(DEVICE_SHARES)
            .map(|(device, share)| DevicePatch {
                id: Some(device.id),
                name: Some(device.name),
                watts: Some((watts * share).round()),
                connected: Some(device.connected),
            })
            .collect();
        Payload::Energy(EnergyPayload {
            watts: Some(watts),
            devices: Some(devices),
        })
    }

    /// One sample per hour over the last day, oldest first.
    fn backfill(rng: &mut StdRng, now: WallClock) -> EnergyHistory {
        let samples = (0..HISTORY_LEN)
            .rev()
            .map(|hours_ago| {
                let hours_ago = i64::try_from(hours_ago + 1).unwrap_or(i64::MAX);
                let at = now - TimeDelta::hours(hours_ago);
                PowerSample {
                    time: at.format("%H:%M").to_string(),
                    watts: base_watts(rng, DayPeriod::of(at)),
                }
            })
            .collect();
        EnergyHistory::from_samples(samples)
    }

    fn history_payload(history: &EnergyHistory) -> Payload {
        Payload::EnergyHistory(
            history
                .samples()
                .iter()
                .map(|sample| PowerSamplePayload {
                    time: Some(sample.time.clone()),
                    watts: Some(sample.watts),
                })
                .collect(),
        )
    }
}
