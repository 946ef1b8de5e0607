//! Energy monitoring — current draw, per-device power table, history.

use serde::{Deserialize, Serialize};

/// Number of samples kept in [`EnergyHistory`].
pub const HISTORY_LEN: usize = 24;

/// Daily consumption used as the savings reference, in kWh.
pub const BASELINE_KWH: f64 = 5.0;

/// Power drawn by one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceReading {
    pub id: u32,
    pub name: String,
    pub watts: f64,
    pub connected: bool,
}

impl DeviceReading {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, connected: bool) -> Self {
        Self {
            id,
            name: name.into(),
            watts: 0.0,
            connected,
        }
    }
}

/// The monitored devices of a fresh install.
#[must_use]
pub fn default_devices() -> Vec<DeviceReading> {
    vec![
        DeviceReading::new(1, "Living Room Light", true),
        DeviceReading::new(2, "Kitchen Appliances", true),
        DeviceReading::new(3, "Thermostat", true),
        DeviceReading::new(4, "Entertainment System", false),
    ]
}

/// Share of the total draw attributed to each default device, by position.
pub const DEVICE_SHARES: [f64; 4] = [0.15, 0.4, 0.2, 0.25];

/// Current whole-home draw and the device table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyState {
    pub watts: f64,
    pub devices: Vec<DeviceReading>,
}

impl Default for EnergyState {
    fn default() -> Self {
        Self {
            watts: 0.0,
            devices: default_devices(),
        }
    }
}

/// One point of the power history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    /// Display label, `HH:MM`.
    pub time: String,
    pub watts: f64,
}

/// Rolling power history, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyHistory {
    samples: Vec<PowerSample>,
}

impl EnergyHistory {
    /// Build a history from samples, keeping only the newest [`HISTORY_LEN`].
    #[must_use]
    pub fn from_samples(mut samples: Vec<PowerSample>) -> Self {
        if samples.len() > HISTORY_LEN {
            samples.drain(..samples.len() - HISTORY_LEN);
        }
        Self { samples }
    }

    /// Append the newest sample, dropping the oldest beyond [`HISTORY_LEN`].
    pub fn push(&mut self, sample: PowerSample) {
        if self.samples.len() == HISTORY_LEN {
            self.samples.remove(0);
        }
        self.samples.push(sample);
    }

    #[must_use]
    pub fn samples(&self) -> &[PowerSample] {
        &self.samples
    }

    /// Approximate consumption in kWh, rounded to one decimal.
    #[must_use]
    pub fn total_kwh(&self) -> f64 {
        let total: f64 = self.samples.iter().map(|s| s.watts).sum::<f64>() / 60.0;
        (total * 10.0).round() / 10.0
    }

    /// Progress (0–100) towards reducing consumption by `goal_percent`
    /// relative to [`BASELINE_KWH`].
    #[must_use]
    pub fn savings_progress(&self, goal_percent: u8) -> u8 {
        savings_progress(self.total_kwh(), goal_percent)
    }
}

/// Progress (0–100) towards a savings goal given a consumption in kWh.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn savings_progress(consumption_kwh: f64, goal_percent: u8) -> u8 {
    let target_reduction = BASELINE_KWH * f64::from(goal_percent) / 100.0;
    let target_usage = BASELINE_KWH - target_reduction;
    if consumption_kwh <= target_usage {
        return 100;
    }
    if consumption_kwh >= BASELINE_KWH {
        return 0;
    }
    let saved = BASELINE_KWH - consumption_kwh;
    (saved / target_reduction * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(watts: f64) -> PowerSample {
        PowerSample {
            time: "00:00".to_string(),
            watts,
        }
    }

    #[test]
    fn should_start_with_four_devices_one_disconnected() {
        let state = EnergyState::default();
        assert_eq!(state.devices.len(), 4);
        assert_eq!(state.devices.iter().filter(|d| !d.connected).count(), 1);
    }

    #[test]
    fn should_keep_only_newest_samples() {
        let samples: Vec<_> = (0..30).map(|i| sample(f64::from(i))).collect();
        let history = EnergyHistory::from_samples(samples);
        assert_eq!(history.samples().len(), HISTORY_LEN);
        assert!((history.samples()[0].watts - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_evict_oldest_sample_when_full() {
        let samples = (0..24).map(|i| sample(f64::from(i))).collect();
        let mut history = EnergyHistory::from_samples(samples);

        history.push(sample(100.0));

        assert_eq!(history.samples().len(), HISTORY_LEN);
        assert!((history.samples()[0].watts - 1.0).abs() < f64::EPSILON);
        assert!((history.samples()[23].watts - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_grow_until_full() {
        let mut history = EnergyHistory::default();
        history.push(sample(1.0));
        history.push(sample(2.0));
        assert_eq!(history.samples().len(), 2);
    }

    #[test]
    fn should_compute_total_kwh_rounded() {
        let history = EnergyHistory::from_samples(vec![sample(100.0), sample(50.0)]);
        assert!((history.total_kwh() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_report_full_progress_below_target() {
        assert_eq!(savings_progress(4.0, 15), 100);
    }

    #[test]
    fn should_report_no_progress_above_baseline() {
        assert_eq!(savings_progress(6.0, 15), 0);
    }

    #[test]
    fn should_report_partial_progress_between_target_and_baseline() {
        // target reduction 1.0 kWh, saved 0.5 kWh
        assert_eq!(savings_progress(4.5, 20), 50);
    }

    #[test]
    fn should_not_divide_by_zero_when_goal_is_zero() {
        assert_eq!(savings_progress(5.0, 0), 100);
        assert_eq!(savings_progress(5.5, 0), 0);
    }
}
