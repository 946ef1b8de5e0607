//! Channels — the logical state slots derived from bus traffic.
//!
//! Every known topic feeds exactly one [`Channel`]. A channel keeps the
//! latest value only; [`ChannelState::apply`] merges a decoded payload into
//! it field by field, so a field that is absent from the payload keeps its
//! previous value.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmState;
use crate::energy::{DeviceReading, EnergyHistory, EnergyState, PowerSample};
use crate::error::ValidationError;
use crate::payload::{EnergyPayload, Payload, WeatherPayload};
use crate::session::Session;
use crate::time::Timestamp;
use crate::weather::{CurrentWeather, ForecastDay, SkyCondition};

/// Accepted thermostat setpoints, °C.
pub const SETPOINT_RANGE: RangeInclusive<i32> = 16..=30;

/// How long a motion detection stays active.
pub const MOTION_ACTIVE_WINDOW: TimeDelta = TimeDelta::seconds(5);

/// Check a thermostat setpoint against [`SETPOINT_RANGE`].
///
/// # Errors
///
/// Returns [`ValidationError::TemperatureOutOfRange`] outside the range.
pub fn validate_setpoint(celsius: i32) -> Result<i32, ValidationError> {
    if SETPOINT_RANGE.contains(&celsius) {
        Ok(celsius)
    } else {
        Err(ValidationError::TemperatureOutOfRange {
            value: celsius,
            min: *SETPOINT_RANGE.start(),
            max: *SETPOINT_RANGE.end(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Light,
    Temperature,
    DoorLock,
    Motion,
    Door,
    Camera,
    Alarm,
    Blinds,
    Weather,
    Forecast,
    Location,
    Energy,
    EnergyHistory,
}

impl Channel {
    pub const ALL: [Self; 13] = [
        Self::Light,
        Self::Temperature,
        Self::DoorLock,
        Self::Motion,
        Self::Door,
        Self::Camera,
        Self::Alarm,
        Self::Blinds,
        Self::Weather,
        Self::Forecast,
        Self::Location,
        Self::Energy,
        Self::EnergyHistory,
    ];

    /// Channel a payload feeds, `None` for unknown topics.
    #[must_use]
    pub fn of(payload: &Payload) -> Option<Self> {
        let channel = match payload {
            Payload::Light(_) => Self::Light,
            Payload::Thermostat(_) => Self::Temperature,
            Payload::DoorLock(_) => Self::DoorLock,
            Payload::Motion(_) | Payload::SecurityMotion(_) => Self::Motion,
            Payload::SecurityDoor(_) => Self::Door,
            Payload::Camera(_) => Self::Camera,
            Payload::Alarm(_) => Self::Alarm,
            Payload::Blinds(_) => Self::Blinds,
            Payload::Weather(_) => Self::Weather,
            Payload::Forecast(_) => Self::Forecast,
            Payload::Location(_) => Self::Location,
            Payload::Energy(_) => Self::Energy,
            Payload::EnergyHistory(_) => Self::EnergyHistory,
            Payload::Unknown { .. } => return None,
        };
        Some(channel)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Temperature => "temperature",
            Self::DoorLock => "door_lock",
            Self::Motion => "motion",
            Self::Door => "door",
            Self::Camera => "camera",
            Self::Alarm => "alarm",
            Self::Blinds => "blinds",
            Self::Weather => "weather",
            Self::Forecast => "forecast",
            Self::Location => "location",
            Self::Energy => "energy",
            Self::EnergyHistory => "energy_history",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest motion report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionState {
    pub detected: bool,
    pub location: Option<String>,
    pub last_detected: Option<Timestamp>,
}

impl MotionState {
    /// `true` within [`MOTION_ACTIVE_WINDOW`] of the last detection.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.last_detected
            .is_some_and(|at| now >= at && now - at < MOTION_ACTIVE_WINDOW)
    }
}

/// Latest entry-door report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorState {
    pub action: Option<String>,
    pub location: Option<String>,
    pub last_changed: Option<Timestamp>,
}

/// Latest value of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "value", rename_all = "snake_case")]
pub enum ChannelState {
    Light(bool),
    /// Thermostat reading, °C.
    Temperature(f64),
    /// `true` when locked.
    DoorLock(bool),
    Motion(MotionState),
    Door(DoorState),
    /// `true` when the camera is on.
    Camera(bool),
    Alarm(AlarmState),
    /// `true` when closed.
    Blinds(bool),
    /// `None` until the first reading.
    Weather(Option<CurrentWeather>),
    Forecast(Vec<ForecastDay>),
    Location(String),
    Energy(EnergyState),
    EnergyHistory(EnergyHistory),
}

impl ChannelState {
    /// Value a channel holds before any message arrived.
    #[must_use]
    pub fn initial(channel: Channel, session: &Session) -> Self {
        match channel {
            Channel::Light => Self::Light(false),
            Channel::Temperature => Self::Temperature(f64::from(session.default_temperature)),
            Channel::DoorLock => Self::DoorLock(true),
            Channel::Motion => Self::Motion(MotionState::default()),
            Channel::Door => Self::Door(DoorState::default()),
            Channel::Camera => Self::Camera(session.security.camera_on),
            Channel::Alarm => Self::Alarm(AlarmState::new(session.security.alarm_armed)),
            Channel::Blinds => Self::Blinds(false),
            Channel::Weather => Self::Weather(None),
            Channel::Forecast => Self::Forecast(Vec::new()),
            Channel::Location => Self::Location(session.weather_location.clone()),
            Channel::Energy => Self::Energy(EnergyState::default()),
            Channel::EnergyHistory => Self::EnergyHistory(EnergyHistory::default()),
        }
    }

    #[must_use]
    pub fn channel(&self) -> Channel {
        match self {
            Self::Light(_) => Channel::Light,
            Self::Temperature(_) => Channel::Temperature,
            Self::DoorLock(_) => Channel::DoorLock,
            Self::Motion(_) => Channel::Motion,
            Self::Door(_) => Channel::Door,
            Self::Camera(_) => Channel::Camera,
            Self::Alarm(_) => Channel::Alarm,
            Self::Blinds(_) => Channel::Blinds,
            Self::Weather(_) => Channel::Weather,
            Self::Forecast(_) => Channel::Forecast,
            Self::Location(_) => Channel::Location,
            Self::Energy(_) => Channel::Energy,
            Self::EnergyHistory(_) => Channel::EnergyHistory,
        }
    }

    /// Merge `payload` into this state.
    ///
    /// Returns `false` when the payload belongs to another channel, or when
    /// it is a first weather reading without a temperature. Nothing changes
    /// in either case.
    pub fn apply(&mut self, payload: &Payload, received_at: Timestamp) -> bool {
        match (self, payload) {
            (Self::Light(on), Payload::Light(p)) => merge(on, p.light),
            (Self::Temperature(celsius), Payload::Thermostat(p)) => merge(celsius, p.temperature),
            (Self::DoorLock(locked), Payload::DoorLock(p)) => merge(locked, p.locked),
            (Self::Motion(state), Payload::Motion(p)) => {
                state.record(p.motion, None, received_at);
            }
            (Self::Motion(state), Payload::SecurityMotion(p)) => {
                state.record(p.detected, p.location.clone(), received_at);
            }
            (Self::Door(state), Payload::SecurityDoor(p)) => {
                merge(&mut state.action, p.action.clone().map(Some));
                merge(&mut state.location, p.location.clone().map(Some));
                state.last_changed = Some(received_at);
            }
            (Self::Camera(on), Payload::Camera(p)) => merge(on, p.enabled),
            (Self::Alarm(state), Payload::Alarm(p)) => state.merge(p),
            (Self::Blinds(closed), Payload::Blinds(p)) => merge(closed, p.closed),
            (Self::Weather(current), Payload::Weather(p)) => {
                // a first reading needs a temperature; rules compare against it
                if current.is_none() && p.temp.is_none() {
                    return false;
                }
                merge_weather(current.get_or_insert_with(CurrentWeather::default), p);
            }
            (Self::Forecast(days), Payload::Forecast(p)) => {
                *days = p
                    .iter()
                    .map(|day| {
                        let condition = day.condition.unwrap_or_default();
                        ForecastDay {
                            date: day.date.clone().unwrap_or_default(),
                            temp: day.temp.unwrap_or_default(),
                            condition,
                            icon: day
                                .icon
                                .clone()
                                .unwrap_or_else(|| condition.icon().to_string()),
                        }
                    })
                    .collect();
            }
            (Self::Location(location), Payload::Location(p)) => {
                merge(location, p.location.clone());
            }
            (Self::Energy(state), Payload::Energy(p)) => merge_energy(state, p),
            (Self::EnergyHistory(history), Payload::EnergyHistory(p)) => {
                *history = EnergyHistory::from_samples(
                    p.iter()
                        .map(|sample| PowerSample {
                            time: sample.time.clone().unwrap_or_default(),
                            watts: sample.watts.unwrap_or_default(),
                        })
                        .collect(),
                );
            }
            _ => return false,
        }
        true
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl MotionState {
    fn record(&mut self, detected: Option<bool>, location: Option<String>, at: Timestamp) {
        merge(&mut self.detected, detected);
        if location.is_some() {
            self.location = location;
        }
        if detected == Some(true) {
            self.last_detected = Some(at);
        }
    }
}

fn merge_weather(current: &mut CurrentWeather, p: &WeatherPayload) {
    merge(&mut current.temp, p.temp);
    merge(&mut current.humidity, p.humidity);
    merge(&mut current.wind_speed, p.wind_speed);
    if let Some(condition) = p.condition {
        current.condition = condition;
        if p.icon.is_none() {
            current.icon = condition.icon().to_string();
        }
    }
    merge(&mut current.icon, p.icon.clone());
}

fn merge_energy(state: &mut EnergyState, p: &EnergyPayload) {
    merge(&mut state.watts, p.watts);
    for patch in p.devices.iter().flatten() {
        let Some(id) = patch.id else {
            continue;
        };
        let device = match state.devices.iter_mut().position(|d| d.id == id) {
            Some(index) => &mut state.devices[index],
            None => {
                state
                    .devices
                    .push(DeviceReading::new(id, format!("Device {id}"), true));
                let last = state.devices.len() - 1;
                &mut state.devices[last]
            }
        };
        merge(&mut device.name, patch.name.clone());
        merge(&mut device.watts, patch.watts);
        merge(&mut device.connected, patch.connected);
    }
}

/// Copy of every channel at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSnapshot {
    pub light_on: bool,
    pub temperature: f64,
    pub door_locked: bool,
    pub motion: MotionState,
    pub door: DoorState,
    pub camera_on: bool,
    pub alarm: AlarmState,
    pub blinds_closed: bool,
    pub weather: Option<CurrentWeather>,
    pub forecast: Vec<ForecastDay>,
    pub location: String,
    pub energy: EnergyState,
    pub energy_history: EnergyHistory,
}

impl HomeSnapshot {
    /// Snapshot of a home where nothing was reported yet.
    #[must_use]
    pub fn initial(session: &Session) -> Self {
        let mut snapshot = Self {
            light_on: false,
            temperature: 0.0,
            door_locked: true,
            motion: MotionState::default(),
            door: DoorState::default(),
            camera_on: false,
            alarm: AlarmState::default(),
            blinds_closed: false,
            weather: None,
            forecast: Vec::new(),
            location: String::new(),
            energy: EnergyState::default(),
            energy_history: EnergyHistory::default(),
        };
        for channel in Channel::ALL {
            snapshot.set(ChannelState::initial(channel, session));
        }
        snapshot
    }

    /// Overwrite the slot matching `state`.
    pub fn set(&mut self, state: ChannelState) {
        match state {
            ChannelState::Light(v) => self.light_on = v,
            ChannelState::Temperature(v) => self.temperature = v,
            ChannelState::DoorLock(v) => self.door_locked = v,
            ChannelState::Motion(v) => self.motion = v,
            ChannelState::Door(v) => self.door = v,
            ChannelState::Camera(v) => self.camera_on = v,
            ChannelState::Alarm(v) => self.alarm = v,
            ChannelState::Blinds(v) => self.blinds_closed = v,
            ChannelState::Weather(v) => self.weather = v,
            ChannelState::Forecast(v) => self.forecast = v,
            ChannelState::Location(v) => self.location = v,
            ChannelState::Energy(v) => self.energy = v,
            ChannelState::EnergyHistory(v) => self.energy_history = v,
        }
    }

    /// Condition of the latest weather reading, if any.
    #[must_use]
    pub fn sky(&self) -> Option<SkyCondition> {
        self.weather.as_ref().map(|w| w.condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{
        AlarmPayload, DevicePatch, LightPayload, SecurityMotionPayload, ThermostatPayload,
    };
    use crate::topic::topics;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn initial(channel: Channel) -> ChannelState {
        ChannelState::initial(channel, &Session::default())
    }

    #[test]
    fn should_map_every_typed_topic_to_a_channel() {
        let payload = Payload::decode(topics::SECURITY_MOTION, b"{}").unwrap();
        assert_eq!(Channel::of(&payload), Some(Channel::Motion));
        let payload = Payload::decode("garden/sprinkler", b"{}").unwrap();
        assert_eq!(Channel::of(&payload), None);
    }

    #[test]
    fn should_seed_initial_values_from_session() {
        let mut session = Session::default();
        session.security.alarm_armed = true;
        session.default_temperature = 19;
        assert_eq!(
            ChannelState::initial(Channel::Alarm, &session),
            ChannelState::Alarm(AlarmState::new(true))
        );
        assert_eq!(
            ChannelState::initial(Channel::Temperature, &session),
            ChannelState::Temperature(19.0)
        );
    }

    #[test]
    fn should_replace_temperature_with_latest_value() {
        let mut state = initial(Channel::Temperature);
        let applied = state.apply(
            &Payload::Thermostat(ThermostatPayload {
                temperature: Some(26.0),
            }),
            at(0),
        );
        assert!(applied);
        assert_eq!(state, ChannelState::Temperature(26.0));
    }

    #[test]
    fn should_keep_previous_value_when_field_missing() {
        let mut state = ChannelState::Light(true);
        state.apply(&Payload::Light(LightPayload { light: None }), at(0));
        assert_eq!(state, ChannelState::Light(true));
    }

    #[test]
    fn should_refuse_payload_of_other_channel() {
        let mut state = ChannelState::Light(false);
        let applied = state.apply(&Payload::Alarm(AlarmPayload::default()), at(0));
        assert!(!applied);
        assert_eq!(state, ChannelState::Light(false));
    }

    #[test]
    fn should_create_weather_on_first_reading() {
        let mut state = initial(Channel::Weather);
        let payload = Payload::decode(
            topics::WEATHER_CURRENT,
            br#"{"temp": 32, "condition": "hot"}"#,
        )
        .unwrap();
        state.apply(&payload, at(0));
        let ChannelState::Weather(Some(weather)) = state else {
            panic!("expected a weather reading");
        };
        assert!((weather.temp - 32.0).abs() < f64::EPSILON);
        assert_eq!(weather.condition, SkyCondition::Hot);
        assert_eq!(weather.icon, SkyCondition::Hot.icon());
    }

    #[test]
    fn should_not_create_weather_without_temperature() {
        let mut state = initial(Channel::Weather);
        let partial =
            Payload::decode(topics::WEATHER_CURRENT, br#"{"humidity": 50}"#).unwrap();

        assert!(!state.apply(&partial, at(0)));
        assert_eq!(state, ChannelState::Weather(None));

        let full = Payload::decode(topics::WEATHER_CURRENT, br#"{"temp": 12}"#).unwrap();
        assert!(state.apply(&full, at(1)));
        assert!(state.apply(&partial, at(2)));
        let ChannelState::Weather(Some(weather)) = state else {
            panic!("expected a weather reading");
        };
        assert!((weather.temp - 12.0).abs() < f64::EPSILON);
        assert!((weather.humidity - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_merge_devices_by_id_and_append_unknown_ones() {
        let mut state = initial(Channel::Energy);
        let payload = Payload::Energy(EnergyPayload {
            watts: Some(250.0),
            devices: Some(vec![
                DevicePatch {
                    id: Some(2),
                    watts: Some(100.0),
                    ..DevicePatch::default()
                },
                DevicePatch {
                    id: Some(9),
                    name: Some("Heat Pump".to_string()),
                    watts: Some(40.0),
                    connected: None,
                },
                DevicePatch::default(),
            ]),
        });
        state.apply(&payload, at(0));
        let ChannelState::Energy(energy) = state else {
            panic!("expected energy state");
        };
        assert_eq!(energy.devices.len(), 5);
        assert_eq!(energy.devices[1].name, "Kitchen Appliances");
        assert!((energy.devices[1].watts - 100.0).abs() < f64::EPSILON);
        assert_eq!(energy.devices[4].name, "Heat Pump");
    }

    #[test]
    fn should_keep_motion_active_for_five_seconds() {
        let mut state = initial(Channel::Motion);
        state.apply(
            &Payload::SecurityMotion(SecurityMotionPayload {
                detected: Some(true),
                location: Some("Garage".to_string()),
            }),
            at(0),
        );
        let ChannelState::Motion(motion) = state else {
            panic!("expected motion state");
        };
        assert_eq!(motion.location.as_deref(), Some("Garage"));
        assert!(motion.is_active(at(4)));
        assert!(!motion.is_active(at(5)));
    }

    #[test]
    fn should_validate_setpoint_range() {
        assert_eq!(validate_setpoint(16), Ok(16));
        assert_eq!(validate_setpoint(30), Ok(30));
        assert!(validate_setpoint(31).is_err());
        assert!(validate_setpoint(15).is_err());
    }

    #[test]
    fn should_build_snapshot_from_initial_channels() {
        let snapshot = HomeSnapshot::initial(&Session::default());
        assert_eq!(snapshot.location, "New York");
        assert!((snapshot.temperature - 22.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.sky(), None);
    }
}
