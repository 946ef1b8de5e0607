//! Typed payloads — one variant per known topic.
//!
//! Payloads travel as JSON objects. Decoding is lenient per field: a field
//! that is missing or has the wrong type decodes as `None` instead of
//! rejecting the whole message. Only a body that is not JSON at all, or not
//! the expected JSON shape, is a [`DecodeError`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DecodeError;
use crate::topic::topics;
use crate::weather::SkyCondition;

/// Door action that arms the intrusion check.
pub const DOOR_OPENED: &str = "opened";

/// Deserialize a field, turning a type mismatch into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Serialize integral floats as JSON integers (`24` rather than `24.0`).
#[allow(
    clippy::ref_option,
    clippy::float_cmp,
    clippy::cast_possible_truncation
)]
fn whole_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match *value {
        Some(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => serializer.serialize_i64(v as i64),
        Some(v) => serializer.serialize_f64(v),
        None => serializer.serialize_none(),
    }
}

macro_rules! define_payload {
    ($(#[doc = $doc:expr])* $name:ident { $($(#[$field_meta:meta])* $field:ident: $ty:ty),* $(,)? }) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }
    };
}

define_payload!(
    /// `home/light`
    LightPayload { light: bool }
);

define_payload!(
    /// `home/temperature` — thermostat reading or setpoint, °C.
    ThermostatPayload {
        #[serde(serialize_with = "whole_number")]
        temperature: f64,
    }
);

define_payload!(
    /// `home/door`
    DoorLockPayload { locked: bool }
);

define_payload!(
    /// `home/motion` — raw presence sensor.
    MotionPayload { motion: bool }
);

define_payload!(
    /// `home/security/motion`
    SecurityMotionPayload {
        detected: bool,
        location: String,
    }
);

define_payload!(
    /// `home/security/door`
    SecurityDoorPayload {
        action: String,
        location: String,
    }
);

define_payload!(
    /// `home/security/camera`
    CameraPayload { enabled: bool }
);

define_payload!(
    /// `home/security/alarm`
    AlarmPayload {
        armed: bool,
        triggered: bool,
        reset: bool,
    }
);

define_payload!(
    /// `home/blinds`
    BlindsPayload { closed: bool }
);

define_payload!(
    /// `home/weather/current`
    WeatherPayload {
        #[serde(serialize_with = "whole_number")]
        temp: f64,
        condition: SkyCondition,
        icon: String,
        #[serde(serialize_with = "whole_number")]
        humidity: f64,
        #[serde(rename = "windSpeed", serialize_with = "whole_number")]
        wind_speed: f64,
    }
);

define_payload!(
    /// One element of `home/weather/forecast`.
    ForecastDayPayload {
        date: String,
        #[serde(serialize_with = "whole_number")]
        temp: f64,
        condition: SkyCondition,
        icon: String,
    }
);

define_payload!(
    /// `home/weather/location`
    LocationPayload { location: String }
);

define_payload!(
    /// One element of the `devices` table in `home/energy/current`.
    DevicePatch {
        id: u32,
        name: String,
        #[serde(alias = "power", serialize_with = "whole_number")]
        watts: f64,
        connected: bool,
    }
);

define_payload!(
    /// `home/energy/current`
    EnergyPayload {
        #[serde(serialize_with = "whole_number")]
        watts: f64,
        devices: Vec<DevicePatch>,
    }
);

define_payload!(
    /// One element of `home/energy/history`.
    PowerSamplePayload {
        time: String,
        #[serde(alias = "power", serialize_with = "whole_number")]
        watts: f64,
    }
);

impl ThermostatPayload {
    #[must_use]
    pub fn setpoint(celsius: i32) -> Self {
        Self {
            temperature: Some(f64::from(celsius)),
        }
    }
}

impl SecurityDoorPayload {
    #[must_use]
    pub fn is_opened(&self) -> bool {
        self.action.as_deref() == Some(DOOR_OPENED)
    }
}

/// A decoded message body, keyed by the topic it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Light(LightPayload),
    Thermostat(ThermostatPayload),
    DoorLock(DoorLockPayload),
    Motion(MotionPayload),
    SecurityMotion(SecurityMotionPayload),
    SecurityDoor(SecurityDoorPayload),
    Camera(CameraPayload),
    Alarm(AlarmPayload),
    Blinds(BlindsPayload),
    Weather(WeatherPayload),
    Forecast(Vec<ForecastDayPayload>),
    Location(LocationPayload),
    Energy(EnergyPayload),
    EnergyHistory(Vec<PowerSamplePayload>),
    /// A topic with no typed schema; the body is kept verbatim.
    Unknown { topic: String, body: Vec<u8> },
}

impl Payload {
    /// Decode `body` according to the schema registered for `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the body is not JSON, or not the JSON
    /// shape (object / array) the topic expects. Unknown topics never fail.
    pub fn decode(topic: &str, body: &[u8]) -> Result<Self, DecodeError> {
        let payload = match topic {
            topics::LIGHT => Self::Light(object(topic, body)?),
            topics::TEMPERATURE => Self::Thermostat(object(topic, body)?),
            topics::DOOR_LOCK => Self::DoorLock(object(topic, body)?),
            topics::MOTION => Self::Motion(object(topic, body)?),
            topics::SECURITY_MOTION => Self::SecurityMotion(object(topic, body)?),
            topics::SECURITY_DOOR => Self::SecurityDoor(object(topic, body)?),
            topics::CAMERA => Self::Camera(object(topic, body)?),
            topics::ALARM => Self::Alarm(object(topic, body)?),
            topics::BLINDS => Self::Blinds(object(topic, body)?),
            topics::WEATHER_CURRENT => Self::Weather(object(topic, body)?),
            topics::WEATHER_FORECAST => Self::Forecast(array(topic, body)?),
            topics::WEATHER_LOCATION => Self::Location(object(topic, body)?),
            topics::ENERGY_CURRENT => Self::Energy(object(topic, body)?),
            topics::ENERGY_HISTORY => Self::EnergyHistory(array(topic, body)?),
            _ => Self::Unknown {
                topic: topic.to_string(),
                body: body.to_vec(),
            },
        };
        Ok(payload)
    }

    /// The fixed topic this payload is published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        match self {
            Self::Light(_) => topics::LIGHT,
            Self::Thermostat(_) => topics::TEMPERATURE,
            Self::DoorLock(_) => topics::DOOR_LOCK,
            Self::Motion(_) => topics::MOTION,
            Self::SecurityMotion(_) => topics::SECURITY_MOTION,
            Self::SecurityDoor(_) => topics::SECURITY_DOOR,
            Self::Camera(_) => topics::CAMERA,
            Self::Alarm(_) => topics::ALARM,
            Self::Blinds(_) => topics::BLINDS,
            Self::Weather(_) => topics::WEATHER_CURRENT,
            Self::Forecast(_) => topics::WEATHER_FORECAST,
            Self::Location(_) => topics::WEATHER_LOCATION,
            Self::Energy(_) => topics::ENERGY_CURRENT,
            Self::EnergyHistory(_) => topics::ENERGY_HISTORY,
            Self::Unknown { topic, .. } => topic,
        }
    }

    /// Encode the payload as a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; the typed payloads never produce one.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Light(p) => serde_json::to_vec(p),
            Self::Thermostat(p) => serde_json::to_vec(p),
            Self::DoorLock(p) => serde_json::to_vec(p),
            Self::Motion(p) => serde_json::to_vec(p),
            Self::SecurityMotion(p) => serde_json::to_vec(p),
            Self::SecurityDoor(p) => serde_json::to_vec(p),
            Self::Camera(p) => serde_json::to_vec(p),
            Self::Alarm(p) => serde_json::to_vec(p),
            Self::Blinds(p) => serde_json::to_vec(p),
            Self::Weather(p) => serde_json::to_vec(p),
            Self::Forecast(p) => serde_json::to_vec(p),
            Self::Location(p) => serde_json::to_vec(p),
            Self::Energy(p) => serde_json::to_vec(p),
            Self::EnergyHistory(p) => serde_json::to_vec(p),
            Self::Unknown { body, .. } => Ok(body.clone()),
        }
    }
}

fn object<T: DeserializeOwned>(topic: &str, body: &[u8]) -> Result<T, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(DecodeError::Shape {
            topic: topic.to_string(),
            expected: "object",
        });
    }
    Ok(serde_json::from_value(value)?)
}

fn array<T: DeserializeOwned>(topic: &str, body: &[u8]) -> Result<Vec<T>, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let serde_json::Value::Array(items) = value else {
        return Err(DecodeError::Shape {
            topic: topic.to_string(),
            expected: "array",
        });
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
