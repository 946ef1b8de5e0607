//! Action — the device command a rule publishes when it fires.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::payload::{BlindsPayload, LightPayload, Payload, ThermostatPayload};

/// Setpoint published by [`RuleAction::IncreaseTemp`], °C.
pub const WARM_SETPOINT: i32 = 24;

/// Setpoint published by [`RuleAction::DecreaseTemp`], °C.
pub const COOL_SETPOINT: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleAction {
    LightsOn,
    LightsOff,
    CloseBlinds,
    OpenBlinds,
    IncreaseTemp,
    DecreaseTemp,
}

impl RuleAction {
    /// The single command published when the rule fires.
    #[must_use]
    pub fn command(self) -> Payload {
        match self {
            Self::LightsOn => Payload::Light(LightPayload { light: Some(true) }),
            Self::LightsOff => Payload::Light(LightPayload { light: Some(false) }),
            Self::CloseBlinds => Payload::Blinds(BlindsPayload { closed: Some(true) }),
            Self::OpenBlinds => Payload::Blinds(BlindsPayload {
                closed: Some(false),
            }),
            Self::IncreaseTemp => Payload::Thermostat(ThermostatPayload::setpoint(WARM_SETPOINT)),
            Self::DecreaseTemp => Payload::Thermostat(ThermostatPayload::setpoint(COOL_SETPOINT)),
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LightsOn => "lightsOn",
            Self::LightsOff => "lightsOff",
            Self::CloseBlinds => "closeBlinds",
            Self::OpenBlinds => "openBlinds",
            Self::IncreaseTemp => "increaseTemp",
            Self::DecreaseTemp => "decreaseTemp",
        };
        f.write_str(name)
    }
}
