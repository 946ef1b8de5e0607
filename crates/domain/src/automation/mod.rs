//! Automation — weather condition → device command rules.
//!
//! Each rule pairs a [`RuleCondition`] on the current weather with a single
//! [`RuleAction`], gated by a [`Schedule`]. Rules fire on every evaluation
//! where condition and schedule hold; there is no cooldown.

mod action;
mod condition;
mod schedule;

pub use action::{COOL_SETPOINT, RuleAction, WARM_SETPOINT};
pub use condition::{COLD_BELOW, HOT_ABOVE, RuleCondition, WINDY_ABOVE};
pub use schedule::{SCHEDULE_TOLERANCE_MINUTES, Schedule};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::{EntryId, RuleId};
use crate::time::Timestamp;
use crate::weather::CurrentWeather;

/// Maximum number of entries kept in the automation log.
pub const AUTOMATION_LOG_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRule {
    pub id: RuleId,
    pub name: String,
    pub condition: RuleCondition,
    pub action: RuleAction,
    pub enabled: bool,
    #[serde(rename = "time", default)]
    pub schedule: Schedule,
    /// Informational, never used for throttling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired: Option<Timestamp>,
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when:
    /// - `name` is blank ([`ValidationError::EmptyName`])
    /// - the schedule is out of range ([`ValidationError::InvalidSchedule`])
    pub fn validate(&self) -> Result<(), HubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.schedule.validate()?;
        Ok(())
    }

    /// Whether the rule fires for `weather` at `time`.
    #[must_use]
    pub fn should_fire(&self, weather: &CurrentWeather, time: NaiveTime) -> bool {
        self.enabled && self.condition.matches(weather) && self.schedule.is_due(time)
    }
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    condition: Option<RuleCondition>,
    action: Option<RuleAction>,
    enabled: Option<bool>,
    schedule: Option<Schedule>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: RuleCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn action(mut self, action: RuleAction) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// Condition defaults to `sunny`, action to `lightsOn`, schedule to
    /// immediate; rules start enabled.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the rule is invalid.
    pub fn build(self) -> Result<AutomationRule, HubError> {
        let rule = AutomationRule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            condition: self.condition.unwrap_or(RuleCondition::Sunny),
            action: self.action.unwrap_or(RuleAction::LightsOn),
            enabled: self.enabled.unwrap_or(true),
            schedule: self.schedule.unwrap_or_default(),
            last_fired: None,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// The rules a fresh install starts with.
#[must_use]
pub fn stock_rules() -> Vec<AutomationRule> {
    vec![
        AutomationRule {
            id: RuleId::new(),
            name: "Close blinds on sunny days".to_string(),
            condition: RuleCondition::Sunny,
            action: RuleAction::CloseBlinds,
            enabled: true,
            schedule: Schedule::At { hour: 9, minute: 0 },
            last_fired: None,
        },
        AutomationRule {
            id: RuleId::new(),
            name: "Turn on lights when cloudy".to_string(),
            condition: RuleCondition::Cloudy,
            action: RuleAction::LightsOn,
            enabled: true,
            schedule: Schedule::Immediate,
            last_fired: None,
        },
        AutomationRule {
            id: RuleId::new(),
            name: "Increase temperature when cold".to_string(),
            condition: RuleCondition::Cold,
            action: RuleAction::IncreaseTemp,
            enabled: false,
            schedule: Schedule::Immediate,
            last_fired: None,
        },
    ]
}

/// One firing of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationLogEntry {
    pub id: EntryId,
    pub rule_id: RuleId,
    pub timestamp: Timestamp,
    pub message: String,
}

impl AutomationLogEntry {
    #[must_use]
    pub fn fired(rule: &AutomationRule, timestamp: Timestamp) -> Self {
        Self {
            id: EntryId::new(),
            rule_id: rule.id,
            timestamp,
            message: format!("Triggered: {}", rule.name),
        }
    }
}
