//! Scenario configuration
//!
//! The serialized form of a scenario: the time axis, the profiles present at
//! the start, and the time-boxed profiles that come and go. Profile payloads
//! stay untyped ([`ProfileTemplate::data`]) until a [`ProfileFactory`]
//! constructor decodes them for their kind.
//!
//! ```yaml
//! time:
//!   startingDate: 2000-01-01
//!   accrualModel: periodic monthly
//!   granularity: 1M
//!   period: 30
//! initialState:
//!   - type: cash
//!     name: Savings
//!     data: { value: 100 }
//! scheduledStateUpdates:
//!   - startDate: 2030-05-15
//!     endDate: 2040-04-30
//!     value: { type: cash, name: inheritance, data: { value: 5000 } }
//! ```

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::accrual::{AccrualModel, Period};
use crate::error::ConfigError;
use crate::schedule::WindowPolicy;

mod factory;

pub use factory::{ProfileConstructor, ProfileFactory};

/// Complete scenario description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConfig {
    pub time: TimeConfig,
    pub initial_state: Vec<ProfileTemplate>,
    #[serde(default)]
    pub scheduled_state_updates: Vec<ScheduledUpdateConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConfig {
    pub starting_date: Date,
    /// Default accrual model for profiles that do not name one
    pub accrual_model: AccrualModel,
    /// Length of one tick
    pub granularity: Period,
    /// Horizon in years
    pub period: i32,
    #[serde(default)]
    pub schedule_window: WindowPolicy,
}

/// An uninstantiated profile: a registered type name plus its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTemplate {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ProfileTemplate {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledUpdateConfig {
    pub start_date: Date,
    pub end_date: Date,
    pub value: ProfileTemplate,
}

impl ScenarioConfig {
    /// Last date a tick may land on
    pub fn end_date(&self) -> Result<Date, ConfigError> {
        Ok(Period::years(self.time.period).end_from(self.time.starting_date)?)
    }

    /// Checks that do not need a factory: horizon, tick length, windows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time.period <= 0 {
            return Err(ConfigError::InvalidHorizon(self.time.period as i64));
        }
        let g = self.time.granularity;
        if g.is_zero() || g.years < 0 || g.months < 0 || g.days < 0 {
            return Err(ConfigError::InvalidGranularity(g.to_string()));
        }
        for update in &self.scheduled_state_updates {
            if update.end_date < update.start_date {
                return Err(ConfigError::InvalidScheduleWindow {
                    name: update.value.name.clone(),
                    start: update.start_date,
                    end: update.end_date,
                });
            }
        }
        Ok(())
    }
}
