//! Scheduled updates - time-boxed profiles that join and leave the scenario
//!
//! The activator is reconciled against the latest committed snapshot once per
//! tick. It keeps the `active` flag of each update itself; the history only
//! ever sees the resulting inserts and removals.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accrual::AccrualModel;
use crate::config::{ProfileFactory, ProfileTemplate, ScenarioConfig};
use crate::error::ConfigError;
use crate::history::FinanceHistory;

/// Whether a window includes its end date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPolicy {
    /// `[start, end)`
    #[default]
    HalfOpen,
    /// `[start, end]`
    Closed,
}

impl WindowPolicy {
    pub fn contains(self, start: Date, end: Date, date: Date) -> bool {
        match self {
            WindowPolicy::HalfOpen => start <= date && date < end,
            WindowPolicy::Closed => start <= date && date <= end,
        }
    }

    pub fn has_ended(self, end: Date, date: Date) -> bool {
        match self {
            WindowPolicy::HalfOpen => date >= end,
            WindowPolicy::Closed => date > end,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledUpdate {
    pub start_date: Date,
    pub end_date: Date,
    pub template: ProfileTemplate,
    pub active: bool,
}

impl ScheduledUpdate {
    pub fn new(start_date: Date, end_date: Date, template: ProfileTemplate) -> Self {
        Self {
            start_date,
            end_date,
            template,
            active: false,
        }
    }
}

/// A transition made by [`ScheduleActivator::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleChange {
    /// `replaced` is set when a member of the same name was overwritten
    Activated {
        name: String,
        date: Date,
        replaced: bool,
    },
    Deactivated { name: String, date: Date },
}

#[derive(Debug, Clone)]
pub struct ScheduleActivator {
    updates: Vec<ScheduledUpdate>,
    policy: WindowPolicy,
    /// Default model handed to the factory
    accrual_model: AccrualModel,
}

impl ScheduleActivator {
    pub fn new(
        updates: Vec<ScheduledUpdate>,
        policy: WindowPolicy,
        accrual_model: AccrualModel,
    ) -> Self {
        Self {
            updates,
            policy,
            accrual_model,
        }
    }

    pub fn from_config(config: &ScenarioConfig) -> Self {
        let updates = config
            .scheduled_state_updates
            .iter()
            .map(|u| ScheduledUpdate::new(u.start_date, u.end_date, u.value.clone()))
            .collect();
        Self::new(
            updates,
            config.time.schedule_window,
            config.time.accrual_model,
        )
    }

    pub fn updates(&self) -> &[ScheduledUpdate] {
        &self.updates
    }

    /// Insert or remove scheduled members of the latest snapshot so that it
    /// matches the windows as of `date`. An activated profile takes the place
    /// of any member with the same name.
    pub fn apply(
        &mut self,
        history: &mut FinanceHistory,
        date: Date,
        factory: &ProfileFactory,
    ) -> Result<Vec<ScheduleChange>, ConfigError> {
        let mut changes = Vec::new();
        for update in &mut self.updates {
            let name = &update.template.name;
            if !update.active && self.policy.contains(update.start_date, update.end_date, date) {
                let profile = factory.create(&update.template, self.accrual_model)?;
                let replaced = history.latest_mut().insert(profile).is_some();
                update.active = true;
                info!(
                    %date,
                    name = %name,
                    kind = %update.template.kind,
                    replaced,
                    "scheduled profile activated"
                );
                changes.push(ScheduleChange::Activated {
                    name: name.clone(),
                    date,
                    replaced,
                });
            } else if update.active && self.policy.has_ended(update.end_date, date) {
                history.latest_mut().remove(name);
                update.active = false;
                info!(%date, name = %name, "scheduled profile deactivated");
                changes.push(ScheduleChange::Deactivated {
                    name: name.clone(),
                    date,
                });
            }
        }
        Ok(changes)
    }
}
