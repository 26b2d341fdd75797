//! Event groups - one complete snapshot of a scenario's profiles

use jiff::civil::Date;
use serde::Serialize;

use super::profiles::EventProfile;
use crate::accrual::Period;
use crate::error::{ConfigError, FundsError, TickError};
use crate::routing::{RoutingContext, add_to_cash};

/// The profiles of a scenario as of one date.
///
/// Members keep their insertion order, which decides the order of transforms
/// within a tick. Names are unique within a group. Cloning a group clones
/// every member, so snapshots never share state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventGroup {
    pub date: Date,
    events: Vec<EventProfile>,
}

impl EventGroup {
    pub fn new(date: Date) -> Self {
        Self {
            date,
            events: Vec::new(),
        }
    }

    pub fn with_events(
        date: Date,
        events: impl IntoIterator<Item = EventProfile>,
    ) -> Result<Self, ConfigError> {
        let mut group = Self::new(date);
        for event in events {
            group.push(event)?;
        }
        Ok(group)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventProfile> {
        self.events.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(EventProfile::name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.events.iter().position(|e| e.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&EventProfile> {
        self.events.iter().find(|e| e.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut EventProfile> {
        self.events.iter_mut().find(|e| e.name() == name)
    }

    /// Append a profile, rejecting a name that is already taken
    pub fn push(&mut self, event: EventProfile) -> Result<(), ConfigError> {
        if self.contains(event.name()) {
            return Err(ConfigError::DuplicateProfileName(event.name().to_string()));
        }
        self.events.push(event);
        Ok(())
    }

    /// Insert under the profile's name. An existing member with that name is
    /// replaced in place and returned; otherwise the profile is appended.
    pub fn insert(&mut self, event: EventProfile) -> Option<EventProfile> {
        match self.position(event.name()) {
            Some(index) => Some(std::mem::replace(&mut self.events[index], event)),
            None => {
                self.events.push(event);
                None
            }
        }
    }

    /// Remove a member by name, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<EventProfile> {
        let index = self.position(name)?;
        Some(self.events.remove(index))
    }

    /// Total of all cash members
    pub fn cash_balance(&self) -> f64 {
        self.events
            .iter()
            .filter_map(EventProfile::as_cash)
            .map(|c| c.value)
            .sum()
    }

    /// Route a signed amount through this group's cash and tax members
    pub fn add_to_cash(&mut self, amount: f64, taxable: bool) -> Result<(), FundsError> {
        add_to_cash(self.events.iter_mut(), amount, taxable)
    }

    /// Transform every member in insertion order. Later members see the cash
    /// and tax changes made by earlier ones.
    pub(crate) fn transform_all(&mut self, date: Date, period: Period) -> Result<(), TickError> {
        for index in 0..self.events.len() {
            let (before, rest) = self.events.split_at_mut(index);
            let Some((member, after)) = rest.split_first_mut() else {
                break;
            };
            let mut ctx = RoutingContext::new(before, after);
            member
                .transform(&mut ctx, date, period)
                .map_err(|source| TickError::Transform {
                    date,
                    profile: member.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
