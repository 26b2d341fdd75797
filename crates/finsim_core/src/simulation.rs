//! Scenario driver
//!
//! Builds the initial snapshot, then alternates tick advances with schedule
//! reconciliation until the horizon is reached.

use jiff::civil::Date;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::info;

use crate::config::{ProfileFactory, ScenarioConfig};
use crate::error::{ConfigError, SimulationError};
use crate::history::FinanceHistory;
use crate::schedule::ScheduleActivator;

/// Run one scenario to its horizon.
pub fn simulate(
    config: &ScenarioConfig,
    factory: &ProfileFactory,
) -> Result<FinanceHistory, SimulationError> {
    config.validate()?;
    let time = &config.time;
    let start = time.starting_date;
    let end = config.end_date()?;

    // Scheduled kinds are only instantiated when their window opens
    if let Some(update) = config
        .scheduled_state_updates
        .iter()
        .find(|u| !factory.is_registered(&u.value.kind))
    {
        return Err(ConfigError::UnknownEventType(update.value.kind.clone()).into());
    }

    let initial = factory.create_group(start, &config.initial_state, time.accrual_model)?;
    let mut history = FinanceHistory::new(initial);
    let mut schedule = ScheduleActivator::from_config(config);
    let mut schedule_changes = schedule.apply(&mut history, start, factory)?.len();

    for date in tick_dates(config, end) {
        let date = date?;
        history.advance(date, time.granularity)?;
        schedule_changes += schedule.apply(&mut history, date, factory)?.len();
    }

    info!(
        start = %start,
        end = %history.latest().date,
        snapshots = history.len(),
        schedule_changes,
        "scenario complete"
    );
    Ok(history)
}

/// Run independent scenarios, in parallel when the `parallel` feature is on.
/// Results are in input order.
pub fn simulate_batch(
    configs: &[ScenarioConfig],
    factory: &ProfileFactory,
) -> Vec<Result<FinanceHistory, SimulationError>> {
    #[cfg(feature = "parallel")]
    let results = configs
        .par_iter()
        .map(|config| simulate(config, factory))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results = configs
        .iter()
        .map(|config| simulate(config, factory))
        .collect();

    results
}

/// `start + k * granularity` for k = 1, 2, ... up to and including `end`.
/// Each date is offset from the start so month-end clamping never drifts.
fn tick_dates(
    config: &ScenarioConfig,
    end: Date,
) -> impl Iterator<Item = Result<Date, ConfigError>> + '_ {
    let start = config.time.starting_date;
    let granularity = config.time.granularity;
    (1..)
        .map(move |k| {
            let step = granularity
                .times(k)
                .ok_or_else(|| ConfigError::InvalidGranularity(granularity.to_string()))?;
            Ok(step.end_from(start)?)
        })
        .take_while(move |date| date.as_ref().map_or(true, |d| *d <= end))
}
