//! Personal finance scenario engine
//!
//! This crate advances a set of named financial profiles through time, one
//! accrual period per tick, and records every committed state. It provides:
//! - Accrual models that turn a calendar period into a fraction of a year
//! - Cash, growth assets, amortizing loans, salary, expenses and bracketed tax
//! - Fund routing between cash pools with taxable income tracking
//! - An append-only snapshot history with all-or-nothing ticks
//! - Time-boxed profiles that are activated and removed on schedule
//!
//! # Example
//!
//! ```ignore
//! use finsim_core::{ProfileFactory, ScenarioConfig, simulate};
//!
//! let config: ScenarioConfig = serde_json::from_str(scenario_json)?;
//! let history = simulate(&config, &ProfileFactory::standard())?;
//! for snapshot in history.snapshots() {
//!     println!("{} cash={:.2}", snapshot.date, snapshot.cash_balance());
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod accrual;
pub mod date_math;
pub mod error;
pub mod history;
pub mod routing;
pub mod schedule;
pub mod simulation;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use accrual::{AccrualModel, Period, portion_of_year};
pub use config::{ProfileFactory, ProfileTemplate, ScenarioConfig};
pub use error::{ConfigError, SimulationError};
pub use history::FinanceHistory;
pub use model::{EventGroup, EventProfile};
pub use simulation::{simulate, simulate_batch};
