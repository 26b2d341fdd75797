//! Command line front end for the finsim engine
//!
//! Loads YAML scenarios, runs them through `finsim_core` and renders each
//! resulting history as a CSV table or as structured JSON.

pub mod logging;
pub mod report;
pub mod runner;
pub mod scenario;

pub use logging::init_logging;
pub use report::{Report, ReportFormat, write_report};
pub use runner::{RunOptions, run};
pub use scenario::{load_scenario, parse_scenario};
