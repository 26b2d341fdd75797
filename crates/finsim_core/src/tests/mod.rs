//! Scenario tests for the finsim engine
//!
//! Tests are organized by topic:
//! - `basic` - Tick mechanics, cash flow and failure propagation
//! - `taxes` - Bracketed tax assessment over whole scenarios
//! - `loans` - Amortization over the full term
//! - `schedule` - Time-boxed profiles joining and leaving the history
