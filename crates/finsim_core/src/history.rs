//! Append-only snapshot history
//!
//! A tick clones the latest snapshot, transforms every member of the clone and
//! appends it. The clone is a local value for the duration of the tick; if any
//! transform fails it is dropped and the history keeps its last committed
//! state.

use jiff::civil::Date;
use serde::Serialize;
use tracing::debug;

use crate::accrual::Period;
use crate::error::TickError;
use crate::model::EventGroup;

#[derive(Debug, Clone, Serialize)]
pub struct FinanceHistory {
    /// Never empty; dates are non-decreasing
    snapshots: Vec<EventGroup>,
}

impl FinanceHistory {
    pub fn new(initial: EventGroup) -> Self {
        Self {
            snapshots: vec![initial],
        }
    }

    pub fn snapshots(&self) -> &[EventGroup] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a history starts with its initial snapshot
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> &EventGroup {
        &self.snapshots[0]
    }

    pub fn latest(&self) -> &EventGroup {
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// The latest committed snapshot, for schedule reconciliation
    pub fn latest_mut(&mut self) -> &mut EventGroup {
        let last = self.snapshots.len() - 1;
        &mut self.snapshots[last]
    }

    /// Advance one tick across `period`, ending at `date`.
    pub fn advance(&mut self, date: Date, period: Period) -> Result<&EventGroup, TickError> {
        let pending = self.begin(date)?;
        let pending = apply(pending, date, period)?;
        Ok(self.commit(pending))
    }

    fn begin(&self, date: Date) -> Result<EventGroup, TickError> {
        let latest = self.latest();
        if date < latest.date {
            return Err(TickError::OutOfOrder {
                latest: latest.date,
                date,
            });
        }
        let mut pending = latest.clone();
        pending.date = date;
        Ok(pending)
    }

    fn commit(&mut self, pending: EventGroup) -> &EventGroup {
        debug!(date = %pending.date, members = pending.len(), "tick committed");
        self.snapshots.push(pending);
        self.latest()
    }
}

fn apply(mut pending: EventGroup, date: Date, period: Period) -> Result<EventGroup, TickError> {
    pending.transform_all(date, period)?;
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::AccrualModel;
    use crate::error::{FundsError, TransformError};
    use crate::model::{Cash, ConstantExpense, ConstantSalariedIncome, EventProfile};
    use jiff::civil::date;

    fn history(cash: f64, yearly_expense: f64) -> FinanceHistory {
        let group = EventGroup::with_events(
            date(2000, 1, 1),
            [
                EventProfile::Cash(Cash::new("Savings", cash)),
                EventProfile::ConstantExpense(ConstantExpense::new(
                    "Rent",
                    yearly_expense,
                    AccrualModel::PeriodicMonthly,
                )),
            ],
        )
        .unwrap();
        FinanceHistory::new(group)
    }

    fn savings(group: &EventGroup) -> f64 {
        group.get("Savings").unwrap().as_cash().unwrap().value
    }

    #[test]
    fn test_expense_monthly() {
        let mut history = history(10_000.0, 120.0);
        history.advance(date(2000, 2, 1), Period::months(1)).unwrap();
        history.advance(date(2000, 3, 1), Period::months(1)).unwrap();
        let cash: Vec<f64> = history.snapshots().iter().map(savings).collect();
        assert!((cash[0] - 10_000.0).abs() < 1e-9);
        assert!((cash[1] - 9_990.0).abs() < 1e-9);
        assert!((cash[2] - 9_980.0).abs() < 1e-9);
        assert_eq!(history.latest().date, date(2000, 3, 1));
    }

    #[test]
    fn test_zero_expense_leaves_cash() {
        let mut history = history(10_000.0, 0.0);
        history.advance(date(2000, 2, 1), Period::months(1)).unwrap();
        assert_eq!(savings(history.latest()), 10_000.0);
    }

    #[test]
    fn test_failed_tick_commits_nothing() {
        let mut history = history(15.0, 120.0);
        history.advance(date(2000, 2, 1), Period::months(1)).unwrap();
        let err = history
            .advance(date(2000, 3, 1), Period::months(1))
            .unwrap_err();
        assert!(matches!(
            err,
            TickError::Transform {
                source: TransformError::Funds(FundsError::InsufficientFunds { .. }),
                ..
            }
        ));
        assert_eq!(history.len(), 2);
        assert!((savings(history.latest()) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_order_tick_rejected() {
        let mut history = history(100.0, 0.0);
        history.advance(date(2000, 2, 1), Period::months(1)).unwrap();
        let err = history
            .advance(date(2000, 1, 1), Period::months(1))
            .unwrap_err();
        assert!(matches!(err, TickError::OutOfOrder { .. }));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut history = history(0.0, 0.0);
        history
            .latest_mut()
            .push(EventProfile::ConstantSalariedIncome(ConstantSalariedIncome::new(
                "Job",
                1_200.0,
                AccrualModel::PeriodicMonthly,
            )))
            .unwrap();
        history.advance(date(2000, 2, 1), Period::months(1)).unwrap();
        history.advance(date(2000, 3, 1), Period::months(1)).unwrap();
        assert_eq!(savings(history.first()), 0.0);
        assert!((savings(&history.snapshots()[1]) - 100.0).abs() < 1e-9);
        assert!((savings(history.latest()) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_member_order_is_preserved_across_ticks() {
        let mut history = history(100.0, 0.0);
        history.advance(date(2000, 2, 1), Period::months(1)).unwrap();
        let names: Vec<&str> = history.latest().names().collect();
        assert_eq!(names, ["Savings", "Rent"]);
    }
}
