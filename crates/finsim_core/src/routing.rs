//! Fund routing between the cash-like members of a snapshot
//!
//! Debits drain every [`Cash`] member in insertion order until covered.
//! Credits land on the first `Cash` member only, and taxable credits are also
//! added to the taxable income of the first [`TaxPayment`] member.

use tracing::warn;

use crate::error::FundsError;
use crate::model::{Cash, EventProfile, TaxPayment};

/// Relative shortfall below which a debit counts as fully covered
const DEBIT_TOLERANCE: f64 = 1e-12;

/// The rest of the pending snapshot, as seen by the member being transformed.
///
/// Holds the members before and after the transforming one so that routing
/// walks them in the group's insertion order.
pub struct RoutingContext<'a> {
    before: &'a mut [EventProfile],
    after: &'a mut [EventProfile],
}

impl<'a> RoutingContext<'a> {
    pub fn new(before: &'a mut [EventProfile], after: &'a mut [EventProfile]) -> Self {
        Self { before, after }
    }

    pub fn add_to_cash(&mut self, amount: f64, taxable: bool) -> Result<(), FundsError> {
        add_to_cash(
            self.before.iter_mut().chain(self.after.iter_mut()),
            amount,
            taxable,
        )
    }
}

/// Route a signed cash delta across `members`, visited in order.
///
/// Fails with [`FundsError::InsufficientFunds`] when a debit is larger than
/// the combined positive balance of all cash members. Cash balances touched
/// before the failure are left drained; callers discard the snapshot.
pub fn add_to_cash<'a, I>(members: I, amount: f64, taxable: bool) -> Result<(), FundsError>
where
    I: IntoIterator<Item = &'a mut EventProfile>,
{
    if amount < 0.0 {
        debit(members, -amount)
    } else {
        credit(members, amount, taxable);
        Ok(())
    }
}

fn debit<'a, I>(members: I, requested: f64) -> Result<(), FundsError>
where
    I: IntoIterator<Item = &'a mut EventProfile>,
{
    let mut remaining = requested;
    for member in members {
        if remaining <= 0.0 {
            break;
        }
        if let EventProfile::Cash(cash) = member {
            if cash.value >= remaining {
                cash.value -= remaining;
                remaining = 0.0;
            } else if cash.value > 0.0 {
                remaining -= cash.value;
                cash.value = 0.0;
            }
        }
    }

    // Rounding residue from draining several pools counts as covered
    if remaining > requested * DEBIT_TOLERANCE {
        return Err(FundsError::InsufficientFunds {
            requested,
            shortfall: remaining,
        });
    }
    Ok(())
}

fn credit<'a, I>(members: I, amount: f64, taxable: bool)
where
    I: IntoIterator<Item = &'a mut EventProfile>,
{
    let mut cash: Option<&mut Cash> = None;
    let mut tax: Option<&mut TaxPayment> = None;
    for member in members {
        match member {
            EventProfile::Cash(c) if cash.is_none() => cash = Some(c),
            EventProfile::TaxPayment(t) if tax.is_none() => tax = Some(t),
            _ => {}
        }
        if cash.is_some() && tax.is_some() {
            break;
        }
    }

    match cash {
        Some(cash) => cash.value += amount,
        None if amount > 0.0 => {
            warn!(amount, "no cash member to receive credit, amount dropped");
        }
        None => {}
    }
    if taxable && let Some(tax) = tax {
        tax.taxable_income += amount;
    }
}
