//! Event profiles - the stateful financial primitives of a scenario
//!
//! Each variant owns its numeric state and knows how to advance itself across
//! one period. Variants that move money do so through the [`RoutingContext`],
//! which gives them access to the cash and tax members of the snapshot that is
//! being transformed.

use std::fmt;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::accrual::{AccrualModel, Period, portion_of_year};
use crate::error::{ConfigError, TransformError};
use crate::routing::RoutingContext;

/// Remaining balance below which a loan counts as settled
const SETTLED_BALANCE: f64 = 0.005;
/// Remaining term (in years) below which a loan counts as expired
const EXPIRED_TERM: f64 = 1e-9;

/// A named, stateful participant in the simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventProfile {
    Cash(Cash),
    ConstantGrowthAsset(ConstantGrowthAsset),
    AmortizingLoan(AmortizingLoan),
    ConstantSalariedIncome(ConstantSalariedIncome),
    ConstantExpense(ConstantExpense),
    TaxPayment(TaxPayment),
}

impl EventProfile {
    pub fn name(&self) -> &str {
        match self {
            EventProfile::Cash(p) => &p.name,
            EventProfile::ConstantGrowthAsset(p) => &p.name,
            EventProfile::AmortizingLoan(p) => &p.name,
            EventProfile::ConstantSalariedIncome(p) => &p.name,
            EventProfile::ConstantExpense(p) => &p.name,
            EventProfile::TaxPayment(p) => &p.name,
        }
    }

    /// The type name this variant is registered under in a profile factory
    pub fn kind(&self) -> &'static str {
        match self {
            EventProfile::Cash(_) => "cash",
            EventProfile::ConstantGrowthAsset(_) => "constant-growth-asset",
            EventProfile::AmortizingLoan(_) => "amortizing-loan",
            EventProfile::ConstantSalariedIncome(_) => "constant-salaried-income",
            EventProfile::ConstantExpense(_) => "constant-expense",
            EventProfile::TaxPayment(_) => "tax-payment",
        }
    }

    /// Advance this profile across the `period` ending at `date`.
    pub fn transform(
        &mut self,
        ctx: &mut RoutingContext<'_>,
        date: Date,
        period: Period,
    ) -> Result<(), TransformError> {
        match self {
            EventProfile::Cash(_) => Ok(()),
            EventProfile::ConstantGrowthAsset(p) => p.transform(date, period),
            EventProfile::AmortizingLoan(p) => p.transform(ctx, date, period),
            EventProfile::ConstantSalariedIncome(p) => p.transform(ctx, date, period),
            EventProfile::ConstantExpense(p) => p.transform(ctx, date, period),
            EventProfile::TaxPayment(p) => p.transform(ctx, date, period),
        }
    }

    pub fn as_cash(&self) -> Option<&Cash> {
        match self {
            EventProfile::Cash(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_growth_asset(&self) -> Option<&ConstantGrowthAsset> {
        match self {
            EventProfile::ConstantGrowthAsset(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_loan(&self) -> Option<&AmortizingLoan> {
        match self {
            EventProfile::AmortizingLoan(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_tax_payment(&self) -> Option<&TaxPayment> {
        match self {
            EventProfile::TaxPayment(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for EventProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventProfile::Cash(p) => write!(f, "{:.2}", p.value),
            EventProfile::ConstantGrowthAsset(p) => write!(f, "{:.2}", p.value),
            EventProfile::AmortizingLoan(p) => write!(f, "{}", p.principal),
            EventProfile::ConstantSalariedIncome(p) => write!(f, "{}", p.salary),
            EventProfile::ConstantExpense(p) => write!(f, "{}", -p.yearly_expense),
            EventProfile::TaxPayment(p) => write!(
                f,
                "taxable income: {}; taxes paid: {}",
                p.taxable_income, p.taxes_paid
            ),
        }
    }
}

/// A cash pool. Only the fund router changes its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cash {
    pub name: String,
    pub value: f64,
}

impl Cash {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An asset compounding at a constant annual rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantGrowthAsset {
    pub name: String,
    pub value: f64,
    pub appreciation_rate: f64,
    pub accrual_model: AccrualModel,
}

impl ConstantGrowthAsset {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        appreciation_rate: f64,
        accrual_model: AccrualModel,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            appreciation_rate,
            accrual_model,
        }
    }

    fn transform(&mut self, date: Date, period: Period) -> Result<(), TransformError> {
        let portion = portion_of_year(date, period, self.accrual_model)?;
        self.value *= (1.0 + self.appreciation_rate).powf(portion);
        Ok(())
    }
}

/// A fixed-payment loan.
///
/// `principal` is the amount of `loan_amount` paid off so far. The payment is
/// computed from the annuity formula on the first transform unless one was
/// configured, and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmortizingLoan {
    pub name: String,
    pub accrual_model: AccrualModel,
    pub principal: f64,
    pub loan_amount: f64,
    pub rate: f64,
    /// Years left on the loan
    pub remaining_term: f64,
    pub payment: Option<f64>,
}

impl AmortizingLoan {
    pub fn new(
        name: impl Into<String>,
        accrual_model: AccrualModel,
        loan_amount: f64,
        rate: f64,
        remaining_term: f64,
    ) -> Self {
        Self {
            name: name.into(),
            accrual_model,
            principal: 0.0,
            loan_amount,
            rate,
            remaining_term,
            payment: None,
        }
    }

    pub fn with_principal(mut self, principal: f64) -> Self {
        self.principal = principal;
        self
    }

    /// A negative payment means "compute it on the first period".
    pub fn with_payment(mut self, payment: f64) -> Self {
        self.payment = (payment >= 0.0).then_some(payment);
        self
    }

    pub fn balance(&self) -> f64 {
        self.loan_amount - self.principal
    }

    pub fn is_settled(&self) -> bool {
        self.balance() <= SETTLED_BALANCE || self.remaining_term <= EXPIRED_TERM
    }

    /// Level payment that clears `balance` over `periods` at `period_rate`
    fn annuity_payment(balance: f64, period_rate: f64, periods: f64) -> f64 {
        if period_rate == 0.0 {
            return balance / periods;
        }
        balance * period_rate / (1.0 - (1.0 + period_rate).powf(-periods))
    }

    fn transform(
        &mut self,
        ctx: &mut RoutingContext<'_>,
        date: Date,
        period: Period,
    ) -> Result<(), TransformError> {
        if self.is_settled() {
            return Ok(());
        }
        let year_fraction = portion_of_year(date, period, self.accrual_model)?;
        let period_rate = (1.0 + self.rate).powf(year_fraction) - 1.0;
        let balance = self.balance();
        let interest = balance * period_rate;
        let remaining_periods = self.remaining_term / year_fraction;
        let payment = *self
            .payment
            .get_or_insert_with(|| Self::annuity_payment(balance, period_rate, remaining_periods));

        self.principal += payment - interest;
        self.remaining_term -= year_fraction;
        ctx.add_to_cash(-payment, false)?;
        Ok(())
    }
}

/// A salary paid evenly across the year; all of it is taxable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantSalariedIncome {
    pub name: String,
    pub salary: f64,
    pub accrual_model: AccrualModel,
}

impl ConstantSalariedIncome {
    pub fn new(name: impl Into<String>, salary: f64, accrual_model: AccrualModel) -> Self {
        Self {
            name: name.into(),
            salary,
            accrual_model,
        }
    }

    fn transform(
        &mut self,
        ctx: &mut RoutingContext<'_>,
        date: Date,
        period: Period,
    ) -> Result<(), TransformError> {
        let portion = portion_of_year(date, period, self.accrual_model)?;
        ctx.add_to_cash(self.salary * portion, true)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantExpense {
    pub name: String,
    pub yearly_expense: f64,
    pub accrual_model: AccrualModel,
}

impl ConstantExpense {
    pub fn new(name: impl Into<String>, yearly_expense: f64, accrual_model: AccrualModel) -> Self {
        Self {
            name: name.into(),
            yearly_expense,
            accrual_model,
        }
    }

    fn transform(
        &mut self,
        ctx: &mut RoutingContext<'_>,
        date: Date,
        period: Period,
    ) -> Result<(), TransformError> {
        let portion = portion_of_year(date, period, self.accrual_model)?;
        ctx.add_to_cash(-self.yearly_expense * portion, false)?;
        Ok(())
    }
}

/// One marginal tax bracket: income above `income` (per year) is taxed at `rate`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub rate: f64,
    pub income: f64,
}

/// A bracketed tax, assessed on the taxable income credited by other profiles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxPayment {
    pub name: String,
    pub frequency: Period,
    pub accrual_model: AccrualModel,
    brackets: Vec<TaxBracket>,
    pub taxable_income: f64,
    pub taxes_paid: f64,
    /// Start of the current assessment window
    #[serde(skip)]
    window_start: Option<Date>,
    /// Year-fraction accrued since the window started
    #[serde(skip)]
    accrued_portion: f64,
}

impl TaxPayment {
    /// Brackets are ordered by income; the lowest must start at zero.
    pub fn new(
        name: impl Into<String>,
        frequency: Period,
        accrual_model: AccrualModel,
        mut brackets: Vec<TaxBracket>,
    ) -> Result<Self, ConfigError> {
        brackets.sort_by(|a, b| a.income.total_cmp(&b.income));
        match brackets.first() {
            None => return Err(ConfigError::EmptyTaxSchedule),
            Some(lowest) if lowest.income != 0.0 => {
                return Err(ConfigError::NonZeroLowestBracket {
                    income: lowest.income,
                });
            }
            Some(_) => {}
        }

        Ok(Self {
            name: name.into(),
            frequency,
            accrual_model,
            brackets,
            taxable_income: 0.0,
            taxes_paid: 0.0,
            window_start: None,
            accrued_portion: 0.0,
        })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Tax owed on the accumulated taxable income, with every bracket
    /// threshold scaled by `portion` of a year. Taxed income is removed.
    fn assess(&mut self, portion: f64) -> f64 {
        let mut tax_due = 0.0;
        for bracket in self.brackets.iter().rev() {
            let threshold = bracket.income * portion;
            if self.taxable_income > threshold {
                let margin = self.taxable_income - threshold;
                tax_due += bracket.rate * margin;
                self.taxable_income -= margin;
            }
        }
        tax_due
    }

    fn transform(
        &mut self,
        ctx: &mut RoutingContext<'_>,
        date: Date,
        period: Period,
    ) -> Result<(), TransformError> {
        let portion = portion_of_year(date, period, self.accrual_model)?;
        let period_start = period.start_of(date)?;
        let due_by = self.frequency.start_of(date)?;
        let window_start = *self.window_start.get_or_insert(period_start);
        self.accrued_portion += portion;

        if period_start > due_by && window_start > due_by {
            return Ok(());
        }

        let tax_due = self.assess(self.accrued_portion);
        self.window_start = Some(date);
        self.accrued_portion = 0.0;
        if tax_due != 0.0 {
            ctx.add_to_cash(-tax_due, false)?;
        }
        self.taxes_paid += tax_due;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn run(profile: &mut EventProfile, others: &mut [EventProfile], d: Date, period: Period) {
        let mut ctx = RoutingContext::new(&mut [], others);
        profile.transform(&mut ctx, d, period).unwrap();
    }

    #[test]
    fn test_growth_asset_monthly_compounding() {
        let mut asset = EventProfile::ConstantGrowthAsset(ConstantGrowthAsset::new(
            "CD",
            100.0,
            0.5,
            AccrualModel::PeriodicMonthly,
        ));
        let monthly = 1.5_f64.powf(1.0 / 12.0);
        let mut expected = 100.0;
        for k in 1..10 {
            run(&mut asset, &mut [], date(2000, 1 + k, 1), Period::months(1));
            expected *= monthly;
            let value = asset.as_growth_asset().unwrap().value;
            assert!((value - expected).abs() < 1e-9, "month {k}: {value} vs {expected}");
        }
    }

    #[test]
    fn test_growth_asset_rejects_bad_period() {
        let mut asset = EventProfile::ConstantGrowthAsset(ConstantGrowthAsset::new(
            "CD",
            100.0,
            0.05,
            AccrualModel::PeriodicYearly,
        ));
        let mut ctx = RoutingContext::new(&mut [], &mut []);
        let result = asset.transform(&mut ctx, date(2000, 2, 1), Period::months(1));
        assert!(matches!(result, Err(TransformError::Period(_))));
        assert_eq!(asset.as_growth_asset().unwrap().value, 100.0);
    }

    #[test]
    fn test_salary_credits_cash_and_taxable_income() {
        let mut income = EventProfile::ConstantSalariedIncome(ConstantSalariedIncome::new(
            "Job",
            120.0,
            AccrualModel::PeriodicMonthly,
        ));
        let tax = TaxPayment::new(
            "Tax",
            Period::years(1),
            AccrualModel::PeriodicMonthly,
            vec![TaxBracket {
                rate: 0.1,
                income: 0.0,
            }],
        )
        .unwrap();
        let mut others = vec![
            EventProfile::Cash(Cash::new("Savings", 0.0)),
            EventProfile::TaxPayment(tax),
        ];
        run(&mut income, &mut others, date(2000, 2, 1), Period::months(1));
        assert!((others[0].as_cash().unwrap().value - 10.0).abs() < 1e-12);
        assert!((others[1].as_tax_payment().unwrap().taxable_income - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_expense_is_not_taxable() {
        let mut expense = EventProfile::ConstantExpense(ConstantExpense::new(
            "Rent",
            120.0,
            AccrualModel::PeriodicYearly,
        ));
        let tax = TaxPayment::new(
            "Tax",
            Period::years(1),
            AccrualModel::PeriodicYearly,
            vec![TaxBracket {
                rate: 0.1,
                income: 0.0,
            }],
        )
        .unwrap();
        let mut others = vec![
            EventProfile::Cash(Cash::new("Savings", 10_000.0)),
            EventProfile::TaxPayment(tax),
        ];
        run(&mut expense, &mut others, date(2001, 1, 1), Period::years(1));
        run(&mut expense, &mut others, date(2002, 1, 1), Period::years(1));
        assert!((others[0].as_cash().unwrap().value - 9_760.0).abs() < 1e-9);
        assert_eq!(others[1].as_tax_payment().unwrap().taxable_income, 0.0);
    }

    #[test]
    fn test_loan_payment_is_fixed_once_computed() {
        let mut loan = EventProfile::AmortizingLoan(AmortizingLoan::new(
            "Mortgage",
            AccrualModel::PeriodicMonthly,
            100_000.0,
            0.05,
            20.0,
        ));
        let mut others = vec![EventProfile::Cash(Cash::new("Savings", 1_000_000.0))];
        run(&mut loan, &mut others, date(2000, 2, 1), Period::months(1));
        let first = loan.as_loan().unwrap().payment.unwrap();
        for k in 2..=24 {
            let d = Period::months(k).end_from(date(2000, 1, 1)).unwrap();
            run(&mut loan, &mut others, d, Period::months(1));
            assert_eq!(loan.as_loan().unwrap().payment, Some(first));
        }
        let remaining = loan.as_loan().unwrap().remaining_term;
        assert!((remaining - 18.0).abs() < 1e-9);
        let paid = 1_000_000.0 - others[0].as_cash().unwrap().value;
        assert!((paid - 24.0 * first).abs() < 1e-6);
    }

    #[test]
    fn test_configured_loan_payment_is_used() {
        let mut loan = EventProfile::AmortizingLoan(
            AmortizingLoan::new("Car", AccrualModel::PeriodicMonthly, 12_000.0, 0.0, 1.0)
                .with_payment(500.0),
        );
        let mut others = vec![EventProfile::Cash(Cash::new("Savings", 10_000.0))];
        run(&mut loan, &mut others, date(2000, 2, 1), Period::months(1));
        assert_eq!(loan.as_loan().unwrap().payment, Some(500.0));
        assert!((loan.as_loan().unwrap().principal - 500.0).abs() < 1e-12);
        assert!((others[0].as_cash().unwrap().value - 9_500.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_rate_loan_splits_balance_evenly() {
        let mut loan = EventProfile::AmortizingLoan(AmortizingLoan::new(
            "Family",
            AccrualModel::PeriodicMonthly,
            1_200.0,
            0.0,
            1.0,
        ));
        let mut others = vec![EventProfile::Cash(Cash::new("Savings", 10_000.0))];
        run(&mut loan, &mut others, date(2000, 2, 1), Period::months(1));
        let payment = loan.as_loan().unwrap().payment.unwrap();
        assert!((payment - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_settled_loan_stops_paying() {
        let mut loan = EventProfile::AmortizingLoan(
            AmortizingLoan::new("Paid", AccrualModel::PeriodicMonthly, 1_000.0, 0.05, 5.0)
                .with_principal(1_000.0),
        );
        let mut others = vec![EventProfile::Cash(Cash::new("Savings", 100.0))];
        run(&mut loan, &mut others, date(2000, 2, 1), Period::months(1));
        assert_eq!(loan.as_loan().unwrap().payment, None);
        assert_eq!(others[0].as_cash().unwrap().value, 100.0);
    }

    #[test]
    fn test_tax_schedule_validation() {
        let model = AccrualModel::PeriodicMonthly;
        assert!(matches!(
            TaxPayment::new("Tax", Period::months(1), model, vec![]),
            Err(ConfigError::EmptyTaxSchedule)
        ));
        assert!(matches!(
            TaxPayment::new(
                "Tax",
                Period::months(1),
                model,
                vec![TaxBracket {
                    rate: 0.05,
                    income: 10.0
                }]
            ),
            Err(ConfigError::NonZeroLowestBracket { .. })
        ));
    }

    #[test]
    fn test_brackets_are_sorted_by_income() {
        let tax = TaxPayment::new(
            "Tax",
            Period::months(1),
            AccrualModel::PeriodicMonthly,
            vec![
                TaxBracket {
                    rate: 0.2,
                    income: 60_000.0,
                },
                TaxBracket {
                    rate: 0.05,
                    income: 0.0,
                },
            ],
        )
        .unwrap();
        assert_eq!(tax.brackets()[0].income, 0.0);
        assert_eq!(tax.brackets()[1].income, 60_000.0);
    }

    #[test]
    fn test_yearly_tax_accumulates_across_monthly_periods() {
        let tax = TaxPayment::new(
            "Tax",
            Period::years(1),
            AccrualModel::PeriodicMonthly,
            vec![
                TaxBracket {
                    rate: 0.0,
                    income: 0.0,
                },
                TaxBracket {
                    rate: 0.5,
                    income: 12_000.0,
                },
            ],
        )
        .unwrap();
        let mut tax = EventProfile::TaxPayment(tax);
        let mut others = vec![EventProfile::Cash(Cash::new("Savings", 100_000.0))];
        let start = date(2000, 1, 1);
        for k in 1..=12 {
            if let EventProfile::TaxPayment(t) = &mut tax {
                t.taxable_income += 2_000.0;
            }
            let d = Period::months(k).end_from(start).unwrap();
            run(&mut tax, &mut others, d, Period::months(1));
            let paid = tax.as_tax_payment().unwrap().taxes_paid;
            if k < 12 {
                assert_eq!(paid, 0.0, "month {k} should not be assessed");
            }
        }
        // 24k earned, 12k above the yearly threshold at 50%
        let tax = tax.as_tax_payment().unwrap();
        assert!((tax.taxes_paid - 6_000.0).abs() < 1e-6);
        assert!(tax.taxable_income.abs() < 1e-6);
        assert!((others[0].as_cash().unwrap().value - 94_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_tax_due_is_credited() {
        let tax = TaxPayment::new(
            "Credit",
            Period::months(1),
            AccrualModel::PeriodicMonthly,
            vec![TaxBracket {
                rate: -0.1,
                income: 0.0,
            }],
        )
        .unwrap();
        let mut tax = EventProfile::TaxPayment(tax);
        if let EventProfile::TaxPayment(t) = &mut tax {
            t.taxable_income = 1_000.0;
        }
        let mut others = vec![EventProfile::Cash(Cash::new("Savings", 50.0))];
        run(&mut tax, &mut others, date(2000, 2, 1), Period::months(1));

        let tax = tax.as_tax_payment().unwrap();
        assert!((tax.taxes_paid + 100.0).abs() < 1e-9);
        assert!((others[0].as_cash().unwrap().value - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_formats() {
        let cash = EventProfile::Cash(Cash::new("Savings", 1234.567));
        assert_eq!(cash.to_string(), "1234.57");
        let expense = EventProfile::ConstantExpense(ConstantExpense::new(
            "Rent",
            120.0,
            AccrualModel::PeriodicMonthly,
        ));
        assert_eq!(expense.to_string(), "-120");
        assert_eq!(expense.kind(), "constant-expense");
    }
}
