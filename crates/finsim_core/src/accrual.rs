//! Accrual models and the portion-of-year calculator
//!
//! Every profile that accrues (interest, salary, expenses, tax thresholds)
//! converts a simulation period into a fraction of a year through
//! [`portion_of_year`]. The periodic models assume a fixed number of identical
//! sub-periods per year and reject periods that do not line up with that
//! cadence; [`AccrualModel::ProRata`] counts actual days instead.

use std::fmt;
use std::str::FromStr;

use jiff::Span;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::date_math::{days_between, days_in_year, is_last_day_of_month, is_semi_monthly_anchor};
use crate::error::{ConfigError, PeriodError};

/// Convention for turning a calendar period into a fraction of a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccrualModel {
    /// Actual days elapsed over days in the year
    ProRata,
    PeriodicMonthly,
    PeriodicSemiMonthly,
    PeriodicWeekly,
    PeriodicBiweekly,
    PeriodicYearly,
}

impl AccrualModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccrualModel::ProRata => "pro rata",
            AccrualModel::PeriodicMonthly => "periodic monthly",
            AccrualModel::PeriodicSemiMonthly => "periodic semi monthly",
            AccrualModel::PeriodicWeekly => "periodic weekly",
            AccrualModel::PeriodicBiweekly => "periodic biweekly",
            AccrualModel::PeriodicYearly => "periodic yearly",
        }
    }
}

impl fmt::Display for AccrualModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccrualModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pro rata" => Ok(AccrualModel::ProRata),
            "periodic monthly" => Ok(AccrualModel::PeriodicMonthly),
            "periodic semi monthly" | "periodic semimonthly" => {
                Ok(AccrualModel::PeriodicSemiMonthly)
            }
            "periodic weekly" => Ok(AccrualModel::PeriodicWeekly),
            "periodic biweekly" => Ok(AccrualModel::PeriodicBiweekly),
            "periodic yearly" => Ok(AccrualModel::PeriodicYearly),
            other => Err(ConfigError::UnknownAccrualModel(other.to_string())),
        }
    }
}

impl TryFrom<String> for AccrualModel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccrualModel> for String {
    fn from(model: AccrualModel) -> Self {
        model.as_str().to_string()
    }
}

/// A calendar-aware interval, compared field by field.
///
/// `1M` and `30d` are different periods even when they cover the same number
/// of days, because the periodic models restrict which fields may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Period {
    pub const fn new(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub const fn years(years: i32) -> Self {
        Self::new(years, 0, 0)
    }

    pub const fn months(months: i32) -> Self {
        Self::new(0, months, 0)
    }

    pub const fn days(days: i32) -> Self {
        Self::new(0, 0, days)
    }

    pub const fn weeks(weeks: i32) -> Self {
        Self::new(0, 0, 7 * weeks)
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    /// Nonzero-ness of (years, months, days)
    fn shape(&self) -> (bool, bool, bool) {
        (self.years != 0, self.months != 0, self.days != 0)
    }

    /// This period repeated `n` times, or `None` on overflow
    pub fn times(&self, n: i32) -> Option<Period> {
        Some(Period {
            years: self.years.checked_mul(n)?,
            months: self.months.checked_mul(n)?,
            days: self.days.checked_mul(n)?,
        })
    }

    pub fn to_span(&self) -> Result<Span, jiff::Error> {
        Span::new()
            .try_years(self.years)?
            .try_months(self.months)?
            .try_days(self.days)
    }

    /// The date this period begins on when it ends at `date`.
    ///
    /// Years and months are applied first (clamping to the end of the month),
    /// then days.
    pub fn start_of(&self, date: Date) -> Result<Date, jiff::Error> {
        date.checked_sub(self.to_span()?)
    }

    /// The date this period ends on when it begins at `date`.
    pub fn end_from(&self, date: Date) -> Result<Date, jiff::Error> {
        date.checked_add(self.to_span()?)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0d");
        }
        let mut parts = Vec::with_capacity(3);
        if self.years != 0 {
            parts.push(format!("{}Y", self.years));
        }
        if self.months != 0 {
            parts.push(format!("{}M", self.months));
        }
        if self.days != 0 {
            parts.push(format!("{}d", self.days));
        }
        f.write_str(&parts.join(" "))
    }
}

impl FromStr for Period {
    type Err = ConfigError;

    /// Parse a granularity such as `1M`, `2 w`, `1M2` or a compound `1Y 6M`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidGranularity(s.to_string());

        let mut period = Period::default();
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(invalid());
        }

        while !rest.is_empty() {
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits == 0 {
                return Err(invalid());
            }
            let value: i32 = rest[..digits].parse().map_err(|_| invalid())?;
            rest = rest[digits..].trim_start();

            let unit_len = if rest.starts_with("M2") {
                2
            } else if rest.starts_with(['d', 'w', 'M', 'Y']) {
                1
            } else {
                return Err(invalid());
            };
            let unit = &rest[..unit_len];
            rest = rest[unit_len..].trim_start();

            let scaled = |factor: i32| value.checked_mul(factor).ok_or_else(invalid);
            let (field, amount) = match unit {
                "d" => (&mut period.days, value),
                "w" => (&mut period.days, scaled(7)?),
                "M" => (&mut period.months, value),
                "M2" => (&mut period.days, scaled(15)?),
                _ => (&mut period.years, value),
            };
            *field = field.checked_add(amount).ok_or_else(invalid)?;
        }

        if period.is_zero() {
            return Err(invalid());
        }
        Ok(period)
    }
}

impl TryFrom<String> for Period {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// Fraction of a year covered by the `period` ending at `date` under `model`.
///
/// The period's nonzero fields are validated against the model before anything
/// is computed.
pub fn portion_of_year(date: Date, period: Period, model: AccrualModel) -> Result<f64, PeriodError> {
    let unsupported = || PeriodError::UnsupportedFields { model, period };

    match model {
        AccrualModel::PeriodicMonthly => match period.shape() {
            (false, true, false) | (true, true, false) => {
                Ok(period.years as f64 + period.months as f64 / 12.0)
            }
            _ => Err(unsupported()),
        },
        AccrualModel::PeriodicYearly => match period.shape() {
            (true, false, false) => Ok(period.years as f64),
            _ => Err(unsupported()),
        },
        AccrualModel::PeriodicWeekly => cadence_in_days(period, model, 7, 52),
        AccrualModel::PeriodicBiweekly => cadence_in_days(period, model, 14, 26),
        AccrualModel::PeriodicSemiMonthly => semi_monthly(date, period),
        AccrualModel::ProRata => {
            let start = period.start_of(date)?;
            Ok(days_between(start, date) as f64 / days_in_year(date.year()) as f64)
        }
    }
}

/// Weekly-style models: whole multiples of `unit` days, `per_year` per year
fn cadence_in_days(
    period: Period,
    model: AccrualModel,
    unit: i32,
    per_year: i32,
) -> Result<f64, PeriodError> {
    if period.shape() != (false, false, true) {
        return Err(PeriodError::UnsupportedFields { model, period });
    }
    if period.days % unit != 0 {
        return Err(PeriodError::NotMultipleOfDays {
            model,
            days: period.days,
            multiple: unit,
        });
    }
    Ok((period.days / unit) as f64 / per_year as f64)
}

/// Counts half-month boundaries between the period start and `date`.
fn semi_monthly(date: Date, period: Period) -> Result<f64, PeriodError> {
    let model = AccrualModel::PeriodicSemiMonthly;
    match period.shape() {
        (false, false, true) | (false, true, true) | (true, true, true) => {}
        _ => return Err(PeriodError::UnsupportedFields { model, period }),
    }
    if !is_semi_monthly_anchor(date) {
        return Err(PeriodError::UnanchoredDate { model, date });
    }
    let start = period.start_of(date)?;
    if !is_semi_monthly_anchor(start) {
        return Err(PeriodError::UnanchoredPeriodStart { model, start });
    }

    let mut halves = (date.year() as i32 - start.year() as i32) * 24
        + (date.month() as i32 - start.month() as i32) * 2;
    if is_last_day_of_month(date) && start.day() == 15 {
        halves += 1;
    } else if date.day() == 15 && is_last_day_of_month(start) {
        halves -= 1;
    }
    Ok(halves as f64 / 24.0)
}
