//! Calendar helpers used by the accrual calculator.
//!
//! Day counts go through Rata Die numbering so the pro-rata model never has
//! to build and normalise an intermediate `jiff::Span`.

use jiff::civil::Date;

/// Gregorian leap year check.
#[inline]
pub fn is_leap_year(year: i16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Number of days in the given calendar year.
#[inline]
pub fn days_in_year(year: i16) -> i32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Days in a month without constructing a `Date`.
#[inline]
pub fn days_in_month(year: i16, month: i8) -> i8 {
    const DAYS: [i8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS[(month - 1) as usize]
    }
}

/// Whether `date` is the final day of its month.
#[inline]
pub fn is_last_day_of_month(date: Date) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}

/// Whether `date` sits on a semi-monthly boundary (the 15th or month end).
#[inline]
pub fn is_semi_monthly_anchor(date: Date) -> bool {
    date.day() == 15 || is_last_day_of_month(date)
}

/// Convert a civil date to a Rata Die day number (days since 0001-01-01).
///
/// Uses the proleptic Gregorian calendar algorithm from Baum (2017).
#[inline]
pub fn ordinal(d: Date) -> i32 {
    let y = d.year() as i32;
    let m = d.month() as i32;
    let day = d.day() as i32;

    // Shift March = month 1 so Feb (end of "year") is month 12
    let a = (14 - m) / 12;
    let y2 = y - a;
    let m2 = m + 12 * a - 3;

    day + (153 * m2 + 2) / 5 + 365 * y2 + y2 / 4 - y2 / 100 + y2 / 400 - 306
}

/// Days from `d1` to `d2`, positive when `d2 > d1`.
#[inline]
pub fn days_between(d1: Date, d2: Date) -> i32 {
    ordinal(d2) - ordinal(d1)
}
