use std::fmt;

use jiff::civil::Date;

use crate::accrual::{AccrualModel, Period};

/// A period whose shape is incompatible with an accrual model.
#[derive(Debug)]
pub enum PeriodError {
    /// The nonzero fields of the period are not accepted by the model
    UnsupportedFields { model: AccrualModel, period: Period },
    /// Weekly/biweekly models need a whole number of cadence units
    NotMultipleOfDays {
        model: AccrualModel,
        days: i32,
        multiple: i32,
    },
    /// Semi-monthly accrual needs the period end on the 15th or month end
    UnanchoredDate { model: AccrualModel, date: Date },
    /// Semi-monthly accrual needs the period start on the 15th or month end
    UnanchoredPeriodStart { model: AccrualModel, start: Date },
    DateArithmetic(jiff::Error),
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::UnsupportedFields { model, period } => {
                write!(f, "{model} accrual does not support a period of {period}")
            }
            PeriodError::NotMultipleOfDays {
                model,
                days,
                multiple,
            } => write!(
                f,
                "{model} accrual requires a multiple of {multiple} days, got {days}"
            ),
            PeriodError::UnanchoredDate { model, date } => write!(
                f,
                "{model} accrual requires dates on the 15th or the last day of the month, got {date}"
            ),
            PeriodError::UnanchoredPeriodStart { model, start } => write!(
                f,
                "{model} accrual requires the period to begin on the 15th or the last day of the month, got {start}"
            ),
            PeriodError::DateArithmetic(e) => write!(f, "date calculation error: {e}"),
        }
    }
}

impl std::error::Error for PeriodError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PeriodError::DateArithmetic(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jiff::Error> for PeriodError {
    fn from(err: jiff::Error) -> Self {
        PeriodError::DateArithmetic(err)
    }
}

/// Cash routing failures
#[derive(Debug, Clone)]
pub enum FundsError {
    /// A debit exceeded the combined balance of every cash member
    InsufficientFunds { requested: f64, shortfall: f64 },
}

impl fmt::Display for FundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundsError::InsufficientFunds {
                requested,
                shortfall,
            } => write!(
                f,
                "insufficient funds: debit of {requested:.2} is short by {shortfall:.2}"
            ),
        }
    }
}

impl std::error::Error for FundsError {}

/// Failure of a single profile's transform
#[derive(Debug)]
pub enum TransformError {
    Period(PeriodError),
    Funds(FundsError),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Period(e) => write!(f, "{e}"),
            TransformError::Funds(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Period(e) => Some(e),
            TransformError::Funds(e) => Some(e),
        }
    }
}

impl From<PeriodError> for TransformError {
    fn from(err: PeriodError) -> Self {
        TransformError::Period(err)
    }
}

impl From<FundsError> for TransformError {
    fn from(err: FundsError) -> Self {
        TransformError::Funds(err)
    }
}

impl From<jiff::Error> for TransformError {
    fn from(err: jiff::Error) -> Self {
        TransformError::Period(PeriodError::DateArithmetic(err))
    }
}

/// An aborted tick. Nothing from the tick was committed.
#[derive(Debug)]
pub enum TickError {
    /// A member's transform failed
    Transform {
        date: Date,
        profile: String,
        source: TransformError,
    },
    /// The tick date is earlier than the latest snapshot
    OutOfOrder { latest: Date, date: Date },
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickError::Transform {
                date,
                profile,
                source,
            } => write!(f, "tick {date} failed in profile '{profile}': {source}"),
            TickError::OutOfOrder { latest, date } => write!(
                f,
                "cannot advance to {date}: latest snapshot is already at {latest}"
            ),
        }
    }
}

impl std::error::Error for TickError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TickError::Transform { source, .. } => Some(source),
            TickError::OutOfOrder { .. } => None,
        }
    }
}

/// Construction-time problems with a scenario or profile template
#[derive(Debug)]
pub enum ConfigError {
    UnknownAccrualModel(String),
    InvalidGranularity(String),
    /// A tax schedule needs at least one bracket
    EmptyTaxSchedule,
    /// The lowest tax bracket must start at zero income
    NonZeroLowestBracket { income: f64 },
    /// No constructor is registered for the template's type name
    UnknownEventType(String),
    InvalidProfileData {
        name: String,
        kind: String,
        message: String,
    },
    DuplicateProfileName(String),
    InvalidScheduleWindow {
        name: String,
        start: Date,
        end: Date,
    },
    InvalidHorizon(i64),
    DateArithmetic(jiff::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownAccrualModel(s) => write!(
                f,
                "unknown accrual model '{s}' (expected 'pro rata' or 'periodic monthly|semi monthly|weekly|biweekly|yearly')"
            ),
            ConfigError::InvalidGranularity(s) => write!(
                f,
                "invalid granularity '{s}' (expected <n>d, <n>w, <n>M, <n>M2 or <n>Y)"
            ),
            ConfigError::EmptyTaxSchedule => write!(f, "there must be at least one tax bracket"),
            ConfigError::NonZeroLowestBracket { income } => write!(
                f,
                "the lowest tax bracket must start at zero income, got {income}"
            ),
            ConfigError::UnknownEventType(kind) => write!(f, "unknown event type '{kind}'"),
            ConfigError::InvalidProfileData {
                name,
                kind,
                message,
            } => write!(f, "invalid data for {kind} '{name}': {message}"),
            ConfigError::DuplicateProfileName(name) => {
                write!(f, "profile name '{name}' is already in use")
            }
            ConfigError::InvalidScheduleWindow { name, start, end } => write!(
                f,
                "scheduled update '{name}' ends ({end}) before it starts ({start})"
            ),
            ConfigError::InvalidHorizon(years) => {
                write!(f, "simulation period must be positive, got {years} years")
            }
            ConfigError::DateArithmetic(e) => write!(f, "date calculation error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::DateArithmetic(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jiff::Error> for ConfigError {
    fn from(err: jiff::Error) -> Self {
        ConfigError::DateArithmetic(err)
    }
}

/// Anything that can stop a scenario run
#[derive(Debug)]
pub enum SimulationError {
    Config(ConfigError),
    Tick(TickError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "configuration error: {e}"),
            SimulationError::Tick(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::Tick(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(err: ConfigError) -> Self {
        SimulationError::Config(err)
    }
}

impl From<TickError> for SimulationError {
    fn from(err: TickError) -> Self {
        SimulationError::Tick(err)
    }
}

impl From<jiff::Error> for SimulationError {
    fn from(err: jiff::Error) -> Self {
        SimulationError::Config(ConfigError::DateArithmetic(err))
    }
}
