//! Error types for period-engine configuration.
//!
//! Only invalid configuration is an error. A duration that cannot be placed
//! inside the admissible time is reported as `None` by the arithmetic
//! operations, never through this type.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid hour range: {0}")]
    InvalidHourRange(String),

    #[error("Invalid calendar: {0}")]
    InvalidCalendar(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, PeriodError>;
