//! # period-engine
//!
//! Deterministic calendar arithmetic over constrained time.
//!
//! The engine adds and subtracts durations while honoring included and
//! excluded periods and weekly working-hour calendars, decomposes the
//! difference between two instants into calendar-accurate components, and
//! enumerates calendar periods that match a filter. All computations are
//! pure: the calendar configuration is always passed in, never read from
//! the environment.
//!
//! ## Modules
//!
//! - [`range`] — `TimeRange`, time-of-day windows and per-weekday windows
//! - [`interval_set`] — Merge, gap and subtraction algebra over range lists
//! - [`calendar`] — Calendar configuration (week start, fiscal year) and calendar-aligned ranges
//! - [`date_add`] — Duration arithmetic over include/exclude periods
//! - [`calendar_date_add`] — Duration arithmetic over working days and hours
//! - [`date_diff`] — Elapsed components and unit totals between two instants
//! - [`collector`] — Enumerate years, months, days and hour windows matching a filter
//! - [`error`] — Error types

pub mod calendar;
pub mod calendar_date_add;
pub mod collector;
pub mod date_add;
pub mod date_diff;
pub mod error;
pub mod interval_set;
pub mod range;

pub use calendar::{TimeCalendar, YearHalf, YearQuarter};
pub use calendar_date_add::{CalendarDateAdd, DEFAULT_MAX_SEARCH_DAYS};
pub use collector::{CalendarPeriodCollector, CalendarPeriodCollectorFilter};
pub use date_add::{DateAdd, SeekBoundaryMode};
pub use date_diff::DateDiff;
pub use error::PeriodError;
pub use interval_set::{admissible_periods, merge_periods, period_gaps, subtract_periods};
pub use range::{DayHourRange, HourRangeInDay, TimeOfDay, TimeRange};
