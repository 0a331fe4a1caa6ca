//! Calendar configuration and calendar-aligned ranges.
//!
//! [`TimeCalendar`] carries the two settings every calendar computation
//! depends on: which weekday starts a week and which month starts a
//! (fiscal) year. It is always passed explicitly; nothing here reads process
//! locale or the system clock.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::PeriodError;
use crate::range::TimeRange;

pub const MONTHS_PER_YEAR: u32 = 12;
pub const MONTHS_PER_QUARTER: u32 = 3;
pub const MONTHS_PER_HALF_YEAR: u32 = 6;
pub const DAYS_PER_WEEK: i64 = 7;

/// One half of a (fiscal) year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YearHalf {
    First,
    Second,
}

/// One quarter of a (fiscal) year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum YearQuarter {
    First,
    Second,
    Third,
    Fourth,
}

impl YearQuarter {
    /// Zero-based position within the year.
    pub fn index(self) -> u32 {
        match self {
            YearQuarter::First => 0,
            YearQuarter::Second => 1,
            YearQuarter::Third => 2,
            YearQuarter::Fourth => 3,
        }
    }

    fn from_index(index: u32) -> Self {
        match index {
            0 => YearQuarter::First,
            1 => YearQuarter::Second,
            2 => YearQuarter::Third,
            _ => YearQuarter::Fourth,
        }
    }
}

/// Calendar settings shared by all computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeCalendar")]
pub struct TimeCalendar {
    first_day_of_week: Weekday,
    year_base_month: u32,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawTimeCalendar {
    first_day_of_week: Weekday,
    year_base_month: u32,
}

impl Default for RawTimeCalendar {
    fn default() -> Self {
        let calendar = TimeCalendar::default();
        Self {
            first_day_of_week: calendar.first_day_of_week,
            year_base_month: calendar.year_base_month,
        }
    }
}

impl TryFrom<RawTimeCalendar> for TimeCalendar {
    type Error = PeriodError;

    fn try_from(raw: RawTimeCalendar) -> Result<Self, Self::Error> {
        TimeCalendar::new(raw.first_day_of_week, raw.year_base_month)
    }
}

impl Default for TimeCalendar {
    /// ISO 8601 weeks (Monday first) and calendar years (January).
    fn default() -> Self {
        Self {
            first_day_of_week: Weekday::Mon,
            year_base_month: 1,
        }
    }
}

impl TimeCalendar {
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidCalendar`] if `year_base_month` is not in `1..=12`.
    pub fn new(first_day_of_week: Weekday, year_base_month: u32) -> Result<Self, PeriodError> {
        if !(1..=MONTHS_PER_YEAR).contains(&year_base_month) {
            return Err(PeriodError::InvalidCalendar(format!(
                "year base month must be 1-12, got {year_base_month}"
            )));
        }
        Ok(Self {
            first_day_of_week,
            year_base_month,
        })
    }

    pub fn first_day_of_week(&self) -> Weekday {
        self.first_day_of_week
    }

    pub fn year_base_month(&self) -> u32 {
        self.year_base_month
    }

    // ── Week helpers ────────────────────────────────────────────────────

    /// How many days `weekday` is from the first day of the week.
    pub fn days_from_week_start(&self, weekday: Weekday) -> i64 {
        let first = self.first_day_of_week.num_days_from_monday();
        i64::from((weekday.num_days_from_monday() + 7 - first) % 7)
    }

    /// The first day of the week containing `date`.
    pub fn start_of_week(&self, date: NaiveDate) -> NaiveDate {
        let back = self.days_from_week_start(date.weekday());
        date.checked_sub_signed(Duration::days(back))
            .unwrap_or(NaiveDate::MIN)
    }

    // ── Fiscal year helpers ─────────────────────────────────────────────

    /// The fiscal year `(year, month)` belongs to, named after the calendar
    /// year in which that fiscal year starts.
    pub fn fiscal_year_of(&self, year: i32, month: u32) -> i32 {
        if month >= self.year_base_month {
            year
        } else {
            year - 1
        }
    }

    /// Zero-based month offset from the fiscal year start.
    pub fn fiscal_month_index(&self, month: u32) -> u32 {
        (month + MONTHS_PER_YEAR - self.year_base_month) % MONTHS_PER_YEAR
    }

    /// The fiscal quarter containing `month`.
    pub fn quarter_of_month(&self, month: u32) -> YearQuarter {
        YearQuarter::from_index(self.fiscal_month_index(month) / MONTHS_PER_QUARTER)
    }

    /// A monotonically increasing quarter number, used for quarter differences.
    pub fn quarter_index(&self, year: i32, month: u32) -> i64 {
        let fiscal_year = i64::from(self.fiscal_year_of(year, month));
        fiscal_year * 4 + i64::from(self.quarter_of_month(month).index())
    }

    // ── Calendar-aligned ranges ─────────────────────────────────────────

    /// The fiscal year `year`, starting on the first day of the base month.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDate`] if the year is out of range.
    pub fn year(&self, year: i32) -> Result<TimeRange, PeriodError> {
        months_from(year, self.year_base_month, MONTHS_PER_YEAR)
    }

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDate`] if the year is out of range.
    pub fn half_year(&self, year: i32, half: YearHalf) -> Result<TimeRange, PeriodError> {
        let offset = match half {
            YearHalf::First => 0,
            YearHalf::Second => MONTHS_PER_HALF_YEAR,
        };
        let (y, m) = shift_month(year, self.year_base_month, offset);
        months_from(y, m, MONTHS_PER_HALF_YEAR)
    }

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDate`] if the year is out of range.
    pub fn quarter(&self, year: i32, quarter: YearQuarter) -> Result<TimeRange, PeriodError> {
        let (y, m) = shift_month(
            year,
            self.year_base_month,
            quarter.index() * MONTHS_PER_QUARTER,
        );
        months_from(y, m, MONTHS_PER_QUARTER)
    }

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDate`] if `month` is not in `1..=12` or
    /// the year is out of range.
    pub fn month(&self, year: i32, month: u32) -> Result<TimeRange, PeriodError> {
        months_from(year, month, 1)
    }

    /// The week containing `date`, honoring the configured first day of week.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDate`] at the edges of the representable range.
    pub fn week(&self, date: NaiveDate) -> Result<TimeRange, PeriodError> {
        let start = self.start_of_week(date);
        days_from(start, DAYS_PER_WEEK)
    }

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDate`] at the edges of the representable range.
    pub fn day(&self, date: NaiveDate) -> Result<TimeRange, PeriodError> {
        days_from(date, 1)
    }

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDate`] if `hour` is above 23.
    pub fn hour(&self, date: NaiveDate, hour: u32) -> Result<TimeRange, PeriodError> {
        let start = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| PeriodError::InvalidDate(format!("{date} hour {hour}")))?;
        TimeRange::with_duration(start, Duration::hours(1))
            .map_err(|e| PeriodError::InvalidDate(e.to_string()))
    }
}

/// Midnight at the start of `date`.
pub(crate) fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Move `(year, month)` forward by `offset` months.
fn shift_month(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let zero_based = month - 1 + offset;
    (
        year + (zero_based / MONTHS_PER_YEAR) as i32,
        zero_based % MONTHS_PER_YEAR + 1,
    )
}

fn months_from(year: i32, month: u32, count: u32) -> Result<TimeRange, PeriodError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| PeriodError::InvalidDate(format!("{year}-{month:02}")))?;
    let next = first
        .checked_add_months(Months::new(count))
        .ok_or_else(|| PeriodError::InvalidDate(format!("{first} + {count} months")))?;
    TimeRange::new(start_of_day(first), start_of_day(next))
}

fn days_from(first: NaiveDate, count: i64) -> Result<TimeRange, PeriodError> {
    let next = first
        .checked_add_signed(Duration::days(count))
        .ok_or_else(|| PeriodError::InvalidDate(format!("{first} + {count} days")))?;
    TimeRange::new(start_of_day(first), start_of_day(next))
}
