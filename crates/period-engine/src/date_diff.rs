//! Calendar-aware difference between two instants.
//!
//! [`DateDiff`] reports the same difference two ways:
//!
//! - **elapsed components**: an age-style decomposition (years, then months,
//!   then days, hours, minutes, seconds), each taken from what the larger
//!   units leave over
//! - **totals**: the whole difference expressed in one unit. Years and
//!   quarters count fiscal boundaries crossed, months and weeks count calendar
//!   boundaries; days and smaller units truncate the raw elapsed time

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};

use crate::calendar::{TimeCalendar, DAYS_PER_WEEK, MONTHS_PER_YEAR};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// The difference between `date1` and `date2` (`date2 - date1`).
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use period_engine::{DateDiff, TimeCalendar};
///
/// let birth = NaiveDate::from_ymd_opt(2008, 10, 12).unwrap().and_hms_opt(15, 32, 44).unwrap();
/// let now = NaiveDate::from_ymd_opt(2010, 1, 3).unwrap().and_hms_opt(23, 22, 9).unwrap();
///
/// let diff = DateDiff::new(birth, now, &TimeCalendar::default());
/// assert_eq!(diff.elapsed_years(), 1);
/// assert_eq!(diff.elapsed_months(), 2);
/// assert_eq!(diff.elapsed_days(), 22);
/// assert_eq!(diff.months(), 14);
/// assert_eq!(diff.description(3), "1 year, 2 months, 22 days");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDiff {
    date1: NaiveDateTime,
    date2: NaiveDateTime,
    difference: Duration,
    elapsed: Elapsed,
    years: i64,
    quarters: i64,
    months: i64,
    weeks: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Elapsed {
    years: i64,
    months: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl DateDiff {
    pub fn new(date1: NaiveDateTime, date2: NaiveDateTime, calendar: &TimeCalendar) -> Self {
        let years = calendar.fiscal_year_of(date2.year(), date2.month())
            - calendar.fiscal_year_of(date1.year(), date1.month());
        let quarters = calendar.quarter_index(date2.year(), date2.month())
            - calendar.quarter_index(date1.year(), date1.month());
        let week1 = calendar.start_of_week(date1.date());
        let week2 = calendar.start_of_week(date2.date());

        Self {
            date1,
            date2,
            difference: date2 - date1,
            elapsed: elapsed(date1, date2),
            years: i64::from(years),
            quarters,
            months: total_months(date1, date2),
            weeks: (week2 - week1).num_days() / DAYS_PER_WEEK,
        }
    }

    pub fn date1(&self) -> NaiveDateTime {
        self.date1
    }

    pub fn date2(&self) -> NaiveDateTime {
        self.date2
    }

    /// The raw `date2 - date1`, without any rounding.
    pub fn difference(&self) -> Duration {
        self.difference
    }

    pub fn is_empty(&self) -> bool {
        self.difference.is_zero()
    }

    // ── Elapsed components ──────────────────────────────────────────────

    pub fn elapsed_years(&self) -> i64 {
        self.elapsed.years
    }

    pub fn elapsed_months(&self) -> i64 {
        self.elapsed.months
    }

    pub fn elapsed_days(&self) -> i64 {
        self.elapsed.days
    }

    pub fn elapsed_hours(&self) -> i64 {
        self.elapsed.hours
    }

    pub fn elapsed_minutes(&self) -> i64 {
        self.elapsed.minutes
    }

    pub fn elapsed_seconds(&self) -> i64 {
        self.elapsed.seconds
    }

    // ── Totals ──────────────────────────────────────────────────────────

    /// Fiscal year boundaries crossed, honoring the year base month.
    /// [`DateDiff::elapsed_years`] counts anniversaries instead.
    pub fn years(&self) -> i64 {
        self.years
    }

    /// Fiscal quarter boundaries crossed, honoring the year base month.
    pub fn quarters(&self) -> i64 {
        self.quarters
    }

    /// Whole months from `date1` to `date2`.
    pub fn months(&self) -> i64 {
        self.months
    }

    /// Week boundaries crossed, honoring the first day of week.
    pub fn weeks(&self) -> i64 {
        self.weeks
    }

    pub fn days(&self) -> i64 {
        self.difference.num_days()
    }

    pub fn hours(&self) -> i64 {
        self.difference.num_hours()
    }

    pub fn minutes(&self) -> i64 {
        self.difference.num_minutes()
    }

    pub fn seconds(&self) -> i64 {
        self.difference.num_seconds()
    }

    /// A human-readable summary of the elapsed components, e.g.
    /// `"1 year, 2 months, 22 days"`, using at most `precision` non-zero
    /// components. Describes the magnitude; the sign is not rendered.
    pub fn description(&self, precision: usize) -> String {
        let e = &self.elapsed;
        let units = [
            (e.years, "year"),
            (e.months, "month"),
            (e.days, "day"),
            (e.hours, "hour"),
            (e.minutes, "minute"),
            (e.seconds, "second"),
        ];

        let parts: Vec<String> = units
            .iter()
            .filter(|(value, _)| *value != 0)
            .take(precision.max(1))
            .map(|(value, unit)| {
                let value = value.abs();
                format!("{} {}{}", value, unit, if value == 1 { "" } else { "s" })
            })
            .collect();

        if parts.is_empty() {
            return "0 seconds".to_string();
        }
        parts.join(", ")
    }
}

/// Age-style decomposition, walking from `date1` toward `date2`.
fn elapsed(date1: NaiveDateTime, date2: NaiveDateTime) -> Elapsed {
    if date1 == date2 {
        return Elapsed::default();
    }
    let sign = if date2 > date1 { 1 } else { -1 };

    // Largest month count that does not overshoot date2.
    let mut months = (month_index(date2) - month_index(date1)).abs();
    let fits = |c: NaiveDateTime| if sign > 0 { c <= date2 } else { c >= date2 };
    let cursor = loop {
        match shift_months(date1, sign * months) {
            Some(c) if fits(c) => break c,
            _ => months -= 1,
        }
    };

    let rest = (date2 - cursor).num_seconds().abs();
    Elapsed {
        years: sign * (months / i64::from(MONTHS_PER_YEAR)),
        months: sign * (months % i64::from(MONTHS_PER_YEAR)),
        days: sign * (rest / SECONDS_PER_DAY),
        hours: sign * (rest % SECONDS_PER_DAY / SECONDS_PER_HOUR),
        minutes: sign * (rest % SECONDS_PER_HOUR / SECONDS_PER_MINUTE),
        seconds: sign * (rest % SECONDS_PER_MINUTE),
    }
}

fn total_months(date1: NaiveDateTime, date2: NaiveDateTime) -> i64 {
    let mut months = month_index(date2) - month_index(date1);
    let Some(compare) = compare_date(date1.year(), date1.month(), date2) else {
        return months;
    };

    if date2 > date1 && compare < date1 {
        months -= 1;
    } else if date2 < date1 && compare > date1 {
        months += 1;
    }
    months
}

/// `reference`'s day (clamped to the month length) and time in `year`/`month`.
fn compare_date(year: i32, month: u32, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let day = reference.day().min(days_in_month(year, month)?);
    Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(reference.time()))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.pred_opt()?.day())
}

fn month_index(dt: NaiveDateTime) -> i64 {
    i64::from(dt.year()) * i64::from(MONTHS_PER_YEAR) + i64::from(dt.month0())
}

/// Move by whole months, clamping the day to the target month's length.
fn shift_months(dt: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        dt.checked_add_months(magnitude)
    } else {
        dt.checked_sub_months(magnitude)
    }
}
