//! Time range primitives.
//!
//! - [`TimeRange`]: an immutable half-open interval `[start, end)`; a range
//!   with `start == end` is a *moment* and contains exactly its own instant
//! - [`TimeOfDay`]: a wall-clock time with minute granularity (`00:00` to `24:00`)
//! - [`HourRangeInDay`]: a recurring window within a day (e.g. `08:00`–`18:00`)
//! - [`DayHourRange`]: an [`HourRangeInDay`] bound to a single weekday

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

// ── TimeRange ───────────────────────────────────────────────────────────────

/// A half-open interval `[start, end)` between two instants.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use period_engine::TimeRange;
///
/// let day = NaiveDate::from_ymd_opt(2011, 4, 12).unwrap();
/// let range = TimeRange::new(
///     day.and_hms_opt(8, 0, 0).unwrap(),
///     day.and_hms_opt(18, 0, 0).unwrap(),
/// )
/// .unwrap();
///
/// assert!(range.has_inside(day.and_hms_opt(8, 0, 0).unwrap()));
/// assert!(!range.has_inside(day.and_hms_opt(18, 0, 0).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = PeriodError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Create a range from `start` (inclusive) to `end` (exclusive).
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidRange`] if `end` is before `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::InvalidRange(format!(
                "end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Create a range starting at `start` lasting `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidRange`] if `duration` is negative or the
    /// end falls outside the representable range.
    pub fn with_duration(start: NaiveDateTime, duration: Duration) -> Result<Self, PeriodError> {
        let end = start.checked_add_signed(duration).ok_or_else(|| {
            PeriodError::InvalidRange(format!("{start} + {duration} is out of range"))
        })?;
        Self::new(start, end)
    }

    /// A zero-length range holding a single instant.
    pub fn moment(at: NaiveDateTime) -> Self {
        Self { start: at, end: at }
    }

    /// The range spanning every representable instant.
    pub fn anytime() -> Self {
        Self {
            start: NaiveDateTime::MIN,
            end: NaiveDateTime::MAX,
        }
    }

    /// Build a range from already ordered bounds.
    pub(crate) fn from_ordered(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_moment(&self) -> bool {
        self.start == self.end
    }

    pub fn is_anytime(&self) -> bool {
        self.start == NaiveDateTime::MIN && self.end == NaiveDateTime::MAX
    }

    /// Whether `instant` lies inside the range. The start is inside, the end
    /// is not; a moment contains only its own instant.
    pub fn has_inside(&self, instant: NaiveDateTime) -> bool {
        if self.is_moment() {
            return instant == self.start;
        }
        self.start <= instant && instant < self.end
    }

    /// Whether `other` lies entirely within this range.
    pub fn has_inside_range(&self, other: &TimeRange) -> bool {
        if other.is_moment() {
            return self.has_inside(other.start);
        }
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two ranges share at least one instant.
    pub fn overlaps_with(&self, other: &TimeRange) -> bool {
        match (self.is_moment(), other.is_moment()) {
            (true, _) => other.has_inside(self.start),
            (false, true) => self.has_inside(other.start),
            (false, false) => self.start < other.end && other.start < self.end,
        }
    }

    /// Whether the ranges overlap or touch at a boundary.
    pub fn intersects_with(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The shared part of two overlapping ranges.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        if !self.overlaps_with(other) {
            return None;
        }
        Some(TimeRange::from_ordered(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ── TimeOfDay ───────────────────────────────────────────────────────────────

/// A time of day with minute granularity. `24:00` denotes the end of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeOfDay")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

#[derive(Deserialize)]
struct RawTimeOfDay {
    hour: u32,
    minute: u32,
}

impl TryFrom<RawTimeOfDay> for TimeOfDay {
    type Error = PeriodError;

    fn try_from(raw: RawTimeOfDay) -> Result<Self, Self::Error> {
        TimeOfDay::new(raw.hour, raw.minute)
    }
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };
    pub const END_OF_DAY: TimeOfDay = TimeOfDay {
        hour: 24,
        minute: 0,
    };

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidTimeOfDay`] for hours above 24, minutes
    /// above 59, or any minute past `24:00`.
    pub fn new(hour: u32, minute: u32) -> Result<Self, PeriodError> {
        if hour > 24 || minute > 59 || (hour == 24 && minute != 0) {
            return Err(PeriodError::InvalidTimeOfDay(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Offset from midnight.
    pub fn offset(&self) -> Duration {
        Duration::minutes(i64::from(self.hour * 60 + self.minute))
    }

    /// This time of day on `date`; `24:00` maps to the following midnight.
    pub fn on(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        date.and_time(NaiveTime::MIN)
            .checked_add_signed(self.offset())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ── HourRangeInDay ──────────────────────────────────────────────────────────

/// A time-of-day window repeated on every qualifying day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHourRange")]
pub struct HourRangeInDay {
    start: TimeOfDay,
    end: TimeOfDay,
}

#[derive(Deserialize)]
struct RawHourRange {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<RawHourRange> for HourRangeInDay {
    type Error = PeriodError;

    fn try_from(raw: RawHourRange) -> Result<Self, Self::Error> {
        HourRangeInDay::new(raw.start, raw.end)
    }
}

impl HourRangeInDay {
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidHourRange`] if `end` is before `start`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::InvalidHourRange(format!(
                "{start}-{end} ends before it starts"
            )));
        }
        Ok(Self { start, end })
    }

    /// Whole-hour window, e.g. `HourRangeInDay::hours(8, 18)` for `08:00`–`18:00`.
    ///
    /// # Errors
    ///
    /// Fails like [`TimeOfDay::new`] and [`HourRangeInDay::new`].
    pub fn hours(start_hour: u32, end_hour: u32) -> Result<Self, PeriodError> {
        Self::new(TimeOfDay::new(start_hour, 0)?, TimeOfDay::new(end_hour, 0)?)
    }

    pub fn whole_day() -> Self {
        Self {
            start: TimeOfDay::MIDNIGHT,
            end: TimeOfDay::END_OF_DAY,
        }
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// The concrete range this window covers on `date`.
    pub fn on(&self, date: NaiveDate) -> Option<TimeRange> {
        let start = self.start.on(date)?;
        let end = self.end.on(date)?;
        Some(TimeRange::from_ordered(start, end))
    }
}

impl fmt::Display for HourRangeInDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ── DayHourRange ────────────────────────────────────────────────────────────

/// A working-hour window that applies only on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayHourRange {
    pub day: Weekday,
    pub hours: HourRangeInDay,
}

impl DayHourRange {
    pub fn new(day: Weekday, hours: HourRangeInDay) -> Self {
        Self { day, hours }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2011, 4, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn range(d1: u32, h1: u32, d2: u32, h2: u32) -> TimeRange {
        TimeRange::new(at(d1, h1), at(d2, h2)).unwrap()
    }

    // ── TimeRange tests ─────────────────────────────────────────────────

    #[test]
    fn test_range_rejects_end_before_start() {
        let err = TimeRange::new(at(2, 0), at(1, 0)).unwrap_err();
        assert!(matches!(err, PeriodError::InvalidRange(_)));
        assert!(err.to_string().contains("Invalid time range"), "got: {err}");
    }

    #[test]
    fn test_range_is_half_open() {
        let r = range(1, 8, 1, 18);
        assert!(r.has_inside(at(1, 8)));
        assert!(r.has_inside(at(1, 17)));
        assert!(!r.has_inside(at(1, 18)));
        assert!(!r.has_inside(at(1, 7)));
    }

    #[test]
    fn test_moment_contains_only_itself() {
        let m = TimeRange::moment(at(3, 12));
        assert!(m.is_moment());
        assert!(m.has_inside(at(3, 12)));
        assert!(!m.has_inside(at(3, 13)));
        assert_eq!(m.duration(), Duration::zero());
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        let a = range(1, 0, 2, 0);
        let b = range(2, 0, 3, 0);
        assert!(!a.overlaps_with(&b));
        assert!(a.intersects_with(&b));
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn test_intersection_of_overlapping_ranges() {
        let a = range(1, 0, 5, 0);
        let b = range(3, 0, 8, 0);
        assert_eq!(a.intersection(&b), Some(range(3, 0, 5, 0)));
    }

    #[test]
    fn test_moment_overlap_at_range_start_but_not_end() {
        let r = range(1, 0, 2, 0);
        assert!(r.overlaps_with(&TimeRange::moment(at(1, 0))));
        assert!(!r.overlaps_with(&TimeRange::moment(at(2, 0))));
    }

    #[test]
    fn test_anytime_contains_everything() {
        let any = TimeRange::anytime();
        assert!(any.is_anytime());
        assert!(any.has_inside_range(&range(1, 0, 30, 0)));
    }

    #[test]
    fn test_range_deserialize_validates() {
        let ok: TimeRange =
            serde_json::from_str(r#"{"start":"2011-04-01T00:00:00","end":"2011-04-02T00:00:00"}"#)
                .unwrap();
        assert_eq!(ok, range(1, 0, 2, 0));

        let bad = serde_json::from_str::<TimeRange>(
            r#"{"start":"2011-04-02T00:00:00","end":"2011-04-01T00:00:00"}"#,
        );
        assert!(bad.is_err());
    }

    // ── Hour range tests ────────────────────────────────────────────────

    #[test]
    fn test_time_of_day_bounds() {
        assert!(TimeOfDay::new(24, 0).is_ok());
        assert!(TimeOfDay::new(24, 1).is_err());
        assert!(TimeOfDay::new(12, 60).is_err());
        assert!(TimeOfDay::new(25, 0).is_err());
    }

    #[test]
    fn test_hour_range_rejects_negative_window() {
        let err = HourRangeInDay::hours(18, 8).unwrap_err();
        assert!(matches!(err, PeriodError::InvalidHourRange(_)));
    }

    #[test]
    fn test_hour_range_on_date() {
        let date = NaiveDate::from_ymd_opt(2011, 4, 1).unwrap();
        let window = HourRangeInDay::hours(8, 18).unwrap();
        assert_eq!(window.on(date), Some(range(1, 8, 1, 18)));
    }

    #[test]
    fn test_end_of_day_maps_to_next_midnight() {
        let date = NaiveDate::from_ymd_opt(2011, 4, 1).unwrap();
        assert_eq!(HourRangeInDay::whole_day().on(date), Some(range(1, 0, 2, 0)));
    }
}
