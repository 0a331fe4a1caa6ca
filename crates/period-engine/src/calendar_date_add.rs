//! Duration arithmetic over a weekly working calendar.
//!
//! [`CalendarDateAdd`] synthesizes its admissible time from working weekdays
//! and working-hour windows, minus explicit exclusions (holidays, blackout
//! periods), and hands the result to the same walk [`crate::DateAdd`] uses.
//! The working calendar is unbounded in both directions, so it is generated
//! one day at a time in the direction of travel and never materialized.

use std::collections::{HashSet, VecDeque};

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::start_of_day;
use crate::date_add::{seek_backward, seek_forward, SeekBoundaryMode};
use crate::interval_set::{merge_periods, subtract_periods};
use crate::range::{DayHourRange, HourRangeInDay, TimeRange};

/// How many consecutive days without working time a calculation may scan
/// before giving up (about ten years).
pub const DEFAULT_MAX_SEARCH_DAYS: u32 = 3660;

const WORKING_WEEK_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Duration arithmetic that only counts working time.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, NaiveDate};
/// use period_engine::{CalendarDateAdd, HourRangeInDay, SeekBoundaryMode};
///
/// let mut calendar = CalendarDateAdd::new();
/// calendar.add_working_week_days();
/// calendar.working_hours.push(HourRangeInDay::hours(8, 18).unwrap());
///
/// // Friday 16:00 plus 4 working hours is Monday 10:00.
/// let friday = NaiveDate::from_ymd_opt(2011, 4, 1).unwrap().and_hms_opt(16, 0, 0).unwrap();
/// let end = calendar.add(friday, Duration::hours(4), SeekBoundaryMode::Next);
/// let monday = NaiveDate::from_ymd_opt(2011, 4, 4).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// assert_eq!(end, Some(monday));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarDateAdd {
    /// Working weekdays. Empty means every weekday is a working day.
    pub week_days: HashSet<Weekday>,
    /// Windows applied to every working day.
    pub working_hours: Vec<HourRangeInDay>,
    /// Windows applied only on their own weekday.
    pub working_day_hours: Vec<DayHourRange>,
    /// Always removed from the working time, at whatever granularity declared.
    pub exclude_periods: Vec<TimeRange>,
    /// Upper bound on consecutive days without working time scanned per
    /// calculation; any day that contributes working time resets the count.
    pub max_search_days: u32,
}

impl Default for CalendarDateAdd {
    fn default() -> Self {
        Self {
            week_days: HashSet::new(),
            working_hours: Vec::new(),
            working_day_hours: Vec::new(),
            exclude_periods: Vec::new(),
            max_search_days: DEFAULT_MAX_SEARCH_DAYS,
        }
    }
}

impl CalendarDateAdd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark Monday through Friday as working days.
    pub fn add_working_week_days(&mut self) {
        self.week_days.extend(WORKING_WEEK_DAYS);
    }

    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        self.week_days.is_empty() || self.week_days.contains(&weekday)
    }

    /// Add `offset` working time to `start`; negative offsets walk backward.
    pub fn add(
        &self,
        start: NaiveDateTime,
        offset: Duration,
        mode: SeekBoundaryMode,
    ) -> Option<NaiveDateTime> {
        let excludes = merge_periods(&self.exclude_periods);
        if offset < Duration::zero() {
            let periods = self.working_periods(start.date(), SeekDirection::Backward, excludes);
            seek_backward(periods, start, -offset, mode)
        } else {
            let periods = self.working_periods(start.date(), SeekDirection::Forward, excludes);
            seek_forward(periods, start, offset, mode)
        }
    }

    /// Subtract `offset` working time from `start`.
    pub fn subtract(
        &self,
        start: NaiveDateTime,
        offset: Duration,
        mode: SeekBoundaryMode,
    ) -> Option<NaiveDateTime> {
        self.add(start, -offset, mode)
    }

    /// The working periods inside `within`, in chronological order.
    ///
    /// At most `max_search_days` days from the start of `within` are scanned.
    pub fn available_periods(&self, within: &TimeRange) -> Vec<TimeRange> {
        let excludes = merge_periods(&self.exclude_periods);
        let first_day = within.start().date();
        let limit = first_day
            .checked_add_days(Days::new(u64::from(self.max_search_days)))
            .unwrap_or(NaiveDate::MAX);
        let mut periods = self.working_periods(first_day, SeekDirection::Forward, excludes);
        periods.last_day = Some(within.end().date().min(limit));
        periods.filter_map(|p| p.intersection(within)).collect()
    }

    /// Working periods of one day, sorted, with exclusions removed.
    fn day_periods(&self, date: NaiveDate, excludes: &[TimeRange]) -> Vec<TimeRange> {
        let weekday = date.weekday();
        if !self.is_working_day(weekday) {
            return Vec::new();
        }

        let windows: Vec<HourRangeInDay> =
            if self.working_hours.is_empty() && self.working_day_hours.is_empty() {
                vec![HourRangeInDay::whole_day()]
            } else {
                self.working_hours
                    .iter()
                    .copied()
                    .chain(
                        self.working_day_hours
                            .iter()
                            .filter(|d| d.day == weekday)
                            .map(|d| d.hours),
                    )
                    .collect()
            };

        let ranges: Vec<TimeRange> = windows
            .iter()
            .filter_map(|w| w.on(date))
            .filter(|r| !r.is_moment())
            .collect();
        if ranges.is_empty() {
            return ranges;
        }

        subtract_periods(&ranges, overlapping(excludes, date))
    }

    fn working_periods(
        &self,
        first_day: NaiveDate,
        direction: SeekDirection,
        excludes: Vec<TimeRange>,
    ) -> WorkingPeriods<'_> {
        WorkingPeriods {
            calendar: self,
            excludes,
            day: Some(first_day),
            last_day: None,
            direction,
            idle_days: 0,
            pending: VecDeque::new(),
        }
    }
}

/// The slice of sorted, merged `excludes` that touches `date`.
fn overlapping(excludes: &[TimeRange], date: NaiveDate) -> &[TimeRange] {
    let day_start = start_of_day(date);
    let day_end = date
        .succ_opt()
        .map(start_of_day)
        .unwrap_or(NaiveDateTime::MAX);
    let first = excludes.partition_point(|e| e.end() < day_start);
    let last = first + excludes[first..].partition_point(|e| e.start() < day_end);
    &excludes[first..last]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeekDirection {
    Forward,
    Backward,
}

/// Lazily generated working periods, day by day in one direction.
///
/// Ends after `max_search_days` consecutive days without working time, or
/// once it moves past `last_day`.
struct WorkingPeriods<'a> {
    calendar: &'a CalendarDateAdd,
    excludes: Vec<TimeRange>,
    day: Option<NaiveDate>,
    last_day: Option<NaiveDate>,
    direction: SeekDirection,
    idle_days: u32,
    pending: VecDeque<TimeRange>,
}

impl WorkingPeriods<'_> {
    fn is_past_last_day(&self, day: NaiveDate) -> bool {
        self.last_day.is_some_and(|last| match self.direction {
            SeekDirection::Forward => day > last,
            SeekDirection::Backward => day < last,
        })
    }
}

impl Iterator for WorkingPeriods<'_> {
    type Item = TimeRange;

    fn next(&mut self) -> Option<TimeRange> {
        loop {
            if let Some(period) = self.pending.pop_front() {
                return Some(period);
            }

            let day = self.day?;
            if self.is_past_last_day(day) {
                self.day = None;
                return None;
            }
            if self.idle_days >= self.calendar.max_search_days {
                debug!(
                    %day,
                    max_search_days = self.calendar.max_search_days,
                    "working calendar search limit reached"
                );
                self.day = None;
                return None;
            }

            let mut periods = self.calendar.day_periods(day, &self.excludes);
            if periods.is_empty() {
                self.idle_days += 1;
            } else {
                self.idle_days = 0;
            }
            if self.direction == SeekDirection::Backward {
                periods.reverse();
            }
            self.pending.extend(periods);

            self.day = match self.direction {
                SeekDirection::Forward => day.succ_opt(),
                SeekDirection::Backward => day.pred_opt(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::TimeOfDay;
    use crate::date_add::SeekBoundaryMode::{Fill, Next};

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2011, 4, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn day_range(d: u32) -> TimeRange {
        TimeRange::new(at(d, 0, 0), at(d + 1, 0, 0)).unwrap()
    }

    /// Mon–Fri, 08:00–18:00.
    fn office() -> CalendarDateAdd {
        let mut calendar = CalendarDateAdd::new();
        calendar.add_working_week_days();
        calendar
            .working_hours
            .push(HourRangeInDay::hours(8, 18).unwrap());
        calendar
    }

    // ── Working days ────────────────────────────────────────────────────

    #[test]
    fn test_unconfigured_calendar_is_plain_arithmetic() {
        let calendar = CalendarDateAdd::new();
        assert_eq!(
            calendar.add(at(1, 9, 0), Duration::hours(30), Next),
            Some(at(2, 15, 0))
        );
    }

    #[test]
    fn test_working_week_days_skip_weekend() {
        let mut calendar = CalendarDateAdd::new();
        calendar.add_working_week_days();
        // 2011-04-01 is a Friday
        assert_eq!(
            calendar.add(at(1, 12, 0), Duration::days(1), Next),
            Some(at(4, 12, 0))
        );
        assert_eq!(
            calendar.subtract(at(4, 12, 0), Duration::days(1), Next),
            Some(at(1, 12, 0))
        );
    }

    #[test]
    fn test_start_on_weekend_snaps_to_monday() {
        let calendar = office();
        assert_eq!(
            calendar.add(at(2, 10, 0), Duration::hours(1), Next),
            Some(at(4, 9, 0))
        );
        assert_eq!(
            calendar.add(at(2, 10, 0), Duration::zero(), Next),
            Some(at(4, 8, 0))
        );
    }

    // ── Working hours ───────────────────────────────────────────────────

    #[test]
    fn test_working_hours_with_holiday() {
        let mut calendar = office();
        calendar.exclude_periods.push(day_range(4));
        assert_eq!(
            calendar.add(at(1, 9, 0), Duration::hours(22), Next),
            Some(at(6, 11, 0))
        );
    }

    #[test]
    fn test_subtract_working_hours_with_holiday() {
        let mut calendar = office();
        calendar.exclude_periods.push(day_range(4));
        assert_eq!(
            calendar.subtract(at(6, 11, 0), Duration::hours(22), Next),
            Some(at(1, 9, 0))
        );
    }

    #[test]
    fn test_end_of_working_day_rolls_to_next_morning() {
        let calendar = office();
        // Exactly consuming Monday's remaining hours lands on Tuesday 08:00.
        assert_eq!(
            calendar.add(at(4, 16, 0), Duration::hours(2), Next),
            Some(at(5, 8, 0))
        );
        // After hours snaps forward.
        assert_eq!(
            calendar.add(at(4, 19, 0), Duration::hours(1), Next),
            Some(at(5, 9, 0))
        );
        // Walking back to the start of the working day stays on it.
        assert_eq!(
            calendar.subtract(at(5, 10, 0), Duration::hours(2), Next),
            Some(at(5, 8, 0))
        );
    }

    #[test]
    fn test_lunch_break() {
        let mut calendar = CalendarDateAdd::new();
        calendar.add_working_week_days();
        calendar
            .working_hours
            .push(HourRangeInDay::hours(8, 12).unwrap());
        calendar.working_hours.push(
            HourRangeInDay::new(TimeOfDay::new(13, 0).unwrap(), TimeOfDay::new(17, 30).unwrap())
                .unwrap(),
        );
        assert_eq!(
            calendar.add(at(4, 11, 0), Duration::hours(2), Next),
            Some(at(4, 14, 0))
        );
        assert_eq!(
            calendar.add(at(4, 11, 0), Duration::hours(6), Next),
            Some(at(5, 8, 30))
        );
    }

    #[test]
    fn test_sub_day_exclusion() {
        let mut calendar = office();
        calendar
            .exclude_periods
            .push(TimeRange::new(at(4, 10, 0), at(4, 14, 0)).unwrap());
        assert_eq!(
            calendar.add(at(4, 9, 0), Duration::hours(2), Next),
            Some(at(4, 15, 0))
        );
    }

    #[test]
    fn test_per_weekday_hours() {
        let mut calendar = CalendarDateAdd::new();
        calendar.add_working_week_days();
        calendar.working_day_hours.push(DayHourRange::new(
            Weekday::Fri,
            HourRangeInDay::hours(8, 12).unwrap(),
        ));
        calendar.working_day_hours.push(DayHourRange::new(
            Weekday::Mon,
            HourRangeInDay::hours(9, 17).unwrap(),
        ));
        // Friday 11:00 + 3h: 1h on Friday, 2h on Monday from 09:00.
        assert_eq!(
            calendar.add(at(1, 11, 0), Duration::hours(3), Next),
            Some(at(4, 11, 0))
        );
        // Tuesday has no template, so nothing after Monday is admissible
        // until the next Friday.
        assert_eq!(
            calendar.add(at(4, 16, 0), Duration::hours(2), Next),
            Some(at(8, 9, 0))
        );
    }

    // ── Search limit ────────────────────────────────────────────────────

    #[test]
    fn test_fully_excluded_span_hits_search_limit() {
        let mut calendar = office();
        calendar.max_search_days = 30;
        calendar
            .exclude_periods
            .push(TimeRange::new(at(1, 0, 0), at(1, 0, 0) + Duration::days(3650)).unwrap());
        assert_eq!(calendar.add(at(1, 9, 0), Duration::hours(1), Next), None);
        assert_eq!(calendar.add(at(1, 9, 0), Duration::hours(1), Fill), None);
    }

    #[test]
    fn test_fill_clamps_at_search_limit() {
        let mut calendar = office();
        calendar.max_search_days = 30;
        // Mon Apr 4 .. Fri Apr 8 leaves five working days of 10 hours.
        calendar
            .exclude_periods
            .push(TimeRange::new(at(9, 0, 0), at(9, 0, 0) + Duration::days(3650)).unwrap());
        assert_eq!(
            calendar.add(at(4, 8, 0), Duration::hours(100), Fill),
            Some(at(8, 18, 0))
        );
        assert_eq!(calendar.add(at(4, 8, 0), Duration::hours(100), Next), None);
    }

    #[test]
    fn test_search_limit_counts_only_idle_days() {
        let mut calendar = office();
        calendar.max_search_days = 7;
        // Nearly four weeks of working time, far more days than the limit.
        assert_eq!(
            calendar.add(at(4, 8, 0), Duration::hours(195), Next),
            Some(at(29, 13, 0))
        );
        assert_eq!(
            calendar.subtract(at(29, 13, 0), Duration::hours(195), Next),
            Some(at(4, 8, 0))
        );

        // A weekend plus a holiday week is fewer idle days than the limit.
        calendar.max_search_days = 10;
        calendar
            .exclude_periods
            .push(TimeRange::new(at(11, 0, 0), at(16, 0, 0)).unwrap());
        assert_eq!(
            calendar.add(at(8, 17, 0), Duration::hours(2), Next),
            Some(at(18, 9, 0))
        );
    }

    #[test]
    fn test_long_walk_beyond_default_limit() {
        let start = at(1, 0, 0);
        let offset = Duration::days(i64::from(DEFAULT_MAX_SEARCH_DAYS) + 340);
        let calendar = CalendarDateAdd::new();
        assert_eq!(calendar.add(start, offset, Next), Some(start + offset));
        assert_eq!(calendar.add(start, offset, Fill), Some(start + offset));

        let mut weekdays = CalendarDateAdd::new();
        weekdays.add_working_week_days();
        // 2600 weekdays are exactly 520 weeks from a Friday midnight.
        assert_eq!(
            weekdays.add(start, Duration::days(2600), Next),
            Some(start + Duration::weeks(520))
        );
    }

    // ── Available periods ───────────────────────────────────────────────

    #[test]
    fn test_available_periods_bounded_by_search_limit() {
        let mut calendar = office();
        calendar.max_search_days = 14;
        // Fifteen days scanned from the first representable day.
        let periods = calendar.available_periods(&TimeRange::anytime());
        assert!((10..=11).contains(&periods.len()), "got {}", periods.len());

        let window = TimeRange::new(at(1, 0, 0), at(1, 0, 0) + Duration::days(3650)).unwrap();
        let periods = calendar.available_periods(&window);
        // Fri Apr 1 through Fri Apr 15.
        assert_eq!(periods.len(), 11);
        assert_eq!(periods[10], TimeRange::new(at(15, 8, 0), at(15, 18, 0)).unwrap());
    }

    #[test]
    fn test_available_periods_in_window() {
        let mut calendar = office();
        calendar.exclude_periods.push(day_range(4));
        let window = TimeRange::new(at(1, 12, 0), at(5, 10, 0)).unwrap();
        assert_eq!(
            calendar.available_periods(&window),
            vec![
                TimeRange::new(at(1, 12, 0), at(1, 18, 0)).unwrap(),
                TimeRange::new(at(5, 8, 0), at(5, 10, 0)).unwrap(),
            ]
        );
    }
}
