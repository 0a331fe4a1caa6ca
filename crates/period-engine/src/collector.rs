//! Enumerate calendar periods matching a multi-dimensional filter.
//!
//! [`CalendarPeriodCollector`] walks the calendar hierarchy (years, months,
//! days, hour windows) inside a bounding range and keeps every unit the
//! [`CalendarPeriodCollectorFilter`] accepts. Containers that fail the filter
//! or lie inside an exclusion are pruned before their children are visited.

use std::collections::{BTreeSet, HashSet};
use std::iter::successors;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::{start_of_day, TimeCalendar};
use crate::error::PeriodError;
use crate::range::{DayHourRange, HourRangeInDay, TimeRange};

/// Which periods to collect. An empty set places no restriction on its
/// dimension; dimensions combine with AND, values within one with OR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarPeriodCollectorFilter {
    /// Fiscal years, starting at the calendar's year base month, at every
    /// granularity.
    pub years: BTreeSet<i32>,
    /// Months of the year, `1..=12`.
    pub months: BTreeSet<u32>,
    /// Days of the month, `1..=31`.
    pub days: BTreeSet<u32>,
    pub week_days: HashSet<Weekday>,
    /// Hour windows emitted for each matching day by [`CalendarPeriodCollector::collect_hours`].
    pub collecting_hours: Vec<HourRangeInDay>,
    /// Hour windows emitted only on their own weekday.
    pub collecting_day_hours: Vec<DayHourRange>,
    pub exclude_periods: Vec<TimeRange>,
}

impl CalendarPeriodCollectorFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict days to Monday through Friday.
    pub fn add_working_week_days(&mut self) {
        self.week_days.extend([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]);
    }

    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidCalendar`] for months outside `1..=12`
    /// or days outside `1..=31`.
    pub fn validate(&self) -> Result<(), PeriodError> {
        if let Some(month) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(PeriodError::InvalidCalendar(format!(
                "filter month must be 1-12, got {month}"
            )));
        }
        if let Some(day) = self.days.iter().find(|d| !(1..=31).contains(*d)) {
            return Err(PeriodError::InvalidCalendar(format!(
                "filter day must be 1-31, got {day}"
            )));
        }
        Ok(())
    }

    fn matches_year(&self, year: i32) -> bool {
        self.years.is_empty() || self.years.contains(&year)
    }

    fn matches_month(&self, month: u32) -> bool {
        self.months.is_empty() || self.months.contains(&month)
    }

    fn matches_day(&self, date: NaiveDate) -> bool {
        (self.days.is_empty() || self.days.contains(&date.day()))
            && (self.week_days.is_empty() || self.week_days.contains(&date.weekday()))
    }

    fn is_excluded(&self, period: &TimeRange) -> bool {
        self.exclude_periods
            .iter()
            .any(|exclude| exclude.has_inside_range(period))
    }

    /// Hour windows that apply on `weekday`; `None` when none are configured.
    fn windows_for(&self, weekday: Weekday) -> Option<Vec<HourRangeInDay>> {
        if self.collecting_hours.is_empty() && self.collecting_day_hours.is_empty() {
            return None;
        }
        Some(
            self.collecting_hours
                .iter()
                .copied()
                .chain(
                    self.collecting_day_hours
                        .iter()
                        .filter(|d| d.day == weekday)
                        .map(|d| d.hours),
                )
                .collect(),
        )
    }
}

/// Collects the calendar periods inside `bounds` that match a filter.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use period_engine::{CalendarPeriodCollector, CalendarPeriodCollectorFilter, TimeCalendar};
///
/// let mut filter = CalendarPeriodCollectorFilter::new();
/// filter.add_working_week_days();
/// filter.months.insert(1);
///
/// let calendar = TimeCalendar::default();
/// let mut collector =
///     CalendarPeriodCollector::new(filter, calendar.year(2011).unwrap(), calendar).unwrap();
///
/// // January 2011 has 21 weekdays.
/// assert_eq!(collector.collect_days().len(), 21);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarPeriodCollector {
    filter: CalendarPeriodCollectorFilter,
    bounds: TimeRange,
    calendar: TimeCalendar,
    periods: Vec<TimeRange>,
}

impl CalendarPeriodCollector {
    /// # Errors
    ///
    /// Fails if the filter does not pass [`CalendarPeriodCollectorFilter::validate`].
    pub fn new(
        filter: CalendarPeriodCollectorFilter,
        bounds: TimeRange,
        calendar: TimeCalendar,
    ) -> Result<Self, PeriodError> {
        filter.validate()?;
        Ok(Self {
            filter,
            bounds,
            calendar,
            periods: Vec::new(),
        })
    }

    pub fn filter(&self) -> &CalendarPeriodCollectorFilter {
        &self.filter
    }

    pub fn bounds(&self) -> &TimeRange {
        &self.bounds
    }

    /// Periods produced by the last `collect_*` call.
    pub fn periods(&self) -> &[TimeRange] {
        &self.periods
    }

    /// Matching (fiscal) years.
    pub fn collect_years(&mut self) -> &[TimeRange] {
        let periods: Vec<TimeRange> = self
            .years()
            .filter(|(year, _)| self.filter.matches_year(*year))
            .map(|(_, period)| period)
            .filter(|period| !self.filter.is_excluded(period))
            .collect();
        self.store(periods)
    }

    /// Matching calendar months.
    pub fn collect_months(&mut self) -> &[TimeRange] {
        let periods: Vec<TimeRange> = self.matching_months().collect();
        self.store(periods)
    }

    /// Matching days.
    pub fn collect_days(&mut self) -> &[TimeRange] {
        let periods: Vec<TimeRange> = self
            .matching_months()
            .flat_map(|month| self.matching_days(month))
            .map(|(_, period)| period)
            .collect();
        self.store(periods)
    }

    /// One period per collecting window on each matching day, clipped to
    /// the day; the whole day when no window is configured.
    pub fn collect_hours(&mut self) -> &[TimeRange] {
        let mut periods = Vec::new();
        for month in self.matching_months() {
            for (date, day) in self.matching_days(month) {
                let Some(windows) = self.filter.windows_for(date.weekday()) else {
                    periods.push(day);
                    continue;
                };
                periods.extend(
                    windows
                        .iter()
                        .filter_map(|w| w.on(date))
                        .filter(|r| !r.is_moment())
                        .filter_map(|r| r.intersection(&day))
                        .filter(|r| !self.filter.is_excluded(r)),
                );
            }
        }
        self.store(periods)
    }

    fn store(&mut self, mut periods: Vec<TimeRange>) -> &[TimeRange] {
        periods.sort();
        periods.dedup();
        self.periods = periods;
        &self.periods
    }

    /// Clip a calendar unit to the bounds, dropping units outside them.
    fn clip(&self, unit: TimeRange) -> Option<TimeRange> {
        unit.intersection(&self.bounds)
    }

    /// Fiscal years overlapping the bounds, as `(year, clipped range)`.
    fn years(&self) -> impl Iterator<Item = (i32, TimeRange)> + '_ {
        let start = self.bounds.start();
        let first = self.calendar.fiscal_year_of(start.year(), start.month());
        successors(Some(first), |year| year.checked_add(1))
            .map_while(move |year| self.calendar.year(year).ok().map(|range| (year, range)))
            .take_while(move |(_, range)| range.start() <= self.bounds.end())
            .filter_map(move |(year, range)| self.clip(range).map(|clipped| (year, clipped)))
    }

    /// Calendar months overlapping the bounds that pass the (fiscal) year and
    /// month dimensions and are not excluded, clipped to the bounds.
    fn matching_months(&self) -> impl Iterator<Item = TimeRange> + '_ {
        let start = self.bounds.start();
        successors(
            self.calendar.month(start.year(), start.month()).ok(),
            move |month| {
                let next = month.end();
                self.calendar.month(next.year(), next.month()).ok()
            },
        )
        .take_while(move |month| month.start() <= self.bounds.end())
        .filter(move |month| {
            let first = month.start();
            let fiscal_year = self.calendar.fiscal_year_of(first.year(), first.month());
            self.filter.matches_year(fiscal_year) && self.filter.matches_month(first.month())
        })
        .filter_map(move |month| self.clip(month))
        .filter(move |month| !self.filter.is_excluded(month))
    }

    /// Days of the clipped `month` that pass the day dimensions and are not
    /// excluded, clipped to the bounds.
    fn matching_days(
        &self,
        month: TimeRange,
    ) -> impl Iterator<Item = (NaiveDate, TimeRange)> + '_ {
        successors(Some(month.start().date()), |date| date.succ_opt())
            .take_while(move |date| {
                let midnight = start_of_day(*date);
                midnight < month.end() || (month.is_moment() && midnight == month.start())
            })
            .filter(move |date| self.filter.matches_day(*date))
            .filter_map(move |date| {
                let day = self.calendar.day(date).ok()?;
                self.clip(day).map(|clipped| (date, clipped))
            })
            .filter(move |(_, day)| !self.filter.is_excluded(day))
    }
}
