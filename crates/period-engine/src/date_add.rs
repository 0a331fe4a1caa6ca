//! Duration arithmetic constrained by include and exclude periods.
//!
//! [`DateAdd`] adds a signed duration to an instant, letting time accumulate
//! only inside the admissible sequence `(⋃include or anytime) − ⋃exclude`.
//! The walk itself works over any chronologically ordered iterator of
//! admissible ranges, which is how
//! [`crate::calendar_date_add::CalendarDateAdd`] reuses it over a lazily
//! generated working calendar.
//!
//! # Boundary rules
//!
//! - Moving forward, `[s, e)` admits `[s, e)`; moving backward it admits
//!   `(s, e]`. An instant equal to the start of an exclusion is therefore
//!   inside that exclusion and is snapped past it.
//! - Moving forward, consumption that ends exactly on a range end continues
//!   into the next range when one exists; the result is that range's start.
//!   Moving backward, consumption that ends exactly on a range start stays
//!   there, so `subtract` undoes `add`.
//! - When the ranges run out, [`SeekBoundaryMode::Next`] gives `None` and
//!   [`SeekBoundaryMode::Fill`] gives the last reachable boundary.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::interval_set::admissible_periods;
use crate::range::TimeRange;

/// What to return when the requested duration cannot be fully consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeekBoundaryMode {
    /// Strict: no result unless the whole duration fits before the last boundary.
    #[default]
    Next,
    /// Lenient: clamp to the furthest reachable boundary.
    Fill,
}

/// Duration arithmetic over explicit include and exclude periods.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, NaiveDate};
/// use period_engine::{DateAdd, SeekBoundaryMode, TimeRange};
///
/// let day = |d| NaiveDate::from_ymd_opt(2011, 4, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
///
/// let mut date_add = DateAdd::new();
/// date_add.exclude_periods.push(TimeRange::new(day(15), day(20)).unwrap());
///
/// // Three days from April 12 reach the exclusion start, which jumps to its end.
/// let end = date_add.add(day(12), Duration::days(3), SeekBoundaryMode::Next);
/// assert_eq!(end, Some(day(20)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAdd {
    /// When non-empty, only these ranges are admissible.
    #[serde(default)]
    pub include_periods: Vec<TimeRange>,
    /// Always removed from the admissible time.
    #[serde(default)]
    pub exclude_periods: Vec<TimeRange>,
}

impl DateAdd {
    pub fn new() -> Self {
        Self::default()
    }

    /// The normalized admissible sequence for the current configuration.
    pub fn admissible_periods(&self) -> Vec<TimeRange> {
        admissible_periods(&self.include_periods, &self.exclude_periods)
    }

    /// Add `offset` to `start`, counting only admissible time.
    ///
    /// A negative `offset` walks backward. Returns `None` when the duration
    /// cannot be placed under `mode`.
    pub fn add(
        &self,
        start: NaiveDateTime,
        offset: Duration,
        mode: SeekBoundaryMode,
    ) -> Option<NaiveDateTime> {
        let admissible = self.admissible_periods();
        if admissible.is_empty() {
            return self.degenerate_moment(start, offset);
        }

        if offset < Duration::zero() {
            seek_backward(admissible.into_iter().rev(), start, -offset, mode)
        } else {
            seek_forward(admissible.into_iter(), start, offset, mode)
        }
    }

    /// Subtract `offset` from `start`; the same as `add(start, -offset, mode)`.
    pub fn subtract(
        &self,
        start: NaiveDateTime,
        offset: Duration,
        mode: SeekBoundaryMode,
    ) -> Option<NaiveDateTime> {
        self.add(start, -offset, mode)
    }

    /// A zero offset is satisfiable on a range that is both included and
    /// excluded, as long as `start` sits on it.
    fn degenerate_moment(&self, start: NaiveDateTime, offset: Duration) -> Option<NaiveDateTime> {
        if !offset.is_zero() {
            return None;
        }
        let on_shared_range = self.include_periods.iter().any(|include| {
            self.exclude_periods.contains(include)
                && (include.has_inside(start) || include.end() == start)
        });
        on_shared_range.then_some(start)
    }
}

/// Whether `range` admits `instant` when travelling forward.
fn admits_forward(range: &TimeRange, instant: NaiveDateTime) -> bool {
    range.end() > instant || (range.is_moment() && range.start() == instant)
}

/// Whether `range` admits `instant` when travelling backward.
fn admits_backward(range: &TimeRange, instant: NaiveDateTime) -> bool {
    range.start() < instant || (range.is_moment() && range.start() == instant)
}

/// Consume `remaining` forward through `ranges`, which must be sorted
/// ascending and non-overlapping.
pub(crate) fn seek_forward<I>(
    ranges: I,
    start: NaiveDateTime,
    remaining: Duration,
    mode: SeekBoundaryMode,
) -> Option<NaiveDateTime>
where
    I: Iterator<Item = TimeRange>,
{
    let mut ranges = ranges.skip_while(|r| !admits_forward(r, start));
    let mut current = ranges.next()?;
    let mut cursor = start.max(current.start());
    let mut remaining = remaining;
    trace!(%start, %cursor, "forward seek starts");

    loop {
        if remaining.is_zero() {
            return Some(cursor);
        }

        let available = current.end() - cursor;
        if available > remaining {
            return cursor.checked_add_signed(remaining);
        }
        remaining = remaining - available;

        match ranges.next() {
            Some(next) => {
                current = next;
                cursor = next.start();
            }
            None => {
                trace!(%remaining, "forward seek exhausted");
                return match mode {
                    SeekBoundaryMode::Fill => Some(current.end()),
                    SeekBoundaryMode::Next => None,
                };
            }
        }
    }
}

/// Consume `remaining` backward through `ranges`, which must be sorted
/// descending and non-overlapping.
pub(crate) fn seek_backward<I>(
    ranges: I,
    start: NaiveDateTime,
    remaining: Duration,
    mode: SeekBoundaryMode,
) -> Option<NaiveDateTime>
where
    I: Iterator<Item = TimeRange>,
{
    let mut ranges = ranges.skip_while(|r| !admits_backward(r, start));
    let mut current = ranges.next()?;
    let mut cursor = start.min(current.end());
    let mut remaining = remaining;
    trace!(%start, %cursor, "backward seek starts");

    loop {
        if remaining.is_zero() {
            return Some(cursor);
        }

        let available = cursor - current.start();
        if available >= remaining {
            return cursor.checked_sub_signed(remaining);
        }
        remaining = remaining - available;

        match ranges.next() {
            Some(previous) => {
                current = previous;
                cursor = previous.end();
            }
            None => {
                trace!(%remaining, "backward seek exhausted");
                return match mode {
                    SeekBoundaryMode::Fill => Some(current.start()),
                    SeekBoundaryMode::Next => None,
                };
            }
        }
    }
}
