//! Interval-set algebra over [`TimeRange`] lists.
//!
//! Sorts ranges by start time, merges overlapping or adjacent ranges, and
//! computes the gaps one set leaves inside another. The result of every
//! function here is sorted chronologically and free of overlaps, which is the
//! shape the duration walk in [`crate::date_add`] relies on.

use crate::range::TimeRange;

/// Merge overlapping or adjacent ranges into a sorted, non-overlapping list.
///
/// Moments covered by a longer range are absorbed. A moment sitting exactly
/// on the exclusive end of a range is kept as its own entry.
pub fn merge_periods(periods: &[TimeRange]) -> Vec<TimeRange> {
    let mut spans: Vec<TimeRange> = periods.iter().filter(|p| !p.is_moment()).copied().collect();
    spans.sort();

    let mut merged: Vec<TimeRange> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = merged.last_mut() {
            if span.start() <= last.end() {
                // Overlapping or adjacent: extend the current range.
                *last = TimeRange::from_ordered(last.start(), last.end().max(span.end()));
                continue;
            }
        }
        merged.push(span);
    }

    let mut moments: Vec<TimeRange> = periods
        .iter()
        .filter(|p| p.is_moment())
        .filter(|m| !merged.iter().any(|span| span.has_inside(m.start())))
        .copied()
        .collect();
    if moments.is_empty() {
        return merged;
    }

    moments.sort();
    moments.dedup();
    merged.extend(moments);
    merged.sort();
    merged
}

/// The parts of `within` not covered by any of `periods`.
///
/// A moment `within` survives unless a period contains its instant or an
/// identical moment is listed in `periods`.
pub fn period_gaps(periods: &[TimeRange], within: &TimeRange) -> Vec<TimeRange> {
    if within.is_moment() {
        let covered = periods.iter().any(|p| p.has_inside(within.start()));
        return if covered { Vec::new() } else { vec![*within] };
    }

    let busy: Vec<TimeRange> = merge_periods(periods)
        .into_iter()
        .filter(|p| !p.is_moment())
        .filter_map(|p| p.intersection(within))
        .collect();

    let mut gaps = Vec::new();
    let mut cursor = within.start();
    for period in &busy {
        if cursor < period.start() {
            gaps.push(TimeRange::from_ordered(cursor, period.start()));
        }
        cursor = cursor.max(period.end());
    }

    // Trailing gap after the last covered range.
    if cursor < within.end() {
        gaps.push(TimeRange::from_ordered(cursor, within.end()));
    }

    gaps
}

/// Remove every instant covered by `excludes` from `includes`.
pub fn subtract_periods(includes: &[TimeRange], excludes: &[TimeRange]) -> Vec<TimeRange> {
    let includes = merge_periods(includes);
    if excludes.is_empty() {
        return includes;
    }

    let excludes = merge_periods(excludes);
    let remaining: Vec<TimeRange> = includes
        .iter()
        .flat_map(|include| {
            let overlapping: Vec<TimeRange> = excludes
                .iter()
                .filter(|e| e.overlaps_with(include))
                .copied()
                .collect();
            period_gaps(&overlapping, include)
        })
        .collect();

    merge_periods(&remaining)
}

/// The admissible sequence `(⋃includes or anytime) − ⋃excludes`.
pub fn admissible_periods(includes: &[TimeRange], excludes: &[TimeRange]) -> Vec<TimeRange> {
    if includes.is_empty() {
        subtract_periods(&[TimeRange::anytime()], excludes)
    } else {
        subtract_periods(includes, excludes)
    }
}
