// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weekly trend derivation: complete-week buckets and a trailing moving
//! average over the daily aggregate.

use crate::aggregate::DailyAggregate;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default trailing window for the moving average, in complete weeks.
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 4;

/// One Monday-to-Sunday bucket of the daily aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekBucket {
    /// Monday of the week.
    pub week_start: NaiveDate,
    pub total_count: u64,
    /// True only if all 7 dates of the week fall inside the fetched range.
    pub is_complete: bool,
}

/// Trailing mean over the last `window` complete weeks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
    pub week_start: NaiveDate,
    pub average: f64,
}

/// Get the Monday of the week containing the given date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday();
    date - chrono::Duration::days(days_from_monday as i64)
}

/// Bucket the daily aggregate into weeks and compute the trailing moving
/// average over complete weeks only.
///
/// A week is complete when its 7 dates all lie within
/// [min(daily), max(daily)]. Truncated boundary weeks are kept in the
/// bucket list, marked incomplete, and excluded from the moving average:
/// a partial week would bias the trend downward, so it is never zero-filled
/// or compared against full weeks.
pub fn weekly_trend(
    daily: &DailyAggregate,
    window: usize,
) -> (Vec<WeekBucket>, Vec<MovingAveragePoint>) {
    let (Some(first), Some(last)) = (daily.keys().next(), daily.keys().next_back()) else {
        return (Vec::new(), Vec::new());
    };
    let range_start = *first;
    let range_end = *last;

    let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for (date, count) in daily {
        *totals.entry(week_start(*date)).or_insert(0) += count;
    }

    let weeks: Vec<WeekBucket> = totals
        .into_iter()
        .map(|(start, total_count)| {
            let week_end = start + chrono::Duration::days(6);
            WeekBucket {
                week_start: start,
                total_count,
                is_complete: start >= range_start && week_end <= range_end,
            }
        })
        .collect();

    let moving_average = moving_average_points(
        weeks.iter().filter(|week| week.is_complete),
        window,
    );

    (weeks, moving_average)
}

/// Sliding-window mean over an ordered sequence of complete weeks. No point
/// is produced until `window` weeks of history exist.
fn moving_average_points<'a>(
    complete: impl Iterator<Item = &'a WeekBucket>,
    window: usize,
) -> Vec<MovingAveragePoint> {
    if window == 0 {
        return Vec::new();
    }

    let complete: Vec<&WeekBucket> = complete.collect();
    let mut points = Vec::new();
    let mut window_sum: u64 = 0;

    for (i, week) in complete.iter().enumerate() {
        window_sum += week.total_count;
        if i >= window {
            window_sum -= complete[i - window].total_count;
        }
        if i + 1 >= window {
            points.push(MovingAveragePoint {
                week_start: week.week_start,
                average: window_sum as f64 / window as f64,
            });
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Build a daily aggregate covering every date in [start, start+days),
    /// with the given count on Mondays and zero elsewhere.
    fn daily_with_monday_totals(start: NaiveDate, days: i64, monday_counts: &[u64]) -> DailyAggregate {
        let mut daily = DailyAggregate::new();
        let mut monday_index = 0;
        for offset in 0..days {
            let d = start + chrono::Duration::days(offset);
            let count = if d.weekday() == Weekday::Mon && monday_index < monday_counts.len() {
                let c = monday_counts[monday_index];
                monday_index += 1;
                c
            } else {
                0
            };
            daily.insert(d, count);
        }
        daily
    }

    #[test]
    fn test_week_start() {
        // 2025-11-19 is a Wednesday
        let d = date(2025, 11, 19);
        let start = week_start(d);

        // Should return Monday of that week (2025-11-17)
        assert_eq!(start, date(2025, 11, 17));
        assert_eq!(start.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_week_start_already_monday() {
        // 2025-11-17 is a Monday
        let d = date(2025, 11, 17);
        assert_eq!(week_start(d), d);
    }

    #[test]
    fn test_empty_daily_yields_no_weeks() {
        let (weeks, ma) = weekly_trend(&DailyAggregate::new(), 4);
        assert!(weeks.is_empty());
        assert!(ma.is_empty());
    }

    #[test]
    fn test_ten_day_window_starting_midweek() {
        // 2025-01-11 is a Saturday; ten days reach Monday 2025-01-20.
        // Only the week of 2025-01-13 is fully contained.
        let daily = daily_with_monday_totals(date(2025, 1, 11), 10, &[5, 5]);
        let (weeks, ma) = weekly_trend(&daily, 4);

        assert_eq!(weeks.len(), 3);
        let complete: Vec<&WeekBucket> = weeks.iter().filter(|w| w.is_complete).collect();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete[0].week_start, date(2025, 1, 13));
        assert!(ma.is_empty(), "four complete weeks are required for K=4");
    }

    #[test]
    fn test_incomplete_weeks_keep_their_partial_totals() {
        // Thursday start: the first bucket is incomplete but its observed
        // total is preserved, not zero-filled.
        let mut daily = DailyAggregate::new();
        daily.insert(date(2025, 1, 2), 3); // Thursday
        daily.insert(date(2025, 1, 3), 2);
        for offset in 3..13 {
            daily.insert(date(2025, 1, 1) + chrono::Duration::days(offset), 1);
        }

        let (weeks, _) = weekly_trend(&daily, 4);
        assert_eq!(weeks[0].week_start, date(2024, 12, 30));
        assert!(!weeks[0].is_complete);
        assert_eq!(weeks[0].total_count, 7);
    }

    #[test]
    fn test_moving_average_over_five_complete_weeks() {
        // Five complete weeks starting Monday 2025-01-06, weekly totals
        // 10, 20, 30, 40, 50.
        let daily = daily_with_monday_totals(date(2025, 1, 6), 35, &[10, 20, 30, 40, 50]);
        let (weeks, ma) = weekly_trend(&daily, 4);

        assert_eq!(weeks.iter().filter(|w| w.is_complete).count(), 5);
        assert_eq!(ma.len(), 2);
        assert_eq!(ma[0].week_start, date(2025, 1, 27));
        assert_eq!(ma[0].average, 25.0);
        assert_eq!(ma[1].week_start, date(2025, 2, 3));
        assert_eq!(ma[1].average, 35.0);
    }

    #[test]
    fn test_moving_average_ignores_incomplete_boundary_weeks() {
        // Complete weeks carry 10, 20, 30, 40; a trailing partial week with
        // a huge total must not leak into the average.
        let mut daily = daily_with_monday_totals(date(2025, 1, 6), 28, &[10, 20, 30, 40]);
        daily.insert(date(2025, 2, 3), 1000); // Monday of a truncated week

        let (weeks, ma) = weekly_trend(&daily, 4);
        let last = weeks.last().unwrap();
        assert!(!last.is_complete);
        assert_eq!(ma.len(), 1);
        assert_eq!(ma[0].average, 25.0);
    }

    #[test]
    fn test_sliding_window_matches_direct_mean() {
        let totals = [7u64, 1, 12, 4, 9, 30, 2, 18];
        let daily = daily_with_monday_totals(date(2025, 1, 6), 7 * totals.len() as i64, &totals);
        let (_, ma) = weekly_trend(&daily, 3);

        assert_eq!(ma.len(), totals.len() - 2);
        for (i, point) in ma.iter().enumerate() {
            let expected = totals[i..i + 3].iter().sum::<u64>() as f64 / 3.0;
            assert_eq!(point.average, expected);
        }
    }

    #[test]
    fn test_window_of_one_mirrors_weekly_totals() {
        let daily = daily_with_monday_totals(date(2025, 1, 6), 14, &[8, 6]);
        let (_, ma) = weekly_trend(&daily, 1);

        assert_eq!(ma.len(), 2);
        assert_eq!(ma[0].average, 8.0);
        assert_eq!(ma[1].average, 6.0);
    }
}
