// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of per-user contribution series into group statistics.

use crate::fetch::FetchOutcome;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total contributions per date, across all successfully fetched users.
///
/// The domain is the union of all successful series' dates; dates whose
/// total is zero are present, not dropped.
pub type DailyAggregate = BTreeMap<NaiveDate, u64>;

/// Total contributions per (year, month), derived from the daily aggregate.
pub type MonthlyAggregate = BTreeMap<(i32, u32), u64>;

/// One row of the contributor ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopContributor {
    pub login: String,
    pub total_count: u64,
    /// Dense rank: equal totals share a rank, the next distinct total gets
    /// the previous rank plus one.
    pub rank: u32,
}

/// Everything the aggregation step produces for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub daily: DailyAggregate,
    pub monthly: MonthlyAggregate,
    pub top_contributors: Vec<TopContributor>,
    pub failed_user_count: usize,
}

/// Merge all per-user outcomes into group statistics.
///
/// Only successful series contribute to the sums; failures are counted and
/// surfaced, never silently dropped. Output is deterministic for a given
/// outcome map regardless of fetch completion order.
pub fn aggregate(outcomes: &BTreeMap<String, FetchOutcome>) -> BatchStats {
    let mut daily = DailyAggregate::new();
    let mut totals: Vec<(String, u64)> = Vec::new();
    let mut failed_user_count = 0;

    for (login, outcome) in outcomes {
        match outcome.series() {
            Some(series) => {
                for day in &series.days {
                    *daily.entry(day.date).or_insert(0) += day.count;
                }
                totals.push((login.clone(), series.total()));
            }
            None => failed_user_count += 1,
        }
    }

    let monthly = monthly_from_daily(&daily);
    let top_contributors = rank_contributors(totals);

    BatchStats {
        daily,
        monthly,
        top_contributors,
        failed_user_count,
    }
}

/// Sum daily totals into (year, month) buckets.
pub fn monthly_from_daily(daily: &DailyAggregate) -> MonthlyAggregate {
    let mut monthly = MonthlyAggregate::new();
    for (date, total) in daily {
        *monthly.entry((date.year(), date.month())).or_insert(0) += total;
    }
    monthly
}

/// Order users by total descending (ties broken by login ascending) and
/// assign dense ranks starting at 1.
fn rank_contributors(mut totals: Vec<(String, u64)>) -> Vec<TopContributor> {
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut ranked = Vec::with_capacity(totals.len());
    let mut rank = 0;
    let mut previous_total = None;
    for (login, total_count) in totals {
        if previous_total != Some(total_count) {
            rank += 1;
            previous_total = Some(total_count);
        }
        ranked.push(TopContributor {
            login,
            total_count,
            rank,
        });
    }
    ranked
}
