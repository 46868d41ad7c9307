// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report dataset assembly and JSON persistence.

use crate::aggregate::{BatchStats, TopContributor};
use crate::trend::{MovingAveragePoint, WeekBucket};
use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

/// Raised when the assembled aggregates disagree with each other. This
/// guards against aggregation bugs, not expected runtime conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("aggregate consistency violated: daily total {daily_total} != monthly total {monthly_total}")]
pub struct DataConsistencyError {
    pub daily_total: u64,
    pub monthly_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTotal {
    /// Monday of the week.
    pub week_start: NaiveDate,
    pub total_count: u64,
}

/// The dataset handed to rendering and persistence collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDataset {
    pub generated_at: DateTime<Utc>,
    pub daily: Vec<DailyTotal>,
    pub monthly: Vec<MonthlyTotal>,
    pub top_contributors: Vec<TopContributor>,
    pub failed_user_count: usize,
    /// Complete weeks only; truncated boundary weeks are excluded.
    pub weekly_trend: Vec<WeeklyTotal>,
    pub moving_average: Vec<MovingAveragePoint>,
}

/// Package the batch statistics and weekly trend into the output schema.
///
/// Pure transformation: no I/O, no recomputation. The daily/monthly totals
/// must already agree; a mismatch is a fatal invariant failure.
pub fn assemble(
    stats: &BatchStats,
    weeks: &[WeekBucket],
    moving_average: &[MovingAveragePoint],
    generated_at: DateTime<Utc>,
) -> Result<ReportDataset, DataConsistencyError> {
    let daily_total: u64 = stats.daily.values().sum();
    let monthly_total: u64 = stats.monthly.values().sum();
    if daily_total != monthly_total {
        return Err(DataConsistencyError {
            daily_total,
            monthly_total,
        });
    }

    Ok(ReportDataset {
        generated_at,
        daily: stats
            .daily
            .iter()
            .map(|(&date, &total_count)| DailyTotal { date, total_count })
            .collect(),
        monthly: stats
            .monthly
            .iter()
            .map(|(&(year, month), &total_count)| MonthlyTotal {
                year,
                month,
                total_count,
            })
            .collect(),
        top_contributors: stats.top_contributors.clone(),
        failed_user_count: stats.failed_user_count,
        weekly_trend: weeks
            .iter()
            .filter(|week| week.is_complete)
            .map(|week| WeeklyTotal {
                week_start: week.week_start,
                total_count: week.total_count,
            })
            .collect(),
        moving_average: moving_average.to_vec(),
    })
}

/// Write the report to a JSON file.
pub fn save_report(report: &ReportDataset, path: &Utf8Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    fs::write(path.as_std_path(), json)
        .with_context(|| format!("failed to write report to {}", path))?;
    Ok(())
}

/// Load a previously saved report.
pub fn load_report(path: &Utf8Path) -> Result<ReportDataset> {
    let content = fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read report at {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse report at {}", path))
}
