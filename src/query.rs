// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query and export functionality for saved contribution reports.

use crate::report::ReportDataset;
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::{fs::File, io::Write};

pub enum QueryKind {
    Weekly { limit: usize },
    Total,
    Top { limit: usize },
}

pub enum ExportKind {
    Csv { output: String, table: String },
    Json { output: String, table: String },
}

pub fn run_query(report: &ReportDataset, query: QueryKind) -> Result<()> {
    match query {
        QueryKind::Weekly { limit } => query_weekly(report, limit),
        QueryKind::Total => query_total(report),
        QueryKind::Top { limit } => query_top(report, limit),
    }
    Ok(())
}

pub fn run_export(report: &ReportDataset, export: ExportKind) -> Result<()> {
    match export {
        ExportKind::Csv { output, table } => export_csv(report, output.as_ref(), &table)?,
        ExportKind::Json { output, table } => export_json(report, output.as_ref(), &table)?,
    }
    Ok(())
}

fn query_weekly(report: &ReportDataset, limit: usize) {
    println!("\n{:<12} {:>15}", "Week", "Contributions");
    println!("{}", "=".repeat(30));

    for week in report.weekly_trend.iter().rev().take(limit) {
        println!(
            "{:<12} {:>15}",
            week.week_start,
            format_number(week.total_count)
        );
    }
}

fn query_total(report: &ReportDataset) {
    let total: u64 = report.daily.iter().map(|d| d.total_count).sum();

    println!("\nTotal contributions");
    println!("  Users ranked: {}", report.top_contributors.len());
    println!("  Failed users: {}", report.failed_user_count);
    println!("  Total:        {}", format_number(total));

    if let (Some(first), Some(last)) = (report.daily.first(), report.daily.last()) {
        println!("\nData coverage: {} to {}", first.date, last.date);
    }
}

fn query_top(report: &ReportDataset, limit: usize) {
    println!("\n{:<5} {:<24} {:>15}", "Rank", "Login", "Contributions");
    println!("{}", "=".repeat(46));

    for contributor in report.top_contributors.iter().take(limit) {
        println!(
            "{:<5} {:<24} {:>15}",
            contributor.rank,
            contributor.login,
            format_number(contributor.total_count)
        );
    }
}

fn export_csv(report: &ReportDataset, output: &Utf8Path, table: &str) -> Result<()> {
    let mut file = File::create(output.as_std_path())
        .with_context(|| format!("failed to create file at {}", output))?;

    match table {
        "daily" => {
            writeln!(file, "date,total_count")?;
            for day in &report.daily {
                writeln!(file, "{},{}", day.date, day.total_count)?;
            }
        }
        "monthly" => {
            writeln!(file, "year,month,total_count")?;
            for month in &report.monthly {
                writeln!(file, "{},{},{}", month.year, month.month, month.total_count)?;
            }
        }
        "weekly" => {
            writeln!(file, "week_start,total_count")?;
            for week in &report.weekly_trend {
                writeln!(file, "{},{}", week.week_start, week.total_count)?;
            }
        }
        "top" => {
            writeln!(file, "rank,login,total_count")?;
            for contributor in &report.top_contributors {
                writeln!(
                    file,
                    "{},{},{}",
                    contributor.rank, contributor.login, contributor.total_count
                )?;
            }
        }
        _ => anyhow::bail!(
            "Unknown table type: {}. Use 'daily', 'monthly', 'weekly', or 'top'",
            table
        ),
    }

    println!("Exported to {}.", output);
    Ok(())
}

fn export_json(report: &ReportDataset, output: &Utf8Path, table: &str) -> Result<()> {
    let json = match table {
        "daily" => serde_json::to_string_pretty(&report.daily)?,
        "monthly" => serde_json::to_string_pretty(&report.monthly)?,
        "weekly" => serde_json::to_string_pretty(&report.weekly_trend)?,
        "top" => serde_json::to_string_pretty(&report.top_contributors)?,
        _ => anyhow::bail!(
            "Unknown table type: {}. Use 'daily', 'monthly', 'weekly', or 'top'",
            table
        ),
    };

    let mut file = File::create(output.as_std_path())
        .with_context(|| format!("failed to create file at {}", output))?;
    file.write_all(json.as_bytes())?;

    println!("Exported to {}.", output);
    Ok(())
}

/// Format a number with thousands separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for c in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::TopContributor;
    use crate::report::{DailyTotal, MonthlyTotal, WeeklyTotal};
    use camino::Utf8PathBuf;
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn report() -> ReportDataset {
        ReportDataset {
            generated_at: Utc::now(),
            daily: vec![
                DailyTotal {
                    date: date(2025, 1, 6),
                    total_count: 4,
                },
                DailyTotal {
                    date: date(2025, 1, 7),
                    total_count: 6,
                },
            ],
            monthly: vec![MonthlyTotal {
                year: 2025,
                month: 1,
                total_count: 10,
            }],
            top_contributors: vec![TopContributor {
                login: "alice".into(),
                total_count: 10,
                rank: 1,
            }],
            failed_user_count: 0,
            weekly_trend: vec![WeeklyTotal {
                week_start: date(2025, 1, 6),
                total_count: 10,
            }],
            moving_average: Vec::new(),
        }
    }

    #[test]
    fn test_export_csv_daily() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("daily.csv")).unwrap();

        export_csv(&report(), &path, "daily").unwrap();

        let content = std::fs::read_to_string(path.as_std_path()).unwrap();
        assert_eq!(
            content,
            "date,total_count\n2025-01-06,4\n2025-01-07,6\n"
        );
    }

    #[test]
    fn test_export_csv_rejects_unknown_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("out.csv")).unwrap();
        assert!(export_csv(&report(), &path, "bogus").is_err());
    }

    #[test]
    fn test_export_json_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("top.json")).unwrap();

        export_json(&report(), &path, "top").unwrap();

        let content = std::fs::read_to_string(path.as_std_path()).unwrap();
        let parsed: Vec<TopContributor> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0].login, "alice");
    }
}
