// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations.

use crate::fetch::UserHandle;
use crate::{aggregate, batch, charts, config, github, query, report, trend, users};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

/// Options for one analyze run, resolved from CLI flags and config.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub users_file: Utf8PathBuf,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub max_workers: usize,
    pub limit: Option<usize>,
    pub moving_average_window: usize,
    pub output: Utf8PathBuf,
    pub summary_only: bool,
}

/// Run the analyze command: fetch, aggregate, derive trends, report.
pub async fn run_analyze(config: &config::Config, opts: AnalyzeOptions) -> Result<()> {
    let handles = users::load_users(&opts.users_file)?;
    if handles.is_empty() {
        anyhow::bail!("no users found in {}", opts.users_file);
    }

    let dispatched = opts.limit.unwrap_or(handles.len()).min(handles.len());
    println!(
        "Fetching contributions for {} users ({} to {})...",
        dispatched, opts.start, opts.end
    );

    let fetcher = Arc::new(github::GithubFetcher::new(
        config.retry_policy(),
        config.rate_limiter(),
    ));
    let (start, end) = (opts.start, opts.end);
    let fetch = move |handle: UserHandle| {
        let fetcher = Arc::clone(&fetcher);
        async move { fetcher.fetch(&handle, start, end).await }
    };

    let outcomes = batch::run_batch(&handles, opts.max_workers, opts.limit, true, fetch).await;

    let stats = aggregate::aggregate(&outcomes);
    let (weeks, moving_average) = trend::weekly_trend(&stats.daily, opts.moving_average_window);
    let dataset = report::assemble(&stats, &weeks, &moving_average, Utc::now())
        .context("aggregation produced an inconsistent dataset")?;

    print_summary(&stats, &dataset);

    if !opts.summary_only {
        report::save_report(&dataset, &opts.output)?;
        println!("\nReport saved to {}", opts.output);
    }

    Ok(())
}

/// Run the charts command.
pub fn run_charts(report_path: &Utf8Path, output_dir: &Utf8Path) -> Result<()> {
    let dataset = report::load_report(report_path)?;
    charts::generate_all_charts(&dataset, output_dir)?;
    Ok(())
}

/// Run the query command.
pub fn run_query(report_path: &Utf8Path, kind: query::QueryKind) -> Result<()> {
    let dataset = report::load_report(report_path)?;
    query::run_query(&dataset, kind)
}

/// Run the export command.
pub fn run_export(report_path: &Utf8Path, kind: query::ExportKind) -> Result<()> {
    let dataset = report::load_report(report_path)?;
    query::run_export(&dataset, kind)
}

fn print_summary(stats: &aggregate::BatchStats, dataset: &report::ReportDataset) {
    let total: u64 = stats.daily.values().sum();
    let active_users = stats
        .top_contributors
        .iter()
        .filter(|c| c.total_count > 0)
        .count();

    println!("\n=== Batch Contribution Summary ===");
    println!("Users fetched:       {}", stats.top_contributors.len());
    println!("Failed users:        {}", stats.failed_user_count);
    println!("Active users:        {}", active_users);
    println!("Total contributions: {}", format_number(total));

    if !stats.top_contributors.is_empty() {
        println!("\nTop 10 contributors:");
        for contributor in stats.top_contributors.iter().take(10) {
            println!(
                "  {:2}. {:<24} {:>12}",
                contributor.rank,
                contributor.login,
                format_number(contributor.total_count)
            );
        }
    }

    if let Some((date, count)) = stats.daily.iter().max_by_key(|(date, count)| (**count, **date)) {
        println!(
            "\nMost active day:   {} ({} contributions)",
            date,
            format_number(*count)
        );
    }
    if let Some(((year, month), count)) = stats
        .monthly
        .iter()
        .max_by_key(|(month, count)| (**count, **month))
    {
        println!(
            "Most active month: {}-{:02} ({} contributions)",
            year,
            month,
            format_number(*count)
        );
    }

    println!(
        "\nComplete weeks: {} ({} moving-average points)",
        dataset.weekly_trend.len(),
        dataset.moving_average.len()
    );
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
