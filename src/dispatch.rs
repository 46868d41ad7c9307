// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing and command dispatch.

use crate::{commands, config, query};
use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: Utf8PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Fetch and aggregate contribution statistics for a group of users
    Analyze {
        /// JSON file containing the user list
        #[arg(short, long)]
        users_file: Utf8PathBuf,

        /// Calendar year to analyze (mutually exclusive with --from/--to)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        year: Option<i32>,

        /// Start of the date range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// End of the date range (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Maximum parallel fetch workers (overrides config)
        #[arg(long)]
        max_workers: Option<usize>,

        /// Limit number of users to process (overrides config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Moving-average window in complete weeks (overrides config)
        #[arg(long)]
        window: Option<usize>,

        /// Output file for the report dataset
        #[arg(short, long, default_value = "contribution-report.json")]
        output: Utf8PathBuf,

        /// Only show the summary, do not save the report
        #[arg(long)]
        summary_only: bool,
    },

    /// Generate charts from a saved report
    Charts {
        /// Report file produced by `analyze`
        #[arg(short, long, default_value = "contribution-report.json")]
        report: Utf8PathBuf,

        /// Output directory for charts
        #[arg(short, long, default_value = "charts")]
        output: Utf8PathBuf,
    },

    /// Query a saved report
    Query {
        /// Report file produced by `analyze`
        #[arg(short, long, default_value = "contribution-report.json", global = true)]
        report: Utf8PathBuf,

        #[command(subcommand)]
        query_type: QueryType,
    },

    /// Export a saved report to various formats
    Export {
        /// Report file produced by `analyze`
        #[arg(short, long, default_value = "contribution-report.json", global = true)]
        report: Utf8PathBuf,

        #[command(subcommand)]
        export_type: ExportType,
    },
}

#[derive(Parser, Debug)]
enum QueryType {
    /// Show weekly contribution totals
    Weekly {
        /// Number of weeks to show (default: 12)
        #[arg(short = 'n', long, default_value = "12")]
        limit: usize,
    },

    /// Show total contributions
    Total,

    /// Show the contributor ranking
    Top {
        /// Number of contributors to show (default: 10)
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Parser, Debug)]
enum ExportType {
    /// Export to CSV format
    Csv {
        /// Output file path
        #[arg(short, long)]
        output: Utf8PathBuf,

        /// What to export: 'daily', 'monthly', 'weekly', or 'top'
        #[arg(short = 't', long, default_value = "weekly")]
        table: String,
    },

    /// Export to JSON format
    Json {
        /// Output file path
        #[arg(short, long)]
        output: Utf8PathBuf,

        /// What to export: 'daily', 'monthly', 'weekly', or 'top'
        #[arg(short = 't', long, default_value = "weekly")]
        table: String,
    },
}

/// Parse arguments and dispatch to the appropriate command.
pub async fn dispatch() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Analyze {
            users_file,
            year,
            from,
            to,
            max_workers,
            limit,
            window,
            output,
            summary_only,
        } => {
            let config = config::Config::load_or_default(&args.config)
                .context("failed to load configuration")?;
            let today = Utc::now().date_naive();
            let (start, end) = resolve_range(year, from, to, today)?;

            let opts = commands::AnalyzeOptions {
                users_file,
                start,
                end,
                max_workers: max_workers.unwrap_or(config.fetch.max_workers),
                limit: limit.or(config.fetch.limit),
                moving_average_window: window.unwrap_or(config.trend.moving_average_window),
                output,
                summary_only,
            };
            if opts.max_workers == 0 {
                bail!("--max-workers must be positive");
            }
            if opts.limit == Some(0) {
                bail!("--limit must be positive");
            }
            if opts.moving_average_window == 0 {
                bail!("--window must be positive");
            }

            commands::run_analyze(&config, opts).await?;
        }
        Command::Charts { report, output } => {
            commands::run_charts(&report, &output)?;
        }
        Command::Query { report, query_type } => {
            let query_kind = match query_type {
                QueryType::Weekly { limit } => query::QueryKind::Weekly { limit },
                QueryType::Total => query::QueryKind::Total,
                QueryType::Top { limit } => query::QueryKind::Top { limit },
            };
            commands::run_query(&report, query_kind)?;
        }
        Command::Export {
            report,
            export_type,
        } => {
            let export_kind = match export_type {
                ExportType::Csv { output, table } => query::ExportKind::Csv {
                    output: output.to_string(),
                    table,
                },
                ExportType::Json { output, table } => query::ExportKind::Json {
                    output: output.to_string(),
                    table,
                },
            };
            commands::run_export(&report, export_kind)?;
        }
    }

    Ok(())
}

/// Resolve the fetch date range from CLI flags. Explicit --from/--to wins,
/// then --year, then the 365 days ending today.
fn resolve_range(
    year: Option<i32>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    match (year, from, to) {
        (_, Some(start), Some(end)) => {
            if start > end {
                bail!("--from {} is after --to {}", start, end);
            }
            Ok((start, end))
        }
        (Some(year), _, _) => {
            let start = NaiveDate::from_ymd_opt(year, 1, 1)
                .with_context(|| format!("invalid year {}", year))?;
            let end = NaiveDate::from_ymd_opt(year, 12, 31)
                .with_context(|| format!("invalid year {}", year))?;
            Ok((start, end))
        }
        _ => Ok((today - Duration::days(364), today)),
    }
}
