// Copyright (c) The contribution-trends Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chart generation for contribution trend visualization.

use crate::report::ReportDataset;
use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::NaiveDate;
use plotters::coord::types::RangedCoordi64;
use plotters::prelude::*;

const CHART_WIDTH: u32 = 1600;
const CHART_HEIGHT: u32 = 900;

// Typography - Inter font family
const FONT_FAMILY: &str = "Inter";
const TITLE_SIZE: i32 = 24;
const LABEL_SIZE: i32 = 16;
const AXIS_SIZE: i32 = 14;

// Colors - Modern, minimal palette
const BACKGROUND: RGBColor = RGBColor(250, 250, 252); // Off-white
const TEXT_PRIMARY: RGBColor = RGBColor(15, 23, 42); // Slate 900
const TEXT_SECONDARY: RGBColor = RGBColor(100, 116, 139); // Slate 500
const GRID_COLOR: RGBColor = RGBColor(226, 232, 240); // Slate 200
const ACCENT_BLUE: RGBColor = RGBColor(59, 130, 246); // Blue 500
const ACCENT_GREEN: RGBColor = RGBColor(34, 197, 94); // Green 500
const ACCENT_RED: RGBColor = RGBColor(239, 68, 68); // Red 500

/// Generate all charts from a report dataset.
pub fn generate_all_charts(report: &ReportDataset, output_dir: &Utf8Path) -> Result<()> {
    std::fs::create_dir_all(output_dir.as_std_path())
        .with_context(|| format!("failed to create output directory at {}", output_dir))?;

    println!("\nGenerating charts...");

    generate_daily_trend(report, &output_dir.join("daily-contributions.png"))?;
    generate_weekly_trend(report, &output_dir.join("weekly-trend.png"))?;
    generate_monthly_totals(report, &output_dir.join("monthly-totals.png"))?;
    generate_top_contributors(report, &output_dir.join("top-contributors.png"))?;

    println!("  ✓ Charts saved to {}", output_dir);
    Ok(())
}

/// Create a styled drawing area with background.
fn create_drawing_area(
    output_path: &Utf8Path,
) -> Result<DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>> {
    let root = BitMapBackend::new(output_path.as_std_path(), (CHART_WIDTH, CHART_HEIGHT))
        .into_drawing_area();
    root.fill(&BACKGROUND)?;
    Ok(root)
}

/// Configure common mesh styling for date-based charts.
fn configure_date_mesh<DB: DrawingBackend>(
    chart: &mut ChartContext<DB, Cartesian2d<RangedDate<NaiveDate>, RangedCoordi64>>,
) -> Result<()>
where
    <DB as DrawingBackend>::ErrorType: 'static,
{
    chart
        .configure_mesh()
        .bold_line_style(&GRID_COLOR.mix(0.3))
        .light_line_style(&TRANSPARENT)
        .x_labels(8)
        .y_labels(6)
        .x_label_style((FONT_FAMILY, AXIS_SIZE).into_font().color(&TEXT_SECONDARY))
        .y_label_style((FONT_FAMILY, AXIS_SIZE).into_font().color(&TEXT_SECONDARY))
        .x_label_formatter(&|date| date.format("%Y-%m-%d").to_string())
        .y_label_formatter(&|y| format_number(*y as u64))
        .disable_x_mesh()
        .draw()?;
    Ok(())
}

/// Generate daily total contributions chart (line chart).
fn generate_daily_trend(report: &ReportDataset, output_path: &Utf8Path) -> Result<()> {
    let data: Vec<(NaiveDate, i64)> = report
        .daily
        .iter()
        .map(|d| (d.date, d.total_count as i64))
        .collect();

    if data.is_empty() {
        return Ok(());
    }

    let root = create_drawing_area(output_path)?;

    let min_date = data.first().unwrap().0;
    let max_date = data.last().unwrap().0;
    let max_count = data.iter().map(|(_, c)| *c).max().unwrap().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Daily Contributions - Group Total",
            (FONT_FAMILY, TITLE_SIZE).into_font().color(&TEXT_PRIMARY),
        )
        .margin(60)
        .x_label_area_size(70)
        .y_label_area_size(100)
        .build_cartesian_2d(min_date..max_date, 0i64..max_count)?;

    configure_date_mesh(&mut chart)?;

    chart.draw_series(AreaSeries::new(
        data.iter().map(|(d, c)| (*d, *c)),
        0,
        ACCENT_BLUE.mix(0.15),
    ))?;

    chart.draw_series(LineSeries::new(
        data.iter().map(|(d, c)| (*d, *c)),
        ShapeStyle {
            color: ACCENT_BLUE.to_rgba(),
            filled: true,
            stroke_width: 2,
        },
    ))?;

    root.present()?;
    println!("  • daily-contributions.png");
    Ok(())
}

/// Generate weekly trend chart: complete-week totals with the trailing
/// moving average overlaid.
fn generate_weekly_trend(report: &ReportDataset, output_path: &Utf8Path) -> Result<()> {
    let weekly: Vec<(NaiveDate, f64)> = report
        .weekly_trend
        .iter()
        .map(|w| (w.week_start, w.total_count as f64))
        .collect();

    if weekly.is_empty() {
        return Ok(());
    }

    let root = create_drawing_area(output_path)?;

    let min_date = weekly.first().unwrap().0;
    let max_date = weekly.last().unwrap().0;
    let max_count = weekly.iter().map(|(_, c)| *c).fold(1.0f64, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Weekly Contributions - Complete Weeks with Moving Average",
            (FONT_FAMILY, TITLE_SIZE).into_font().color(&TEXT_PRIMARY),
        )
        .margin(60)
        .x_label_area_size(70)
        .y_label_area_size(100)
        .build_cartesian_2d(min_date..max_date, 0f64..max_count)?;

    chart
        .configure_mesh()
        .bold_line_style(&GRID_COLOR.mix(0.3))
        .light_line_style(&TRANSPARENT)
        .x_labels(8)
        .y_labels(6)
        .x_label_style((FONT_FAMILY, AXIS_SIZE).into_font().color(&TEXT_SECONDARY))
        .y_label_style((FONT_FAMILY, AXIS_SIZE).into_font().color(&TEXT_SECONDARY))
        .x_label_formatter(&|date| date.format("%Y-%m-%d").to_string())
        .y_label_formatter(&|y| format_number(*y as u64))
        .disable_x_mesh()
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            weekly.iter().map(|(d, c)| (*d, *c)),
            ShapeStyle {
                color: ACCENT_BLUE.to_rgba(),
                filled: true,
                stroke_width: 3,
            },
        ))?
        .label("Weekly total")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], ACCENT_BLUE.filled()));

    if !report.moving_average.is_empty() {
        chart
            .draw_series(LineSeries::new(
                report.moving_average.iter().map(|p| (p.week_start, p.average)),
                ShapeStyle {
                    color: ACCENT_RED.to_rgba(),
                    filled: true,
                    stroke_width: 3,
                },
            ))?
            .label("Moving average")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], ACCENT_RED.filled()));
    }

    chart
        .configure_series_labels()
        .label_font((FONT_FAMILY, LABEL_SIZE).into_font().color(&TEXT_PRIMARY))
        .background_style(&BACKGROUND)
        .border_style(&GRID_COLOR)
        .margin(15)
        .draw()?;

    root.present()?;
    println!("  • weekly-trend.png");
    Ok(())
}

/// Generate monthly totals chart (area chart).
fn generate_monthly_totals(report: &ReportDataset, output_path: &Utf8Path) -> Result<()> {
    let data: Vec<(NaiveDate, i64)> = report
        .monthly
        .iter()
        .filter_map(|m| {
            NaiveDate::from_ymd_opt(m.year, m.month, 1).map(|d| (d, m.total_count as i64))
        })
        .collect();

    if data.is_empty() {
        return Ok(());
    }

    let root = create_drawing_area(output_path)?;

    let min_date = data.first().unwrap().0;
    let max_date = data.last().unwrap().0;
    let max_count = data.iter().map(|(_, c)| *c).max().unwrap().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Monthly Contributions - Group Total",
            (FONT_FAMILY, TITLE_SIZE).into_font().color(&TEXT_PRIMARY),
        )
        .margin(60)
        .x_label_area_size(70)
        .y_label_area_size(100)
        .build_cartesian_2d(min_date..max_date, 0i64..max_count)?;

    configure_date_mesh(&mut chart)?;

    chart.draw_series(AreaSeries::new(
        data.iter().map(|(d, c)| (*d, *c)),
        0,
        ACCENT_GREEN.mix(0.15),
    ))?;

    chart.draw_series(LineSeries::new(
        data.iter().map(|(d, c)| (*d, *c)),
        ShapeStyle {
            color: ACCENT_GREEN.to_rgba(),
            filled: true,
            stroke_width: 2,
        },
    ))?;

    root.present()?;
    println!("  • monthly-totals.png");
    Ok(())
}

/// Generate top contributors chart (bar chart over ranked logins).
fn generate_top_contributors(report: &ReportDataset, output_path: &Utf8Path) -> Result<()> {
    let top: Vec<(String, i64)> = report
        .top_contributors
        .iter()
        .take(10)
        .map(|c| (c.login.clone(), c.total_count as i64))
        .collect();

    if top.is_empty() {
        return Ok(());
    }

    let root = create_drawing_area(output_path)?;

    let max_count = top.iter().map(|(_, c)| *c).max().unwrap().max(1);
    let logins: Vec<String> = top.iter().map(|(login, _)| login.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Top Contributors",
            (FONT_FAMILY, TITLE_SIZE).into_font().color(&TEXT_PRIMARY),
        )
        .margin(60)
        .x_label_area_size(70)
        .y_label_area_size(100)
        .build_cartesian_2d(0i64..top.len() as i64, 0i64..max_count)?;

    chart
        .configure_mesh()
        .bold_line_style(&GRID_COLOR.mix(0.3))
        .light_line_style(&TRANSPARENT)
        .x_labels(top.len())
        .y_labels(6)
        .x_label_style((FONT_FAMILY, AXIS_SIZE).into_font().color(&TEXT_SECONDARY))
        .y_label_style((FONT_FAMILY, AXIS_SIZE).into_font().color(&TEXT_SECONDARY))
        .x_label_formatter(&|x| {
            logins
                .get(*x as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_label_formatter(&|y| format_number(*y as u64))
        .disable_x_mesh()
        .draw()?;

    chart.draw_series(top.iter().enumerate().map(|(i, (_, count))| {
        Rectangle::new(
            [(i as i64, 0), (i as i64 + 1, *count)],
            ACCENT_BLUE.mix(0.8).filled(),
        )
    }))?;

    root.present()?;
    println!("  • top-contributors.png");
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

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
