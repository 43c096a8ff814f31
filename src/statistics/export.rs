use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::{
    session::TimeReport,
    storage::settings::Rates,
    utils::{
        format::{format_clock, format_money},
        time::YearMonth,
    },
};

use super::DaySummary;

const HEADER: &str = "Date,Work Time,Pause Time,Non-working Day,Earnings";

/// `Work_Statistics_Apr_2025.csv`
pub fn export_file_name(month: YearMonth) -> String {
    format!(
        "Work_Statistics_{}.csv",
        month.first_day().format("%b_%Y")
    )
}

/// Renders reports of a month as CSV, one row per reported day.
pub fn month_csv(
    reports: &[TimeReport],
    selected: &BTreeSet<NaiveDate>,
    rates: Rates,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for report in reports {
        let non_working = selected.contains(&report.date);
        let day = DaySummary::new(report.clone(), non_working, rates, now);

        let row = [
            csv_escape(&day.date().format("%d %b %Y").to_string()),
            format_clock(day.work),
            format_clock(day.pause),
            if non_working { "Yes" } else { "No" }.to_string(),
            format_money(day.earnings),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Writes the CSV of `month` into `dir` and returns the path of the file.
pub async fn export_month(
    reports: &[TimeReport],
    month: YearMonth,
    selected: &BTreeSet<NaiveDate>,
    rates: Rates,
    dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(export_file_name(month));
    tokio::fs::write(&path, month_csv(reports, selected, rates, now)).await?;
    info!("Exported {} reports of {month} to {path:?}", reports.len());
    Ok(path)
}

fn csv_escape(s: &str) -> String {
    let needs_quote = s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r');
    if !needs_quote {
        return s.to_string();
    }
    format!("\"{}\"", s.replace('"', "\"\""))
}
