//! Persistence of the application. Everything lives in the application directory:
//!  - `reports/YYYY-MM` keeps one JSON line per saved report, see [report_storage].
//!  - `calendar/YYYY-MM.json` keeps the selected (non-working) days of a month.
//!  - `settings.json` keeps rates and flags, see [settings].

pub mod calendar_storage;
pub mod entities;
pub mod report_storage;
pub mod settings;

use std::{future, path::Path, sync::Arc};

use anyhow::Result;
use chrono::NaiveDate;
use futures::{stream, Stream, StreamExt};
use tracing::error;

use crate::{
    session::TimeReport,
    utils::time::{months_between, YearMonth},
};

use report_storage::ReportStorage;

pub const REPORTS_DIR: &str = "reports";
pub const CALENDAR_DIR: &str = "calendar";
pub const SETTINGS_FILE: &str = "settings.json";

pub fn reports_dir(app_dir: &Path) -> std::path::PathBuf {
    app_dir.join(REPORTS_DIR)
}

pub fn calendar_dir(app_dir: &Path) -> std::path::PathBuf {
    app_dir.join(CALENDAR_DIR)
}

pub fn settings_path(app_dir: &Path) -> std::path::PathBuf {
    app_dir.join(SETTINGS_FILE)
}

/// Extracts reports with dates in `start..=end`, ordered by date. Month files are loaded a few
/// at a time.
pub fn reports_between(
    storage: impl ReportStorage,
    start: NaiveDate,
    end: NaiveDate,
) -> impl Stream<Item = Result<TimeReport>> {
    let storage = Arc::new(storage);

    let months = stream::iter(months_between(start, end).collect::<Vec<YearMonth>>())
        .map(move |month| {
            let storage = storage.clone();
            async move { (month, storage.get_reports_by_month(month).await) }
        })
        .buffered(4);

    months
        .flat_map(|(month, data)| match data {
            Ok(data) => stream::iter(data).map(Ok).boxed(),
            Err(e) => {
                error!("Failed to load reports of {month} {e}");
                stream::once(future::ready(Err(e))).boxed()
            }
        })
        .filter(move |v| {
            future::ready(match v {
                Ok(report) => report.date >= start && report.date <= end,
                Err(_) => true,
            })
        })
}
