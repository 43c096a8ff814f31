use std::path::PathBuf;

use anyhow::Result;

use crate::{
    statistics::export::export_month, storage::report_storage::ReportStorage,
    utils::time::YearMonth,
};

use super::context::AppContext;

const EXPORT_DIR: &str = "exports";

/// Exports a month (the current one by default) into `out`, or `<app dir>/exports`.
pub async fn process_export_command(
    context: &AppContext,
    month: Option<YearMonth>,
    out: Option<PathBuf>,
) -> Result<()> {
    let now = context.clock().time();
    let month = month.unwrap_or_else(|| YearMonth::from_date(context.clock().today()));
    let out = out.unwrap_or_else(|| context.dir.join(EXPORT_DIR));

    let reports = context.reports.get_reports_by_month(month).await?;
    if reports.is_empty() {
        println!("No reports for {month}, writing an empty table");
    }
    let selected = context
        .calendar
        .selected_days_between(month.first_day(), month.last_day())
        .await?;
    let rates = context.settings.load().await?.rates();

    let path = export_month(&reports, month, &selected, rates, &out, now).await?;
    println!("Exported to {}", path.display());
    Ok(())
}
