use std::fmt::Write;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::ValueEnum;

use crate::{
    statistics::{load_statistics, DaySummary, PeriodStatistics, StatisticsPeriod, Totals},
    utils::{
        format::{format_hours, format_money, format_time_of_day},
        time::YearMonth,
    },
};

use super::{
    context::AppContext,
    dates::{parse_day, DateStyle, DATE_HELP, DATE_STYLE_HELP},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodKind {
    Day,
    Week,
    Month,
}

#[derive(Debug, clap::Args)]
pub struct StatsCommand {
    #[arg(value_enum)]
    period: PeriodKind,
    #[arg(long, short, help = DATE_HELP)]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = DATE_STYLE_HELP)]
    date_style: DateStyle,
    #[arg(
        long,
        short,
        default_value_t = 0,
        allow_hyphen_values = true,
        help = "Move by whole periods, -1 is the previous one"
    )]
    offset: i32,
}

pub fn period_of(kind: PeriodKind, date: NaiveDate) -> StatisticsPeriod {
    match kind {
        PeriodKind::Day => StatisticsPeriod::Day(date),
        PeriodKind::Week => StatisticsPeriod::week_of(date),
        PeriodKind::Month => StatisticsPeriod::Month(YearMonth::from_date(date)),
    }
}

pub async fn process_stats_command(
    context: &AppContext,
    StatsCommand {
        period,
        date,
        date_style,
        offset,
    }: StatsCommand,
) -> Result<()> {
    let now = context.clock().time();
    let date = parse_day(date.as_deref(), date_style, now.with_timezone(&Local))?;
    let period = period_of(period, date)
        .shift(offset)
        .ok_or_else(|| anyhow!("Offset {offset} leads outside of supported dates"))?;
    let rates = context.settings.load().await?.rates();

    let statistics =
        load_statistics(&context.reports, &context.calendar, rates, period, now).await?;
    print!("{}", render_statistics(period, &statistics));
    Ok(())
}

fn day_line(day: &DaySummary) -> String {
    format!(
        "{}\t{}\t{}{}",
        day.date().format("%a %d %b"),
        format_hours(day.work),
        format_money(day.earnings),
        if day.non_working { "\tnon-working" } else { "" }
    )
}

fn totals_lines(out: &mut String, totals: &Totals) -> std::fmt::Result {
    writeln!(out, "Total worked\t{}", format_hours(totals.total_work))?;
    writeln!(out, "Average day\t{}", format_hours(totals.average_work))?;
    writeln!(out, "Total pause\t{}", format_hours(totals.total_pause))?;
    writeln!(out, "Earnings\t{}", format_money(totals.total_earnings))
}

pub fn render_statistics(period: StatisticsPeriod, statistics: &PeriodStatistics) -> String {
    let mut out = String::new();
    // Writing into a String can't fail.
    let _ = write_statistics(&mut out, period, statistics);
    out
}

fn write_statistics(
    out: &mut String,
    period: StatisticsPeriod,
    statistics: &PeriodStatistics,
) -> std::fmt::Result {
    writeln!(out, "{period}")?;
    match statistics {
        PeriodStatistics::Day(day) => {
            let Some(summary) = &day.summary else {
                writeln!(out, "No work recorded")?;
                return Ok(());
            };
            let local = |time: chrono::DateTime<chrono::Utc>| {
                format_time_of_day(&time.with_timezone(&Local))
            };
            writeln!(out, "Started\t{}", local(summary.report.start))?;
            if let Some(end) = summary.report.end {
                writeln!(out, "Finished\t{}", local(end))?;
            }
            writeln!(out, "Worked\t{}", format_hours(summary.work))?;
            writeln!(out, "Paused\t{}", format_hours(day.total_pause()))?;
            if day.non_working {
                writeln!(out, "Non-working day")?;
            }
            writeln!(out, "Earnings\t{}", format_money(summary.earnings))?;
        }
        PeriodStatistics::Week(week) => {
            totals_lines(out, &week.totals)?;
            writeln!(out, "Non-working days\t{}", week.non_working_days)?;
            for day in &week.totals.days {
                writeln!(out, "{}", day_line(day))?;
            }
        }
        PeriodStatistics::Month(month) => {
            totals_lines(out, &month.totals)?;
            writeln!(out, "Non-working days\t{}", month.non_working_days)?;
            if let Some(longest) = month.longest_day() {
                writeln!(out, "Longest day\t{}", day_line(longest))?;
            }
            if let Some(shortest) = month.shortest_day() {
                writeln!(out, "Shortest day\t{}", day_line(shortest))?;
            }
        }
    }
    Ok(())
}
