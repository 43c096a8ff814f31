//! Aggregation of reports over a day, a week or a month. Builders are pure functions over
//! already loaded data, [load_statistics] collects that data from the storages.

pub mod export;

use std::{collections::BTreeSet, fmt::Display};

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::TryStreamExt;

use crate::{
    calendar::Calendar,
    session::TimeReport,
    storage::{
        calendar_storage::CalendarStorage, report_storage::ReportStorage, reports_between,
        settings::Rates,
    },
    utils::time::{week_start, YearMonth},
};

/// Period statistics are shown for. Weeks always start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsPeriod {
    Day(NaiveDate),
    Week(NaiveDate),
    Month(YearMonth),
}

impl StatisticsPeriod {
    pub fn week_of(date: NaiveDate) -> Self {
        Self::Week(week_start(date))
    }

    pub fn previous(self) -> Option<Self> {
        self.shift(-1)
    }

    pub fn next(self) -> Option<Self> {
        self.shift(1)
    }

    /// Moves the period `offset` steps, negative values go to the past. `None` when the
    /// result doesn't fit into supported dates.
    pub fn shift(self, offset: i32) -> Option<Self> {
        match self {
            Self::Day(date) => date
                .checked_add_signed(Duration::days(offset.into()))
                .map(Self::Day),
            Self::Week(start) => {
                let start = start.checked_add_signed(Duration::weeks(offset.into()))?;
                start.checked_add_signed(Duration::days(6))?;
                Some(Self::Week(start))
            }
            Self::Month(month) => month.shift(offset).map(Self::Month),
        }
    }

    /// Inclusive range of dates.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            Self::Day(date) => (date, date),
            Self::Week(start) => (start, start + Duration::days(6)),
            Self::Month(month) => (month.first_day(), month.last_day()),
        }
    }
}

impl Display for StatisticsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day(date) => write!(f, "{}", date.format("%a %d %b %Y")),
            Self::Week(_) => {
                let (start, end) = self.range();
                write!(f, "{} - {}", start.format("%d %b %Y"), end.format("%d %b %Y"))
            }
            Self::Month(month) => write!(f, "{}", month.first_day().format("%B %Y")),
        }
    }
}

/// Pay for `work`. Selected (non-working) days use the weekend rate.
pub fn earnings(work: Duration, non_working: bool, rates: Rates) -> f64 {
    let hours = work.num_seconds() as f64 / 3600.;
    let rate = if non_working {
        rates.weekend
    } else {
        rates.weekday
    };
    hours * rate
}

/// One reported day with everything computed at the moment of loading.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub report: TimeReport,
    pub work: Duration,
    pub pause: Duration,
    pub non_working: bool,
    pub earnings: f64,
}

impl DaySummary {
    pub fn new(report: TimeReport, non_working: bool, rates: Rates, now: DateTime<Utc>) -> Self {
        let work = report.calculate_work_time(now);
        Self {
            pause: report.pause_time(now),
            earnings: earnings(work, non_working, rates),
            work,
            non_working,
            report,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.report.date
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayStatistics {
    pub date: NaiveDate,
    pub non_working: bool,
    pub summary: Option<DaySummary>,
}

impl DayStatistics {
    pub fn build(
        date: NaiveDate,
        report: Option<TimeReport>,
        non_working: bool,
        rates: Rates,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            date,
            non_working,
            summary: report.map(|report| DaySummary::new(report, non_working, rates, now)),
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.summary.as_ref().map(|s| s.report.start)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.summary.as_ref().and_then(|s| s.report.end)
    }

    pub fn total_pause(&self) -> Duration {
        self.summary.as_ref().map_or(Duration::zero(), |s| s.pause)
    }
}

/// Totals shared by weeks and months.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub days: Vec<DaySummary>,
    pub total_work: Duration,
    pub average_work: Duration,
    pub total_pause: Duration,
    pub total_earnings: f64,
}

impl Totals {
    fn build(
        reports: Vec<TimeReport>,
        selected: &BTreeSet<NaiveDate>,
        rates: Rates,
        now: DateTime<Utc>,
    ) -> Self {
        let days: Vec<_> = reports
            .into_iter()
            .map(|report| {
                let non_working = selected.contains(&report.date);
                DaySummary::new(report, non_working, rates, now)
            })
            .collect();
        let total_work = days.iter().fold(Duration::zero(), |t, d| t + d.work);
        let total_pause = days.iter().fold(Duration::zero(), |t, d| t + d.pause);
        let average_work = if days.is_empty() {
            Duration::zero()
        } else {
            total_work / days.len() as i32
        };
        Self {
            total_earnings: days.iter().map(|d| d.earnings).sum(),
            days,
            total_work,
            average_work,
            total_pause,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekStatistics {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub totals: Totals,
    /// Selected days of the week, whether worked or not.
    pub non_working_days: usize,
}

impl WeekStatistics {
    pub fn build(
        start: NaiveDate,
        reports: Vec<TimeReport>,
        selected: &BTreeSet<NaiveDate>,
        rates: Rates,
        now: DateTime<Utc>,
    ) -> Self {
        let start = week_start(start);
        let end = start + Duration::days(6);
        Self {
            start,
            end,
            totals: Totals::build(reports, selected, rates, now),
            non_working_days: selected.range(start..=end).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthStatistics {
    pub month: YearMonth,
    pub totals: Totals,
    pub non_working_days: usize,
}

impl MonthStatistics {
    pub fn build(
        month: YearMonth,
        reports: Vec<TimeReport>,
        selected: &BTreeSet<NaiveDate>,
        rates: Rates,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            month,
            totals: Totals::build(reports, selected, rates, now),
            non_working_days: selected.iter().filter(|d| month.contains(**d)).count(),
        }
    }

    pub fn longest_day(&self) -> Option<&DaySummary> {
        self.totals.days.iter().max_by_key(|d| d.work)
    }

    pub fn shortest_day(&self) -> Option<&DaySummary> {
        self.totals.days.iter().min_by_key(|d| d.work)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeriodStatistics {
    Day(DayStatistics),
    Week(WeekStatistics),
    Month(MonthStatistics),
}

/// Loads everything needed for `period` and builds its statistics.
pub async fn load_statistics<R, C>(
    reports: &R,
    calendar: &Calendar<C>,
    rates: Rates,
    period: StatisticsPeriod,
    now: DateTime<Utc>,
) -> Result<PeriodStatistics>
where
    R: ReportStorage,
    C: CalendarStorage,
{
    let (start, end) = period.range();
    let selected = calendar.selected_days_between(start, end).await?;
    Ok(match period {
        StatisticsPeriod::Day(date) => PeriodStatistics::Day(DayStatistics::build(
            date,
            reports.get_report_by_date(date).await?,
            selected.contains(&date),
            rates,
            now,
        )),
        StatisticsPeriod::Week(start) => {
            let loaded = reports_between(reports, start, end).try_collect().await?;
            PeriodStatistics::Week(WeekStatistics::build(start, loaded, &selected, rates, now))
        }
        StatisticsPeriod::Month(month) => {
            let loaded = reports.get_reports_by_month(month).await?;
            PeriodStatistics::Month(MonthStatistics::build(month, loaded, &selected, rates, now))
        }
    })
}
