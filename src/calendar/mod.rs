//! Selection of non-working days. Selected days are paid with the weekend rate and are
//! highlighted in statistics. Weekends get selected automatically the first time a month is
//! initialized, after that the user owns the selection.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    storage::{calendar_storage::CalendarStorage, settings::SettingsStore},
    utils::time::{is_weekend, months_between, YearMonth},
};

pub const FIRST_SUPPORTED_YEAR: i32 = 1900;
pub const LAST_SUPPORTED_YEAR: i32 = 9999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("month {0} is outside of the supported range 1900-01..9999-12")]
    MonthOutOfRange(YearMonth),
    #[error("{month} has no day {day}")]
    InvalidDay { month: YearMonth, day: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthData {
    pub month: YearMonth,
    pub days: Vec<u32>,
    pub selected: BTreeSet<u32>,
}

impl MonthData {
    pub fn is_selected(&self, day: u32) -> bool {
        self.selected.contains(&day)
    }
}

pub fn days_of_month(month: YearMonth) -> Vec<u32> {
    (1..=month.length()).collect()
}

fn check_range(month: YearMonth) -> Result<(), CalendarError> {
    if (FIRST_SUPPORTED_YEAR..=LAST_SUPPORTED_YEAR).contains(&month.year()) {
        Ok(())
    } else {
        Err(CalendarError::MonthOutOfRange(month))
    }
}

pub struct Calendar<C: CalendarStorage> {
    storage: C,
    settings: SettingsStore,
}

impl<C: CalendarStorage> Calendar<C> {
    pub fn new(storage: C, settings: SettingsStore) -> Self {
        Self { storage, settings }
    }

    pub async fn month_data(&self, month: YearMonth) -> Result<MonthData> {
        check_range(month)?;
        Ok(MonthData {
            month,
            days: days_of_month(month),
            selected: self.storage.get_selected_days(month).await?,
        })
    }

    /// Flips the selection of a day, returns whether it's selected now.
    pub async fn toggle_day(&self, month: YearMonth, day: u32) -> Result<bool> {
        check_range(month)?;
        if month.day(day).is_none() {
            return Err(CalendarError::InvalidDay { month, day }.into());
        }
        let selected = self.storage.get_selected_days(month).await?;
        if selected.contains(&day) {
            self.storage.remove_selected_day(month, day).await?;
            debug!("Day {day} of {month} is a working day now");
            Ok(false)
        } else {
            self.storage.save_selected_day(month, day).await?;
            debug!("Day {day} of {month} is a non-working day now");
            Ok(true)
        }
    }

    /// Selects Saturdays and Sundays of a month. Happens only once per month, so weekends the
    /// user unselected stay unselected. Returns whether anything was done.
    pub async fn initialize_weekend_days(&self, month: YearMonth) -> Result<bool> {
        check_range(month)?;
        if self.settings.load().await?.is_month_initialized(month) {
            return Ok(false);
        }

        let selected = self.storage.get_selected_days(month).await?;
        for day in month
            .days()
            .filter(|date| is_weekend(*date))
            .map(|date| date.day())
            .filter(|day| !selected.contains(day))
        {
            self.storage.save_selected_day(month, day).await?;
        }

        self.settings
            .update(|s| {
                s.initialized_months.insert(month.to_string());
            })
            .await?;
        info!("Initialized weekends of {month}");
        Ok(true)
    }

    /// Makes sure the month of `today` has its weekends initialized. On the first launch the
    /// whole year of `today` is initialized.
    pub async fn ensure_initialized(&self, today: NaiveDate) -> Result<()> {
        let current = YearMonth::from_date(today);
        if self.settings.load().await?.first_launch {
            info!("First launch, initializing weekends of {}", today.year());
            for month in (1..=12).filter_map(|m| YearMonth::new(today.year(), m)) {
                self.initialize_weekend_days(month).await?;
            }
            self.settings.update(|s| s.first_launch = false).await?;
        }
        self.initialize_weekend_days(current).await?;
        Ok(())
    }

    pub async fn is_selected(&self, date: NaiveDate) -> Result<bool> {
        Ok(self
            .storage
            .get_selected_days(YearMonth::from_date(date))
            .await?
            .contains(&date.day()))
    }

    /// Selected dates within `start..=end`, the range may cross months.
    pub async fn selected_days_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>> {
        let mut result = BTreeSet::new();
        for month in months_between(start, end) {
            let days = self.storage.get_selected_days(month).await?;
            result.extend(
                days.into_iter()
                    .filter_map(|day| month.day(day))
                    .filter(|date| *date >= start && *date <= end),
            );
        }
        Ok(result)
    }
}
