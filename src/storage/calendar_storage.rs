use std::{collections::BTreeSet, ops::Deref, path::PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::{
    fs::operations::{read_locked_json, update_locked_json},
    utils::time::{month_to_record_name, YearMonth},
};

use super::entities::SelectedDaysEntity;

/// Storage of selected (non-working) days. Days are numbers inside of a month.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarStorage: Send + Sync {
    async fn get_selected_days(&self, month: YearMonth) -> Result<BTreeSet<u32>>;

    async fn save_selected_day(&self, month: YearMonth, day: u32) -> Result<()>;

    async fn remove_selected_day(&self, month: YearMonth, day: u32) -> Result<()>;
}

#[async_trait]
impl<T> CalendarStorage for T
where
    T: Deref + Send + Sync,
    T::Target: CalendarStorage,
{
    async fn get_selected_days(&self, month: YearMonth) -> Result<BTreeSet<u32>> {
        self.deref().get_selected_days(month).await
    }

    async fn save_selected_day(&self, month: YearMonth, day: u32) -> Result<()> {
        self.deref().save_selected_day(month, day).await
    }

    async fn remove_selected_day(&self, month: YearMonth, day: u32) -> Result<()> {
        self.deref().remove_selected_day(month, day).await
    }
}

/// Keeps a `YYYY-MM.json` document per month.
pub struct CalendarStorageImpl {
    calendar_dir: PathBuf,
}

impl CalendarStorageImpl {
    pub fn new(calendar_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&calendar_dir)?;

        Ok(Self { calendar_dir })
    }

    fn month_path(&self, month: YearMonth) -> PathBuf {
        self.calendar_dir
            .join(format!("{}.json", month_to_record_name(month)))
    }
}

#[async_trait]
impl CalendarStorage for CalendarStorageImpl {
    async fn get_selected_days(&self, month: YearMonth) -> Result<BTreeSet<u32>> {
        let entity: SelectedDaysEntity = read_locked_json(&self.month_path(month)).await?;
        Ok(entity.days)
    }

    async fn save_selected_day(&self, month: YearMonth, day: u32) -> Result<()> {
        update_locked_json(&self.month_path(month), |entity: &mut SelectedDaysEntity| {
            entity.days.insert(day);
        })
        .await?;
        debug!("Selected {month}-{day:02}");
        Ok(())
    }

    async fn remove_selected_day(&self, month: YearMonth, day: u32) -> Result<()> {
        update_locked_json(&self.month_path(month), |entity: &mut SelectedDaysEntity| {
            entity.days.remove(&day);
        })
        .await?;
        debug!("Unselected {month}-{day:02}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::utils::time::YearMonth;

    use super::{CalendarStorage, CalendarStorageImpl};

    #[tokio::test]
    async fn days_are_kept_per_month() -> Result<()> {
        let dir = tempdir()?;
        let storage = CalendarStorageImpl::new(dir.path().join("calendar"))?;
        let april = YearMonth::new(2025, 4).unwrap();
        let may = april.next().unwrap();

        storage.save_selected_day(april, 5).await?;
        storage.save_selected_day(april, 6).await?;
        storage.save_selected_day(april, 5).await?;
        storage.save_selected_day(may, 1).await?;

        assert_eq!(storage.get_selected_days(april).await?, BTreeSet::from([5, 6]));
        assert_eq!(storage.get_selected_days(may).await?, BTreeSet::from([1]));
        assert!(dir.path().join("calendar/2025-04.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn removing_days() -> Result<()> {
        let dir = tempdir()?;
        let storage = CalendarStorageImpl::new(dir.path().to_owned())?;
        let april = YearMonth::new(2025, 4).unwrap();

        storage.remove_selected_day(april, 3).await?;
        assert!(storage.get_selected_days(april).await?.is_empty());

        storage.save_selected_day(april, 3).await?;
        storage.save_selected_day(april, 12).await?;
        storage.remove_selected_day(april, 3).await?;
        assert_eq!(storage.get_selected_days(april).await?, BTreeSet::from([12]));
        Ok(())
    }
}
