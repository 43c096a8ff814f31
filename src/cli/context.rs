use std::{path::PathBuf, sync::Arc};

use anyhow::Result;

use crate::{
    calendar::Calendar,
    session::manager::SessionManager,
    storage::{
        calendar_dir, calendar_storage::CalendarStorageImpl, report_storage::ReportStorageImpl,
        reports_dir, settings::SettingsStore, settings_path,
    },
    utils::clock::{Clock, DefaultClock},
};

/// Everything a cli command may need, opened over one application directory.
pub struct AppContext {
    pub dir: PathBuf,
    pub reports: Arc<ReportStorageImpl>,
    pub manager: SessionManager<Arc<ReportStorageImpl>>,
    pub calendar: Calendar<CalendarStorageImpl>,
    pub settings: SettingsStore,
}

impl AppContext {
    pub async fn open(dir: PathBuf) -> Result<Self> {
        Self::open_with_clock(dir, Box::new(DefaultClock)).await
    }

    pub async fn open_with_clock(dir: PathBuf, clock: Box<dyn Clock>) -> Result<Self> {
        let reports = Arc::new(ReportStorageImpl::new(reports_dir(&dir))?);
        let settings = SettingsStore::new(settings_path(&dir));
        let calendar = Calendar::new(
            CalendarStorageImpl::new(calendar_dir(&dir))?,
            settings.clone(),
        );
        calendar.ensure_initialized(clock.today()).await?;

        Ok(Self {
            manager: SessionManager::new(reports.clone(), clock),
            dir,
            reports,
            calendar,
            settings,
        })
    }

    pub fn clock(&self) -> &dyn Clock {
        self.manager.clock()
    }
}
