use anyhow::Result;
use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::{
    events::{EventBus, SessionEvent},
    storage::report_storage::ReportStorage,
    utils::clock::Clock,
};

use super::{SessionError, TimeReport, WorkSession};

/// Session use cases on top of the report storage. Storage is the single source of truth, every
/// transition is loaded, applied and saved, so the cli and the daemon can work on the same data.
pub struct SessionManager<R: ReportStorage> {
    storage: R,
    clock: Box<dyn Clock>,
    bus: Option<EventBus>,
}

impl<R: ReportStorage> SessionManager<R> {
    pub fn new(storage: R, clock: Box<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            bus: None,
        }
    }

    /// Successful transitions get published on the bus.
    pub fn with_bus(self, bus: EventBus) -> Self {
        Self {
            bus: Some(bus),
            ..self
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(bus) = &self.bus {
            bus.emit(event);
        }
    }

    pub async fn report_for(&self, date: NaiveDate) -> Result<Option<TimeReport>> {
        self.storage.get_report_by_date(date).await
    }

    /// What should be shown for `date`: the open session (possibly from the day before) with
    /// its worked time brought up to now, or the stored report.
    pub async fn live_report(&self, date: NaiveDate) -> Result<Option<TimeReport>> {
        match self.current_session(date).await? {
            Some(session) => Ok(Some(session.to_report(self.clock.time()))),
            None => self.report_for(date).await,
        }
    }

    /// Starts work on `date`. A session that is still open, including one left running since
    /// the day before, is returned as is. A finished day can't be started again.
    pub async fn start_session(&self, date: NaiveDate) -> Result<WorkSession> {
        if let Some(session) = self.current_session(date).await? {
            debug!("Attaching to the open session of {}", session.date);
            return Ok(session);
        }
        if self.storage.get_report_by_date(date).await?.is_some() {
            return Err(SessionError::AlreadyCompleted(date).into());
        }
        let now = self.clock.time();
        let session = WorkSession::create(date, now);
        self.storage.save_report(&session.to_report(now)).await?;
        info!("Started session for {date}");
        self.emit(SessionEvent::Started(session.clone()));
        Ok(session)
    }

    /// Open session of `date`. A session started the day before and still open is also
    /// returned, work may go on past midnight.
    pub async fn current_session(&self, date: NaiveDate) -> Result<Option<WorkSession>> {
        if let Some(report) = self.storage.get_report_by_date(date).await? {
            if !report.is_completed() {
                return Ok(Some(WorkSession::from(report)));
            }
        }
        let Some(previous) = date.checked_sub_signed(Duration::days(1)) else {
            return Ok(None);
        };
        Ok(self
            .storage
            .get_report_by_date(previous)
            .await?
            .filter(|report| !report.is_completed())
            .map(WorkSession::from))
    }

    async fn open_session(&self, date: NaiveDate) -> Result<WorkSession> {
        match self.current_session(date).await? {
            Some(session) => Ok(session),
            None => match self.storage.get_report_by_date(date).await? {
                Some(_) => Err(SessionError::AlreadyStopped.into()),
                None => Err(SessionError::NoSession(date).into()),
            },
        }
    }

    pub async fn pause_session(&self, date: NaiveDate) -> Result<WorkSession> {
        let mut session = self.open_session(date).await?;
        let now = self.clock.time();
        session.pause(now)?;
        self.storage.save_report(&session.to_report(now)).await?;
        info!("Paused session of {}", session.date);
        self.emit(SessionEvent::PausedResumed {
            session: session.clone(),
            paused: true,
        });
        Ok(session)
    }

    pub async fn resume_session(&self, date: NaiveDate) -> Result<WorkSession> {
        let mut session = self.open_session(date).await?;
        let now = self.clock.time();
        session.resume(now)?;
        self.storage.save_report(&session.to_report(now)).await?;
        info!("Resumed session of {}", session.date);
        self.emit(SessionEvent::PausedResumed {
            session: session.clone(),
            paused: false,
        });
        Ok(session)
    }

    pub async fn stop_session(&self, date: NaiveDate) -> Result<TimeReport> {
        let mut session = self.open_session(date).await?;
        let report = session.stop(self.clock.time())?;
        self.storage.save_report(&report).await?;
        info!(
            "Stopped session of {} after {} minutes of work",
            report.date,
            report.work_time.num_minutes()
        );
        self.emit(SessionEvent::Stopped(report.clone()));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        events::{EventBus, SessionEvent},
        session::{SessionError, SessionStatus, WorkSession},
        storage::report_storage::{MockReportStorage, ReportStorage, ReportStorageImpl},
        utils::{clock::OffsetClock, logging::TEST_LOGGING},
    };

    use super::SessionManager;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 7).unwrap()
    }

    fn clock() -> OffsetClock {
        OffsetClock::new(Utc.with_ymd_and_hms(2025, 4, 7, 9, 0, 0).unwrap())
            .with_today(test_date())
    }

    fn manager(dir: &std::path::Path) -> Result<SessionManager<ReportStorageImpl>> {
        Ok(SessionManager::new(
            ReportStorageImpl::new(dir.to_owned())?,
            Box::new(clock()),
        ))
    }

    fn session_error(e: anyhow::Error) -> SessionError {
        e.downcast::<SessionError>().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn full_day_flow() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let manager = manager(dir.path())?;

        manager.start_session(test_date()).await?;
        tokio::time::advance(StdDuration::from_secs(2 * 3600)).await;
        let paused = manager.pause_session(test_date()).await?;
        assert_eq!(paused.status(), SessionStatus::Paused);

        tokio::time::advance(StdDuration::from_secs(3600)).await;
        let resumed = manager.resume_session(test_date()).await?;
        assert_eq!(resumed.status(), SessionStatus::Running);

        tokio::time::advance(StdDuration::from_secs(5 * 3600)).await;
        let report = manager.stop_session(test_date()).await?;
        assert_eq!(report.work_time, Duration::hours(7));
        assert_eq!(report.pause_time(report.end.unwrap()), Duration::hours(1));

        assert_eq!(manager.report_for(test_date()).await?, Some(report));
        assert_eq!(manager.current_session(test_date()).await?, None);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn start_reattaches_to_open_session() -> Result<()> {
        let dir = tempdir()?;
        let manager = manager(dir.path())?;

        let first = manager.start_session(test_date()).await?;
        tokio::time::advance(StdDuration::from_secs(600)).await;
        let second = manager.start_session(test_date()).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn completed_day_cannot_be_restarted() -> Result<()> {
        let dir = tempdir()?;
        let manager = manager(dir.path())?;

        manager.start_session(test_date()).await?;
        manager.stop_session(test_date()).await?;

        let e = manager.start_session(test_date()).await.unwrap_err();
        assert_eq!(session_error(e), SessionError::AlreadyCompleted(test_date()));
        let e = manager.stop_session(test_date()).await.unwrap_err();
        assert_eq!(session_error(e), SessionError::AlreadyStopped);
        let e = manager.pause_session(test_date()).await.unwrap_err();
        assert_eq!(session_error(e), SessionError::AlreadyStopped);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn transition_guards() -> Result<()> {
        let dir = tempdir()?;
        let manager = manager(dir.path())?;

        let e = manager.pause_session(test_date()).await.unwrap_err();
        assert_eq!(session_error(e), SessionError::NoSession(test_date()));

        manager.start_session(test_date()).await?;
        let e = manager.resume_session(test_date()).await.unwrap_err();
        assert_eq!(session_error(e), SessionError::NotPaused);

        manager.pause_session(test_date()).await?;
        let e = manager.pause_session(test_date()).await.unwrap_err();
        assert_eq!(session_error(e), SessionError::AlreadyPaused);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_paused_session_closes_pause() -> Result<()> {
        let dir = tempdir()?;
        let manager = manager(dir.path())?;

        manager.start_session(test_date()).await?;
        tokio::time::advance(StdDuration::from_secs(3600)).await;
        manager.pause_session(test_date()).await?;
        tokio::time::advance(StdDuration::from_secs(1800)).await;
        let report = manager.stop_session(test_date()).await?;

        assert_eq!(report.status(), SessionStatus::Stopped);
        assert!(report.pauses.iter().all(|p| !p.is_open()));
        assert_eq!(report.work_time, Duration::hours(1));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn session_from_yesterday_is_current() -> Result<()> {
        let dir = tempdir()?;
        let manager = manager(dir.path())?;
        let yesterday = test_date().pred_opt().unwrap();

        manager.start_session(yesterday).await?;
        let current = manager.current_session(test_date()).await?.unwrap();
        assert_eq!(current.date, yesterday);

        let report = manager.stop_session(test_date()).await?;
        assert_eq!(report.date, yesterday);
        assert_eq!(manager.current_session(test_date()).await?, None);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn start_after_midnight_continues_yesterday() -> Result<()> {
        let dir = tempdir()?;
        let manager = manager(dir.path())?;
        let yesterday = test_date().pred_opt().unwrap();

        manager.start_session(yesterday).await?;
        let attached = manager.start_session(test_date()).await?;
        assert_eq!(attached.date, yesterday);
        assert_eq!(manager.report_for(test_date()).await?, None);

        let report = manager.stop_session(test_date()).await?;
        assert_eq!(report.date, yesterday);
        assert!(manager.report_for(yesterday).await?.unwrap().is_completed());
        assert_eq!(manager.current_session(test_date()).await?, None);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn open_yesterday_is_reachable_after_today_is_finished() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;
        let yesterday = test_date().pred_opt().unwrap();
        let start = Utc.with_ymd_and_hms(2025, 4, 6, 22, 0, 0).unwrap();
        storage
            .save_report(&WorkSession::create(yesterday, start).to_report(start))
            .await?;
        let today_start = Utc.with_ymd_and_hms(2025, 4, 7, 8, 0, 0).unwrap();
        let finished = WorkSession::create(test_date(), today_start)
            .stop(today_start + Duration::hours(1))?;
        storage.save_report(&finished).await?;

        let manager = SessionManager::new(storage, Box::new(clock()));
        let current = manager.current_session(test_date()).await?.unwrap();
        assert_eq!(current.date, yesterday);
        let report = manager.stop_session(test_date()).await?;
        assert_eq!(report.date, yesterday);
        assert_eq!(manager.current_session(test_date()).await?, None);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn live_report_counts_up_to_now() -> Result<()> {
        let dir = tempdir()?;
        let manager = manager(dir.path())?;
        assert_eq!(manager.live_report(test_date()).await?, None);

        manager.start_session(test_date()).await?;
        tokio::time::advance(StdDuration::from_secs(1800)).await;
        let stored = manager.report_for(test_date()).await?.unwrap();
        let live = manager.live_report(test_date()).await?.unwrap();
        assert_eq!(stored.work_time, Duration::zero());
        assert_eq!(live.work_time, Duration::minutes(30));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn transitions_are_published() -> Result<()> {
        let dir = tempdir()?;
        let bus = EventBus::default();
        let mut events = bus.subscribe();
        let manager = manager(dir.path())?.with_bus(bus);

        manager.start_session(test_date()).await?;
        manager.pause_session(test_date()).await?;
        manager.resume_session(test_date()).await?;
        manager.stop_session(test_date()).await?;

        assert!(matches!(events.recv().await?, SessionEvent::Started(_)));
        assert!(matches!(
            events.recv().await?,
            SessionEvent::PausedResumed { paused: true, .. }
        ));
        assert!(matches!(
            events.recv().await?,
            SessionEvent::PausedResumed { paused: false, .. }
        ));
        assert!(matches!(events.recv().await?, SessionEvent::Stopped(_)));
        Ok(())
    }

    #[tokio::test]
    async fn storage_failures_are_propagated() {
        let mut storage = MockReportStorage::new();
        storage
            .expect_get_report_by_date()
            .returning(|_| Ok(None));
        storage
            .expect_save_report()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("read-only file system")));
        let manager = SessionManager::new(storage, Box::new(clock()));

        assert!(manager.start_session(test_date()).await.is_err());
    }
}
