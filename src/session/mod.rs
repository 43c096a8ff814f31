//! Work session model. A session belongs to one calendar day, runs from `start` until `end` and
//! may be suspended by any number of pauses. Its state is derived from the data alone:
//!  - no `end` and no open pause: running
//!  - no `end` and an open pause: paused
//!  - `end` present: stopped
//!
//! [TimeReport] is the persisted shape of the same data, with the worked time frozen at the
//! moment of the last save.

pub mod manager;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::time::is_weekend;

/// A suspension of work. `end` is `None` while the pause is still going on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pause {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Pause {
    pub fn open(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length of the pause as seen at `until`. Open pauses run up to `until` and nothing is
    /// counted past it.
    pub fn duration(&self, until: DateTime<Utc>) -> Duration {
        let end = self.end.map_or(until, |end| end.min(until));
        (end - self.start).max(Duration::zero())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session for {0} is already completed")]
    AlreadyCompleted(NaiveDate),
    #[error("session is already stopped")]
    AlreadyStopped,
    #[error("session is already paused")]
    AlreadyPaused,
    #[error("session is not paused")]
    NotPaused,
    #[error("cannot pause a stopped session")]
    PauseStopped,
    #[error("cannot resume a stopped session")]
    ResumeStopped,
    #[error("no session found for {0}")]
    NoSession(NaiveDate),
}

fn status_of(end: Option<DateTime<Utc>>, pauses: &[Pause]) -> SessionStatus {
    if end.is_some() {
        SessionStatus::Stopped
    } else if pauses.iter().any(Pause::is_open) {
        SessionStatus::Paused
    } else {
        SessionStatus::Running
    }
}

fn pause_time_of(end: Option<DateTime<Utc>>, pauses: &[Pause], now: DateTime<Utc>) -> Duration {
    let until = end.unwrap_or(now);
    pauses
        .iter()
        .fold(Duration::zero(), |total, pause| total + pause.duration(until))
}

fn work_time_of(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    pauses: &[Pause],
    now: DateTime<Utc>,
) -> Duration {
    let until = end.unwrap_or(now);
    (until - start - pause_time_of(end, pauses, now)).max(Duration::zero())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSession {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub is_weekend: bool,
    pub pauses: Vec<Pause>,
}

impl WorkSession {
    pub fn create(date: NaiveDate, start: DateTime<Utc>) -> Self {
        Self {
            date,
            start,
            end: None,
            is_weekend: is_weekend(date),
            pauses: vec![],
        }
    }

    pub fn status(&self) -> SessionStatus {
        status_of(self.end, &self.pauses)
    }

    pub fn is_paused(&self) -> bool {
        self.status() == SessionStatus::Paused
    }

    /// Time between start and end (or `now`) minus every pause.
    pub fn work_time(&self, now: DateTime<Utc>) -> Duration {
        work_time_of(self.start, self.end, &self.pauses, now)
    }

    pub fn pause_time(&self, now: DateTime<Utc>) -> Duration {
        pause_time_of(self.end, &self.pauses, now)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.status() {
            SessionStatus::Stopped => Err(SessionError::PauseStopped),
            SessionStatus::Paused => Err(SessionError::AlreadyPaused),
            SessionStatus::Running | SessionStatus::Idle => {
                self.pauses.push(Pause::open(now));
                Ok(())
            }
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.end.is_some() {
            return Err(SessionError::ResumeStopped);
        }
        match self.pauses.last_mut() {
            Some(last) if last.is_open() => {
                last.end = Some(now.max(last.start));
                Ok(())
            }
            _ => Err(SessionError::NotPaused),
        }
    }

    /// Finishes the session. A pause that is still open is closed at the same moment, so a
    /// stopped session never keeps accumulating pause time.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<TimeReport, SessionError> {
        if self.end.is_some() {
            return Err(SessionError::AlreadyStopped);
        }
        for pause in self.pauses.iter_mut().filter(|p| p.is_open()) {
            pause.end = Some(now.max(pause.start));
        }
        self.end = Some(now.max(self.start));
        Ok(self.to_report(now))
    }

    pub fn to_report(&self, now: DateTime<Utc>) -> TimeReport {
        TimeReport {
            date: self.date,
            start: self.start,
            end: self.end,
            work_time: self.work_time(now),
            pauses: self.pauses.clone(),
        }
    }
}

impl From<TimeReport> for WorkSession {
    fn from(report: TimeReport) -> Self {
        Self {
            date: report.date,
            start: report.start,
            end: report.end,
            is_weekend: is_weekend(report.date),
            pauses: report.pauses,
        }
    }
}

/// Persisted day of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeReport {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Worked time at the moment the report was saved.
    pub work_time: Duration,
    pub pauses: Vec<Pause>,
}

impl TimeReport {
    pub fn status(&self) -> SessionStatus {
        status_of(self.end, &self.pauses)
    }

    pub fn is_completed(&self) -> bool {
        self.end.is_some()
    }

    /// Worked time that is up to date for open reports. Completed reports return the same
    /// value that was stored.
    pub fn calculate_work_time(&self, now: DateTime<Utc>) -> Duration {
        work_time_of(self.start, self.end, &self.pauses, now)
    }

    pub fn pause_time(&self, now: DateTime<Utc>) -> Duration {
        pause_time_of(self.end, &self.pauses, now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use super::{Pause, SessionError, SessionStatus, WorkSession};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 7, hour, minute, 0).unwrap()
    }

    #[test]
    fn new_session_is_running() {
        let session = WorkSession::create(TEST_DATE, at(9, 0));
        assert_eq!(session.status(), SessionStatus::Running);
        assert!(!session.is_weekend);
        assert_eq!(session.work_time(at(10, 30)), Duration::minutes(90));
    }

    #[test]
    fn weekend_flag_follows_date() {
        let saturday = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
        assert!(WorkSession::create(saturday, at(9, 0)).is_weekend);
    }

    #[test]
    fn work_time_excludes_closed_and_open_pauses() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        session.pause(at(10, 0)).unwrap();
        session.resume(at(10, 15)).unwrap();
        session.pause(at(12, 0)).unwrap();

        assert_eq!(session.status(), SessionStatus::Paused);
        // 4 hours elapsed, 15 minutes of closed pause and 60 minutes of open pause.
        assert_eq!(session.work_time(at(13, 0)), Duration::minutes(165));
        assert_eq!(session.pause_time(at(13, 0)), Duration::minutes(75));
    }

    #[test]
    fn work_time_is_frozen_while_paused() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        session.pause(at(11, 0)).unwrap();
        assert_eq!(session.work_time(at(11, 30)), session.work_time(at(15, 0)));
    }

    #[test]
    fn cannot_pause_twice() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        session.pause(at(10, 0)).unwrap();
        assert_eq!(session.pause(at(10, 5)), Err(SessionError::AlreadyPaused));
        assert_eq!(session.pauses.len(), 1);
    }

    #[test]
    fn cannot_resume_running_session() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        assert_eq!(session.resume(at(10, 0)), Err(SessionError::NotPaused));
        session.pause(at(10, 0)).unwrap();
        session.resume(at(10, 10)).unwrap();
        assert_eq!(session.resume(at(10, 20)), Err(SessionError::NotPaused));
    }

    #[test]
    fn stopped_session_rejects_transitions() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        session.stop(at(17, 0)).unwrap();
        assert_eq!(session.status(), SessionStatus::Stopped);
        assert_eq!(session.pause(at(17, 5)), Err(SessionError::PauseStopped));
        assert_eq!(session.resume(at(17, 5)), Err(SessionError::ResumeStopped));
        assert_eq!(session.stop(at(17, 5)), Err(SessionError::AlreadyStopped));
    }

    #[test]
    fn stopping_paused_session_closes_pause() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        session.pause(at(12, 0)).unwrap();
        let report = session.stop(at(13, 0)).unwrap();

        assert_eq!(report.pauses, vec![Pause::closed(at(12, 0), at(13, 0))]);
        assert_eq!(report.work_time, Duration::hours(3));
        // Nothing changes once the report is completed.
        assert_eq!(report.calculate_work_time(at(23, 0)), Duration::hours(3));
        assert_eq!(report.pause_time(at(23, 0)), Duration::hours(1));
    }

    #[test]
    fn pauses_past_the_end_are_clamped() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        session.end = Some(at(12, 0));
        session.pauses = vec![Pause::closed(at(11, 0), at(14, 0))];
        assert_eq!(session.work_time(at(20, 0)), Duration::hours(2));
    }

    #[test]
    fn work_time_never_negative() {
        let session = WorkSession::create(TEST_DATE, at(9, 0));
        assert_eq!(session.work_time(at(8, 0)), Duration::zero());
    }

    #[test]
    fn report_round_trips_into_session() {
        let mut session = WorkSession::create(TEST_DATE, at(9, 0));
        session.pause(at(10, 0)).unwrap();
        let restored = WorkSession::from(session.to_report(at(10, 30)));
        assert_eq!(restored, session);
    }
}
