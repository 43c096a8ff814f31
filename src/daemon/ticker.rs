use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::{
    events::{EventBus, SessionEvent},
    session::{SessionStatus, TimeReport, WorkSession},
    storage::report_storage::ReportStorage,
    utils::clock::Clock,
};

/// Foreground timer of the daemon. The report storage is polled every tick, the difference
/// with the previous snapshot is turned into [SessionEvent]s.
pub struct SessionTicker<R: ReportStorage> {
    storage: R,
    bus: EventBus,
    shutdown: CancellationToken,
    tick_frequency: Duration,
    clock: Box<dyn Clock>,
    tracked: Option<TimeReport>,
}

impl<R: ReportStorage> SessionTicker<R> {
    pub fn new(
        storage: R,
        bus: EventBus,
        shutdown: CancellationToken,
        tick_frequency: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            bus,
            shutdown,
            tick_frequency,
            clock,
            tracked: None,
        }
    }

    /// The report the ticker should look at. An open session keeps being followed after
    /// midnight until it's stopped, otherwise it's today's report.
    async fn load_snapshot(&self, today: NaiveDate) -> Result<Option<TimeReport>> {
        if let Some(tracked) = &self.tracked {
            if !tracked.is_completed() && tracked.date != today {
                if let Some(report) = self.storage.get_report_by_date(tracked.date).await? {
                    return Ok(Some(report));
                }
            }
        }
        let todays = self.storage.get_report_by_date(today).await?;
        if todays.as_ref().is_some_and(|report| !report.is_completed()) {
            return Ok(todays);
        }
        if let Some(yesterday) = today.pred_opt() {
            let open = self
                .storage
                .get_report_by_date(yesterday)
                .await?
                .filter(|report| !report.is_completed());
            if open.is_some() {
                return Ok(open);
            }
        }
        Ok(todays)
    }

    async fn tick(&mut self) -> Result<()> {
        let now = self.clock.time();
        let current = self.load_snapshot(self.clock.today()).await?;
        for event in diff(self.tracked.as_ref(), current.as_ref(), now) {
            trace!("Emitting {event:?}");
            self.bus.emit(event);
        }
        self.tracked = current;
        Ok(())
    }

    /// Executes the ticker loop until shutdown.
    pub async fn run(mut self) -> Result<()> {
        info!("Starting session ticker");
        let mut tick_point = self.clock.instant();
        loop {
            tick_point += self.tick_frequency;

            if let Err(e) = self.tick().await {
                error!("Encountered an error during tick {:?}", e)
            }

            tokio::select! {
                // Dropping the ticker drops the bus, observers see the channel closing and finish.
                _ = self.shutdown.cancelled() => {
                    debug!("Ticker received shutdown");
                    return Ok(())
                }
                _ = self.clock.sleep_until(tick_point) => ()
            }
        }
    }
}

/// Events that describe the move from `previous` to `current`.
pub fn diff(
    previous: Option<&TimeReport>,
    current: Option<&TimeReport>,
    now: DateTime<Utc>,
) -> Vec<SessionEvent> {
    let Some(current) = current else {
        return match previous {
            Some(_) => vec![SessionEvent::Cleared],
            None => vec![],
        };
    };
    let session = WorkSession::from(current.clone());
    let updated = |session: WorkSession| SessionEvent::Updated {
        worked: session.work_time(now),
        paused: session.is_paused(),
        session,
    };

    let previous = previous.filter(|p| p.date == current.date);
    let Some(previous) = previous else {
        // A session we haven't seen yet.
        return match current.status() {
            SessionStatus::Stopped => vec![SessionEvent::Stopped(current.clone())],
            SessionStatus::Paused => vec![
                SessionEvent::Started(session.clone()),
                SessionEvent::PausedResumed {
                    session,
                    paused: true,
                },
            ],
            SessionStatus::Running | SessionStatus::Idle => {
                vec![SessionEvent::Started(session.clone()), updated(session)]
            }
        };
    };

    match (previous.status(), current.status()) {
        (SessionStatus::Stopped, _) => vec![],
        (_, SessionStatus::Stopped) => vec![SessionEvent::Stopped(current.clone())],
        (SessionStatus::Paused, SessionStatus::Running) => vec![
            SessionEvent::PausedResumed {
                session: session.clone(),
                paused: false,
            },
            updated(session),
        ],
        (SessionStatus::Running, SessionStatus::Paused) => vec![SessionEvent::PausedResumed {
            session,
            paused: true,
        }],
        (_, SessionStatus::Running) => vec![updated(session)],
        _ => vec![],
    }
}
