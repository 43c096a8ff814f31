use std::io::Write;

use anyhow::Result;
use chrono::Local;

use crate::{
    events::SessionEvent,
    utils::format::{format_clock, format_time_of_day},
};

use super::EventObserver;

/// Prints events for `workhours watch`.
pub struct ConsolePrinter<W: Write> {
    out: W,
}

impl<W: Write> ConsolePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Started(session) => format!(
            "Session of {} started at {}",
            session.date,
            format_time_of_day(&session.start.with_timezone(&Local))
        ),
        SessionEvent::Updated { worked, .. } => format!("Worked {}", format_clock(*worked)),
        SessionEvent::PausedResumed { paused: true, .. } => "Session paused".to_string(),
        SessionEvent::PausedResumed { paused: false, .. } => "Session resumed".to_string(),
        SessionEvent::Stopped(report) => format!(
            "Session of {} completed, worked {}",
            report.date,
            format_clock(report.work_time)
        ),
        SessionEvent::Cleared => "No active session".to_string(),
    }
}

impl<W: Write> EventObserver for ConsolePrinter<W> {
    async fn observe(&mut self, event: SessionEvent) -> Result<()> {
        writeln!(self.out, "{}", describe(&event))?;
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use crate::{daemon::observer::EventObserver, events::SessionEvent, session::WorkSession};

    use super::ConsolePrinter;

    #[tokio::test]
    async fn events_are_printed_line_by_line() -> Result<()> {
        let start = Utc.with_ymd_and_hms(2025, 4, 7, 9, 0, 0).unwrap();
        let mut session = WorkSession::create(NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(), start);
        let mut printer = ConsolePrinter::new(Vec::new());

        printer
            .observe(SessionEvent::Updated {
                session: session.clone(),
                worked: Duration::seconds(3723),
                paused: false,
            })
            .await?;
        printer
            .observe(SessionEvent::PausedResumed {
                session: session.clone(),
                paused: true,
            })
            .await?;
        let report = session.stop(start + Duration::hours(8)).unwrap();
        printer.observe(SessionEvent::Stopped(report)).await?;
        printer.finalize().await?;

        let printed = String::from_utf8(printer.into_inner())?;
        assert_eq!(
            printed,
            "Worked 01:02:03\nSession paused\nSession of 2025-04-07 completed, worked 08:00:00\n"
        );
        Ok(())
    }
}
