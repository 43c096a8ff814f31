use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::{
    session::{SessionStatus, TimeReport},
    utils::format::{format_clock, format_time_of_day},
};

use super::context::AppContext;

#[derive(Debug, Clone, Copy)]
pub enum SessionAction {
    Start,
    Pause,
    Resume,
    Finish,
}

fn local_time(time: DateTime<Utc>) -> String {
    format_time_of_day(&time.with_timezone(&Local))
}

pub async fn process_session_command(context: &AppContext, action: SessionAction) -> Result<()> {
    let manager = &context.manager;
    let today = manager.today();
    match action {
        SessionAction::Start => {
            let session = manager.start_session(today).await?;
            println!(
                "Work started at {}, worked {}",
                local_time(session.start),
                format_clock(session.work_time(manager.clock().time()))
            );
        }
        SessionAction::Pause => {
            let session = manager.pause_session(today).await?;
            println!(
                "Paused after {} of work",
                format_clock(session.work_time(manager.clock().time()))
            );
        }
        SessionAction::Resume => {
            let session = manager.resume_session(today).await?;
            println!(
                "Resumed, paused {} in total",
                format_clock(session.pause_time(manager.clock().time()))
            );
        }
        SessionAction::Finish => {
            let report = manager.stop_session(today).await?;
            println!(
                "Work of {} finished, worked {}",
                report.date,
                format_clock(report.work_time)
            );
        }
    }
    Ok(())
}

pub async fn process_status_command(context: &AppContext, date: NaiveDate) -> Result<()> {
    let manager = &context.manager;
    match manager.live_report(date).await? {
        Some(report) => print!("{}", describe_report(&report, manager.clock().time())),
        None => println!("No work recorded for {date}"),
    }
    Ok(())
}

pub fn describe_report(report: &TimeReport, now: DateTime<Utc>) -> String {
    let status = match report.status() {
        SessionStatus::Idle => "idle",
        SessionStatus::Running => "running",
        SessionStatus::Paused => "paused",
        SessionStatus::Stopped => "completed",
    };
    let mut out = format!("{}: {status}\n", report.date);
    out.push_str(&format!("Started\t{}\n", local_time(report.start)));
    if let Some(end) = report.end {
        out.push_str(&format!("Finished\t{}\n", local_time(end)));
    }
    out.push_str(&format!(
        "Worked\t{}\n",
        format_clock(report.calculate_work_time(now))
    ));
    out.push_str(&format!("Paused\t{}\n", format_clock(report.pause_time(now))));
    for pause in &report.pauses {
        let end = pause
            .end
            .map(local_time)
            .unwrap_or_else(|| "...".to_string());
        out.push_str(&format!("  {} - {end}\n", local_time(pause.start)));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use crate::session::WorkSession;

    use super::describe_report;

    #[test]
    fn report_description() {
        let start = Utc.with_ymd_and_hms(2025, 4, 7, 9, 0, 0).unwrap();
        let mut session = WorkSession::create(NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(), start);
        session.pause(start + Duration::hours(1)).unwrap();
        let report = session.to_report(start + Duration::hours(1));

        let described = describe_report(&report, start + Duration::minutes(90));
        let lines = described.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "2025-04-07: paused");
        assert_eq!(lines[2], "Worked\t01:00:00");
        assert_eq!(lines[3], "Paused\t00:30:00");
        assert!(lines[4].ends_with(" - ..."));
    }
}
