//! Compact status of the current day, the terminal counterpart of a home screen widget. The
//! daemon keeps `widget.json` up to date so status bars can show it without touching reports.

use std::{fmt::Display, path::Path};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    fs::operations::{read_locked_json, write_locked_json},
    session::{manager::SessionManager, SessionError, SessionStatus, TimeReport},
    storage::report_storage::ReportStorage,
    utils::format::format_clock,
};

pub const WIDGET_FILE: &str = "widget.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WidgetStatus {
    #[default]
    Inactive,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetAction {
    StartWork,
    StopWork,
    Pause,
    Resume,
}

impl Display for WidgetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetAction::StartWork => write!(f, "Start work"),
            WidgetAction::StopWork => write!(f, "Stop work"),
            WidgetAction::Pause => write!(f, "Pause"),
            WidgetAction::Resume => write!(f, "Resume"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetView {
    pub date: Option<NaiveDate>,
    pub status: WidgetStatus,
    pub status_label: String,
    /// Worked time without pauses.
    pub worked: String,
    /// Time since the start of the session, pauses included.
    pub total: String,
    pub primary_action: Option<WidgetAction>,
    pub secondary_action: Option<WidgetAction>,
}

impl Default for WidgetView {
    fn default() -> Self {
        Self::render(None, Utc::now())
    }
}

impl WidgetView {
    pub fn render(report: Option<&TimeReport>, now: DateTime<Utc>) -> Self {
        let Some(report) = report else {
            return Self {
                date: None,
                status: WidgetStatus::Inactive,
                status_label: "Session not active".into(),
                worked: format_clock(chrono::Duration::zero()),
                total: format_clock(chrono::Duration::zero()),
                primary_action: Some(WidgetAction::StartWork),
                secondary_action: None,
            };
        };

        let (status, status_label, primary_action, secondary_action) = match report.status() {
            SessionStatus::Stopped => (WidgetStatus::Completed, "Session completed", None, None),
            SessionStatus::Paused => (
                WidgetStatus::Paused,
                "Session paused",
                Some(WidgetAction::StopWork),
                Some(WidgetAction::Resume),
            ),
            SessionStatus::Running | SessionStatus::Idle => (
                WidgetStatus::Active,
                "Session active",
                Some(WidgetAction::StopWork),
                Some(WidgetAction::Pause),
            ),
        };
        let until = report.end.unwrap_or(now);

        Self {
            date: Some(report.date),
            status,
            status_label: status_label.into(),
            worked: format_clock(report.calculate_work_time(now)),
            total: format_clock(until - report.start),
            primary_action,
            secondary_action,
        }
    }
}

impl Display for WidgetView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.status_label)?;
        write!(f, "{}", self.worked)?;
        if self.status != WidgetStatus::Inactive {
            write!(f, " (total {})", self.total)?;
        }
        let actions = [self.primary_action, self.secondary_action]
            .into_iter()
            .flatten()
            .map(|a| format!("[{a}]"))
            .collect::<Vec<_>>();
        if !actions.is_empty() {
            write!(f, "\n{}", actions.join(" "))?;
        }
        Ok(())
    }
}

/// What a widget action ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Started,
    Stopped(TimeReport),
    Paused,
    Resumed,
}

/// Primary button: starts work when nothing is going on and stops an open session.
pub async fn toggle<R: ReportStorage>(
    manager: &SessionManager<R>,
    date: NaiveDate,
) -> Result<ActionOutcome> {
    if manager.current_session(date).await?.is_some() {
        return Ok(ActionOutcome::Stopped(manager.stop_session(date).await?));
    }
    match manager.report_for(date).await? {
        Some(report) if report.is_completed() => Err(SessionError::AlreadyCompleted(date).into()),
        _ => {
            manager.start_session(date).await?;
            Ok(ActionOutcome::Started)
        }
    }
}

/// Secondary button: pauses a running session and resumes a paused one.
pub async fn pause_toggle<R: ReportStorage>(
    manager: &SessionManager<R>,
    date: NaiveDate,
) -> Result<ActionOutcome> {
    match manager.current_session(date).await? {
        Some(session) if session.is_paused() => {
            manager.resume_session(date).await?;
            Ok(ActionOutcome::Resumed)
        }
        Some(_) => {
            manager.pause_session(date).await?;
            Ok(ActionOutcome::Paused)
        }
        None => Err(SessionError::NoSession(date).into()),
    }
}

pub async fn write_widget(path: &Path, view: &WidgetView) -> Result<()> {
    write_locked_json(path, view).await?;
    debug!("Widget updated: {}", view.status_label);
    Ok(())
}

pub async fn read_widget(path: &Path) -> Result<WidgetView> {
    read_locked_json(path).await
}
