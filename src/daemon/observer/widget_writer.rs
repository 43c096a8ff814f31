use std::path::PathBuf;

use anyhow::Result;

use crate::{
    events::SessionEvent,
    utils::clock::Clock,
    widget::{write_widget, WidgetView},
};

use super::EventObserver;

/// Bridges the bus and `widget.json`. Every event re-renders the whole view.
pub struct WidgetWriter {
    path: PathBuf,
    clock: Box<dyn Clock>,
    last: Option<WidgetView>,
}

impl WidgetWriter {
    pub fn new(path: PathBuf, clock: Box<dyn Clock>) -> Self {
        Self {
            path,
            clock,
            last: None,
        }
    }
}

impl EventObserver for WidgetWriter {
    async fn observe(&mut self, event: SessionEvent) -> Result<()> {
        let now = self.clock.time();
        let report = match event {
            SessionEvent::Started(session)
            | SessionEvent::Updated { session, .. }
            | SessionEvent::PausedResumed { session, .. } => Some(session.to_report(now)),
            SessionEvent::Stopped(report) => Some(report),
            SessionEvent::Cleared => None,
        };
        let view = WidgetView::render(report.as_ref(), now);
        // Paused sessions produce identical views, no need to touch the file.
        if self.last.as_ref() == Some(&view) {
            return Ok(());
        }
        write_widget(&self.path, &view).await?;
        self.last = Some(view);
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
