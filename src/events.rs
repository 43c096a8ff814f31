//! In-process propagation of session changes. The ticker and the session manager publish,
//! observers (widget writer, console watcher) subscribe.

use chrono::Duration;
use tokio::sync::broadcast;
use tracing::trace;

use crate::session::{TimeReport, WorkSession};

const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started(WorkSession),
    /// Periodic update while the session is running.
    Updated {
        session: WorkSession,
        worked: Duration,
        paused: bool,
    },
    PausedResumed {
        session: WorkSession,
        paused: bool,
    },
    Stopped(TimeReport),
    /// The followed report is gone, usually because a new day began without a session.
    Cleared,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event. Having nobody listening is not an error.
    pub fn emit(&self, event: SessionEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!("No observers for {event:?}");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}
