use anyhow::Result;
use tokio::sync::broadcast::Receiver;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};
use tracing::{debug, error, warn};

use crate::events::SessionEvent;

pub mod console;
pub mod widget_writer;

/// Reacts to session events. Realistically this abstracts over anything that presents the
/// session: status files, terminal output.
pub trait EventObserver {
    fn observe(&mut self, event: SessionEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}

/// Drains the bus into an observer until every sender is gone.
pub struct ObserverModule<Observer> {
    events: BroadcastStream<SessionEvent>,
    observer: Observer,
}

impl<O: EventObserver> ObserverModule<O> {
    pub fn new(receiver: Receiver<SessionEvent>, observer: O) -> Self {
        Self {
            events: BroadcastStream::new(receiver),
            observer,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    // Only the latest state matters, the next event catches the observer up.
                    warn!("Observer lagged behind, skipped {skipped} events");
                    continue;
                }
            };
            debug!("Observing event {:?}", event);
            if let Err(e) = self.observer.observe(event).await {
                error!("Error observing event: {e:?}")
            }
        }

        self.observer.finalize().await
    }
}
