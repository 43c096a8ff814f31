use std::{io::Write, path::PathBuf, time::Duration};

use anyhow::Result;
use observer::{
    console::ConsolePrinter, widget_writer::WidgetWriter, EventObserver, ObserverModule,
};
use ticker::SessionTicker;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    events::EventBus,
    storage::{
        report_storage::{ReportStorage, ReportStorageImpl},
        reports_dir,
    },
    utils::clock::{Clock, DefaultClock},
    widget::WIDGET_FILE,
};

pub mod args;
pub mod observer;
pub mod shutdown;
pub mod ticker;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    let dir = tokio::fs::canonicalize(&dir).await?;
    let storage = ReportStorageImpl::new(reports_dir(&dir))?;
    let writer = WidgetWriter::new(dir.join(WIDGET_FILE), Box::new(DefaultClock));

    // Everything below works with absolute paths, the daemon shouldn't keep any directory busy.
    std::env::set_current_dir("/")?;
    info!("Daemon started for {dir:?}");
    run_with_observer(storage, writer, DefaultClock).await
}

/// Runs the ticker in the current process and prints events until ctrl-c.
pub async fn start_watch(dir: PathBuf, out: impl Write) -> Result<()> {
    let storage = ReportStorageImpl::new(reports_dir(&dir))?;
    run_with_observer(storage, ConsolePrinter::new(out), DefaultClock).await
}

async fn run_with_observer(
    storage: impl ReportStorage,
    observer: impl EventObserver,
    clock: impl Clock,
) -> Result<()> {
    let bus = EventBus::default();
    let shutdown_token = CancellationToken::new();

    let observer = ObserverModule::new(bus.subscribe(), observer);
    let ticker = create_ticker(storage, bus, &shutdown_token, clock);

    let (_, ticker_result, observer_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = ticker.run().await;
            shutdown_token.cancel();
            result
        },
        observer.run(),
    );

    if let Err(ticker_result) = ticker_result {
        error!("Ticker got an error {:?}", ticker_result);
    }

    if let Err(observer_result) = observer_result {
        error!("Observer got an error {:?}", observer_result);
    }

    Ok(())
}

fn create_ticker<R: ReportStorage>(
    storage: R,
    bus: EventBus,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> SessionTicker<R> {
    SessionTicker::new(
        storage,
        bus,
        shutdown_token.clone(),
        DEFAULT_TICK_INTERVAL,
        Box::new(clock),
    )
}
