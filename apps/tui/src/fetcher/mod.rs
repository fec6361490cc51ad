//! Periodic snapshot retrieval.
//!
//! Requests fire on a fixed schedule whether or not the previous one has
//! finished, so several may be in flight at once. Results are queued in
//! arrival order and handed to a subscriber on the caller's thread; the last
//! one to arrive is the one that sticks.

mod source;

pub use source::{FetchFuture, HttpSource, SnapshotSource};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::domain::ScanSnapshot;
use crate::error::FetchError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of exactly one request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Snapshot(ScanSnapshot),
    Error(FetchError),
}

pub trait FetchSubscriber {
    fn on_snapshot(&mut self, snapshot: ScanSnapshot);
    fn on_error(&mut self, error: FetchError);
}

pub struct Fetcher;

impl Fetcher {
    /// Starts polling `source`. The first request is issued immediately.
    pub fn start(source: Arc<dyn SnapshotSource>, interval: Duration) -> FetchHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = tokio::spawn(poll_loop(source, interval, tx));
        tracing::info!(interval_ms = interval.as_millis(), "Snapshot polling started");

        FetchHandle {
            ticker: Some(ticker),
            events: rx,
        }
    }
}

async fn poll_loop(
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    tx: mpsc::UnboundedSender<FetchEvent>,
) {
    let mut ticks = tokio::time::interval(interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Dropped together with this task, which aborts every request still running.
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let source = Arc::clone(&source);
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let event = match source.fetch().await {
                        Ok(snapshot) => FetchEvent::Snapshot(snapshot),
                        Err(error) => {
                            tracing::warn!(%error, "Scan fetch failed");
                            FetchEvent::Error(error)
                        }
                    };
                    // A closed queue means the handle was stopped.
                    let _ = tx.send(event);
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }

        if tx.is_closed() {
            break;
        }
    }
}

/// Cancellable handle on a running poll schedule.
pub struct FetchHandle {
    ticker: Option<JoinHandle<()>>,
    events: mpsc::UnboundedReceiver<FetchEvent>,
}

impl FetchHandle {
    pub const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Delivers every queued result to `subscriber`, oldest first.
    ///
    /// Returns the number of events delivered; always zero once stopped.
    pub fn dispatch<S: FetchSubscriber + ?Sized>(&mut self, subscriber: &mut S) -> usize {
        if !self.is_running() {
            return 0;
        }

        let mut delivered = 0;
        while let Ok(event) = self.events.try_recv() {
            match event {
                FetchEvent::Snapshot(snapshot) => subscriber.on_snapshot(snapshot),
                FetchEvent::Error(error) => subscriber.on_error(error),
            }
            delivered += 1;
        }
        delivered
    }

    /// Waits for the next result. Returns `None` once stopped.
    pub async fn next_event(&mut self) -> Option<FetchEvent> {
        if !self.is_running() {
            return None;
        }
        self.events.recv().await
    }

    /// Cancels the schedule and every in-flight request. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        ticker.abort();
        self.events.close();
        while self.events.try_recv().is_ok() {}
        tracing::info!("Snapshot polling stopped");
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
