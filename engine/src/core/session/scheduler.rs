//! Debounced document rebuilds.
//!
//! Every edit takes a new generation ticket. A spawned task waits out the
//! debounce delay and publishes only if its ticket is still the newest, so a
//! superseded rebuild is dropped instead of landing out of order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A published document and the ticket that produced it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRevision {
    pub generation: u64,
    pub text: String,
}

pub struct RebuildScheduler {
    delay: Duration,
    generation: Arc<AtomicU64>,
    tx: Arc<watch::Sender<DocumentRevision>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    runtime: Option<Handle>,
}

impl RebuildScheduler {
    /// Creates a scheduler whose first revision is `initial` (generation 0).
    ///
    /// Captures the current Tokio runtime, if any, for debounced rebuilds.
    pub fn new(delay: Duration, initial: String) -> Self {
        let (tx, _rx) = watch::channel(DocumentRevision {
            generation: 0,
            text: initial,
        });

        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            tx: Arc::new(tx),
            pending: Mutex::new(None),
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Newest ticket handed out
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentRevision> {
        self.tx.subscribe()
    }

    /// Last published revision
    pub fn current(&self) -> DocumentRevision {
        self.tx.borrow().clone()
    }

    /// Schedules `build` to run after the debounce delay. Returns the ticket.
    ///
    /// Without a Tokio runtime (neither captured at construction nor current)
    /// the document is rebuilt and published immediately.
    pub fn schedule<F>(&self, build: F) -> u64
    where
        F: FnOnce() -> String + Send + 'static,
    {
        let Some(runtime) = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            tracing::debug!("No async runtime, rebuilding synchronously");
            return self.rebuild_now(build());
        };

        let ticket = self.next_ticket();
        let generation = Arc::clone(&self.generation);
        let tx = Arc::clone(&self.tx);
        let delay = self.delay;

        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            if generation.load(Ordering::SeqCst) != ticket {
                tracing::debug!(ticket, "Dropping superseded rebuild");
                return;
            }

            publish(&tx, &generation, ticket, build());
        });

        // Aborting is an optimization; the ticket check alone keeps ordering.
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(handle) {
                previous.abort();
            }
        }

        ticket
    }

    /// Builds and publishes immediately, superseding anything pending
    pub fn rebuild_now(&self, text: String) -> u64 {
        let ticket = self.next_ticket();
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.take() {
                previous.abort();
            }
        }
        publish(&self.tx, &self.generation, ticket, text);
        ticket
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Drop for RebuildScheduler {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

/// Publishes under the channel lock so a stale ticket can never overwrite a
/// newer revision.
fn publish(
    tx: &watch::Sender<DocumentRevision>,
    generation: &AtomicU64,
    ticket: u64,
    text: String,
) {
    let published = tx.send_if_modified(|revision| {
        if generation.load(Ordering::SeqCst) != ticket || revision.generation > ticket {
            return false;
        }
        revision.generation = ticket;
        revision.text = text;
        true
    });

    if published {
        tracing::debug!(ticket, "Published document revision");
    } else {
        tracing::warn!(ticket, "Discarded late rebuild result");
    }
}
