//! Background worker: the one place pending captures get processed.
//!
//! The worker owns the store subscription. It drains the queue on start, on
//! every change that may have produced a pending capture, and on a poll
//! interval that picks up writes made by other processes. Observers that only
//! want to display progress subscribe to the store themselves and never
//! process anything.

use std::sync::Arc;
use std::time::Duration;

use stash_core::responses::ProcessReport;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::scheduler::Scheduler;

/// Default liveness poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct Worker {
    scheduler: Arc<Scheduler>,
    poll_interval: Duration,
}

/// A running worker and the means to stop it.
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<u64>,
}

impl WorkerHandle {
    /// Ask the worker to stop after its current drain and wait for it.
    ///
    /// Returns the number of captures the worker took out of `pending`.
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown.send(true);
        match self.join.await {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!(error = %e, "worker task failed");
                0
            }
        }
    }
}

impl Worker {
    #[must_use]
    pub const fn new(scheduler: Arc<Scheduler>) -> Self {
        Self {
            scheduler,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the worker on a tokio task.
    #[must_use]
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown, rx) = watch::channel(false);
        let join = tokio::spawn(self.run(rx));
        WorkerHandle { shutdown, join }
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    ///
    /// Returns the number of captures processed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut events = self.scheduler.store().subscribe();
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut processed = 0u64;

        tracing::info!(poll_secs = self.poll_interval.as_secs(), "worker started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Ok(event) if event.may_have_pending() => {
                        processed += self.drain_once().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "worker lagged behind store events");
                        processed += self.drain_once().await;
                    }
                    Err(RecvError::Closed) => break,
                },
                // The first tick fires immediately and drains what is already queued.
                _ = poll.tick() => {
                    processed += self.drain_once().await;
                }
            }
        }
        tracing::info!(processed, "worker stopped");
        processed
    }

    async fn drain_once(&self) -> u64 {
        match self.scheduler.drain().await {
            Ok(report) => {
                log_report(&report);
                report.processed.len() as u64
            }
            Err(e) => {
                tracing::error!(error = %e, "worker drain failed");
                0
            }
        }
    }
}

fn log_report(report: &ProcessReport) {
    for done in &report.processed {
        tracing::info!(capture_id = %done.capture_id, status = %done.status, "capture processed");
    }
    if let Some(ref error) = report.error {
        tracing::warn!(error = %error, remaining = report.remaining_pending, "capture left pending");
    }
}
