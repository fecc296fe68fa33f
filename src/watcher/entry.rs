//! Per-path debounced watch entry.
//!
//! Leading-edge, single-flight, trailing-cooldown debounce. Each entry owns
//! a capacity-one channel and a single consumer task, so at most one
//! reaction per path is ever in flight and no mutable guard flag is shared
//! across tasks. Notifications arriving while a reaction runs or during the
//! cooldown are dropped, not queued; a fresh notification after the cooldown
//! triggers exactly one more run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::notices::Notifier;

use super::reaction::{Outcome, Reaction};

/// A debounced subscription binding one path to one reaction.
pub struct WatchEntry {
    path: PathBuf,
    tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl WatchEntry {
    /// Spawn the consumer task for `path`.
    ///
    /// The task runs the reaction once per accepted notification, reports
    /// the outcome through the notifier, sleeps the cooldown, then drains
    /// everything that arrived in the meantime.
    pub fn spawn(
        path: PathBuf,
        reaction: Arc<dyn Reaction>,
        notifier: Arc<dyn Notifier>,
        cooldown: Duration,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let task_path = path.clone();

        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                crate::log_event!(reaction.name(), "accepted", "{}", task_path.display());

                match reaction.run().await {
                    Ok(Outcome::Report(message)) => notifier.info(&message),
                    Ok(Outcome::Quiet(reason)) => {
                        crate::debug_event!(reaction.name(), "skipped", "{reason}");
                    }
                    Err(e) => notifier.error(&e.to_string()),
                }

                sleep(cooldown).await;

                // Anything that arrived mid-flight or during the cooldown is
                // stale; it does not re-arm the entry.
                while rx.try_recv().is_ok() {}
            }
        });

        Self { path, tx, task }
    }

    /// Deliver a raw notification. Returns false when it was dropped
    /// because a reaction is already in flight.
    pub fn notify(&self) -> bool {
        let accepted = self.tx.try_send(()).is_ok();
        if !accepted {
            crate::debug_event!("watcher", "dropped", "{}", self.path.display());
        }
        accepted
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Stop the consumer task. Safe to call more than once.
    pub fn dispose(&self) {
        self.task.abort();
    }
}

impl Drop for WatchEntry {
    fn drop(&mut self) {
        self.task.abort();
    }
}
