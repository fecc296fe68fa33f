//! Watch registry and orchestrator.
//!
//! Owns the path-to-entry maps for both lifecycles, the single notify
//! watcher, and the event loop that routes raw filesystem events to
//! debounced entries or to document re-scans.
//!
//! Two lifecycles per tracked document:
//! - **anchor**: armed while the document contains the marker, watching the
//!   primary artifact; disposed the moment a re-scan shows the marker gone.
//! - **replication**: registered on first observation of the document,
//!   watching the build log; kept until global teardown.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::notices::Notifier;
use crate::paths::DerivedPaths;

use super::entry::WatchEntry;
use super::error::WatchError;
use super::reaction::{DiffSpliceReaction, ReplicateReaction};

/// Orchestrates debounced watchers for a set of tracked documents.
pub struct WatchRegistry {
    settings: Arc<Settings>,
    notifier: Arc<dyn Notifier>,
    /// Anchor lifecycle entries, keyed by primary artifact path.
    anchors: HashMap<PathBuf, WatchEntry>,
    /// Replication lifecycle entries, keyed by log path.
    replications: HashMap<PathBuf, WatchEntry>,
    /// Documents under observation.
    documents: HashSet<PathBuf>,
    /// Directories already registered with notify.
    watched_dirs: HashSet<PathBuf>,
    /// Channel for receiving raw file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher.
    fs_watcher: notify::RecommendedWatcher,
}

impl WatchRegistry {
    /// Create the registry and the notify-to-tokio bridge.
    pub fn new(settings: Arc<Settings>, notifier: Arc<dyn Notifier>) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(100);

        let fs_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(Self {
            settings,
            notifier,
            anchors: HashMap::new(),
            replications: HashMap::new(),
            documents: HashSet::new(),
            watched_dirs: HashSet::new(),
            event_rx: rx,
            fs_watcher,
        })
    }

    /// Start observing a source document and its companion paths.
    pub async fn track_document(&mut self, document: &Path) -> Result<(), WatchError> {
        let document = document
            .canonicalize()
            .map_err(|e| WatchError::PathWatchFailed {
                path: document.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.watch_parent_dir(&document)?;
        self.observe_document(&document).await;
        Ok(())
    }

    /// Re-scan a document and reconcile both lifecycles.
    ///
    /// Arms the anchor watcher when the marker is present, disposes it when
    /// the marker is gone, and registers the replication watcher on first
    /// observation. Registration is a no-op when an entry already exists.
    pub async fn observe_document(&mut self, document: &Path) {
        let paths = DerivedPaths::for_document(
            document,
            &self.settings.naming.artifact_extension,
            &self.settings.naming.log_extension,
            &self.settings.naming.draft_suffix,
        );

        let has_marker = match tokio::fs::read_to_string(document).await {
            Ok(text) => text.contains(&self.settings.diff.marker),
            Err(e) => {
                crate::debug_event!("registry", "scan failed", "{}: {e}", document.display());
                false
            }
        };

        if has_marker {
            if !self.anchors.contains_key(&paths.artifact) {
                let reaction = Arc::new(DiffSpliceReaction::from_settings(
                    &self.settings,
                    document.to_path_buf(),
                    &paths,
                ));
                let entry = WatchEntry::spawn(
                    paths.artifact.clone(),
                    reaction,
                    self.notifier.clone(),
                    self.settings.watch.cooldown(),
                );
                self.anchors.insert(paths.artifact.clone(), entry);
                crate::log_event!("anchor", "armed", "{}", paths.artifact.display());
            }
        } else if let Some(entry) = self.anchors.remove(&paths.artifact) {
            entry.dispose();
            crate::log_event!("anchor", "disarmed", "{}", paths.artifact.display());
        }

        // Replication never unregisters before global teardown: the build
        // may recreate the log at any time.
        if !self.replications.contains_key(&paths.log) {
            let reaction = Arc::new(ReplicateReaction::from_settings(&self.settings, &paths));
            let entry = WatchEntry::spawn(
                paths.log.clone(),
                reaction,
                self.notifier.clone(),
                self.settings.watch.cooldown(),
            );
            self.replications.insert(paths.log.clone(), entry);
            crate::log_event!("sync", "registered", "{}", paths.log.display());
        }

        self.documents.insert(document.to_path_buf());
    }

    /// Run the event loop until ctrl-c, then tear everything down.
    pub async fn run(&mut self) -> Result<(), WatchError> {
        crate::log_event!(
            "registry",
            "watching",
            "{} document(s) in {} directories",
            self.documents.len(),
            self.watched_dirs.len()
        );

        loop {
            tokio::select! {
                res = self.event_rx.recv() => {
                    match res {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => {
                            tracing::error!("[registry] file watch error: {e}");
                        }
                        None => return Err(WatchError::ChannelClosed),
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    crate::log_event!("registry", "shutting down");
                    break;
                }
            }
        }

        self.dispose_all();
        Ok(())
    }

    /// Route one raw event.
    async fn handle_event(&mut self, event: Event) {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }

        for path in event.paths {
            if self.documents.contains(&path) {
                crate::debug_event!("registry", "document changed", "{}", path.display());
                self.observe_document(&path).await;
                continue;
            }

            if let Some(entry) = self
                .anchors
                .get(&path)
                .or_else(|| self.replications.get(&path))
            {
                entry.notify();
            }
        }
    }

    /// Dispose every entry in both registries. Idempotent.
    pub fn dispose_all(&mut self) {
        for (_, entry) in self.anchors.drain() {
            entry.dispose();
        }
        for (_, entry) in self.replications.drain() {
            entry.dispose();
        }
    }

    /// Watch the parent directory of `path`, once per directory.
    fn watch_parent_dir(&mut self, path: &Path) -> Result<(), WatchError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if !self.watched_dirs.insert(dir.clone()) {
            return Ok(());
        }

        self.fs_watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.clone(),
                reason: e.to_string(),
            })?;

        crate::debug_event!("registry", "watching dir", "{}", dir.display());
        Ok(())
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn replication_count(&self) -> usize {
        self.replications.len()
    }

    pub fn is_armed(&self, artifact: &Path) -> bool {
        self.anchors.contains_key(artifact)
    }
}
