//! Reactions bound to watched paths.
//!
//! A reaction is the whole side effect run for one accepted notification.
//! Two exist: diff the artifacts and splice the result into the document,
//! or replicate the primary artifact onto the draft path.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Settings;
use crate::difftool::DiffTool;
use crate::error::ReactionError;
use crate::paths::DerivedPaths;
use crate::replicate::Replicator;
use crate::splice::Splicer;
use crate::stability;

/// What the consumer task reports after a successful run.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Surface this message to the user.
    Report(String),
    /// Nothing user-visible happened; log the reason at debug.
    Quiet(String),
}

/// One side effect bound to a watched path.
#[async_trait]
pub trait Reaction: Send + Sync {
    /// Component name for logging.
    fn name(&self) -> &str;

    /// Execute the reaction once.
    async fn run(&self) -> Result<Outcome, ReactionError>;
}

/// Diff the draft artifact (baseline) against the primary artifact and
/// splice the generated images into the source document.
pub struct DiffSpliceReaction {
    document: PathBuf,
    primary: PathBuf,
    draft: PathBuf,
    output_dir: PathBuf,
    tool: DiffTool,
    splicer: Splicer,
    stability_samples: u32,
    stability_interval: Duration,
}

impl DiffSpliceReaction {
    pub fn from_settings(settings: &Settings, document: PathBuf, paths: &DerivedPaths) -> Self {
        // The tool writes images next to the document unless configured
        // with an absolute directory.
        let doc_dir = document.parent().map(PathBuf::from).unwrap_or_default();
        let output_dir = if settings.diff.output_dir.is_absolute() {
            settings.diff.output_dir.clone()
        } else {
            doc_dir.join(&settings.diff.output_dir)
        };

        Self {
            document,
            primary: paths.artifact.clone(),
            draft: paths.draft.clone(),
            output_dir,
            tool: DiffTool::new(
                settings.diff.interpreter.clone(),
                settings.diff.tool_path.clone(),
                settings.diff.dpi,
                settings.diff.image_extensions.clone(),
            ),
            splicer: Splicer::new(settings.diff.marker.clone()),
            stability_samples: settings.watch.stability_samples,
            stability_interval: settings.watch.stability_interval(),
        }
    }
}

#[async_trait]
impl Reaction for DiffSpliceReaction {
    fn name(&self) -> &str {
        "anchor"
    }

    async fn run(&self) -> Result<Outcome, ReactionError> {
        for artifact in [&self.primary, &self.draft] {
            if !tokio::fs::try_exists(artifact).await.unwrap_or(false) {
                return Err(ReactionError::ArtifactMissing {
                    path: artifact.clone(),
                });
            }
        }

        if !stability::is_stable(&self.primary, self.stability_samples, self.stability_interval)
            .await
        {
            return Err(ReactionError::NotStable {
                path: self.primary.clone(),
                samples: self.stability_samples,
            });
        }

        let artifacts = self
            .tool
            .run(&self.draft, &self.primary, &self.output_dir)
            .await?;
        let filled = self.splicer.splice(&self.document, &artifacts).await?;

        Ok(Outcome::Report(format!(
            "{filled} anchor(s) filled with {} diff image(s) in {}",
            artifacts.len(),
            self.document.display()
        )))
    }
}

/// Wait for the build log to settle, then copy the primary artifact onto
/// the draft path.
pub struct ReplicateReaction {
    log: PathBuf,
    primary: PathBuf,
    draft: PathBuf,
    settle: Duration,
    stability_samples: u32,
    stability_interval: Duration,
    replicator: Replicator,
}

impl ReplicateReaction {
    pub fn from_settings(settings: &Settings, paths: &DerivedPaths) -> Self {
        Self {
            log: paths.log.clone(),
            primary: paths.artifact.clone(),
            draft: paths.draft.clone(),
            settle: settings.watch.settle(),
            stability_samples: settings.watch.stability_samples,
            stability_interval: settings.watch.stability_interval(),
            replicator: Replicator::new(settings.sync.max_retries, settings.sync.retry_backoff()),
        }
    }
}

#[async_trait]
impl Reaction for ReplicateReaction {
    fn name(&self) -> &str {
        "sync"
    }

    async fn run(&self) -> Result<Outcome, ReactionError> {
        tokio::time::sleep(self.settle).await;

        // An unstable log means the toolchain is still running; the next
        // notification will try again.
        if !stability::is_stable(&self.log, self.stability_samples, self.stability_interval).await
        {
            return Ok(Outcome::Quiet(format!(
                "{} still changing",
                self.log.display()
            )));
        }

        match self.replicator.sync(&self.primary, &self.draft).await {
            Ok(()) => Ok(Outcome::Report(format!(
                "draft synced: {}",
                self.draft.display()
            ))),
            Err(ReactionError::NotStable { path, .. }) => Ok(Outcome::Quiet(format!(
                "{} still changing",
                path.display()
            ))),
            Err(e) => Err(e),
        }
    }
}
