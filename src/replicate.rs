//! Retrying file replication.
//!
//! Keeps the draft artifact byte-identical to the primary artifact at the
//! instant of copy. The copy is retried with a linearly increasing backoff
//! because the producing toolchain occasionally still holds the file open
//! right after it settles.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::ReactionError;
use crate::stability;

/// Stability budget applied before any copy attempt.
const STABILITY_SAMPLES: u32 = 3;
const STABILITY_INTERVAL: Duration = Duration::from_millis(500);

/// Copies the primary artifact to the draft path with bounded retries.
#[derive(Debug, Clone)]
pub struct Replicator {
    max_retries: u32,
    backoff: Duration,
}

impl Replicator {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Copy `primary` over `draft`, overwriting the destination.
    ///
    /// Fails with `ArtifactMissing` when the primary does not exist and
    /// `NotStable` when it is still being written; otherwise retries the
    /// copy up to the configured limit with backoff `base * attempt` between
    /// attempts, surfacing the last io error on exhaustion.
    pub async fn sync(&self, primary: &Path, draft: &Path) -> Result<(), ReactionError> {
        if !tokio::fs::try_exists(primary).await.unwrap_or(false) {
            return Err(ReactionError::ArtifactMissing {
                path: primary.to_path_buf(),
            });
        }

        if !stability::is_stable(primary, STABILITY_SAMPLES, STABILITY_INTERVAL).await {
            return Err(ReactionError::NotStable {
                path: primary.to_path_buf(),
                samples: STABILITY_SAMPLES,
            });
        }

        retry_with_backoff(self.max_retries, self.backoff, || {
            let from = primary.to_path_buf();
            let to = draft.to_path_buf();
            async move { tokio::fs::copy(&from, &to).await.map(|_| ()) }
        })
        .await
        .map_err(|source| ReactionError::CopyFailed {
            from: primary.to_path_buf(),
            to: draft.to_path_buf(),
            attempts: self.max_retries,
            source,
        })
    }
}

/// Run `op` up to `max_retries` times, sleeping `base * attempt_index`
/// between attempts (500ms, 1000ms, ... for the default base).
///
/// Generic over the operation so exhaustion and backoff are testable without
/// filesystem faults.
pub async fn retry_with_backoff<F, Fut>(
    max_retries: u32,
    base: Duration,
    mut op: F,
) -> Result<(), std::io::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), std::io::Error>>,
{
    let mut last_err = None;

    for attempt in 1..=max_retries.max(1) {
        match op().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!("[replicate] attempt {attempt}/{max_retries} failed: {e}");
                last_err = Some(e);
                if attempt < max_retries {
                    sleep(base * attempt).await;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| std::io::Error::other("no attempts were made")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_retry_exhaustion_counts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let start = Instant::now();
        let result = retry_with_backoff(3, Duration::from_millis(20), move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(std::io::Error::other("disk on fire"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Backoffs of 20ms and 40ms between the three attempts
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_third_attempt_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result = retry_with_backoff(3, Duration::from_millis(1), move || {
            let calls = calls2.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(std::io::Error::other("not yet"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sync_missing_primary() {
        let dir = tempfile::TempDir::new().unwrap();
        let primary = dir.path().join("paper.pdf");
        let draft = dir.path().join("paper_draft.pdf");

        let replicator = Replicator::new(3, Duration::from_millis(1));
        let err = replicator.sync(&primary, &draft).await.unwrap_err();

        assert!(matches!(err, ReactionError::ArtifactMissing { .. }));
        assert!(!draft.exists());
    }

    #[tokio::test]
    async fn test_sync_overwrites_draft() {
        let dir = tempfile::TempDir::new().unwrap();
        let primary = dir.path().join("paper.pdf");
        let draft = dir.path().join("paper_draft.pdf");
        std::fs::write(&primary, b"fresh build").unwrap();
        std::fs::write(&draft, b"stale copy").unwrap();

        let replicator = Replicator::new(3, Duration::from_millis(1));
        replicator.sync(&primary, &draft).await.unwrap();

        assert_eq!(std::fs::read(&draft).unwrap(), b"fresh build");
    }
}
