//! Stable-state detection for files under active write.
//!
//! Typesetting tools write their outputs in multiple passes, so a change
//! notification usually arrives mid-write. A file counts as settled once two
//! consecutive metadata samples agree on both size and modification time.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::time::sleep;

/// One metadata observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub len: u64,
    pub mtime: SystemTime,
}

/// Tracks consecutive identical samples.
///
/// Separated from the poll loop so the convergence logic is testable with
/// synthetic samples.
#[derive(Debug, Default)]
pub struct StabilityProbe {
    last: Option<Sample>,
}

impl StabilityProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one poll result. Returns true when this sample matches the
    /// previous successful one.
    ///
    /// A failed poll (file absent or locked) clears the previous sample:
    /// it consumes a slot but can never count as a match.
    pub fn observe(&mut self, sample: Option<Sample>) -> bool {
        match sample {
            Some(current) => {
                let stable = self.last == Some(current);
                self.last = Some(current);
                stable
            }
            None => {
                self.last = None;
                false
            }
        }
    }
}

/// Poll `path` up to `sample_count` times, sleeping `interval` between
/// polls, until two consecutive samples match.
///
/// Returns false when the budget is exhausted without a match, including
/// the case where every poll failed.
pub async fn is_stable(path: &Path, sample_count: u32, interval: Duration) -> bool {
    let mut probe = StabilityProbe::new();

    for i in 0..sample_count {
        if i > 0 {
            sleep(interval).await;
        }

        let sample = tokio::fs::metadata(path).await.ok().and_then(|meta| {
            Some(Sample {
                len: meta.len(),
                mtime: meta.modified().ok()?,
            })
        });

        if probe.observe(sample) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: u64, secs: u64) -> Option<Sample> {
        Some(Sample {
            len,
            mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        })
    }

    #[test]
    fn test_probe_converges_on_consecutive_match() {
        let mut probe = StabilityProbe::new();

        assert!(!probe.observe(sample(10, 1)));
        assert!(!probe.observe(sample(20, 2)));
        assert!(probe.observe(sample(20, 2)));
    }

    #[test]
    fn test_probe_requires_both_fields() {
        let mut probe = StabilityProbe::new();

        assert!(!probe.observe(sample(10, 1)));
        // Same size, newer mtime: still being written
        assert!(!probe.observe(sample(10, 2)));
        assert!(probe.observe(sample(10, 2)));
    }

    #[test]
    fn test_probe_failure_breaks_streak() {
        let mut probe = StabilityProbe::new();

        assert!(!probe.observe(sample(10, 1)));
        assert!(!probe.observe(None));
        // First sample after a failure cannot match anything
        assert!(!probe.observe(sample(10, 1)));
        assert!(probe.observe(sample(10, 1)));
    }

    #[tokio::test]
    async fn test_quiet_file_is_stable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"done").unwrap();

        assert!(is_stable(&path, 3, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_missing_file_is_unstable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.pdf");

        assert!(!is_stable(&path, 3, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_single_sample_budget_never_stable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"done").unwrap();

        // Two consecutive matching samples need a budget of at least two.
        assert!(!is_stable(&path, 1, Duration::from_millis(10)).await);
    }
}
