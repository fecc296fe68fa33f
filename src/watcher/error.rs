//! Error types for watcher setup and plumbing.
//!
//! Reaction failures are `crate::error::ReactionError`; these cover the
//! subscription machinery itself.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher registration and the event loop.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
