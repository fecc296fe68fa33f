//! Error types for reaction failures.
//!
//! Every way a reaction can fail is one of these six kinds, carrying
//! structured context. Rendering to user-facing text happens only at the
//! notification boundary, never by matching on message strings.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the diff, splice, replicate and stability operations.
#[derive(Error, Debug)]
pub enum ReactionError {
    #[error("artifact not found: {path}")]
    ArtifactMissing { path: PathBuf },

    #[error("{path} is still being written after {samples} stability samples")]
    NotStable { path: PathBuf, samples: u32 },

    #[error("comparison tool failed: {detail}")]
    ExternalTool { detail: String },

    #[error("comparison tool produced no image artifacts")]
    NoDifferences,

    #[error("no '{marker}' anchor in {document}")]
    NoAnchor { document: PathBuf, marker: String },

    #[error("copy {from} -> {to} failed after {attempts} attempts: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
