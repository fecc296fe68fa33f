//! Debounced file watching for document builds.
//!
//! A single notify watcher feeds a registry of per-path debounced entries,
//! each bound to one reaction.
//!
//! # Architecture
//!
//! ```text
//! WatchRegistry
//!   - Single notify::RecommendedWatcher
//!   - anchors:      artifact path -> WatchEntry -> DiffSpliceReaction
//!   - replications: log path      -> WatchEntry -> ReplicateReaction
//!   - document re-scans arm/disarm the anchor entries
//! ```
//!
//! Each `WatchEntry` is a capacity-one channel plus one consumer task:
//! single-flight per path, trailing cooldown, stale notifications dropped.

mod entry;
mod error;
mod reaction;
mod registry;

pub use entry::WatchEntry;
pub use error::WatchError;
pub use reaction::{DiffSpliceReaction, Outcome, Reaction, ReplicateReaction};
pub use registry::WatchRegistry;
