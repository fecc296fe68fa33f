pub mod config;
pub mod difftool;
pub mod error;
pub mod logging;
pub mod notices;
pub mod paths;
pub mod replicate;
pub mod splice;
pub mod stability;
pub mod watcher;

pub use config::Settings;
pub use difftool::DiffTool;
pub use error::ReactionError;
pub use notices::{ConsoleNotifier, Notifier};
pub use paths::DerivedPaths;
pub use replicate::Replicator;
pub use splice::Splicer;
pub use watcher::{WatchError, WatchRegistry};
