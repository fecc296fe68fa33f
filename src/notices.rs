//! User-visible notifications.
//!
//! Reactions report exactly one success or failure message per accepted
//! notification. The trait seam lets tests record messages instead of
//! printing them.

use std::sync::Mutex;

use owo_colors::OwoColorize;

/// Sink for user-visible messages.
pub trait Notifier: Send + Sync {
    /// Informational message (sync completed, N anchors filled).
    fn info(&self, message: &str);

    /// Error message with a human-readable cause.
    fn error(&self, message: &str);
}

/// Prints to the terminal and mirrors into the log.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
        println!("{} {message}", "✓".green());
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
        eprintln!("{} {message}", "✗".red());
    }
}

/// Collects messages for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_collects_in_order() {
        let notifier = RecordingNotifier::default();

        notifier.info("synced");
        notifier.error("boom");
        notifier.info("2 anchors filled");

        assert_eq!(
            *notifier.infos.lock().unwrap(),
            vec!["synced".to_string(), "2 anchors filled".to_string()]
        );
        assert_eq!(*notifier.errors.lock().unwrap(), vec!["boom".to_string()]);
    }
}
