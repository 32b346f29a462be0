//! Notification sink.
//!
//! Fire-and-forget messages to the user. The core never reads anything back.

use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Success => write!(f, "success"),
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);

    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }
}

/// Drops every message.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _level: Level, _message: &str) {}
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<(Level, String)> {
        self.messages().pop()
    }

    pub fn count(&self, level: Level) -> usize {
        self.messages().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.info("first");
        notifier.error("second");
        assert_eq!(notifier.messages().len(), 2);
        assert_eq!(notifier.last(), Some((Level::Error, "second".to_string())));
        assert_eq!(notifier.count(Level::Info), 1);

        notifier.clear();
        assert!(notifier.messages().is_empty());
    }
}
