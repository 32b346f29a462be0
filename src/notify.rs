use herdwise_core::{Level, Notifier};

/// Prints notifications to stdout. Logs go to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn prefix(level: Level) -> &'static str {
        match level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        println!("[{}] {}", Self::prefix(level), message);
    }
}
