use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Quiet period before a background draft save.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Coalesces edit signals into a single deadline.
///
/// Each signal pushes the deadline out by the quiet period; signals never
/// stack into multiple pending saves.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Records an edit, resetting the deadline.
    pub fn signal(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Sleeps until the current deadline. Returns at once when idle.
    pub async fn wait_due(&self) {
        if let Some(deadline) = self.deadline {
            sleep_until(deadline).await;
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
