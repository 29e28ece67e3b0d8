//! # LogWriter: lifecycle log lines.
//!
//! Turns orchestrator events into the operator-facing log lines:
//!
//! ```text
//! Starting: db
//! Running: db
//! Exited: db
//! Restarted: flaky
//! Failed to start flaky, giving up
//! ```
//!
//! Lines go through `tracing`, so the installed subscriber decides format
//! and destination.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Queue capacity for lifecycle lines; holds a tight restart loop's burst.
pub const LOG_QUEUE_CAPACITY: usize = 65_536;

/// Built-in subscriber emitting lifecycle log lines.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.program_name();
        match e.kind {
            EventKind::Starting => {
                info!(pid = ?e.pid, attempt = ?e.attempt, "Starting: {key}");
            }
            EventKind::Running => {
                info!(pid = ?e.pid, "Running: {key}");
            }
            EventKind::Exited => match e.reason.as_deref() {
                Some(reason) => info!(exit_code = ?e.exit_code, reason, "Exited: {key}"),
                None => info!(exit_code = ?e.exit_code, "Exited: {key}"),
            },
            EventKind::Restarted => {
                info!(attempt = ?e.attempt, "Restarted: {key}");
            }
            EventKind::GaveUp => {
                warn!(exit_code = ?e.exit_code, "Failed to start {key}, giving up");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested, stopping programs");
            }
            EventKind::AllExited => {
                info!("no supervised programs left");
            }
            // The orchestrator logs violations itself when it detects them.
            EventKind::Violation => {}
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }

    fn queue_capacity(&self) -> usize {
        LOG_QUEUE_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Default1024;

    #[async_trait]
    impl Subscribe for Default1024 {
        async fn on_event(&self, _e: &Event) {}
    }

    #[test]
    fn test_log_queue_outsizes_the_default() {
        assert_eq!(LogWriter::new().queue_capacity(), LOG_QUEUE_CAPACITY);
        assert!(LogWriter::new().queue_capacity() >= 32 * Default1024.queue_capacity());
    }
}
