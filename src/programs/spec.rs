//! # Program specification.
//!
//! [`ProgramSpec`] bundles what the supervisor needs to run one program:
//! - the command line (run through the configured shell)
//! - an optional predecessor key (`after`)
//! - a [`RestartPolicy`] and optional [`BackoffPolicy`] override
//! - the grace period after which a live child counts as running
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use procvisor::{ProgramSpec, RestartPolicy};
//!
//! let web = ProgramSpec::new("web", "python -m http.server 8000")
//!     .after("migrate")
//!     .with_restart(RestartPolicy::unlimited())
//!     .with_grace(Duration::from_secs(3));
//!
//! assert_eq!(web.key(), "web");
//! assert_eq!(web.dependency(), Some("migrate"));
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::policies::{BackoffPolicy, RestartPolicy};

/// Immutable definition of one supervised program.
#[derive(Clone, Debug)]
pub struct ProgramSpec {
    key: Arc<str>,
    command: String,
    after: Option<Arc<str>>,
    restart: RestartPolicy,
    backoff: Option<BackoffPolicy>,
    grace: Duration,
}

impl ProgramSpec {
    /// One-shot program with no dependency and no grace period.
    pub fn new(key: impl Into<Arc<str>>, command: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            command: command.into(),
            after: None,
            restart: RestartPolicy::never(),
            backoff: None,
            grace: Duration::ZERO,
        }
    }

    /// Sets the predecessor. An empty key clears it.
    pub fn after(mut self, key: impl Into<Arc<str>>) -> Self {
        let key = key.into();
        self.after = if key.is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Overrides the supervisor-wide restart backoff for this program.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// `Duration::ZERO` disables the `Running` state for this program.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Shared handle to the key, cheap to clone into events.
    pub fn key_arc(&self) -> &Arc<str> {
        &self.key
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn dependency(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn restart(&self) -> RestartPolicy {
        self.restart
    }

    /// Backoff override, or `default` when none was set.
    pub fn backoff_or(&self, default: BackoffPolicy) -> BackoffPolicy {
        self.backoff.unwrap_or(default)
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }
}
