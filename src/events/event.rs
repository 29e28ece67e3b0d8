//! # Events exchanged between runners, the orchestrator and subscribers.
//!
//! [`EventKind`] falls into three groups:
//! - **Lifecycle** (`Starting`, `Running`, `Exited`): emitted by process runners
//!   onto the event channel; the only kinds the orchestrator acts on.
//! - **Decisions** (`Restarted`, `GaveUp`, `Violation`): emitted by the
//!   orchestrator to subscribers after it applied a lifecycle event.
//! - **Supervisor** (`ShutdownRequested`, `AllExited`): whole-run milestones.
//!
//! ## Ordering
//! `seq` is global and monotonic. Events of one runner are produced in causal
//! order `Starting → [Running] → Exited`; different programs interleave freely.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind, ProcessState};
//!
//! let ev = Event::new(EventKind::Exited)
//!     .with_program("db")
//!     .with_exit_code(0)
//!     .with_attempt(1);
//!
//! assert_eq!(ev.kind.lifecycle(), Some(ProcessState::Exited));
//! assert_eq!(ev.program.as_deref(), Some("db"));
//! assert_eq!(ev.exit_code, Some(0));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::ProcessState;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle (runner → orchestrator) ===
    /// The OS accepted the spawn request.
    ///
    /// Sets `program`, `pid`, `attempt`.
    Starting,

    /// Grace period elapsed while the child was still alive.
    ///
    /// Sets `program`, `pid`, `attempt`.
    Running,

    /// The child terminated, was killed, or never spawned.
    ///
    /// Sets `program`, `exit_code`, `attempt`; `reason` on spawn failure.
    Exited,

    // === Decisions (orchestrator → subscribers) ===
    /// A fresh attempt was launched after an exit.
    ///
    /// Sets `program`, `attempt` (the new attempt), `exit_code` (previous exit).
    Restarted,

    /// Non-zero exit without a granted restart; successors will never start.
    ///
    /// Sets `program`, `exit_code`, `attempt`.
    GaveUp,

    /// An event broke an orchestrator invariant and was skipped.
    ///
    /// Sets `reason`, and `program` when known.
    Violation,

    // === Supervisor ===
    /// OS termination signal observed.
    ShutdownRequested,

    /// No supervised work remains.
    AllExited,
}

impl EventKind {
    /// Lifecycle state carried by this kind, if it is a lifecycle event.
    pub fn lifecycle(self) -> Option<ProcessState> {
        match self {
            EventKind::Starting => Some(ProcessState::Starting),
            EventKind::Running => Some(ProcessState::Running),
            EventKind::Exited => Some(ProcessState::Exited),
            _ => None,
        }
    }

    /// Short snake_case name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Starting => "starting",
            EventKind::Running => "running",
            EventKind::Exited => "exited",
            EventKind::Restarted => "restarted",
            EventKind::GaveUp => "gave_up",
            EventKind::Violation => "violation",
            EventKind::ShutdownRequested => "shutdown_requested",
            EventKind::AllExited => "all_exited",
        }
    }
}

/// Event with optional metadata, set depending on [`EventKind`].
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    pub kind: EventKind,
    /// Program key, if applicable.
    pub program: Option<Arc<str>>,
    /// Child pid; only for `Starting` / `Running`.
    pub pid: Option<u32>,
    /// Exit code; only for `Exited` and decisions derived from it.
    pub exit_code: Option<i32>,
    /// Attempt number of the program (1-based).
    pub attempt: Option<u32>,
    /// Human-readable detail (spawn errors, violations).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event stamped with the current time and the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            program: None,
            pid: None,
            exit_code: None,
            attempt: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_program(mut self, program: impl Into<Arc<str>>) -> Self {
        self.program = Some(program.into());
        self
    }

    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Program key or `"?"`, for log lines.
    pub fn program_name(&self) -> &str {
        self.program.as_deref().unwrap_or("?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::Starting);
        let b = Event::new(EventKind::Starting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_only_lifecycle_kinds_map_to_a_state() {
        assert_eq!(EventKind::Running.lifecycle(), Some(ProcessState::Running));
        for k in [
            EventKind::Restarted,
            EventKind::GaveUp,
            EventKind::Violation,
            EventKind::ShutdownRequested,
            EventKind::AllExited,
        ] {
            assert_eq!(k.lifecycle(), None, "{}", k.as_str());
        }
    }
}
