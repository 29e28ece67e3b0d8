//! Restart and backoff policies.
//!
//! ## Contents
//! - [`RestartPolicy`] if a program is restarted after it exits
//! - [`RestartTrigger`] which exits qualify (any / non-zero only)
//! - [`BackoffPolicy`] how long a restarted program waits before spawning
//! - [`JitterPolicy`] randomization of that wait
//!
//! ## Quick wiring
//! ```text
//! ProgramSpec { restart: RestartPolicy, backoff: BackoffPolicy, .. }
//!      ├─► core::orchestrator consults restart.grants(exit_code, retries_left)
//!      └─► core::runner sleeps backoff.next(restarts_done) before spawn
//! ```

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::{RestartPolicy, RestartTrigger};
