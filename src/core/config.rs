//! # Runtime configuration.
//!
//! [`SupervisorConfig`] holds the knobs that apply to the whole supervisor
//! rather than to one program. Per-program settings live in
//! [`ProgramSpec`](crate::ProgramSpec).
//!
//! ## Sentinel values
//! - `channel_capacity = 0` → one slot per program (minimum 1)
//! - `status_addr = None` → no status endpoint

use std::net::SocketAddr;
use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the supervisor runtime.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum wait for children to exit after a shutdown signal.
    pub grace: Duration,

    /// Capacity of the runner → orchestrator event channel.
    pub channel_capacity: usize,

    /// Restart delay for programs without their own backoff.
    pub backoff: BackoffPolicy,

    /// Bind address of the status endpoint.
    pub status_addr: Option<SocketAddr>,

    /// Interpreter prefix; the program command is appended as one argument.
    pub shell: Vec<String>,
}

impl SupervisorConfig {
    /// Event channel capacity for `programs` definitions.
    #[inline]
    pub fn channel_capacity_for(&self, programs: usize) -> usize {
        match self.channel_capacity {
            0 => programs.max(1),
            n => n,
        }
    }
}

impl Default for SupervisorConfig {
    /// - `grace = 10s`
    /// - `channel_capacity = 0` (one slot per program)
    /// - `backoff = BackoffPolicy::default()` (constant 100ms)
    /// - `status_addr = None`
    /// - `shell = ["sh", "-c"]` (`["cmd", "/C"]` on Windows)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            channel_capacity: 0,
            backoff: BackoffPolicy::default(),
            status_addr: None,
            shell: default_shell(),
        }
    }
}

fn default_shell() -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".into(), "/C".into()]
    } else {
        vec!["sh".into(), "-c".into()]
    }
}
