//! # Restart policy for supervised programs.
//!
//! A [`RestartPolicy`] answers one question when a program attempt exits:
//! should a fresh attempt be launched?
//!
//! ```text
//! autorestart = false                     → never restart
//! autorestart = true, max_retries < 0     → restart on every qualifying exit
//! autorestart = true, max_retries = N     → at most N restarts (N + 1 attempts)
//! ```
//!
//! Which exits qualify is controlled by [`RestartTrigger`]:
//! - [`RestartTrigger::Exit`] any exit, zero or not (keep-alive, default)
//! - [`RestartTrigger::Failure`] only non-zero exits (retry until success)

use serde::Deserialize;

/// Which exits may trigger a restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartTrigger {
    /// Restart regardless of the exit code.
    #[default]
    Exit,
    /// Restart only after a non-zero exit.
    Failure,
}

/// Restart settings of one program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Master switch; `false` means the program runs exactly once.
    pub autorestart: bool,
    /// Restart budget; any negative value means unlimited.
    pub max_retries: i32,
    /// Exit codes that qualify for a restart.
    pub trigger: RestartTrigger,
}

impl Default for RestartPolicy {
    /// Returns [`RestartPolicy::never`].
    fn default() -> Self {
        Self::never()
    }
}

impl RestartPolicy {
    /// One-shot program: never restarted.
    pub const fn never() -> Self {
        Self {
            autorestart: false,
            max_retries: -1,
            trigger: RestartTrigger::Exit,
        }
    }

    /// Restart on every exit, forever.
    pub const fn unlimited() -> Self {
        Self {
            autorestart: true,
            max_retries: -1,
            trigger: RestartTrigger::Exit,
        }
    }

    /// Restart on every exit, at most `retries` times.
    pub const fn limited(retries: u32) -> Self {
        Self {
            autorestart: true,
            max_retries: if retries > i32::MAX as u32 {
                i32::MAX
            } else {
                retries as i32
            },
            trigger: RestartTrigger::Exit,
        }
    }

    /// Returns a copy with a different trigger.
    pub const fn on(mut self, trigger: RestartTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.max_retries < 0
    }

    /// Initial value of the per-program retry counter.
    #[inline]
    pub fn initial_retries(&self) -> i32 {
        self.max_retries
    }

    /// Decides whether an attempt that exited with `exit_code` is restarted,
    /// given the retries left for this program.
    pub fn grants(&self, exit_code: i32, retries_remaining: i32) -> bool {
        if !self.autorestart {
            return false;
        }
        let qualifies = match self.trigger {
            RestartTrigger::Exit => true,
            RestartTrigger::Failure => exit_code != 0,
        };
        qualifies && (self.is_unlimited() || retries_remaining > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_refuses_every_exit() {
        let p = RestartPolicy::never();
        assert!(!p.grants(0, 10));
        assert!(!p.grants(1, 10));
    }

    #[test]
    fn test_unlimited_ignores_counter() {
        let p = RestartPolicy::unlimited();
        assert!(p.grants(0, -1));
        assert!(p.grants(3, -500));
    }

    #[test]
    fn test_limited_counts_down_to_zero() {
        let p = RestartPolicy::limited(2);
        let mut remaining = p.initial_retries();
        let mut attempts = 1;
        while p.grants(1, remaining) {
            remaining -= 1;
            attempts += 1;
        }
        assert_eq!(attempts, 3);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_exit_trigger_restarts_on_success() {
        assert!(RestartPolicy::limited(1).grants(0, 1));
    }

    #[test]
    fn test_failure_trigger_skips_success() {
        let p = RestartPolicy::limited(1).on(RestartTrigger::Failure);
        assert!(!p.grants(0, 1));
        assert!(p.grants(2, 1));
    }

    #[test]
    fn test_zero_retries_means_single_attempt() {
        assert!(!RestartPolicy::limited(0).grants(1, 0));
    }
}
