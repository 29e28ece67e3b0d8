//! # Delay before a restarted program is spawned again.
//!
//! [`BackoffPolicy`] turns the number of restarts already performed into a
//! wait. The base delay for restart `n` (0-indexed) is `first × factor^n`,
//! clamped to `max`; jitter is applied to the clamped base and never fed
//! back into later computations.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use procvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(250),
//!     max: Duration::from_secs(2),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(250));
//! assert_eq!(backoff.next(2), Duration::from_secs(1));
//! assert_eq!(backoff.next(9), Duration::from_secs(2));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Restart delay policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first restart.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied on top of the base delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 100ms between restarts, capped at 30s, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Restart immediately, every time.
    pub const fn none() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay before restart number `restart` (0 = first restart).
    pub fn next(&self, restart: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = restart.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(first_ms: u64, max_ms: u64, factor: f64, jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter,
        }
    }

    #[test]
    fn test_none_is_always_zero() {
        let p = BackoffPolicy::none();
        assert_eq!(p.next(0), Duration::ZERO);
        assert_eq!(p.next(50), Duration::ZERO);
    }

    #[test]
    fn test_default_is_constant() {
        let p = BackoffPolicy::default();
        for n in 0..20 {
            assert_eq!(p.next(n), Duration::from_millis(100));
        }
    }

    #[test]
    fn test_exponential_growth_and_cap() {
        let p = policy(100, 1_000, 2.0, JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_millis(100));
        assert_eq!(p.next(1), Duration::from_millis(200));
        assert_eq!(p.next(3), Duration::from_millis(800));
        assert_eq!(p.next(4), Duration::from_millis(1_000));
        assert_eq!(p.next(u32::MAX), Duration::from_millis(1_000));
    }

    #[test]
    fn test_first_above_max_is_clamped() {
        let p = policy(10_000, 5_000, 2.0, JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_millis(5_000));
    }

    #[test]
    fn test_full_jitter_stays_below_base() {
        let p = policy(1_000, 30_000, 1.0, JitterPolicy::Full);
        for n in 0..50 {
            assert!(p.next(n) <= Duration::from_millis(1_000));
        }
    }

    #[test]
    fn test_equal_jitter_stays_in_upper_half() {
        let p = policy(1_000, 30_000, 1.0, JitterPolicy::Equal);
        for n in 0..50 {
            let d = p.next(n);
            assert!(d >= Duration::from_millis(500), "{d:?}");
            assert!(d <= Duration::from_millis(1_000), "{d:?}");
        }
    }

    #[test]
    fn test_decorrelated_respects_floor_and_cap() {
        let p = policy(100, 30_000, 2.0, JitterPolicy::Decorrelated);
        for _ in 0..100 {
            let d = p.next(8);
            assert!(d >= Duration::from_millis(100), "{d:?}");
            assert!(d <= Duration::from_millis(30_000), "{d:?}");
        }
    }
}
