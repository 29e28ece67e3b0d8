//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for observing what the orchestrator
//! did: every applied lifecycle event and every decision (restart, give-up)
//! is delivered to each subscriber through its own bounded queue.
//!
//! ```text
//! Orchestrator ──emit──► SubscriberSet ──► [queue] ──► worker ──► on_event()
//! ```
//!
//! ## Rules
//! - A slow subscriber only fills its own queue; overflow drops events for it alone.
//! - Per-subscriber FIFO.
//! - Subscribers observe; they cannot influence scheduling.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use procvisor::{Event, EventKind, Subscribe};
//!
//! struct CountRestarts(std::sync::atomic::AtomicU32);
//!
//! #[async_trait]
//! impl Subscribe for CountRestarts {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::Restarted {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "count_restarts" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic log lines.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
