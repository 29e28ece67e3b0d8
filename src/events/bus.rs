//! # Event channel between process runners and the orchestrator.
//!
//! [`Bus`] is the sending half of a bounded `tokio::sync::mpsc` channel.
//! Every runner holds a clone; the orchestrator owns the single receiver.
//!
//! ```text
//! Runner db      ──┐
//! Runner migrate ──┼──► Bus (mpsc, bounded) ──► Orchestrator loop
//! Runner web     ──┘
//! ```
//!
//! ## Rules
//! - Per-sender FIFO: a runner's events arrive in the order it sent them.
//! - No ordering across runners.
//! - `publish` waits for capacity; the orchestrator always drains, so a full
//!   channel only slows runners down.

use tokio::sync::mpsc;

use super::event::Event;

/// Cloneable sender side of the event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: mpsc::Sender<Event>,
}

impl Bus {
    /// Creates a channel with `capacity` slots (minimum 1).
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Sends an event. Returns `false` if the orchestrator is gone.
    pub async fn publish(&self, ev: Event) -> bool {
        self.tx.send(ev).await.is_ok()
    }
}
