//! Events: data model and the runner → orchestrator channel.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] classification and payload
//! - [`Bus`] sender half of the bounded mpsc event channel
//!
//! ## Quick reference
//! - **Publishers on the bus**: `core::runner` (lifecycle events only).
//! - **Consumer of the bus**: `core::orchestrator` (exactly one).
//! - **Fan-out to observers**: the orchestrator re-emits applied events and
//!   its decisions through [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
