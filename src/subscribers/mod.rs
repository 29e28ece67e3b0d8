//! # Event subscribers.
//!
//! - [`Subscribe`] trait for observers of orchestrator events
//! - [`SubscriberSet`] fan-out with per-subscriber queues
//! - [`LogWriter`] built-in subscriber producing the lifecycle log lines
//!
//! ```text
//! Orchestrator ── emit(&Event) ──► SubscriberSet
//!                                      ├──► LogWriter
//!                                      └──► user subscribers (metrics, alerts, ...)
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
