//! Runtime core: running programs and reacting to their lifecycle.
//!
//! The public entry point is [`Supervisor`], built through [`SupervisorBuilder`].
//!
//! Internal modules:
//! - [`runner`]: runs one attempt of one program and reports its lifecycle;
//! - [`orchestrator`]: single consumer of lifecycle events, owns restart and dependency decisions;
//! - [`state`]: externally visible per-program state;
//! - [`supervisor`]: wires orchestrator, subscribers and status endpoint;
//! - [`shutdown`]: OS termination signals.

mod builder;
mod config;
mod orchestrator;
mod runner;
mod shutdown;
mod state;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use orchestrator::{ProgramSummary, RunSummary};
pub use runner::{SPAWN_FAILURE_EXIT_CODE, UNKNOWN_EXIT_CODE};
pub use shutdown::shutdown_signal;
pub use state::{ProcessInfo, ProcessState, StateStore};
pub use supervisor::Supervisor;
