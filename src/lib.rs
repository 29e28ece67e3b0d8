//! # procvisor
//!
//! **Procvisor** is a minimal process supervisor.
//!
//! It launches a set of OS programs, starts each one only after its
//! predecessor is up (or finished successfully), restarts programs according
//! to a per-program policy, and exposes the live state of every program.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ConfigFile (TOML) ──► Vec<ProgramSpec> ──► SupervisorBuilder::build()
//!                                                 ├─ ProgramRegistry   (keys, commands, policies)
//!                                                 ├─ Graph<key>        (after-edges, cycle check)
//!                                                 └─ StateStore        (all not_running)
//!
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (single consumer, owns all runtime state)              │
//! │  - launches roots, then successors on Running / Exited(0)            │
//! │  - restart decisions, retry counters, outstanding count              │
//! └──────┬──────────────────┬──────────────────┬────────────────▲────────┘
//!        ▼ spawn            ▼ spawn            ▼ spawn          │
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//!   │ProcessRunner │   │ProcessRunner │   │ProcessRunner │      │
//!   │ (1 attempt)  │   │ (1 attempt)  │   │ (1 attempt)  │      │
//!   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘      │
//!          │ Starting / Running / Exited         │              │
//!          ▼                  ▼                  ▼              │
//! ┌────────────────────────────────────────────────────────┐    │
//! │            Bus (bounded mpsc, one slot per program)    │────┘
//! └────────────────────────────────────────────────────────┘
//!
//!   Orchestrator ── emit ──► SubscriberSet ──► LogWriter, user subscribers
//!   Orchestrator ── set ───► StateStore ◄── GET /status (axum)
//! ```
//!
//! ### Lifecycle of one program
//! ```text
//! not_running ──spawn──► starting ──alive past startsecs──► running
//!                           │                                  │
//!                           └──────────── exit ────────────────┴──► exited
//!                                                                     │
//!            restart granted: fresh runner (after backoff) ◄──────────┤
//!            exit code 0:     launch successors not yet launched ◄────┤
//!            otherwise:       give up; successors never start ◄───────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Programs**      | Command, predecessor, restart policy, grace period.      | [`ProgramSpec`]                             |
//! | **Policies**      | Restart budget and trigger, restart backoff with jitter. | [`RestartPolicy`], [`BackoffPolicy`]        |
//! | **Supervision**   | Dependency-ordered launch, restarts, graceful shutdown.  | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **State**         | Per-program lifecycle and exit code, JSON-serializable.  | [`StateStore`], [`ProcessInfo`]             |
//! | **Subscriber API**| Observe lifecycle events and decisions.                  | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Typed configuration and runtime errors.                  | [`ConfigError`], [`RuntimeError`]           |
//! | **Configuration** | TOML program file and runtime settings.                  | [`ConfigFile`], [`SupervisorConfig`]        |
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use procvisor::{ProgramSpec, RestartPolicy, Supervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_program(ProgramSpec::new("migrate", "./migrate.sh"))
//!         .with_program(
//!             ProgramSpec::new("web", "./server --port 8080")
//!                 .after("migrate")
//!                 .with_restart(RestartPolicy::limited(5))
//!                 .with_grace(Duration::from_secs(2)),
//!         )
//!         .build()?;
//!
//!     let summary = sup.run().await?;
//!     for (key, program) in &summary.programs {
//!         println!("{key}: {} attempts, {:?}", program.attempts, program.info);
//!     }
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod graph;
mod policies;
mod programs;
mod status;
mod subscribers;

// ---- Public re-exports ----

pub use config::{ConfigFile, ProgramConfig, parse_addr};
pub use core::{
    ProcessInfo, ProcessState, ProgramSummary, RunSummary, SPAWN_FAILURE_EXIT_CODE, StateStore,
    Supervisor, SupervisorBuilder, SupervisorConfig, UNKNOWN_EXIT_CODE, shutdown_signal,
};
pub use error::{ConfigError, RuntimeError, SpawnError};
pub use events::{Event, EventKind};
pub use graph::{DuplicateVertex, Graph};
pub use policies::{BackoffPolicy, JitterPolicy, RestartPolicy, RestartTrigger};
pub use programs::{ProgramRegistry, ProgramSpec};
pub use status::router as status_router;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
