//! # Supervisor: wires the orchestrator, subscribers and status endpoint.
//!
//! The [`Supervisor`] owns the validated program set and the shared
//! [`StateStore`]. [`Supervisor::run`] drives one full run:
//!
//! ```text
//! run()
//!   ├─ bind status endpoint (optional)     ── bind error → RuntimeError::StatusServer
//!   ├─ SubscriberSet::new(subscribers)     (LogWriter first unless disabled)
//!   ├─ Orchestrator::run(shutdown_signal)
//!   │     ├─ launch roots, react to Starting / Running / Exited
//!   │     └─ on signal: cancel runners, wait up to cfg.grace
//!   ├─ stop status endpoint
//!   └─ drain subscriber queues
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use procvisor::{ProgramSpec, RestartPolicy, Supervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), procvisor::RuntimeError> {
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_program(ProgramSpec::new("db", "redis-server"))
//!         .with_program(
//!             ProgramSpec::new("web", "./web")
//!                 .after("db")
//!                 .with_restart(RestartPolicy::unlimited()),
//!         )
//!         .build()?;
//!
//!     let summary = sup.run().await?;
//!     println!("{:?}", summary.get("web"));
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::builder::SupervisorBuilder;
use crate::core::orchestrator::{Orchestrator, OrchestratorParts, RunSummary};
use crate::core::{StateStore, SupervisorConfig, shutdown};
use crate::error::RuntimeError;
use crate::graph::Graph;
use crate::programs::ProgramRegistry;
use crate::status;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Validated program set plus everything needed to run it.
pub struct Supervisor {
    cfg: SupervisorConfig,
    registry: Arc<ProgramRegistry>,
    graph: Arc<Graph<Arc<str>>>,
    store: Arc<StateStore>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Supervisor {
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        registry: Arc<ProgramRegistry>,
        graph: Arc<Graph<Arc<str>>>,
        store: Arc<StateStore>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        Self {
            cfg,
            registry,
            graph,
            store,
            subscribers,
        }
    }

    /// Shared state store; stays readable during and after the run.
    pub fn state(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Runs until every program has exited, or until a termination signal
    /// arrives and all children stopped within the grace period.
    pub async fn run(self) -> Result<RunSummary, RuntimeError> {
        self.run_until(shutdown::shutdown_signal()).await
    }

    /// Like [`run`](Self::run) but with a caller-supplied shutdown trigger.
    pub async fn run_until<F>(self, shutdown: F) -> Result<RunSummary, RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let server_token = CancellationToken::new();
        let server = match self.cfg.status_addr {
            Some(addr) => {
                let listener = status::bind(addr).await?;
                Some(status::spawn(
                    listener,
                    Arc::clone(&self.store),
                    server_token.clone(),
                ))
            }
            None => None,
        };

        let subs = Arc::new(SubscriberSet::new(self.subscribers));
        info!(programs = self.registry.len(), "supervisor starting");

        let orchestrator = Orchestrator::new(OrchestratorParts {
            channel_capacity: self.cfg.channel_capacity_for(self.registry.len()),
            registry: self.registry,
            graph: self.graph,
            store: self.store,
            subs: Arc::clone(&subs),
            backoff: self.cfg.backoff,
            shell: Arc::from(self.cfg.shell),
            grace: self.cfg.grace,
        });
        let result = orchestrator.run(shutdown).await;

        server_token.cancel();
        if let Some(handle) = server {
            let _ = handle.await;
        }
        if let Ok(set) = Arc::try_unwrap(subs) {
            set.shutdown().await;
        }

        result
    }
}
