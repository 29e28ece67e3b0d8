//! # Orchestrator: the single consumer of lifecycle events.
//!
//! Owns every piece of mutable scheduling state and decides what to launch,
//! restart, or give up on. Runners only report; they never decide.
//!
//! ## Architecture
//! ```text
//!   launch(root programs)
//!          │
//!          ▼
//! loop { while outstanding > 0
//!   ├─► Starting(key)  → store
//!   ├─► Running(key)   → store, launch successors not yet launched
//!   ├─► Exited(key)    → store, outstanding -= 1
//!   │       ├─ restart granted  → retries -= 1 (if limited), relaunch
//!   │       ├─ exit code 0      → launch successors not yet launched
//!   │       └─ otherwise        → give up, successors never start
//!   ├─► anything else  → log violation, skip
//!   └─► shutdown signal → stop granting, cancel runners, wait up to grace
//! }
//! ```
//!
//! ## Rules
//! - Events are applied one at a time to completion; no locking of runtime state.
//! - `outstanding` counts launched attempts whose `Exited` has not arrived yet.
//! - A program is launched as a successor at most once (`launched` gate),
//!   whichever of `Running` / successful `Exited` of its predecessor comes first.
//! - The state store lock is never held across a spawn.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::core::runner::{ProcessRunner, UNKNOWN_EXIT_CODE};
use crate::core::state::{ProcessInfo, ProcessState, StateStore};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::graph::Graph;
use crate::policies::BackoffPolicy;
use crate::programs::{ProgramRegistry, ProgramSpec};
use crate::subscribers::SubscriberSet;

/// Mutable per-program state, owned by the orchestrator alone.
#[derive(Debug, Clone)]
pub struct RuntimeState {
    pub lifecycle: ProcessState,
    /// Meaningful only when `lifecycle` is `Exited`.
    pub last_exit_code: Option<i32>,
    /// Restarts left; ignored for unlimited policies.
    pub retries_remaining: i32,
    /// Attempts launched so far.
    pub attempts: u32,
    /// Launch gate: set on first launch, never cleared.
    pub launched: bool,
    /// Set once any attempt exited.
    pub has_run: bool,
}

impl RuntimeState {
    fn new(spec: &ProgramSpec) -> Self {
        Self {
            lifecycle: ProcessState::NotRunning,
            last_exit_code: None,
            retries_remaining: spec.restart().initial_retries(),
            attempts: 0,
            launched: false,
            has_run: false,
        }
    }
}

/// Runtime state of every program, keyed by program key.
#[derive(Debug, Default)]
pub struct RuntimeTable {
    states: HashMap<Arc<str>, RuntimeState>,
}

impl RuntimeTable {
    fn new(registry: &ProgramRegistry) -> Self {
        let states = registry
            .iter()
            .map(|spec| (Arc::clone(spec.key_arc()), RuntimeState::new(spec)))
            .collect();
        Self { states }
    }

    pub fn get(&self, key: &str) -> Option<&RuntimeState> {
        self.states.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut RuntimeState> {
        self.states.get_mut(key)
    }
}

/// Final per-program outcome of a supervisor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSummary {
    /// Attempts launched over the whole run.
    pub attempts: u32,
    /// Restarts left; `None` for unlimited policies.
    pub retries_remaining: Option<i32>,
    /// Last state as published to the state store.
    pub info: ProcessInfo,
}

/// Outcome of [`Supervisor::run`](crate::Supervisor::run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub programs: BTreeMap<String, ProgramSummary>,
}

impl RunSummary {
    pub fn get(&self, key: &str) -> Option<&ProgramSummary> {
        self.programs.get(key)
    }
}

/// Everything the orchestrator needs besides its own state.
pub(crate) struct OrchestratorParts {
    pub registry: Arc<ProgramRegistry>,
    pub graph: Arc<Graph<Arc<str>>>,
    pub store: Arc<StateStore>,
    pub subs: Arc<SubscriberSet>,
    pub backoff: BackoffPolicy,
    pub shell: Arc<[String]>,
    pub grace: Duration,
    pub channel_capacity: usize,
}

/// Single-threaded event loop driving all runners.
pub(crate) struct Orchestrator {
    registry: Arc<ProgramRegistry>,
    graph: Arc<Graph<Arc<str>>>,
    store: Arc<StateStore>,
    subs: Arc<SubscriberSet>,
    backoff: BackoffPolicy,
    shell: Arc<[String]>,
    grace: Duration,

    bus: Bus,
    rx: mpsc::Receiver<Event>,
    table: RuntimeTable,
    runners: JoinSet<()>,
    outstanding: usize,
    runtime_token: CancellationToken,
    shutting_down: bool,
}

impl Orchestrator {
    pub(crate) fn new(parts: OrchestratorParts) -> Self {
        let (bus, rx) = Bus::channel(parts.channel_capacity);
        let table = RuntimeTable::new(&parts.registry);
        Self {
            registry: parts.registry,
            graph: parts.graph,
            store: parts.store,
            subs: parts.subs,
            backoff: parts.backoff,
            shell: parts.shell,
            grace: parts.grace,
            bus,
            rx,
            table,
            runners: JoinSet::new(),
            outstanding: 0,
            runtime_token: CancellationToken::new(),
            shutting_down: false,
        }
    }

    /// Launches the roots and processes events until no work remains.
    ///
    /// `shutdown` resolving starts a graceful stop: no more restarts or
    /// successor launches, every runner kills its child, and the loop waits up
    /// to `grace` for the remaining `Exited` events.
    pub(crate) async fn run<F>(mut self, shutdown: F) -> Result<RunSummary, RuntimeError>
    where
        F: Future<Output = ()>,
    {
        self.launch_roots();

        tokio::pin!(shutdown);
        let deadline = time::sleep(self.grace);
        tokio::pin!(deadline);

        while self.outstanding > 0 {
            tokio::select! {
                biased;
                ev = self.rx.recv() => match ev {
                    Some(ev) => self.handle(ev),
                    None => break,
                },
                _ = &mut shutdown, if !self.shutting_down => {
                    self.begin_shutdown();
                    deadline.as_mut().reset(Instant::now() + self.grace);
                }
                _ = &mut deadline, if self.shutting_down => {
                    let stuck = self.store.alive();
                    error!(?stuck, "children still alive after {:?}", self.grace);
                    return Err(RuntimeError::GraceExceeded {
                        grace: self.grace,
                        stuck,
                    });
                }
            }
        }

        self.subs.emit(&Event::new(EventKind::AllExited));
        while self.runners.join_next().await.is_some() {}
        Ok(self.summary())
    }

    /// Applies one event from the channel.
    fn handle(&mut self, ev: Event) {
        let Some(lifecycle) = ev.kind.lifecycle() else {
            self.violation(&ev, "non-lifecycle event on runner channel");
            return;
        };
        let Some(spec) = ev
            .program
            .as_deref()
            .and_then(|k| self.registry.get(k))
            .cloned()
        else {
            self.violation(&ev, "event for unknown program");
            return;
        };
        let key = spec.key();

        match lifecycle {
            ProcessState::Starting | ProcessState::Running => {
                if let Some(rt) = self.table.get_mut(key) {
                    rt.lifecycle = lifecycle;
                }
                self.store.set(key, lifecycle, None);
                self.subs.emit(&ev);
                if lifecycle == ProcessState::Running && !self.shutting_down {
                    self.launch_successors(key);
                }
            }
            ProcessState::Exited => self.on_exit(&spec, &ev),
            ProcessState::NotRunning => {
                self.violation(&ev, "runner reported not_running");
            }
        }
    }

    fn on_exit(&mut self, spec: &Arc<ProgramSpec>, ev: &Event) {
        let key = spec.key();
        let code = ev.exit_code.unwrap_or(UNKNOWN_EXIT_CODE);
        self.outstanding = self.outstanding.saturating_sub(1);

        let Some(rt) = self.table.get_mut(key) else {
            return;
        };
        rt.lifecycle = ProcessState::Exited;
        rt.last_exit_code = Some(code);
        rt.has_run = true;
        self.store.set(key, ProcessState::Exited, Some(code));
        self.subs.emit(ev);

        if self.shutting_down {
            return;
        }

        let policy = spec.restart();
        if policy.grants(code, rt.retries_remaining) {
            if !policy.is_unlimited() {
                rt.retries_remaining -= 1;
            }
            let delay = spec.backoff_or(self.backoff).next(rt.attempts.saturating_sub(1));
            let attempt = self.launch(spec, delay);
            self.subs.emit(
                &Event::new(EventKind::Restarted)
                    .with_program(Arc::clone(spec.key_arc()))
                    .with_exit_code(code)
                    .with_attempt(attempt),
            );
        } else if code == 0 {
            self.launch_successors(key);
        } else {
            self.subs.emit(
                &Event::new(EventKind::GaveUp)
                    .with_program(Arc::clone(spec.key_arc()))
                    .with_exit_code(code)
                    .with_attempt(rt.attempts),
            );
        }
    }

    fn launch_roots(&mut self) {
        let mut roots = self.graph.root_vertices();
        roots.sort_unstable();
        for key in roots {
            if let Some(spec) = self.registry.get(&key).cloned() {
                self.launch(&spec, Duration::ZERO);
            }
        }
    }

    fn launch_successors(&mut self, key: &str) {
        let key: Arc<str> = Arc::from(key);
        let successors = self.graph.successors(&key).to_vec();
        for succ in successors {
            if self.table.get(&succ).is_some_and(|rt| rt.launched) {
                continue;
            }
            match self.registry.get(&succ).cloned() {
                Some(spec) => {
                    debug!(program = %succ, after = %key, "dependency satisfied");
                    self.launch(&spec, Duration::ZERO);
                }
                None => error!(program = %succ, "successor missing from registry"),
            }
        }
    }

    /// Spawns a fresh runner for `spec`; returns its attempt number.
    fn launch(&mut self, spec: &Arc<ProgramSpec>, delay: Duration) -> u32 {
        let attempt = match self.table.get_mut(spec.key()) {
            Some(rt) => {
                rt.launched = true;
                rt.attempts += 1;
                rt.attempts
            }
            None => 1,
        };

        let runner = ProcessRunner {
            spec: Arc::clone(spec),
            attempt,
            delay,
            shell: Arc::clone(&self.shell),
            bus: self.bus.clone(),
        };
        // Reap finished runners so unlimited restarts do not grow the set.
        while self.runners.try_join_next().is_some() {}
        self.runners.spawn(runner.run(self.runtime_token.child_token()));
        self.outstanding += 1;
        attempt
    }

    fn begin_shutdown(&mut self) {
        info!(outstanding = self.outstanding, "shutdown signal received");
        self.shutting_down = true;
        self.subs.emit(&Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();
    }

    fn violation(&self, ev: &Event, what: &'static str) {
        error!(
            kind = ev.kind.as_str(),
            program = ev.program_name(),
            "internal error: {what}; event skipped"
        );
        let mut report = Event::new(EventKind::Violation).with_reason(what);
        if let Some(p) = &ev.program {
            report = report.with_program(Arc::clone(p));
        }
        self.subs.emit(&report);
    }

    fn summary(&self) -> RunSummary {
        let snapshot = self.store.snapshot();
        let programs = self
            .registry
            .iter()
            .map(|spec| {
                let key = spec.key();
                let rt = self.table.get(key);
                let summary = ProgramSummary {
                    attempts: rt.map_or(0, |rt| rt.attempts),
                    retries_remaining: if spec.restart().is_unlimited() {
                        None
                    } else {
                        rt.map(|rt| rt.retries_remaining)
                    },
                    info: snapshot.get(key).cloned().unwrap_or_default(),
                };
                (key.to_string(), summary)
            })
            .collect();
        RunSummary { programs }
    }
}

#[cfg(test)]
impl Orchestrator {
    /// Test hook: inject an event as if a runner had sent it.
    pub(crate) fn inject(&mut self, ev: Event) {
        self.handle(ev);
    }

    pub(crate) fn table(&self) -> &RuntimeTable {
        &self.table
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub(crate) fn runner_count(&self) -> usize {
        self.runners.len()
    }
}
