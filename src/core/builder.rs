use std::sync::Arc;

use crate::core::{StateStore, SupervisorConfig, supervisor::Supervisor};
use crate::error::ConfigError;
use crate::programs::{ProgramRegistry, ProgramSpec};
use crate::subscribers::{LogWriter, Subscribe};

/// Builder for a [`Supervisor`].
///
/// Validation happens in [`build`](Self::build): duplicate keys, empty
/// commands, dangling `after` references and dependency cycles are all
/// reported there, before any process is spawned.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    programs: Vec<ProgramSpec>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    log_writer: bool,
}

impl SupervisorBuilder {
    /// Creates a builder with the built-in [`LogWriter`] enabled.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            programs: Vec::new(),
            subscribers: Vec::new(),
            log_writer: true,
        }
    }

    /// Replaces the program definitions.
    pub fn with_programs(mut self, programs: Vec<ProgramSpec>) -> Self {
        self.programs = programs;
        self
    }

    /// Adds one program definition.
    pub fn with_program(mut self, program: ProgramSpec) -> Self {
        self.programs.push(program);
        self
    }

    /// Extra event subscribers, served after the built-in log writer.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Disables the built-in [`LogWriter`].
    pub fn without_log_writer(mut self) -> Self {
        self.log_writer = false;
        self
    }

    /// Validates the program set and returns a ready-to-run supervisor.
    pub fn build(self) -> Result<Supervisor, ConfigError> {
        let registry = ProgramRegistry::new(self.programs)?;
        let graph = registry.dependency_graph()?;
        let store = Arc::new(StateStore::with_programs(registry.keys()));

        let mut subscribers = self.subscribers;
        if self.log_writer {
            subscribers.insert(0, Arc::new(LogWriter::new()));
        }

        Ok(Supervisor::new_internal(
            self.cfg,
            Arc::new(registry),
            Arc::new(graph),
            store,
            subscribers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_invalid_program_sets() {
        let err = SupervisorBuilder::new(SupervisorConfig::default())
            .with_program(ProgramSpec::new("a", "true").after("missing"))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.as_label(), "config_missing_dependency");

        let err = SupervisorBuilder::new(SupervisorConfig::default())
            .with_program(ProgramSpec::new("a", "true").after("b"))
            .with_program(ProgramSpec::new("b", "true").after("a"))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.as_label(), "config_dependency_cycle");
    }

    #[test]
    fn test_store_is_prepopulated() {
        let sup = SupervisorBuilder::new(SupervisorConfig::default())
            .with_program(ProgramSpec::new("a", "true"))
            .with_program(ProgramSpec::new("b", "true").after("a"))
            .build()
            .unwrap();

        let snap = sup.state().snapshot();
        assert_eq!(snap.len(), 2);
        assert!(snap.values().all(|i| i.exit_code.is_empty()));
    }
}
