//! Dependency graph construction.
//!
//! For every program an isolated vertex is added first, then one edge
//! `after -> program` per declared dependency. The result is checked for
//! dangling references and cycles so that every program is either a root or
//! reachable from one.

use std::sync::Arc;

use crate::error::ConfigError;
use crate::graph::Graph;
use crate::programs::ProgramRegistry;

impl ProgramRegistry {
    /// Builds the startup graph over program keys.
    pub fn dependency_graph(&self) -> Result<Graph<Arc<str>>, ConfigError> {
        let mut graph = Graph::new();

        for spec in self.iter() {
            graph
                .add_vertex(Arc::clone(spec.key_arc()))
                .map_err(|dup| ConfigError::DuplicateVertex {
                    key: dup.0.to_string(),
                })?;
        }

        for spec in self.iter() {
            let Some(after) = spec.dependency() else {
                continue;
            };
            let Some(pred) = self.get(after) else {
                return Err(ConfigError::MissingDependency {
                    program: spec.key().to_string(),
                    dependency: after.to_string(),
                });
            };
            graph.add_edge(Arc::clone(pred.key_arc()), Arc::clone(spec.key_arc()));
        }

        if let Some(stuck) = graph.find_cycle() {
            let mut programs: Vec<String> = stuck.iter().map(|k| k.to_string()).collect();
            programs.sort_unstable();
            return Err(ConfigError::DependencyCycle { programs });
        }

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::ProgramSpec;

    fn registry(specs: &[(&str, &str)]) -> ProgramRegistry {
        ProgramRegistry::new(
            specs
                .iter()
                .map(|(k, after)| ProgramSpec::new(*k, "true").after(*after))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_chain() {
        let g = registry(&[("db", ""), ("migrate", "db"), ("web", "migrate")])
            .dependency_graph()
            .unwrap();

        let roots: Vec<String> = g.root_vertices().iter().map(|k| k.to_string()).collect();
        assert_eq!(roots, vec!["db"]);
        let db: Arc<str> = Arc::from("db");
        assert_eq!(g.successors(&db).len(), 1);
        assert_eq!(&*g.successors(&db)[0], "migrate");
    }

    #[test]
    fn test_missing_dependency_fails() {
        let err = registry(&[("worker", "missing-key")])
            .dependency_graph()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingDependency { ref program, ref dependency }
                if program == "worker" && dependency == "missing-key"
        ));
    }

    #[test]
    fn test_cycle_fails() {
        let err = registry(&[("a", "c"), ("b", "a"), ("c", "b"), ("d", "")])
            .dependency_graph()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DependencyCycle { ref programs } if programs == &["a", "b", "c"]
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let err = registry(&[("a", "a")]).dependency_graph().unwrap_err();
        assert_eq!(err.as_label(), "config_dependency_cycle");
    }
}
