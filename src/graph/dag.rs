//! # Adjacency-list digraph.
//!
//! [`Graph`] stores, for every vertex, the list of its direct successors in
//! insertion order. Predecessors and roots are derived on demand by scanning
//! the adjacency lists, which keeps the structure trivially consistent.
//!
//! ## Rules
//! - `add_vertex` rejects duplicates with [`DuplicateVertex`].
//! - `add_edge` never fails; missing endpoints are materialized.
//! - No cycle detection on insert; call [`Graph::find_cycle`] after building.
//!
//! ## Example
//! ```rust
//! use procvisor::Graph;
//!
//! let mut g = Graph::new();
//! g.add_edge("db", "migrate");
//! g.add_edge("migrate", "web");
//!
//! assert_eq!(g.successors(&"db"), &["migrate"]);
//! assert_eq!(g.predecessors(&"web"), vec!["migrate"]);
//! assert_eq!(g.root_vertices(), vec!["db"]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use thiserror::Error;

/// Returned by [`Graph::add_vertex`] when the vertex is already present.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("vertex {0:?} already exists")]
pub struct DuplicateVertex<T>(pub T);

/// Directed graph keyed by vertex identity.
#[derive(Debug, Clone)]
pub struct Graph<T> {
    adjacency: HashMap<T, Vec<T>>,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self {
            adjacency: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> Graph<T> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex without edges.
    pub fn add_vertex(&mut self, vertex: T) -> Result<(), DuplicateVertex<T>> {
        if self.adjacency.contains_key(&vertex) {
            return Err(DuplicateVertex(vertex));
        }
        self.adjacency.insert(vertex, Vec::new());
        Ok(())
    }

    /// Adds an edge `from -> to`, creating either endpoint if absent.
    pub fn add_edge(&mut self, from: T, to: T) {
        self.adjacency.entry(to.clone()).or_default();
        self.adjacency.entry(from).or_default().push(to);
    }

    /// Direct successors of `vertex` in insertion order (empty if unknown).
    pub fn successors(&self, vertex: &T) -> &[T] {
        self.adjacency
            .get(vertex)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every vertex whose successor list contains `vertex`.
    pub fn predecessors(&self, vertex: &T) -> Vec<T> {
        self.adjacency
            .iter()
            .filter(|(_, succ)| succ.contains(vertex))
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Vertices with no incoming edges. Order is unspecified.
    pub fn root_vertices(&self) -> Vec<T> {
        self.adjacency
            .keys()
            .filter(|v| self.predecessors(v).is_empty())
            .cloned()
            .collect()
    }

    /// All vertices. Order is unspecified.
    pub fn vertices(&self) -> Vec<T> {
        self.adjacency.keys().cloned().collect()
    }

    pub fn contains(&self, vertex: &T) -> bool {
        self.adjacency.contains_key(vertex)
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Returns the vertices that sit on or behind a cycle, or `None` if the
    /// graph is acyclic.
    ///
    /// Kahn's algorithm: repeatedly peel off vertices with in-degree zero.
    /// Whatever cannot be peeled is unreachable from any root.
    pub fn find_cycle(&self) -> Option<Vec<T>> {
        let mut in_degree: HashMap<&T, usize> = self.adjacency.keys().map(|v| (v, 0)).collect();
        for succ in self.adjacency.values() {
            for s in succ {
                if let Some(d) = in_degree.get_mut(s) {
                    *d += 1;
                }
            }
        }

        let mut queue: VecDeque<&T> = in_degree
            .iter()
            .filter(|&(_, d)| *d == 0)
            .map(|(v, _)| *v)
            .collect();
        let mut visited = 0usize;

        while let Some(v) = queue.pop_front() {
            visited += 1;
            for s in self.successors(v) {
                if let Some(d) = in_degree.get_mut(s) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(s);
                    }
                }
            }
        }

        if visited == self.adjacency.len() {
            return None;
        }
        Some(
            in_degree
                .into_iter()
                .filter(|&(_, d)| d > 0)
                .map(|(v, _)| v.clone())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted<T: Ord>(mut v: Vec<T>) -> Vec<T> {
        v.sort();
        v
    }

    #[test]
    fn test_basics() {
        let mut g = Graph::new();
        g.add_edge(1, 2);
        g.add_edge(1, 3);
        g.add_edge(2, 4);
        assert!(g.add_vertex(5).is_ok());
        assert_eq!(g.add_vertex(5), Err(DuplicateVertex(5)));

        assert_eq!(g.successors(&1), &[2, 3]);
        assert!(g.successors(&5).is_empty());
        assert_eq!(g.predecessors(&2), vec![1]);
        assert!(g.predecessors(&1).is_empty());
        assert_eq!(sorted(g.root_vertices()), vec![1, 5]);
        assert_eq!(g.len(), 5);
    }

    #[test]
    fn test_duplicate_vertex_is_an_error() {
        let err: Box<dyn std::error::Error> = Box::new(DuplicateVertex("db"));
        assert_eq!(err.to_string(), r#"vertex "db" already exists"#);
    }

    #[test]
    fn test_add_edge_materializes_endpoints() {
        let mut g = Graph::new();
        g.add_edge("a", "b");
        assert!(g.contains(&"a"));
        assert!(g.contains(&"b"));
        assert_eq!(g.add_vertex("b"), Err(DuplicateVertex("b")));
    }

    #[test]
    fn test_edge_is_visible_from_both_ends() {
        let mut g = Graph::new();
        for (a, b) in [(1, 2), (3, 2), (2, 5), (4, 4)] {
            g.add_edge(a, b);
            assert!(g.predecessors(&b).contains(&a));
            assert!(g.successors(&a).contains(&b));
        }
    }

    #[test]
    fn test_roots_are_exactly_vertices_without_incoming_edges() {
        let mut g = Graph::new();
        g.add_edge("x", "y");
        g.add_edge("y", "z");
        g.add_edge("w", "z");
        g.add_vertex("lonely").unwrap();

        let roots = g.root_vertices();
        for v in g.vertices() {
            assert_eq!(roots.contains(&v), g.predecessors(&v).is_empty(), "{v}");
        }
        assert_eq!(sorted(roots), vec!["lonely", "w", "x"]);
    }

    #[test]
    fn test_successors_keep_insertion_order() {
        let mut g = Graph::new();
        for s in ["c", "a", "b"] {
            g.add_edge("root", s);
        }
        assert_eq!(g.successors(&"root"), &["c", "a", "b"]);
    }

    #[test]
    fn test_find_cycle() {
        let mut g = Graph::new();
        g.add_edge(1, 2);
        g.add_edge(2, 3);
        assert_eq!(g.find_cycle(), None);

        g.add_edge(3, 2);
        g.add_edge(3, 4);
        assert_eq!(sorted(g.find_cycle().unwrap()), vec![2, 3, 4]);
    }

    #[test]
    fn test_self_loop_is_a_cycle_and_never_a_root() {
        let mut g = Graph::new();
        g.add_edge("me", "me");
        assert!(g.root_vertices().is_empty());
        assert_eq!(g.find_cycle(), Some(vec!["me"]));
    }
}
