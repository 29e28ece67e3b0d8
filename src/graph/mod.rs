//! Generic directed graph used as the startup scheduler.
//!
//! - [`Graph`] adjacency-list digraph over opaque vertex identities
//! - [`Graph::find_cycle`] Kahn-style cycle check run at build time
//!
//! Edges point from a predecessor to its dependents: `a -> b` means "`b`
//! may start once `a` reached a qualifying state".

mod dag;

pub use dag::{DuplicateVertex, Graph};
