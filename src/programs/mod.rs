//! # Program definitions and their dependency graph.
//!
//! - [`ProgramSpec`] immutable definition of one supervised program
//! - [`ProgramRegistry`] arena of specs indexed by key
//! - [`ProgramRegistry::dependency_graph`] builds the startup graph once
//!
//! Definitions and the graph are read-only after construction and shared
//! freely between runners; nothing here is behind a lock.

mod deps;
mod registry;
mod spec;

pub use registry::ProgramRegistry;
pub use spec::ProgramSpec;
