//! # Program registry.
//!
//! Arena of [`ProgramSpec`]s with a key index. Everything downstream (graph,
//! orchestrator, state store) refers to programs by key, never by reference
//! into another structure.
//!
//! ## Rules
//! - Keys are unique; a duplicate is a [`ConfigError::DuplicateVertex`].
//! - Commands are non-empty.
//! - Read-only after construction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::programs::ProgramSpec;

/// Read-only collection of program definitions.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: Vec<Arc<ProgramSpec>>,
    index: HashMap<Arc<str>, usize>,
}

impl ProgramRegistry {
    /// Validates and indexes `specs`, keeping their order.
    pub fn new(specs: Vec<ProgramSpec>) -> Result<Self, ConfigError> {
        let mut programs = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());

        for spec in specs {
            if spec.command().trim().is_empty() {
                return Err(ConfigError::EmptyCommand {
                    program: spec.key().to_string(),
                });
            }
            let key = Arc::clone(spec.key_arc());
            if index.insert(Arc::clone(&key), programs.len()).is_some() {
                return Err(ConfigError::DuplicateVertex {
                    key: key.to_string(),
                });
            }
            programs.push(Arc::new(spec));
        }

        Ok(Self { programs, index })
    }

    /// Looks a program up by key. Absence is not an error here.
    pub fn get(&self, key: &str) -> Option<&Arc<ProgramSpec>> {
        self.index.get(key).map(|&i| &self.programs[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Programs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProgramSpec>> {
        self.programs.iter()
    }

    /// Sorted program keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.index.keys().map(|k| k.to_string()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
