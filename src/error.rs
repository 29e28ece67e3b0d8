//! Error types used by the procvisor runtime.
//!
//! This module defines three error types:
//!
//! - [`ConfigError`]: invalid program set; fatal before any process starts.
//! - [`RuntimeError`]: failures of the supervisor itself while running.
//! - [`SpawnError`]: the OS refused to start one program attempt.
//!
//! Each type provides `as_label` for logs. Child processes exiting non-zero
//! are not errors at this level; they flow through the restart policy.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Configuration errors.
///
/// Raised while loading the configuration file or building the dependency
/// graph. Any of these aborts startup before a single child is launched.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two program definitions share the same key.
    #[error("duplicate program '{key}'")]
    DuplicateVertex {
        /// The offending key.
        key: String,
    },

    /// `after` references a key that is not defined.
    #[error("program '{program}' depends on unknown program '{dependency}'")]
    MissingDependency {
        /// Program declaring the dependency.
        program: String,
        /// The referenced, missing key.
        dependency: String,
    },

    /// `after` chains form a cycle; the listed programs could never start.
    #[error("dependency cycle involving: {}", programs.join(", "))]
    DependencyCycle {
        /// Programs on or behind the cycle, sorted.
        programs: Vec<String>,
    },

    /// A program has an empty command line.
    #[error("program '{program}' has an empty command")]
    EmptyCommand { program: String },

    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The status server address does not parse as `ip:port`.
    #[error("invalid server address '{value}'")]
    InvalidAddress { value: String },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::ConfigError;
    ///
    /// let err = ConfigError::DuplicateVertex { key: "web".into() };
    /// assert_eq!(err.as_label(), "config_duplicate_program");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::DuplicateVertex { .. } => "config_duplicate_program",
            ConfigError::MissingDependency { .. } => "config_missing_dependency",
            ConfigError::DependencyCycle { .. } => "config_dependency_cycle",
            ConfigError::EmptyCommand { .. } => "config_empty_command",
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse { .. } => "config_parse",
            ConfigError::InvalidAddress { .. } => "config_invalid_address",
        }
    }
}

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Startup was refused because the program set is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Shutdown grace period was exceeded; some children never reported exit.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Keys of programs still starting or running.
        stuck: Vec<String>,
    },

    /// The status endpoint could not bind its listener.
    #[error("status server failed: {source}")]
    StatusServer {
        #[source]
        source: io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(e) => e.as_label(),
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::StatusServer { .. } => "runtime_status_server",
        }
    }
}

/// The OS rejected a spawn request (command not found, permission denied...).
#[derive(Error, Debug)]
#[error("failed to spawn '{program}': {source}")]
pub struct SpawnError {
    pub program: String,
    #[source]
    pub source: io::Error,
}

impl SpawnError {
    pub fn as_label(&self) -> &'static str {
        match self.source.kind() {
            io::ErrorKind::NotFound => "spawn_not_found",
            io::ErrorKind::PermissionDenied => "spawn_permission_denied",
            _ => "spawn_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_programs() {
        let err = ConfigError::DependencyCycle {
            programs: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle involving: a, b");
    }

    #[test]
    fn test_runtime_error_forwards_config_label() {
        let err: RuntimeError = ConfigError::MissingDependency {
            program: "worker".into(),
            dependency: "missing-key".into(),
        }
        .into();
        assert_eq!(err.as_label(), "config_missing_dependency");
        assert_eq!(
            err.to_string(),
            "program 'worker' depends on unknown program 'missing-key'"
        );
    }

    #[test]
    fn test_spawn_error_labels() {
        let err = SpawnError {
            program: "ghost".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.as_label(), "spawn_not_found");
    }
}
