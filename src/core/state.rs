//! # Shared snapshot of program lifecycle states.
//!
//! [`StateStore`] maps program key → last-known [`ProcessInfo`]. The
//! orchestrator is the only writer; the status endpoint (and tests) read
//! through [`StateStore::snapshot`].
//!
//! ```text
//! Orchestrator ──set()──► Mutex<BTreeMap<key, ProcessInfo>> ◄──snapshot()── status endpoint
//! ```
//!
//! ## Rules
//! - The lock is held for one map operation at most (never across a spawn or await).
//! - `snapshot` returns a full copy: never a half-applied update, possibly
//!   one event behind the orchestrator.
//! - `exit_code` is the empty string unless the state is `exited`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Lifecycle of one program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Never launched (or waiting on a predecessor).
    #[default]
    NotRunning,
    /// Spawned, grace period not yet elapsed.
    Starting,
    /// Alive past its grace period.
    Running,
    /// Terminated; see `exit_code`.
    Exited,
}

impl ProcessState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::NotRunning => "not_running",
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::Exited => "exited",
        }
    }

    /// True for `Starting` and `Running`.
    pub fn is_alive(self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Running)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally visible state of one program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    pub lifecycle: ProcessState,
    /// Decimal exit code, empty unless `lifecycle` is `Exited`.
    pub exit_code: String,
}

impl ProcessInfo {
    pub fn new(lifecycle: ProcessState, exit_code: Option<i32>) -> Self {
        let exit_code = match (lifecycle, exit_code) {
            (ProcessState::Exited, Some(code)) => code.to_string(),
            _ => String::new(),
        };
        Self {
            lifecycle,
            exit_code,
        }
    }
}

/// Mutex-guarded map of program states.
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<BTreeMap<String, ProcessInfo>>,
}

impl StateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `not_running` for every key.
    #[must_use]
    pub fn with_programs<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map = keys
            .into_iter()
            .map(|k| (k.into(), ProcessInfo::default()))
            .collect();
        Self {
            inner: Mutex::new(map),
        }
    }

    /// Records the latest state of `key`.
    pub fn set(&self, key: &str, lifecycle: ProcessState, exit_code: Option<i32>) {
        let info = ProcessInfo::new(lifecycle, exit_code);
        let mut map = self.lock();
        match map.get_mut(key) {
            Some(slot) => *slot = info,
            None => {
                map.insert(key.to_string(), info);
            }
        }
    }

    /// Consistent copy of all states.
    pub fn snapshot(&self) -> BTreeMap<String, ProcessInfo> {
        self.lock().clone()
    }

    pub fn get(&self, key: &str) -> Option<ProcessInfo> {
        self.lock().get(key).cloned()
    }

    /// Sorted keys of programs currently starting or running.
    pub fn alive(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(_, info)| info.lifecycle.is_alive())
            .map(|(k, _)| k.clone())
            .collect()
    }

    // A panic while holding the guard cannot leave a half-written entry
    // (each write is a single insert), so a poisoned map is still valid.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ProcessInfo>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_only_when_exited() {
        assert_eq!(
            ProcessInfo::new(ProcessState::Running, Some(3)).exit_code,
            ""
        );
        assert_eq!(ProcessInfo::new(ProcessState::Exited, Some(3)).exit_code, "3");
        assert_eq!(ProcessInfo::new(ProcessState::Exited, None).exit_code, "");
    }

    #[test]
    fn test_prepopulated_and_updated() {
        let store = StateStore::with_programs(["db", "web"]);
        assert_eq!(store.get("web"), Some(ProcessInfo::default()));

        store.set("db", ProcessState::Running, None);
        store.set("web", ProcessState::Exited, Some(0));

        let snap = store.snapshot();
        assert_eq!(snap["db"].lifecycle, ProcessState::Running);
        assert_eq!(snap["web"].exit_code, "0");
        assert_eq!(store.alive(), vec!["db"]);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let store = StateStore::with_programs(["db"]);
        store.set("db", ProcessState::Exited, Some(1));
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"db": {"lifecycle": "exited", "exit_code": "1"}})
        );
    }

    #[test]
    fn test_concurrent_readers_see_whole_updates() {
        use std::sync::Arc;

        let store = Arc::new(StateStore::with_programs(["a"]));
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..1_000 {
                    store.set("a", ProcessState::Exited, Some(i));
                    store.set("a", ProcessState::Starting, None);
                }
            })
        };
        for _ in 0..1_000 {
            let info = store.snapshot()["a"].clone();
            match info.lifecycle {
                ProcessState::Exited => assert!(!info.exit_code.is_empty()),
                _ => assert!(info.exit_code.is_empty()),
            }
        }
        writer.join().unwrap();
    }
}
