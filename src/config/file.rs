use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::policies::{RestartPolicy, RestartTrigger};
use crate::programs::ProgramSpec;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Informational name of the program set.
    pub name: Option<String>,
    /// Status endpoint address, `ip:port`.
    pub server: Option<String>,
    /// Program definitions keyed by program key.
    #[serde(default)]
    pub programs: BTreeMap<String, ProgramConfig>,
}

/// One `[programs.<key>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramConfig {
    pub command: String,
    #[serde(default)]
    pub autorestart: bool,
    /// Restart budget; absent or negative is unlimited.
    pub startretries: Option<i32>,
    /// Seconds a child must stay alive to count as running.
    #[serde(default)]
    pub startsecs: u64,
    /// Predecessor key; empty means none.
    pub after: Option<String>,
    pub restart_on: Option<RestartTrigger>,
}

impl ConfigFile {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse::<Self>().map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Program specs, sorted by key.
    pub fn programs(&self) -> Vec<ProgramSpec> {
        self.programs
            .iter()
            .map(|(key, program)| program.to_spec(key))
            .collect()
    }

    /// Parsed `server` address; `None` when absent or empty.
    pub fn server_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        match self.server.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_addr(value).map(Some),
        }
    }
}

impl FromStr for ConfigFile {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl ProgramConfig {
    pub fn restart_policy(&self) -> RestartPolicy {
        if !self.autorestart {
            return RestartPolicy::never();
        }
        let policy = match self.startretries {
            Some(n) if n >= 0 => RestartPolicy::limited(n.unsigned_abs()),
            _ => RestartPolicy::unlimited(),
        };
        policy.on(self.restart_on.unwrap_or_default())
    }

    pub fn to_spec(&self, key: &str) -> ProgramSpec {
        ProgramSpec::new(key, self.command.trim())
            .after(self.after.as_deref().unwrap_or_default().trim())
            .with_restart(self.restart_policy())
            .with_grace(Duration::from_secs(self.startsecs))
    }
}

/// Parses an `ip:port` address.
pub fn parse_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        value: value.to_string(),
    })
}
