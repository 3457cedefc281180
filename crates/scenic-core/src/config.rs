//! TOML configuration.
//!
//! Every key is optional; a missing file means all defaults.
//!
//! ```toml
//! [scheduler]
//! tick_interval_ms = 1000
//! max_concurrency = 3
//!
//! [dependencies]
//! enabled = true
//! stagger_ms = 2000
//!
//! [store]
//! path = "data/tasks.json"
//!
//! [handlers]
//! data_root = "data/regions"
//!
//! [handlers.commands.SEARCH_CITY_SPOTS]
//! program = "python3"
//! args = ["scripts/search_city_spots.py"]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::JobKind;
use crate::error::{Result, ScenicError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub scheduler: SchedulerConfig,
    pub dependencies: DependencyConfig,
    pub store: StoreConfig,
    pub handlers: HandlerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_interval_ms: u64,
    /// Concurrency ceiling. Must be at least 1.
    pub max_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            max_concurrency: 3,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    pub enabled: bool,
    /// Delay between consecutive follow-up tasks of one parent.
    pub stagger_ms: u64,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stagger_ms: 2000,
        }
    }
}

impl DependencyConfig {
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/tasks.json"),
        }
    }
}

/// External program for one job kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    /// Leading arguments, placed before the job's own arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// `scripts/<kind>` with no leading arguments.
    pub fn default_for(kind: JobKind) -> Self {
        Self {
            program: format!("scripts/{}", kind.script_name()),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Root of the per-province data tree.
    pub data_root: PathBuf,
    /// Working directory for spawned programs. Inherited when unset.
    pub working_dir: Option<PathBuf>,
    /// Overrides keyed by job kind (`SEARCH_CITY_SPOTS`, ...).
    pub commands: HashMap<String, CommandSpec>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/regions"),
            working_dir: None,
            commands: HashMap::new(),
        }
    }
}

impl HandlerConfig {
    pub fn command_for(&self, kind: JobKind) -> CommandSpec {
        self.commands
            .get(kind.as_str())
            .cloned()
            .unwrap_or_else(|| CommandSpec::default_for(kind))
    }

    pub fn with_command(mut self, kind: JobKind, command: CommandSpec) -> Self {
        self.commands.insert(kind.as_str().to_string(), command);
        self
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.max_concurrency == 0 {
            return Err(ScenicError::Config(
                "scheduler.max_concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(unknown) = self
            .handlers
            .commands
            .keys()
            .find(|k| JobKind::parse(k).is_none())
        {
            return Err(ScenicError::Config(format!(
                "handlers.commands.{unknown} does not name a job kind"
            )));
        }
        if let Some((kind, _)) = self
            .handlers
            .commands
            .iter()
            .find(|(_, c)| c.program.trim().is_empty())
        {
            return Err(ScenicError::Config(format!(
                "handlers.commands.{kind}.program is empty"
            )));
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("scenic.toml")
}

/// Parse and validate a configuration string.
pub fn from_toml_str(contents: &str) -> Result<OrchestratorConfig> {
    let config: OrchestratorConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate the configuration at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<OrchestratorConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    from_toml_str(&contents)
}

/// Like [`load_from_path`], but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<OrchestratorConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(OrchestratorConfig::default());
    }
    load_from_path(path)
}
