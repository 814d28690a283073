//! Configuration module
//!
//! Handles loading the optional configuration file and resolving it with
//! the environment into the settings a runner needs.

pub mod env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::RunnerError;
use crate::models::TestPath;
use crate::utils::logger::LogLevel;
use env::EnvConfig;

/// How each test of a whole-suite run is isolated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    /// One child process per test
    #[default]
    Process,
    /// Every test in the runner's own process
    Inline,
}

/// Application configuration file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Per-test timeout in seconds, validated when a run starts
    pub per_test_timeout: Option<String>,

    /// Isolation of tests in a whole-suite run
    pub isolation: Isolation,

    /// Log level name
    pub log_level: Option<String>,

    /// Seconds after which a silent child is killed
    pub hang_limit_secs: Option<u64>,
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if is_yaml(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if is_yaml(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// Settings handed to a runner
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunnerConfig {
    /// Raw per-test timeout; `None` disables the watchdog
    pub per_test_timeout: Option<String>,

    /// Set when this process is an isolated child
    pub child_target: Option<TestPath>,

    pub isolation: Isolation,

    pub log_level: LogLevel,

    pub hang_limit: Option<Duration>,
}

impl RunnerConfig {
    /// Merge the configuration file with the environment; the environment wins.
    ///
    /// Fails when the child target set by a parent runner is not a test path.
    pub fn resolve(file: &AppConfig, env: &EnvConfig) -> Result<Self, RunnerError> {
        let child_target = env
            .child_test
            .as_deref()
            .map(str::parse::<TestPath>)
            .transpose()?;

        let isolation = match env.no_fork {
            Some(true) => Isolation::Inline,
            Some(false) => Isolation::Process,
            None => file.isolation,
        };

        let log_level = env
            .log_level
            .as_deref()
            .or(file.log_level.as_deref())
            .map(LogLevel::from_name)
            .unwrap_or_default();

        Ok(Self {
            per_test_timeout: env
                .per_test_timeout
                .clone()
                .or_else(|| file.per_test_timeout.clone()),
            child_target,
            isolation,
            log_level,
            hang_limit: file.hang_limit_secs.map(Duration::from_secs),
        })
    }

    pub fn is_child(&self) -> bool {
        self.child_target.is_some()
    }
}
