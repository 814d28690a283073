//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use crate::models::TestPath;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITEKIT";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Per-test timeout from SUITEKIT_PER_TEST_TIMEOUT, kept raw until validated
    pub per_test_timeout: Option<String>,
    /// Addressed test from SUITEKIT_CHILD_TEST, set by the parent runner;
    /// kept raw so a malformed path is rejected when resolved
    pub child_test: Option<String>,
    /// Inline isolation from SUITEKIT_NO_FORK
    pub no_fork: Option<bool>,
    /// Log level from SUITEKIT_LOG
    pub log_level: Option<String>,
    /// Config file from SUITEKIT_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            per_test_timeout: get_env("PER_TEST_TIMEOUT"),
            child_test: get_env("CHILD_TEST"),
            no_fork: get_env_bool("NO_FORK"),
            log_level: get_env("LOG"),
            config_file: get_env("CONFIG"),
        }
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn per_test_timeout(mut self, raw: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_PER_TEST_TIMEOUT"), raw.into()));
        self
    }

    pub fn child_test(mut self, path: &TestPath) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_CHILD_TEST"), path.to_string()));
        self
    }

    pub fn no_fork(mut self, no_fork: bool) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_NO_FORK"), no_fork.to_string()));
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_LOG"), level.into()));
        self
    }

    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CONFIG"), path.into()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all SUITEKIT environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_PER_TEST_TIMEOUT  Seconds a single test may run (positive integer)");
    println!("  {ENV_PREFIX}_NO_FORK           Run every test in the runner process (true/false)");
    println!("  {ENV_PREFIX}_LOG               Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_CONFIG            Path to configuration file");
    println!("  {ENV_PREFIX}_CHILD_TEST        Set by the runner for isolated children");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_PER_TEST_TIMEOUT=5");
    println!("  suitekit-demo --test adds_numbers");
}
