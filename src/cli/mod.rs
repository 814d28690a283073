//! CLI argument parsing
//!
//! Defines the command-line interface of a test binary and the entry point
//! that wires configuration, logging, executor and reporter together.

use anyhow::Result;
use chrono::Utc;
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

use crate::config::env::{print_env_help, EnvConfig};
use crate::config::{AppConfig, Isolation, RunnerConfig};
use crate::error::RunnerError;
use crate::executor::{ChildEcho, ProcessExecutor, RunStatus, Runner};
use crate::mocks::{MockSubsystem, NoMocks};
use crate::models::Suite;
use crate::reporter::{
    ConsoleReporter, RecordingReporter, ReportedFailure, Reporter, RunMode, RunSummary,
};
use crate::utils::logger::{init_logger, LogLevel};

/// Hierarchical test runner with per-test isolation
#[derive(Parser, Debug)]
#[command(author = "hephaex@gmail.com")]
#[command(version = "0.1.0")]
#[command(about = "Run a test suite, each test isolated from the others")]
#[command(long_about = None)]
pub struct Args {
    /// Run only the tests with this name, in this process
    #[arg(short, long)]
    pub test: Option<String>,

    /// List the tests of the suite and exit
    #[arg(short, long)]
    pub list: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run every test in this process instead of one child per test
    #[arg(long)]
    pub no_fork: bool,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Describe the environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Machine-readable result of a run
#[derive(Debug, Serialize)]
struct JsonReport {
    summary: RunSummary,
    failures: Vec<ReportedFailure>,
}

/// Parse the command line and run `suite`
pub fn main_with(suite: Suite) -> ExitCode {
    main_with_mocks(suite, NoMocks)
}

/// Parse the command line and run `suite`, resetting and tallying `mocks`
/// around every test
pub fn main_with_mocks(suite: Suite, mocks: impl MockSubsystem + 'static) -> ExitCode {
    let args = Args::parse();
    match run(&args, &suite, Box::new(mocks)) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run `suite` as described by `args` and the environment
pub fn run(args: &Args, suite: &Suite, mocks: Box<dyn MockSubsystem>) -> Result<RunStatus> {
    if args.env_help {
        print_env_help();
        return Ok(RunStatus::Success);
    }

    let env = EnvConfig::load();
    let config = load_config(args, &env)?;

    let level = if args.verbose > 0 {
        LogLevel::from_verbosity(args.verbose)
    } else {
        config.log_level
    };
    init_logger(level);

    if args.list {
        for (path, test) in suite.tests() {
            println!("{path}\t{}\t{}", test.name(), test.location());
        }
        return Ok(RunStatus::Success);
    }

    let mut runner = build_runner(&config, args.format)?.with_mocks(mocks);

    if config.is_child() {
        let mut reporter = RecordingReporter::new();
        return Ok(runner.run_all(suite, &mut reporter)?);
    }

    if let Some(name) = &args.test {
        if !suite.has_test(name) {
            warn!("no test named \"{}\" in suite \"{}\"", name, suite.name());
        }
    }

    let started_at = Utc::now();
    let mode = match &args.test {
        Some(name) => RunMode::Named(name.clone()),
        None => RunMode::All,
    };

    match args.format {
        OutputFormat::Text => {
            let mut reporter = ConsoleReporter::stdout();
            if args.no_color {
                reporter = reporter.no_color();
            }
            let status = execute(&mut runner, suite, args.test.as_deref(), &mut reporter)?;
            let summary =
                RunSummary::new(suite.name(), mode, started_at, reporter.tally(), status.is_success());
            println!();
            println!("{summary}");
            Ok(status)
        }
        OutputFormat::Json => {
            let mut reporter = RecordingReporter::new();
            let status = execute(&mut runner, suite, args.test.as_deref(), &mut reporter)?;
            let summary =
                RunSummary::new(suite.name(), mode, started_at, reporter.tally(), status.is_success());
            let (failures, _) = reporter.into_parts();
            let report = JsonReport { summary, failures };
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(status)
        }
    }
}

fn load_config(args: &Args, env: &EnvConfig) -> Result<RunnerConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| env.config_file.as_ref().map(PathBuf::from));
    let file = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let mut config = RunnerConfig::resolve(&file, env)?;
    if args.no_fork {
        config.isolation = Isolation::Inline;
    }
    Ok(config)
}

fn build_runner(config: &RunnerConfig, format: OutputFormat) -> Result<Runner, RunnerError> {
    // a child already is the isolated process
    if config.is_child() || config.isolation == Isolation::Inline {
        return Ok(Runner::inline(config.clone()));
    }

    let echo = match format {
        OutputFormat::Text => ChildEcho::Stdout,
        OutputFormat::Json => ChildEcho::Stderr,
    };
    let mut executor = ProcessExecutor::current()?.with_echo(echo);
    if let Some(limit) = config.hang_limit {
        executor = executor.with_hang_limit(limit);
    }
    info!("isolating each test in a child process");
    Ok(Runner::new(config.clone(), executor))
}

fn execute(
    runner: &mut Runner,
    suite: &Suite,
    test: Option<&str>,
    reporter: &mut dyn Reporter,
) -> Result<RunStatus, RunnerError> {
    match test {
        Some(name) => runner.run_named(suite, name, reporter),
        None => runner.run_all(suite, reporter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "suitekit-demo",
            "--test",
            "adds_numbers",
            "--format",
            "json",
            "--no-fork",
            "-vv",
        ]);
        assert_eq!(args.test.as_deref(), Some("adds_numbers"));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.no_fork);
        assert_eq!(args.verbose, 2);
        assert!(!args.list);
    }

    #[test]
    fn test_no_fork_flag_selects_inline() {
        let args = Args::parse_from(["suitekit-demo", "--no-fork"]);
        let config = load_config(&args, &EnvConfig::default()).unwrap();
        assert_eq!(config.isolation, Isolation::Inline);
    }

    #[test]
    fn test_config_file_from_flag() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("suitekit.yml");
        std::fs::write(&path, "per_test_timeout: \"7\"\n").unwrap();
        let args = Args::parse_from(["suitekit-demo", "--config", path.to_str().unwrap()]);

        let config = load_config(&args, &EnvConfig::default()).unwrap();
        assert_eq!(config.per_test_timeout.as_deref(), Some("7"));
        assert_eq!(config.isolation, Isolation::Process);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args::parse_from(["suitekit-demo", "--config", "/nonexistent/suitekit.yaml"]);
        assert!(load_config(&args, &EnvConfig::default()).is_err());
    }
}
