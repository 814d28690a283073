//! Isolated execution
//!
//! A test in a whole-suite run goes through an [`IsolatedExecutor`], which
//! runs it in its own failure domain and hands back an outcome the runner
//! folds into the parent reporter.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::RunnerError;
use crate::models::{Location, TestPath};
use crate::reporter::{RecordingReporter, ReportedFailure, Reporter, Tally};

/// Environment variable naming the test an isolated child must run
pub const CHILD_TEST_VAR: &str = "SUITEKIT_CHILD_TEST";

/// Prefix of the stdout line carrying a child's report
pub const REPORT_MARKER: &str = "@@suitekit-report@@ ";

/// Results a child sends back to its parent
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildReport {
    pub failures: Vec<ReportedFailure>,
    pub tally: Tally,
}

impl ChildReport {
    pub fn from_recording(reporter: RecordingReporter) -> Self {
        let (failures, tally) = reporter.into_parts();
        Self { failures, tally }
    }

    /// Show every failure through `reporter` and add the counters
    pub fn replay(&self, reporter: &mut dyn Reporter) {
        for failure in &self.failures {
            reporter.show_fail(&failure.location, &failure.message, &[]);
        }
        reporter.tally_mut().absorb(&self.tally);
    }

    pub fn encode(&self) -> Result<String, RunnerError> {
        Ok(format!("{REPORT_MARKER}{}", serde_json::to_string(self)?))
    }

    /// Write the report line and flush
    pub fn emit(&self, out: &mut dyn Write) -> Result<(), RunnerError> {
        writeln!(out, "{}", self.encode()?)?;
        out.flush()?;
        Ok(())
    }

    /// Find the last report line in a child's stdout
    pub fn decode(output: &str) -> Option<Self> {
        output
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(REPORT_MARKER))
            .and_then(|json| serde_json::from_str(json).ok())
    }
}

/// Test handed to an executor
#[derive(Clone, Copy, Debug)]
pub struct IsolatedTest<'a> {
    pub path: &'a TestPath,
    pub name: &'a str,
    pub location: &'a Location,
}

/// How an isolated execution ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IsolationOutcome {
    Completed(ChildReport),
    Crashed { detail: String },
    TimedOut { detail: String },
}

/// Runs the test code in the current process, reporting into the given reporter
pub type InlineRun<'r> = dyn FnMut(&mut dyn Reporter) -> Result<(), RunnerError> + 'r;

/// Runs one test in an independent failure domain
pub trait IsolatedExecutor {
    /// Execute `test`. Executors that stay in-process call `run_inline`;
    /// executors that spawn a child address the test by its path instead.
    fn execute(
        &mut self,
        test: &IsolatedTest<'_>,
        run_inline: &mut InlineRun<'_>,
    ) -> Result<IsolationOutcome, RunnerError>;
}

/// Runs tests in the current process, for debugging and for platforms
/// without process spawning
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl IsolatedExecutor for InlineExecutor {
    fn execute(
        &mut self,
        _test: &IsolatedTest<'_>,
        run_inline: &mut InlineRun<'_>,
    ) -> Result<IsolationOutcome, RunnerError> {
        let mut recorder = RecordingReporter::new();
        run_inline(&mut recorder)?;
        Ok(IsolationOutcome::Completed(ChildReport::from_recording(
            recorder,
        )))
    }
}
