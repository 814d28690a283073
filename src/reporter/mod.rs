//! Reporting protocol
//!
//! The runner drives a [`Reporter`] through suite and test boundaries and
//! forwards every failure to it. Reporters own the run's counters.

mod console;
mod recording;
mod summary;

pub use console::ConsoleReporter;
pub use recording::{Event, RecordingReporter};
pub use summary::{RunMode, RunSummary};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Location;

/// Aggregate counters of one run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub passes: u32,
    pub failures: u32,
    pub exceptions: u32,
}

impl Tally {
    pub fn record_pass(&mut self) {
        self.passes += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn record_exception(&mut self) {
        self.exceptions += 1;
    }

    /// Add counters reported from another execution context
    pub fn absorb(&mut self, other: &Tally) {
        self.passes += other.passes;
        self.failures += other.failures;
        self.exceptions += other.exceptions;
    }

    /// Whether no failure and no exception was recorded
    pub fn is_clean(&self) -> bool {
        self.failures == 0 && self.exceptions == 0
    }

    /// Whether failures or exceptions grew compared to an earlier snapshot
    pub fn worsened_since(&self, earlier: &Tally) -> bool {
        self.failures > earlier.failures || self.exceptions > earlier.exceptions
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passes, {} failures, {} exceptions",
            self.passes, self.failures, self.exceptions
        )
    }
}

/// Failure shown through [`Reporter::show_fail`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedFailure {
    pub location: Location,
    pub message: String,
}

/// Sink for lifecycle notifications
pub trait Reporter {
    fn start_suite(&mut self, name: &str, test_count: usize);

    fn finish_suite(&mut self, location: &Location);

    fn start_test(&mut self, name: &str);

    fn finish_test(&mut self, location: &Location);

    /// Display a failure. Counting it is the caller's job.
    fn show_fail(&mut self, location: &Location, message: &str, context: &[&dyn fmt::Display]);

    fn completion(&mut self) {}

    fn tally(&self) -> Tally;

    fn tally_mut(&mut self) -> &mut Tally;
}

/// Join a failure message with its context values
pub fn render_failure(message: &str, context: &[&dyn fmt::Display]) -> String {
    if context.is_empty() {
        return message.to_string();
    }
    let rendered: Vec<String> = context.iter().map(|value| value.to_string()).collect();
    format!("{message} ({})", rendered.join(", "))
}
