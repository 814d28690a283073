//! Console reporter
//!
//! Line-oriented text output for interactive runs.

use std::fmt;
use std::io::{self, Write};

use super::{render_failure, Reporter, Tally};
use crate::models::Location;
use crate::utils::timer::Timer;

/// Text reporter writing one line per notification
pub struct ConsoleReporter {
    out: Box<dyn Write>,
    colorize: bool,
    tally: Tally,
    suites: Vec<(String, Timer)>,
    tests: Vec<(String, Tally)>,
}

impl ConsoleReporter {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            out,
            colorize: true,
            tally: Tally::default(),
            suites: Vec::new(),
            tests: Vec::new(),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn indent(&self) -> String {
        "  ".repeat(self.suites.len().saturating_sub(1))
    }

    fn status(&self, passed: bool) -> &'static str {
        match (passed, self.colorize) {
            (true, true) => "\x1b[32m✓\x1b[0m",
            (false, true) => "\x1b[31m✗\x1b[0m",
            (true, false) => "✓",
            (false, false) => "✗",
        }
    }

    fn line(&mut self, text: String) {
        // a closed pipe must not abort the run
        let _ = writeln!(self.out, "{text}");
    }
}

impl Reporter for ConsoleReporter {
    fn start_suite(&mut self, name: &str, test_count: usize) {
        self.suites.push((name.to_string(), Timer::start(name)));
        let indent = self.indent();
        self.line(format!("{indent}Running \"{name}\" ({test_count} tests)"));
    }

    fn finish_suite(&mut self, _location: &Location) {
        let Some((name, timer)) = self.suites.pop() else {
            return;
        };
        let elapsed = timer.stop().as_millis();
        if self.suites.is_empty() {
            let summary = format!("Completed \"{name}\": {} in {elapsed}ms.", self.tally);
            self.line(summary);
            let _ = self.out.flush();
        }
    }

    fn start_test(&mut self, name: &str) {
        self.tests.push((name.to_string(), self.tally));
    }

    fn finish_test(&mut self, _location: &Location) {
        let Some((name, before)) = self.tests.pop() else {
            return;
        };
        let passed = !self.tally.worsened_since(&before);
        if passed {
            self.tally.record_pass();
        }
        let line = format!("{}  {} {name}", self.indent(), self.status(passed));
        self.line(line);
    }

    fn show_fail(&mut self, location: &Location, message: &str, context: &[&dyn fmt::Display]) {
        let line = format!(
            "{}    {location}: Failure: {}",
            self.indent(),
            render_failure(message, context)
        );
        self.line(line);
    }

    fn tally(&self) -> Tally {
        self.tally
    }

    fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }
}
