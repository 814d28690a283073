//! Recording reporter
//!
//! Keeps every notification in memory. Isolated children collect their
//! results with it; tests assert on its event log.

use std::fmt;

use super::{render_failure, ReportedFailure, Reporter, Tally};
use crate::models::Location;

/// Notification received by a [`RecordingReporter`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SuiteStarted { name: String, test_count: usize },
    SuiteFinished(Location),
    TestStarted(String),
    TestFinished(Location),
    Failure(ReportedFailure),
    Completion,
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Vec<Event>,
    tally: Tally,
    open_tests: Vec<Tally>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Failures shown so far, in order
    pub fn failures(&self) -> Vec<&ReportedFailure> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Failure(failure) => Some(failure),
                _ => None,
            })
            .collect()
    }

    /// Names of started tests, in order
    pub fn started_tests(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::TestStarted(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of started suites, in order
    pub fn started_suites(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::SuiteStarted { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn into_parts(self) -> (Vec<ReportedFailure>, Tally) {
        let failures = self
            .events
            .into_iter()
            .filter_map(|event| match event {
                Event::Failure(failure) => Some(failure),
                _ => None,
            })
            .collect();
        (failures, self.tally)
    }
}

impl Reporter for RecordingReporter {
    fn start_suite(&mut self, name: &str, test_count: usize) {
        self.events.push(Event::SuiteStarted {
            name: name.to_string(),
            test_count,
        });
    }

    fn finish_suite(&mut self, location: &Location) {
        self.events.push(Event::SuiteFinished(location.clone()));
    }

    fn start_test(&mut self, name: &str) {
        self.open_tests.push(self.tally);
        self.events.push(Event::TestStarted(name.to_string()));
    }

    fn finish_test(&mut self, location: &Location) {
        if let Some(before) = self.open_tests.pop() {
            if !self.tally.worsened_since(&before) {
                self.tally.record_pass();
            }
        }
        self.events.push(Event::TestFinished(location.clone()));
    }

    fn show_fail(&mut self, location: &Location, message: &str, context: &[&dyn fmt::Display]) {
        self.events.push(Event::Failure(ReportedFailure {
            location: location.clone(),
            message: render_failure(message, context),
        }));
    }

    fn completion(&mut self) {
        self.events.push(Event::Completion);
    }

    fn tally(&self) -> Tally {
        self.tally
    }

    fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }
}
