//! Call ledger
//!
//! Minimal call-count mock registry. Tests declare how often a function
//! must be called and record each call; the tally after the test reports
//! any difference.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::MockSubsystem;
use crate::models::Location;
use crate::reporter::Reporter;
use crate::utils::breadcrumb::Breadcrumb;

#[derive(Debug, Default)]
struct Entry {
    expected: Option<u32>,
    calls: u32,
    location: Option<Location>,
}

/// Shared registry of expected and recorded calls
#[derive(Clone, Debug, Default)]
pub struct CallLedger {
    entries: Arc<Mutex<BTreeMap<String, Entry>>>,
}

impl CallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        // a test body that panicked while holding the lock leaves valid data behind
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Require `function` to be called exactly `times` times
    #[track_caller]
    pub fn expect(&self, function: &str, times: u32) {
        let location = Location::caller();
        let mut entries = self.entries();
        let entry = entries.entry(function.to_string()).or_default();
        entry.expected = Some(times);
        entry.location = Some(location);
    }

    /// Require `function` never to be called
    #[track_caller]
    pub fn never_expect(&self, function: &str) {
        self.expect(function, 0);
    }

    /// Record one call of a mocked function
    #[track_caller]
    pub fn record_call(&self, function: &str) {
        let location = Location::caller();
        let mut entries = self.entries();
        let entry = entries.entry(function.to_string()).or_default();
        entry.calls += 1;
        if entry.location.is_none() {
            entry.location = Some(location);
        }
    }

    pub fn calls(&self, function: &str) -> u32 {
        self.entries().get(function).map(|e| e.calls).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl MockSubsystem for CallLedger {
    fn reset_all(&mut self) {
        self.entries().clear();
    }

    fn tally(&mut self, reporter: &mut dyn Reporter, breadcrumb: &Breadcrumb) {
        let scope = format!("in {}", breadcrumb.path(" > "));
        let entries = std::mem::take(&mut *self.entries());
        for (function, entry) in entries {
            let location = entry
                .location
                .unwrap_or_else(|| Location::new("<mock>", 0));
            let message = match entry.expected {
                Some(expected) if expected != entry.calls => format!(
                    "mocked function [{function}] expected to be called {expected} times, was called {} times",
                    entry.calls
                ),
                None => format!(
                    "mocked function [{function}] called {} times without an expectation",
                    entry.calls
                ),
                Some(_) => continue,
            };
            reporter.show_fail(&location, &message, &[&scope]);
            reporter.tally_mut().record_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RecordingReporter;

    fn scope() -> Breadcrumb {
        let mut breadcrumb = Breadcrumb::new();
        breadcrumb.push("suite");
        breadcrumb.push("test");
        breadcrumb
    }

    #[test]
    fn test_met_expectation_is_silent() {
        let mut ledger = CallLedger::new();
        ledger.expect("open", 2);
        ledger.record_call("open");
        ledger.record_call("open");

        let mut reporter = RecordingReporter::new();
        ledger.tally(&mut reporter, &scope());
        assert!(reporter.failures().is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unmet_and_unexpected_calls_fail() {
        let mut ledger = CallLedger::new();
        ledger.expect("open", 1);
        ledger.record_call("close");

        let mut reporter = RecordingReporter::new();
        ledger.tally(&mut reporter, &scope());

        let failures = reporter.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures[0].message.contains("[close] called 1 times without an expectation"));
        assert!(failures[1].message.contains("[open] expected to be called 1 times, was called 0 times"));
        assert!(failures[1].message.ends_with("(in suite > test)"));
        assert_eq!(reporter.tally().failures, 2);
    }

    #[test]
    fn test_reset_clears_recorded_calls() {
        let mut ledger = CallLedger::new();
        ledger.record_call("stray");
        ledger.reset_all();
        assert_eq!(ledger.calls("stray"), 0);

        let mut reporter = RecordingReporter::new();
        ledger.tally(&mut reporter, &scope());
        assert!(reporter.failures().is_empty());
    }
}
