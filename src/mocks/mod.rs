//! Mock lifecycle
//!
//! Resets recorded mock state before each test and tallies it afterwards.
//! The matching logic of mocks lives behind [`MockSubsystem`].

mod ledger;
pub mod precision;

pub use ledger::CallLedger;

use crate::reporter::Reporter;
use crate::utils::breadcrumb::Breadcrumb;

/// Mock registry driven by the runner
pub trait MockSubsystem {
    /// Forget every expectation and recorded call
    fn reset_all(&mut self);

    /// Report unmet expectations and unexpected calls since the last reset
    fn tally(&mut self, reporter: &mut dyn Reporter, breadcrumb: &Breadcrumb);
}

impl<M: MockSubsystem + ?Sized> MockSubsystem for Box<M> {
    fn reset_all(&mut self) {
        (**self).reset_all();
    }

    fn tally(&mut self, reporter: &mut dyn Reporter, breadcrumb: &Breadcrumb) {
        (**self).tally(reporter, breadcrumb);
    }
}

/// Subsystem for suites that use no mocks
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMocks;

impl MockSubsystem for NoMocks {
    fn reset_all(&mut self) {}

    fn tally(&mut self, _reporter: &mut dyn Reporter, _breadcrumb: &Breadcrumb) {}
}

/// Brackets each test with mock reset and tally
pub struct MockLifecycle {
    mocks: Box<dyn MockSubsystem>,
}

impl MockLifecycle {
    pub fn new(mocks: impl MockSubsystem + 'static) -> Self {
        Self {
            mocks: Box::new(mocks),
        }
    }

    pub fn before_test(&mut self) {
        precision::set_significant_figures(precision::SIGNIFICANT_FIGURES);
        self.mocks.reset_all();
    }

    pub fn after_test(&mut self, reporter: &mut dyn Reporter, breadcrumb: &Breadcrumb) {
        self.mocks.tally(reporter, breadcrumb);
    }
}

impl Default for MockLifecycle {
    fn default() -> Self {
        Self::new(NoMocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RecordingReporter;

    #[test]
    fn test_before_test_resets_calls_and_precision() {
        let ledger = CallLedger::new();
        ledger.record_call("leftover");
        let mut lifecycle = MockLifecycle::new(ledger.clone());

        lifecycle.before_test();

        assert_eq!(ledger.calls("leftover"), 0);
        assert_eq!(precision::significant_figures(), precision::SIGNIFICANT_FIGURES);
    }

    #[test]
    fn test_after_test_tallies_into_reporter() {
        let ledger = CallLedger::new();
        let mut lifecycle = MockLifecycle::new(ledger.clone());
        lifecycle.before_test();
        ledger.expect("send", 1);

        let mut reporter = RecordingReporter::new();
        lifecycle.after_test(&mut reporter, &Breadcrumb::new());
        assert_eq!(reporter.tally().failures, 1);
    }
}
