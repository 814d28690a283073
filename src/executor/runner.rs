//! Suite runner
//!
//! Walks a suite tree depth-first in declaration order, dispatches each
//! test to the configured executor (whole-suite run) or runs it in the
//! current process (named run, isolated child), and drives the reporter.

use std::io;
use std::process::ExitCode;
use tracing::{debug, info, warn};

use super::isolation::{
    ChildReport, InlineExecutor, IsolatedExecutor, IsolatedTest, IsolationOutcome,
};
use super::normalizer::{effective_hooks, normalize, Phase};
use super::timeout::TimeoutGuard;
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::mocks::{MockLifecycle, MockSubsystem};
use crate::models::{Hook, Runnable, Suite, Test, TestPath};
use crate::reporter::{RecordingReporter, Reporter};
use crate::utils::breadcrumb::Breadcrumb;

/// Final verdict of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    fn from_success(success: bool) -> Self {
        if success {
            RunStatus::Success
        } else {
            RunStatus::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Everything needed to run one test's code in the current process
struct TestHarness {
    timeout: TimeoutGuard,
    mocks: MockLifecycle,
    breadcrumb: Breadcrumb,
}

impl TestHarness {
    /// Mock reset, deadline, setup, body, teardown, mock tally
    fn run_test_code(
        &mut self,
        suite: &Suite,
        test: &Test,
        reporter: &mut dyn Reporter,
    ) -> Result<(), RunnerError> {
        self.mocks.before_test();
        let _deadline = self.timeout.arm()?;
        self.breadcrumb.push(test.name());

        let hooks = effective_hooks(suite, test);
        let location = test.location();
        if let Some(setup) = hooks.setup {
            normalize(Phase::Setup, location, setup, reporter);
        }
        normalize(Phase::Body, location, test.body(), reporter);
        if let Some(teardown) = hooks.teardown {
            normalize(Phase::Teardown, location, teardown, reporter);
        }

        self.mocks.after_test(reporter, &self.breadcrumb);
        self.breadcrumb.pop();
        Ok(())
    }
}

/// Suite setup or teardown run around a nested suite
fn run_bracket_hook(phase: Phase, suite: &Suite, hook: Option<&Hook>, reporter: &mut dyn Reporter) {
    if let Some(hook) = hook {
        normalize(phase, suite.location(), hook, reporter);
    }
}

/// Test suite runner
pub struct Runner {
    harness: TestHarness,
    executor: Box<dyn IsolatedExecutor>,
    child_target: Option<TestPath>,
}

impl Runner {
    pub fn new(config: RunnerConfig, executor: impl IsolatedExecutor + 'static) -> Self {
        Self {
            harness: TestHarness {
                timeout: TimeoutGuard::new(config.per_test_timeout),
                mocks: MockLifecycle::default(),
                breadcrumb: Breadcrumb::new(),
            },
            executor: Box::new(executor),
            child_target: config.child_target,
        }
    }

    /// Runner executing every test in the current process
    pub fn inline(config: RunnerConfig) -> Self {
        Self::new(config, InlineExecutor)
    }

    pub fn with_mocks(mut self, mocks: impl MockSubsystem + 'static) -> Self {
        self.harness.mocks = MockLifecycle::new(mocks);
        self
    }

    pub fn with_timeout_guard(mut self, guard: TimeoutGuard) -> Self {
        self.harness.timeout = guard;
        self
    }

    /// Run every test of `suite`, each through the executor.
    ///
    /// Succeeds when the reporter recorded neither failures nor exceptions.
    /// When the runner was configured as an isolated child, only the
    /// addressed test runs and its report is written to stdout.
    pub fn run_all(
        &mut self,
        suite: &Suite,
        reporter: &mut dyn Reporter,
    ) -> Result<RunStatus, RunnerError> {
        self.harness.timeout.validate()?;

        if let Some(path) = self.child_target.clone() {
            return self.run_child(suite, &path);
        }

        info!(suite = suite.name(), tests = suite.count_tests(), "running every test");
        self.run_every_test(suite, &TestPath::root(), reporter)?;

        let tally = reporter.tally();
        info!("run finished: {}", tally);
        Ok(RunStatus::from_success(tally.is_clean()))
    }

    /// Run only the tests named `name`, in the current process.
    ///
    /// Succeeds when the reporter recorded no failures; exceptions alone
    /// do not fail a named run.
    pub fn run_named(
        &mut self,
        suite: &Suite,
        name: &str,
        reporter: &mut dyn Reporter,
    ) -> Result<RunStatus, RunnerError> {
        self.harness.timeout.validate()?;

        info!(suite = suite.name(), test = name, "running named test");
        self.run_named_test(suite, name, reporter)?;

        let tally = reporter.tally();
        info!("run finished: {}", tally);
        Ok(RunStatus::from_success(tally.failures == 0))
    }

    fn run_every_test(
        &mut self,
        suite: &Suite,
        prefix: &TestPath,
        reporter: &mut dyn Reporter,
    ) -> Result<(), RunnerError> {
        debug!(suite = suite.name(), "entering suite");
        self.harness.breadcrumb.push(suite.name());
        reporter.start_suite(suite.name(), suite.count_tests());

        for (index, runnable) in suite.runnables().iter().enumerate() {
            let path = prefix.child(index);
            match runnable {
                Runnable::Test(test) => self.run_test_in_isolation(suite, test, &path, reporter)?,
                Runnable::Suite(nested) => {
                    run_bracket_hook(Phase::Setup, suite, suite.setup(), reporter);
                    self.run_every_test(nested, &path, reporter)?;
                    run_bracket_hook(Phase::Teardown, suite, suite.teardown(), reporter);
                }
            }
        }

        reporter.completion();
        reporter.finish_suite(suite.location());
        self.harness.breadcrumb.pop();
        Ok(())
    }

    fn run_named_test(
        &mut self,
        suite: &Suite,
        name: &str,
        reporter: &mut dyn Reporter,
    ) -> Result<(), RunnerError> {
        self.harness.breadcrumb.push(suite.name());
        reporter.start_suite(suite.name(), suite.count_tests());

        for runnable in suite.runnables() {
            match runnable {
                Runnable::Test(test) if test.name() == name => {
                    self.run_test_in_current_process(suite, test, reporter)?
                }
                Runnable::Suite(nested) if nested.has_test(name) => {
                    run_bracket_hook(Phase::Setup, suite, suite.setup(), reporter);
                    self.run_named_test(nested, name, reporter)?;
                    run_bracket_hook(Phase::Teardown, suite, suite.teardown(), reporter);
                }
                _ => {}
            }
        }

        reporter.completion();
        reporter.finish_suite(suite.location());
        self.harness.breadcrumb.pop();
        Ok(())
    }

    fn run_test_in_isolation(
        &mut self,
        suite: &Suite,
        test: &Test,
        path: &TestPath,
        reporter: &mut dyn Reporter,
    ) -> Result<(), RunnerError> {
        reporter.start_test(test.name());

        let request = IsolatedTest {
            path,
            name: test.name(),
            location: test.location(),
        };
        let harness = &mut self.harness;
        let outcome = self
            .executor
            .execute(&request, &mut |inner: &mut dyn Reporter| {
                harness.run_test_code(suite, test, inner)
            })?;

        match outcome {
            IsolationOutcome::Completed(report) => report.replay(reporter),
            IsolationOutcome::Crashed { detail } => {
                warn!(test = test.name(), "test crashed: {}", detail);
                let message = format!("test \"{}\" crashed: {detail}", test.name());
                reporter.show_fail(test.location(), &message, &[]);
                reporter.tally_mut().record_failure();
            }
            IsolationOutcome::TimedOut { detail } => {
                warn!(test = test.name(), "test timed out: {}", detail);
                let message = format!("test \"{}\" timed out: {detail}", test.name());
                reporter.show_fail(test.location(), &message, &[]);
                reporter.tally_mut().record_failure();
            }
        }

        reporter.completion();
        reporter.finish_test(test.location());
        Ok(())
    }

    fn run_test_in_current_process(
        &mut self,
        suite: &Suite,
        test: &Test,
        reporter: &mut dyn Reporter,
    ) -> Result<(), RunnerError> {
        reporter.start_test(test.name());
        self.harness.run_test_code(suite, test, reporter)?;
        reporter.completion();
        reporter.finish_test(test.location());
        Ok(())
    }

    /// Child side of process isolation: run the test at `path` and print
    /// its report
    fn run_child(&mut self, suite: &Suite, path: &TestPath) -> Result<RunStatus, RunnerError> {
        let resolved = suite
            .resolve(path)
            .ok_or_else(|| RunnerError::UnknownTestPath(path.clone()))?;
        debug!(path = %path, test = resolved.test.name(), "running as isolated child");

        // Suites above the enclosing one bracket the descent with their hooks.
        // The parent already reported their failures.
        let brackets = &resolved.suites[..resolved.suites.len() - 1];
        let mut discarded = RecordingReporter::new();
        for ancestor in brackets {
            self.harness.breadcrumb.push(ancestor.name());
            run_bracket_hook(Phase::Setup, ancestor, ancestor.setup(), &mut discarded);
        }

        let enclosing = resolved.enclosing();
        let mut recorder = RecordingReporter::new();
        self.harness.breadcrumb.push(enclosing.name());
        self.harness.run_test_code(enclosing, resolved.test, &mut recorder)?;
        self.harness.breadcrumb.pop();

        for ancestor in brackets.iter().rev() {
            run_bracket_hook(Phase::Teardown, ancestor, ancestor.teardown(), &mut discarded);
            self.harness.breadcrumb.pop();
        }
        if !discarded.failures().is_empty() {
            debug!("ignored {} suite hook failures in child", discarded.failures().len());
        }

        let report = ChildReport::from_recording(recorder);
        report.emit(&mut io::stdout().lock())?;
        Ok(RunStatus::from_success(report.tally.is_clean()))
    }
}
