//! Exception normalization
//!
//! Runs one phase of a test so that any error it raises, returned or
//! panicked, becomes a single reported failure instead of ending the run.

use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use tracing::debug;

use crate::models::{Hook, Location, Raised, Suite, Test};
use crate::reporter::Reporter;

/// Longest diagnostic forwarded to the reporter, in bytes
pub const MESSAGE_LIMIT: usize = 254;

/// Phase of a test run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Body,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Body => write!(f, "test body"),
            Phase::Teardown => write!(f, "teardown"),
        }
    }
}

/// Hooks that actually run around a test body
#[derive(Debug)]
pub struct EffectiveHooks<'a> {
    pub setup: Option<&'a Hook>,
    pub teardown: Option<&'a Hook>,
}

/// Resolve which setup and teardown apply to `test`.
///
/// A hook set on the enclosing suite wins over the test's own hook; the
/// test's hook is used only when the suite leaves that slot empty. Setup
/// and teardown are resolved independently.
pub fn effective_hooks<'a>(suite: &'a Suite, test: &'a Test) -> EffectiveHooks<'a> {
    EffectiveHooks {
        setup: suite.setup().or(test.context().setup.as_ref()),
        teardown: suite.teardown().or(test.context().teardown.as_ref()),
    }
}

thread_local! {
    static CATCHING: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the process panic hook so panics caught by [`normalize`] are only
/// logged; every other panic still reaches the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CATCHING.with(Cell::get) {
                debug!("caught panic: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

/// Whether panics on this thread are currently being caught and reported
pub fn catching_panics() -> bool {
    CATCHING.with(Cell::get)
}

struct CatchScope {
    outer: bool,
}

impl CatchScope {
    fn enter() -> Self {
        install_quiet_hook();
        Self {
            outer: CATCHING.with(|catching| catching.replace(true)),
        }
    }
}

impl Drop for CatchScope {
    fn drop(&mut self) {
        CATCHING.with(|catching| catching.set(self.outer));
    }
}

/// Run `hook` as `phase`, reporting anything it raises at `location`.
///
/// Returns whether the phase completed without raising.
pub fn normalize(
    phase: Phase,
    location: &Location,
    hook: &Hook,
    reporter: &mut dyn Reporter,
) -> bool {
    let outcome = {
        let _scope = CatchScope::enter();
        panic::catch_unwind(AssertUnwindSafe(|| hook.call()))
            .unwrap_or_else(|payload| Err(Raised::from_panic(payload)))
    };

    match outcome {
        Ok(()) => true,
        Err(raised) => {
            report(phase, location, &raised, reporter);
            false
        }
    }
}

fn report(phase: Phase, location: &Location, raised: &Raised, reporter: &mut dyn Reporter) {
    let message = describe(phase, raised);
    reporter.show_fail(location, &message, &[]);
    if raised.is_assertion() {
        reporter.tally_mut().record_failure();
    } else {
        reporter.tally_mut().record_exception();
    }
}

/// Diagnostic text for an error raised during `phase`
pub fn describe(phase: Phase, raised: &Raised) -> String {
    let message = match raised {
        Raised::Assertion(message) => message.clone(),
        other => format!("an exception was thrown during {phase}: [{other}]"),
    };
    bounded(message)
}

fn bounded(mut message: String) -> String {
    if message.len() > MESSAGE_LIMIT {
        let mut cut = MESSAGE_LIMIT;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    message
}
