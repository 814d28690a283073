//! suitekit demo - example suite driven by the suitekit runner
//!
//! Builds a small suite tree and hands it to the command-line entry point.
//!
//! ## Usage
//!
//! ```bash
//! # Run every test, one child process each
//! suitekit-demo
//!
//! # Run one test in this process
//! suitekit-demo --test adds_numbers
//!
//! # Include tests that panic, abort and hang
//! SUITEKIT_DEMO_FAULTS=1 SUITEKIT_PER_TEST_TIMEOUT=1 suitekit-demo
//! ```

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use suitekit::mocks::CallLedger;
use suitekit::{Outcome, Raised, Suite, Test};

/// Enables the fault-injecting tests
const FAULTS_VAR: &str = "SUITEKIT_DEMO_FAULTS";

fn arithmetic() -> Suite {
    Suite::new("arithmetic")
        .with_test(Test::new("adds_numbers", || assert_eq!(2 + 2, 4)))
        .with_test(Test::new("divides_exactly", || -> Outcome {
            if 7 % 2 == 1 {
                Ok(())
            } else {
                Err(Raised::assertion("7 should be odd"))
            }
        }))
}

fn stack() -> Suite {
    let items = Rc::new(RefCell::new(Vec::new()));
    let (fill, clear) = (items.clone(), items.clone());
    let (pushed, popped) = (items.clone(), items);

    Suite::new("stack")
        .with_setup(move || fill.borrow_mut().extend([1, 2, 3]))
        .with_teardown(move || clear.borrow_mut().clear())
        .with_test(Test::new("starts_filled", move || {
            assert_eq!(pushed.borrow().len(), 3)
        }))
        .with_test(Test::new("pops_last", move || {
            assert_eq!(popped.borrow_mut().pop(), Some(3))
        }))
}

fn connections(ledger: &CallLedger) -> Suite {
    let ledger = ledger.clone();
    Suite::new("connections").with_test(Test::new("connects_once", move || {
        println!("opening connection");
        ledger.expect("connect", 1);
        ledger.record_call("connect");
    }))
}

fn faults() -> Suite {
    Suite::new("faults")
        .with_test(Test::new("panics", || -> Outcome {
            panic!("index out of range")
        }))
        .with_test(Test::new::<_, ()>("aborts", || std::process::abort()))
        .with_test(Test::new("hangs", || thread::sleep(Duration::from_secs(60))))
        .with_test(Test::new("miscounts", || assert_eq!(2 + 2, 5)))
        .with_test(Test::new("runs_after_faults", || assert_eq!("abc".len(), 3)))
}

fn main() -> ExitCode {
    let ledger = CallLedger::new();
    let mut suite = Suite::new("demo")
        .with_suite(arithmetic())
        .with_suite(stack())
        .with_suite(connections(&ledger));

    if std::env::var_os(FAULTS_VAR).is_some() {
        suite.add_suite(faults());
    }

    suitekit::cli::main_with_mocks(suite, ledger)
}
