//! suitekit - hierarchical test runner
//!
//! Runs a tree of suites and tests depth-first, isolating each test so
//! that a failure, a crash or a hang stays confined to that test.
//!
//! ## Features
//!
//! - Suites with setup and teardown, nested to any depth
//! - One child process per test, with an in-process mode for debugging
//! - Per-test timeout from `SUITEKIT_PER_TEST_TIMEOUT`
//! - Every error a test raises, returned or panicked, reported as one failure
//! - Mock expectations reset before and tallied after each test
//!
//! ## Usage
//!
//! ```no_run
//! use suitekit::{Suite, Test};
//!
//! fn main() -> std::process::ExitCode {
//!     let suite = Suite::new("arithmetic")
//!         .with_test(Test::new("adds", || assert_eq!(1 + 1, 2)));
//!     suitekit::cli::main_with(suite)
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod mocks;
pub mod models;
pub mod reporter;
pub mod utils;

pub use error::RunnerError;
pub use executor::{RunStatus, Runner};
pub use models::{Outcome, Raised, Suite, Test};
pub use reporter::Reporter;
