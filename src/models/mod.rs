//! Data models for suite execution
//!
//! This module contains the suite tree and the outcome types its procedures produce.

mod outcome;
mod suite;

pub use outcome::{IntoOutcome, Outcome, Raised};
pub use suite::{Hook, Location, Resolved, Runnable, Suite, Test, TestContext, TestPath};
