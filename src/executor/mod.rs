//! Test execution engine
//!
//! Provides the suite runner together with its per-test guards: exception
//! normalization, the timeout watchdog and process isolation.

pub mod isolation;
pub mod normalizer;
mod process;
mod runner;
pub mod timeout;

pub use isolation::{ChildReport, InlineExecutor, IsolatedExecutor, IsolatedTest, IsolationOutcome};
pub use normalizer::{effective_hooks, normalize, Phase};
pub use process::{ChildEcho, ProcessExecutor};
pub use runner::{RunStatus, Runner};
pub use timeout::{Deadline, TimeoutGuard};
