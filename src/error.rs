//! Runner errors
//!
//! Errors that abort a run as a whole. Failures inside a test never
//! surface here; they are reported through the reporter.

use thiserror::Error;

use crate::models::TestPath;

/// Run-level errors
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("invalid value for {variable} environment variable: {value}")]
    InvalidTimeout { variable: String, value: String },

    #[error("no test at path {0}")]
    UnknownTestPath(TestPath),

    #[error("malformed test path: {0:?}")]
    MalformedTestPath(String),

    #[error("failed to encode child report: {0}")]
    ReportEncoding(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
