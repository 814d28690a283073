//! Run summary
//!
//! End-of-run record printed by the command-line entry point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Tally;

/// Which entry point produced the run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "test")]
pub enum RunMode {
    All,
    Named(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub suite: String,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tally: Tally,
    pub success: bool,
}

impl RunSummary {
    pub fn new(
        suite: impl Into<String>,
        mode: RunMode,
        started_at: DateTime<Utc>,
        tally: Tally,
        success: bool,
    ) -> Self {
        Self {
            suite: suite.into(),
            mode,
            started_at,
            finished_at: Utc::now(),
            tally,
            success,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        match &self.mode {
            RunMode::All => writeln!(f, "Suite: {}", self.suite)?,
            RunMode::Named(name) => writeln!(f, "Suite: {} (only \"{name}\")", self.suite)?,
        }
        writeln!(
            f,
            "Pass: {} | Fail: {} | Exceptions: {}",
            self.tally.passes, self.tally.failures, self.tally.exceptions
        )?;
        write!(
            f,
            "Result: {} | Duration: {}ms",
            if self.success { "SUCCESS" } else { "FAILURE" },
            self.duration_ms()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_roundtrip_fields() {
        let summary = RunSummary::new(
            "root",
            RunMode::Named("A".to_string()),
            Utc::now(),
            Tally {
                passes: 1,
                failures: 0,
                exceptions: 0,
            },
            true,
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["suite"], "root");
        assert_eq!(json["mode"]["mode"], "named");
        assert_eq!(json["mode"]["test"], "A");
        assert_eq!(json["tally"]["passes"], 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary::new("root", RunMode::All, Utc::now(), Tally::default(), true);
        let text = summary.to_string();
        assert!(text.contains("Suite: root"));
        assert!(text.contains("Result: SUCCESS"));
    }
}
