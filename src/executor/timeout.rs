//! Per-test timeout
//!
//! Validates the configured timeout and arms a watchdog that terminates
//! the current process when a test outlives it.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::error;

use crate::error::RunnerError;

/// Environment variable holding the per-test timeout in seconds
pub const PER_TEST_TIMEOUT_VAR: &str = "SUITEKIT_PER_TEST_TIMEOUT";

/// Exit code of a process terminated by its deadline
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Action taken when a deadline expires
pub type ExpiryAction = Arc<dyn Fn(Duration) + Send + Sync>;

/// Parse a timeout value: a positive whole number of seconds
pub fn parse_timeout(raw: &str) -> Result<Duration, RunnerError> {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs as u64)),
        _ => Err(RunnerError::InvalidTimeout {
            variable: PER_TEST_TIMEOUT_VAR.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn terminate_process(limit: Duration) {
    error!("test exceeded the per-test timeout of {}s", limit.as_secs());
    eprintln!(
        "test exceeded the per-test timeout of {}s, terminating",
        limit.as_secs()
    );
    std::process::exit(TIMEOUT_EXIT_CODE);
}

/// Per-test timeout guard
#[derive(Clone)]
pub struct TimeoutGuard {
    raw: Option<String>,
    on_expiry: ExpiryAction,
}

impl TimeoutGuard {
    /// Guard for a raw configured value; `None` means no timeout
    pub fn new(raw: Option<String>) -> Self {
        Self {
            raw,
            on_expiry: Arc::new(terminate_process),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Replace the default expiry action, which exits the process
    pub fn with_expiry(mut self, action: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.on_expiry = Arc::new(action);
        self
    }

    pub fn is_defined(&self) -> bool {
        self.raw.is_some()
    }

    pub fn validate(&self) -> Result<Option<Duration>, RunnerError> {
        self.raw.as_deref().map(parse_timeout).transpose()
    }

    /// Validate again and start the watchdog for one test
    pub fn arm(&self) -> Result<Option<Deadline>, RunnerError> {
        match self.validate()? {
            Some(limit) => Deadline::arm(limit, self.on_expiry.clone()).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for TimeoutGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutGuard").field("raw", &self.raw).finish()
    }
}

impl Default for TimeoutGuard {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Armed watchdog. Dropping it disarms the deadline.
#[derive(Debug)]
pub struct Deadline {
    limit: Duration,
    cancel: Option<mpsc::Sender<()>>,
    watchdog: Option<JoinHandle<()>>,
}

impl Deadline {
    pub fn arm(limit: Duration, on_expiry: ExpiryAction) -> Result<Self, RunnerError> {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let watchdog = thread::Builder::new()
            .name("suitekit-deadline".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(limit) {
                    on_expiry(limit);
                }
            })?;

        Ok(Self {
            limit,
            cancel: Some(cancel),
            watchdog: Some(watchdog),
        })
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        drop(self.cancel.take());
        if let Some(watchdog) = self.watchdog.take() {
            let _ = watchdog.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_parse_valid_timeout() {
        assert_eq!(parse_timeout("5").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_timeout(" 30 ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_invalid_timeout() {
        for raw in ["0", "-3", "abc", "", "1.5"] {
            let err = parse_timeout(raw).unwrap_err();
            assert!(matches!(err, RunnerError::InvalidTimeout { .. }), "{raw}");
        }
        assert_eq!(
            parse_timeout("0").unwrap_err().to_string(),
            "invalid value for SUITEKIT_PER_TEST_TIMEOUT environment variable: 0"
        );
    }

    #[test]
    fn test_unset_timeout_arms_nothing() {
        let guard = TimeoutGuard::disabled();
        assert!(!guard.is_defined());
        assert!(guard.validate().unwrap().is_none());
        assert!(guard.arm().unwrap().is_none());
    }

    #[test]
    fn test_invalid_timeout_fails_to_arm() {
        let guard = TimeoutGuard::new(Some("-1".to_string()));
        assert!(guard.validate().is_err());
        assert!(guard.arm().is_err());
    }

    #[test]
    fn test_dropped_deadline_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let deadline = Deadline::arm(
            Duration::from_millis(200),
            Arc::new(move |_| flag.store(true, Ordering::SeqCst)),
        )
        .unwrap();
        drop(deadline);
        thread::sleep(Duration::from_millis(300));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_expired_deadline_fires() {
        let (tx, rx) = mpsc::channel();
        let deadline = Deadline::arm(
            Duration::from_millis(20),
            Arc::new(move |limit| {
                let _ = tx.send(limit);
            }),
        )
        .unwrap();
        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(fired, Duration::from_millis(20));
        assert_eq!(deadline.limit(), Duration::from_millis(20));
    }
}
