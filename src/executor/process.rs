//! Process-per-test isolation
//!
//! Re-executes the current binary once per test. The child sees
//! `SUITEKIT_CHILD_TEST`, runs only the addressed test and prints its
//! report on stdout; a crash or a deadline kill cannot touch the parent.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use super::isolation::{
    ChildReport, InlineRun, IsolatedExecutor, IsolatedTest, IsolationOutcome, CHILD_TEST_VAR,
    REPORT_MARKER,
};
use super::timeout::TIMEOUT_EXIT_CODE;
use crate::error::RunnerError;
use crate::models::TestPath;

/// Where a child's own stdout lines are echoed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChildEcho {
    #[default]
    Stdout,
    /// Keeps the parent's stdout free for machine-readable output
    Stderr,
}

/// Executor spawning one child process per test
#[derive(Debug)]
pub struct ProcessExecutor {
    runtime: Runtime,
    program: PathBuf,
    args: Vec<OsString>,
    hang_limit: Option<Duration>,
    echo: ChildEcho,
}

impl ProcessExecutor {
    /// Executor re-running this binary with its original arguments
    pub fn current() -> Result<Self, RunnerError> {
        let program = std::env::current_exe()?;
        let args = std::env::args_os().skip(1).collect();
        Self::new(program, args)
    }

    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Result<Self, RunnerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            program: program.into(),
            args,
            hang_limit: None,
            echo: ChildEcho::default(),
        })
    }

    /// Kill children still running after `limit`
    pub fn with_hang_limit(mut self, limit: Duration) -> Self {
        self.hang_limit = Some(limit);
        self
    }

    pub fn with_echo(mut self, echo: ChildEcho) -> Self {
        self.echo = echo;
        self
    }
}

impl IsolatedExecutor for ProcessExecutor {
    fn execute(
        &mut self,
        test: &IsolatedTest<'_>,
        _run_inline: &mut InlineRun<'_>,
    ) -> Result<IsolationOutcome, RunnerError> {
        debug!(test = test.name, path = %test.path, "spawning child");
        let finished = self.runtime.block_on(supervise(
            &self.program,
            &self.args,
            self.hang_limit,
            test.path,
        ));
        let outcome = match finished {
            Finished::Exited(output) => {
                match self.echo {
                    ChildEcho::Stdout => echo_output(&output, &mut io::stdout(), &mut io::stderr()),
                    ChildEcho::Stderr => echo_output(&output, &mut io::stderr(), &mut io::stderr()),
                }
                interpret(&output)
            }
            Finished::Abandoned(outcome) => outcome,
        };
        Ok(outcome)
    }
}

/// How supervising a child ended
enum Finished {
    Exited(Output),
    /// Never started, killed, or lost
    Abandoned(IsolationOutcome),
}

async fn supervise(
    program: &Path,
    args: &[OsString],
    hang_limit: Option<Duration>,
    path: &TestPath,
) -> Finished {
    let mut command = Command::new(program);
    command
        .args(args)
        .env(CHILD_TEST_VAR, path.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("failed to spawn child for {}: {}", path, e);
            return Finished::Abandoned(IsolationOutcome::Crashed {
                detail: format!("failed to start child process: {e}"),
            });
        }
    };

    let waited = match hang_limit {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited,
            Err(_) => {
                return Finished::Abandoned(IsolationOutcome::TimedOut {
                    detail: format!("killed after {}s without finishing", limit.as_secs()),
                })
            }
        },
        None => child.wait_with_output().await,
    };

    match waited {
        Ok(output) => Finished::Exited(output),
        Err(e) => Finished::Abandoned(IsolationOutcome::Crashed {
            detail: format!("lost track of child process: {e}"),
        }),
    }
}

/// Forward what the test itself printed, without the report line
fn echo_output(output: &Output, out: &mut dyn Write, err: &mut dyn Write) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    // a closed pipe must not abort the run
    for line in stdout.lines().filter(|l| !l.starts_with(REPORT_MARKER)) {
        let _ = writeln!(out, "{line}");
    }
    let _ = err.write_all(&output.stderr);
    let _ = out.flush();
}

/// Turn a finished child's output into an outcome
fn interpret(output: &Output) -> IsolationOutcome {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if let Some(report) = ChildReport::decode(&stdout) {
        return IsolationOutcome::Completed(report);
    }

    let last_words = stderr.lines().last().unwrap_or("").trim();
    if output.status.code() == Some(TIMEOUT_EXIT_CODE) {
        return IsolationOutcome::TimedOut {
            detail: if last_words.is_empty() {
                "exceeded the per-test timeout".to_string()
            } else {
                last_words.to_string()
            },
        };
    }

    let mut detail = describe_status(output.status);
    if !last_words.is_empty() {
        detail = format!("{detail}: {last_words}");
    }
    IsolationOutcome::Crashed { detail }
}

#[cfg(unix)]
fn describe_status(status: std::process::ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {signal}"),
        None => format!("{status} without reporting a result"),
    }
}

#[cfg(not(unix))]
fn describe_status(status: std::process::ExitStatus) -> String {
    format!("{status} without reporting a result")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn output(raw_status: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(raw_status),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_report_wins_over_exit_status() {
        let line = ChildReport::default().encode().unwrap();
        let outcome = interpret(&output(1 << 8, &format!("{line}\n"), ""));
        assert_eq!(outcome, IsolationOutcome::Completed(ChildReport::default()));
    }

    #[test]
    fn test_timeout_exit_code() {
        let outcome = interpret(&output(
            TIMEOUT_EXIT_CODE << 8,
            "",
            "test exceeded the per-test timeout of 1s, terminating\n",
        ));
        assert_eq!(
            outcome,
            IsolationOutcome::TimedOut {
                detail: "test exceeded the per-test timeout of 1s, terminating".to_string()
            }
        );
    }

    #[test]
    fn test_signal_is_a_crash() {
        // SIGABRT
        let outcome = interpret(&output(6, "", ""));
        assert_eq!(
            outcome,
            IsolationOutcome::Crashed {
                detail: "terminated by signal 6".to_string()
            }
        );
    }

    #[test]
    fn test_echo_skips_report_line() {
        let line = ChildReport::default().encode().unwrap();
        let child = output(0, &format!("printed by test\n{line}\n"), "warning from test\n");
        let (mut out, mut err) = (Vec::new(), Vec::new());

        echo_output(&child, &mut out, &mut err);

        assert_eq!(String::from_utf8(out).unwrap(), "printed by test\n");
        assert_eq!(String::from_utf8(err).unwrap(), "warning from test\n");
    }

    #[test]
    fn test_hang_limit_kills_child() {
        let mut executor = ProcessExecutor::new("sleep", vec!["5".into()])
            .unwrap()
            .with_hang_limit(Duration::from_secs(1))
            .with_echo(ChildEcho::Stderr);
        let path = TestPath::root().child(0);
        let location = crate::models::Location::new("x.rs", 1);
        let test = IsolatedTest {
            path: &path,
            name: "sleeper",
            location: &location,
        };

        let started = std::time::Instant::now();
        let outcome = executor
            .execute(&test, &mut |_: &mut dyn crate::reporter::Reporter| -> Result<(), RunnerError> {
                Ok(())
            })
            .unwrap();

        assert_eq!(
            outcome,
            IsolationOutcome::TimedOut {
                detail: "killed after 1s without finishing".to_string()
            }
        );
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_program_is_a_crash() {
        let mut executor =
            ProcessExecutor::new("/nonexistent/suitekit-child", Vec::new()).unwrap();
        let path = TestPath::root().child(0);
        let location = crate::models::Location::new("x.rs", 1);
        let test = IsolatedTest {
            path: &path,
            name: "x",
            location: &location,
        };
        let outcome = executor
            .execute(&test, &mut |_: &mut dyn crate::reporter::Reporter| -> Result<(), RunnerError> {
                Ok(())
            })
            .unwrap();
        assert!(matches!(outcome, IsolationOutcome::Crashed { .. }));
    }
}
