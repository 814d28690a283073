// End-to-end runs of the demo binary, one child process per test.

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn demo() -> Command {
    let mut cmd = Command::cargo_bin("suitekit-demo").unwrap();
    cmd.env_remove("SUITEKIT_CHILD_TEST")
        .env_remove("SUITEKIT_PER_TEST_TIMEOUT")
        .env_remove("SUITEKIT_NO_FORK")
        .env_remove("SUITEKIT_CONFIG")
        .env_remove("SUITEKIT_DEMO_FAULTS")
        .env_remove("SUITEKIT_LOG")
        .arg("--no-color");
    cmd
}

#[test]
fn test_clean_suite_succeeds() {
    demo()
        .assert()
        .success()
        .stdout(contains("Running \"demo\" (5 tests)"))
        .stdout(contains("✓ connects_once"))
        .stdout(contains("Completed \"demo\": 5 passes, 0 failures, 0 exceptions"))
        .stdout(contains("Result: SUCCESS"))
        .stdout(contains("@@suitekit-report@@").not());
}

#[test]
fn test_faults_are_contained_per_test() {
    demo()
        .env("SUITEKIT_DEMO_FAULTS", "1")
        .env("SUITEKIT_PER_TEST_TIMEOUT", "1")
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .failure()
        .stdout(contains(
            "an exception was thrown during test body: [index out of range]",
        ))
        .stdout(contains("test \"aborts\" crashed"))
        .stdout(contains("test \"hangs\" timed out"))
        .stdout(contains("assertion `left == right` failed"))
        .stdout(contains("✓ runs_after_faults"))
        .stdout(contains("Result: FAILURE"));
}

#[test]
fn test_invalid_timeout_stops_before_running() {
    demo()
        .env("SUITEKIT_PER_TEST_TIMEOUT", "0")
        .assert()
        .code(1)
        .stderr(contains(
            "invalid value for SUITEKIT_PER_TEST_TIMEOUT environment variable: 0",
        ))
        .stdout(contains("Running").not());
}

#[test]
fn test_non_numeric_timeout_is_rejected() {
    demo()
        .env("SUITEKIT_PER_TEST_TIMEOUT", "soon")
        .assert()
        .failure()
        .stderr(contains("SUITEKIT_PER_TEST_TIMEOUT"));
}

#[test]
fn test_named_run_executes_only_matching_test() {
    demo()
        .args(["--test", "adds_numbers"])
        .assert()
        .success()
        .stdout(contains("✓ adds_numbers"))
        .stdout(contains("pops_last").not())
        .stdout(contains("Running \"stack\"").not());
}

#[test]
fn test_named_run_fails_on_std_assertion() {
    demo()
        .env("SUITEKIT_DEMO_FAULTS", "1")
        .args(["--test", "miscounts"])
        .assert()
        .code(1)
        .stdout(contains("✗ miscounts"))
        .stdout(contains("Pass: 0 | Fail: 1 | Exceptions: 0"))
        .stdout(contains("Result: FAILURE"));
}

#[test]
fn test_caught_panic_is_not_echoed_by_panic_hook() {
    demo()
        .env("SUITEKIT_DEMO_FAULTS", "1")
        .args(["--test", "panics"])
        .assert()
        .success()
        .stdout(contains("[index out of range]"))
        .stderr(contains("panicked at").not());
}

#[test]
fn test_malformed_child_target_is_an_error() {
    demo()
        .env("SUITEKIT_CHILD_TEST", "bogus")
        .assert()
        .code(1)
        .stderr(contains("malformed test path"))
        .stdout(contains("Running").not());
}

#[test]
fn test_inline_mode_runs_everything() {
    demo()
        .arg("--no-fork")
        .assert()
        .success()
        .stdout(contains("✓ pops_last"))
        .stdout(contains("Result: SUCCESS"));
}

#[test]
fn test_list_prints_paths() {
    demo()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains("0.0\tadds_numbers"))
        .stdout(contains("2.0\tconnects_once"));
}

#[test]
fn test_json_summary() {
    // children print to stdout; only the report may reach the parent's stdout
    let output = demo().args(["--format", "json"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("opening connection"));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["success"], true);
    assert_eq!(report["summary"]["tally"]["passes"], 5);
    assert_eq!(report["summary"]["mode"]["mode"], "all");
    assert!(report["failures"].as_array().unwrap().is_empty());
}
