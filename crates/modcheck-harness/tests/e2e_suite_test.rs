//! Integration test: the `harness` binary against the fixture module.
//!
//! Loads the fixture crate's cdylib through the real platform loader in a
//! child process, so every run starts from an empty server registry.
//!
//! Run: cargo test -p modcheck-harness --test e2e_suite_test

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use modcheck_harness::scenarios::EXPECTED_INSTANCE_STATE;
use modcheck_harness::structured_log::validate_log_file;

/// The fixture cdylib, built by cargo because the fixture crate is a
/// dev-dependency. Looked for next to the test executable and one level up.
fn fixture_module() -> Option<PathBuf> {
    let name = format!("{DLL_PREFIX}modcheck_fixture_module{DLL_SUFFIX}");
    let exe = std::env::current_exe().ok()?;
    let deps = exe.parent()?;
    [Some(deps), deps.parent()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(&name))
        .find(|candidate| candidate.is_file())
}

macro_rules! fixture_or_skip {
    () => {
        match fixture_module() {
            Some(path) => path,
            None => {
                eprintln!("skipping: fixture module artifact not found");
                return;
            }
        }
    };
}

fn harness(args: &[&str], module: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_harness"));
    if let Some(module) = module {
        cmd.arg(module);
    }
    cmd.args(args).output().expect("failed to spawn harness")
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("modcheck-e2e-{}-{name}", std::process::id()))
}

#[test]
fn canonical_suite_passes_against_fixture() {
    let module = fixture_or_skip!();
    let output = harness(&["--settle-ms", "0"], Some(&module));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout:\n{stdout}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 8, "{stdout}");
    assert_eq!(
        lines[0],
        format!("Running tests for library: {}", module.display())
    );
    assert_eq!(lines[1], "CreateServerInstance: SUCCESS");
    assert_eq!(lines[2], "CreateDatabase: SUCCESS");
    assert!(
        lines[3].starts_with("GetDatabase: SUCCESS (database = {\"id\":\"test-db\","),
        "{}",
        lines[3]
    );
    assert_eq!(lines[4], "LoadServerInstanceState: SUCCESS");
    assert_eq!(
        lines[5],
        format!("GetServerInstanceState: SUCCESS (state = {EXPECTED_INSTANCE_STATE})")
    );
    assert_eq!(lines[6], "StopServerInstance: SUCCESS");
    assert_eq!(lines[7], "Tests passed: 4/4");
}

#[test]
fn extended_suite_passes_against_fixture() {
    let module = fixture_or_skip!();
    let output = harness(&["--settle-ms", "0", "--suite", "extended"], Some(&module));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{stdout}");
    assert!(stdout.contains("CreateCollection: SUCCESS\n"));
    assert!(stdout.contains("UpdateDocument: SUCCESS\n"));
    assert!(stdout.contains("DeleteDocument: SUCCESS\n"));
    assert!(stdout.ends_with("StopServerInstance: SUCCESS\nTests passed: 6/6\n"));
}

#[test]
fn structured_log_and_report_are_written() {
    let module = fixture_or_skip!();
    let log = scratch("run.jsonl");
    let report = scratch("report.md");
    let output = harness(
        &[
            "--settle-ms",
            "0",
            "--log",
            log.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--report-format",
            "markdown",
        ],
        Some(&module),
    );
    assert!(output.status.success());

    let (lines, errors) = validate_log_file(&log).unwrap();
    assert!(errors.is_empty(), "{errors:?}");
    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.lines().next().unwrap().contains("\"event\":\"run_start\""));
    assert!(content.contains("\"event\":\"run_end\""));
    assert!(content.contains("\"exit_code\":0"));
    assert!(lines >= 6, "{lines} log lines");

    let markdown = std::fs::read_to_string(&report).unwrap();
    assert!(markdown.contains("- Passed: 4\n"));
    assert!(markdown.contains("| Stop-Server | PASS |"));

    let _ = std::fs::remove_file(&log);
    let _ = std::fs::remove_file(&report);
}

#[test]
fn unwritable_report_keeps_the_passing_exit_code() {
    let module = fixture_or_skip!();
    let log = scratch("report-failure.jsonl");
    let report = scratch("missing-dir").join("report.json");
    let output = harness(
        &[
            "--settle-ms",
            "0",
            "--log",
            log.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ],
        Some(&module),
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr:\n{stderr}");
    assert!(stdout.ends_with("Tests passed: 4/4\n"));
    assert!(stderr.contains("warning: report not written: "), "{stderr}");
    assert!(!report.exists());

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains("\"event\":\"report_failed\""));
    assert!(content.contains("\"event\":\"run_end\""));
    let _ = std::fs::remove_file(&log);
}

#[test]
fn missing_module_argument_is_a_usage_error() {
    let output = harness(&[], None);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn unloadable_module_fails_before_any_scenario() {
    let missing = scratch("no-such-module.so");
    let output = harness(&["--settle-ms", "0"], Some(&missing));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "{stderr}");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Tests passed"));
}

#[test]
fn help_exits_zero() {
    let output = harness(&["--help"], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--settle-ms"));
    assert!(stdout.contains("--suite"));
}
