//! End-to-end integration tests for callbridge-cli
//!
//! These build and run the binary, so they are gated behind the
//! `integration` feature flag. Run with:
//!
//! ```sh
//! cargo test -p callbridge-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::process::Command;

fn callbridge(args: &[&str]) -> std::process::Output {
    let project_dir = tempfile::TempDir::new().unwrap();
    Command::new("cargo")
        .args(["run", "-q", "-p", "callbridge-cli", "--"])
        .args(args)
        .env("CALLBRIDGE_PROJECT_CONFIG_DIR", project_dir.path())
        .output()
        .expect("Failed to run callbridge")
}

/// Test that callbridge --help lists every command
#[test]
fn callbridge_help_works() {
    let output = callbridge(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("demo"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("config"));
}

/// Test that the demo walks through the whole lifecycle
#[test]
fn callbridge_demo_delivers_lifecycle_events() {
    let output = callbridge(&["demo", "--auto-answer"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[phone] initialized"));
    assert!(stdout.contains("[phone] incoming"));
    assert!(stdout.contains("[phone] incomingAnswered"));
    assert!(stdout.contains("[phone] incomingRejected"));
    assert!(stdout.contains("events delivered"));
}

/// Test that check fails on options without credentials
#[test]
fn callbridge_check_rejects_incomplete_options() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("phone.json");
    std::fs::write(&path, "{}").unwrap();

    let output = callbridge(&["check", path.to_str().unwrap()]);

    assert!(!output.status.success());
}
