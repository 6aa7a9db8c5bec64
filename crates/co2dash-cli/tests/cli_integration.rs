//! CLI Integration Tests
//!
//! These tests run the co2dash binary. None of them need a running store.
//!
//! ```
//! cargo test --package co2dash-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

/// Run co2dash with a clean environment.
fn run_co2dash(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_co2dash"))
        .args(args)
        .env_remove("CO2DASH_URL")
        .env_remove("NO_COLOR")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run co2dash binary")
}

fn config_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// =============================================================================
// Help and Version
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_co2dash(&["--help"]);
    assert!(output.status.success(), "Help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CO2"), "Help should describe the tool");
    for command in ["days", "show", "watch", "config"] {
        assert!(stdout.contains(command), "Help should list {command}");
    }
}

#[test]
fn test_version_command() {
    let output = run_co2dash(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_show_help_lists_formats() {
    let output = run_co2dash(&["show", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--day"));
    assert!(stdout.contains("--once"));
    assert!(stdout.contains("csv"));
}

// =============================================================================
// Config
// =============================================================================

#[test]
fn test_config_path_honors_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let output = run_co2dash(&["config", "path", "--config", &config_arg(&path)]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        path.to_string_lossy()
    );
}

#[test]
fn test_config_init_then_refuse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let arg = config_arg(&path);

    let first = run_co2dash(&["config", "init", "--config", &arg]);
    assert!(first.status.success());
    assert!(path.exists());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("poll_interval_secs = 5"));

    let second = run_co2dash(&["config", "init", "--config", &arg]);
    assert!(!second.status.success(), "Init must not overwrite silently");
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));

    let forced = run_co2dash(&["config", "init", "--force", "--config", &arg]);
    assert!(forced.status.success());
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[store]\nurl = \"http://localhost/co2\"\n\n[live]\npoll_interval_secs = 0\n",
    )
    .unwrap();

    let output = run_co2dash(&["days", "--config", &config_arg(&path)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("poll_interval_secs"));
}

// =============================================================================
// Settings errors
// =============================================================================

#[test]
fn test_missing_url_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let output = run_co2dash(&["days", "--config", &config_arg(&path)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No store URL configured"));
}

#[test]
fn test_interval_out_of_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let output = run_co2dash(&[
        "watch",
        "--url",
        "http://127.0.0.1:9/co2",
        "--interval",
        "0",
        "--config",
        &config_arg(&path),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--interval must be between"));
}

#[test]
fn test_invalid_day_rejected_by_parser() {
    let output = run_co2dash(&["show", "--day", "02/01/2024"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}
