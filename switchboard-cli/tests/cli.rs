//! Runs the `switchboard` binary against a throwaway catalog.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CATALOG: &str = r#"
[[models]]
identifier = "simulated/echo"
provider = "simulated"
model = "echo"

[models.capabilities]
max_tokens = 2048
streaming = true

[[models]]
identifier = "simulated/off"
provider = "simulated"
model = "off"
enabled = false
"#;

fn switchboard(dir: &Path, args: &[&str]) -> Output {
    let catalog = dir.join("models.toml");
    Command::new(env!("CARGO_BIN_EXE_switchboard"))
        .arg("--catalog")
        .arg(&catalog)
        .args(args)
        .env("XDG_CONFIG_HOME", dir)
        .env("SWITCHBOARD_PROJECT_CONFIG_DIR", dir)
        .output()
        .expect("failed to run switchboard")
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("models.toml"), CATALOG).unwrap();
    dir
}

#[test]
fn help_lists_commands() {
    let dir = workspace();
    let output = switchboard(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["resolve", "send", "providers", "credentials"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn resolve_reports_discovered_provider() {
    let dir = workspace();
    let output = switchboard(dir.path(), &["resolve", "simulated/echo"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("simulated/echo"));
    assert!(stdout.contains("2048"));
    assert!(stdout.contains("streaming"));
    assert!(!stdout.contains("fallback"));
}

#[test]
fn resolve_unknown_model_uses_fallback() {
    let dir = workspace();
    let output = switchboard(dir.path(), &["resolve", "totally-unknown/model"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("fallback"));
}

#[test]
fn resolve_disabled_model_uses_fallback() {
    let dir = workspace();
    let output = switchboard(dir.path(), &["resolve", "simulated/off"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("fallback"));
}

#[test]
fn send_prints_reply() {
    let dir = workspace();
    let output = switchboard(dir.path(), &["send", "simulated/echo", "hello there"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Simulated reply from simulated/echo"));
    assert!(stdout.contains("hello there"));
}

#[test]
fn send_stream_prints_full_reply_once() {
    let dir = workspace();
    let output = switchboard(
        dir.path(),
        &["send", "--stream", "simulated/echo", "stream me"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Simulated reply").count(), 1);
    assert!(stdout.contains("stream me"));
}

#[test]
fn missing_catalog_still_answers() {
    let dir = TempDir::new().unwrap();
    let output = switchboard(dir.path(), &["send", "simulated/echo", "hi"]);

    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}
