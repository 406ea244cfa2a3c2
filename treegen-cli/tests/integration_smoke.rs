//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn treegen() -> Command {
    let mut cmd = Command::cargo_bin("treegen").unwrap();
    cmd.env_remove("TREEGEN_BASE_URL").env_remove("TREEGEN_BIND");
    cmd
}

#[test]
fn test_top_level_help_lists_commands() {
    treegen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("tui"))
        .stdout(predicate::str::contains("serve"));
}

// === Watch Command Tests ===

#[test]
fn test_watch_help() {
    treegen()
        .arg("watch")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of images to collect"));
}

#[test]
fn test_watch_rejects_zero_limit() {
    treegen()
        .args(["watch", "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("limit must be at least 1"));
}

#[test]
fn test_watch_unreachable_server_fails() {
    let dir = tempfile::tempdir().unwrap();
    treegen()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args(["--quiet", "watch", "--base-url", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed after 0 of 5 images"));
}

// === Serve Command Tests ===

#[test]
fn test_serve_help() {
    treegen()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generator command"));
}

// === Config Command Tests ===

#[test]
fn test_config_show_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();
    treegen()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image_limit = 5"))
        .stdout(predicate::str::contains("http://localhost:5000"));
}

#[test]
fn test_explicit_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[client]\nimage_limit = 3\n").unwrap();

    treegen()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image_limit = 3"));
}

#[test]
fn test_config_init_local_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();

    treegen()
        .current_dir(dir.path())
        .args(["config", "init", "--local"])
        .assert()
        .success();
    assert!(dir.path().join("treegen.toml").exists());

    treegen()
        .current_dir(dir.path())
        .args(["config", "init", "--local"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

// === Completions ===

#[test]
fn test_completions_bash() {
    treegen()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("treegen"));
}
