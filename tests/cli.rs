// ABOUTME: Integration tests for the edgeship CLI commands.
// ABOUTME: Validates --help output, exit codes, and error plus remediation rendering.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn edgeship_cmd(config_dir: &Path) -> Command {
    let config = config_dir.join("config.yml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("edgeship"));
    cmd.env("EDGESHIP_CONFIG", config)
        .env_remove("EDGESHIP_API_TOKEN");
    cmd
}

#[test]
fn help_shows_commands() {
    let dir = tempfile::tempdir().unwrap();
    edgeship_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("hash-files"));
}

#[test]
fn status_check_code_outside_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    edgeship_cmd(dir.path())
        .args(["deploy", "--status-check-code", "1000"])
        .assert()
        .failure();
}

#[test]
fn validate_missing_package_prints_remediation() {
    let dir = tempfile::tempdir().unwrap();
    edgeship_cmd(dir.path())
        .args(["validate", "--package", "missing.tar.gz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Remediation:"));
}

#[test]
fn validate_accepts_a_good_package() {
    let dir = support::project("name = \"edge-app\"\n");
    let package = support::package(dir.path(), "edge-app");

    edgeship_cmd(dir.path())
        .arg("validate")
        .arg("--package")
        .arg(&package)
        .assert()
        .success()
        .stdout(predicate::str::contains("Validated package"));
}

#[test]
fn deploy_without_token_fails_before_network() {
    let dir = support::project("name = \"edge-app\"\nservice_id = \"svc-1\"\n");
    support::package(dir.path(), "edge-app");

    edgeship_cmd(dir.path())
        .current_dir(dir.path())
        .args(["deploy", "--non-interactive"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no API token found"))
        .stderr(predicate::str::contains("EDGESHIP_API_TOKEN"));
}

#[test]
fn hash_files_prints_digest_for_existing_package() {
    let dir = support::project("name = \"edge-app\"\n");
    let package = support::package(dir.path(), "edge-app");

    edgeship_cmd(dir.path())
        .arg("--quiet")
        .arg("hash-files")
        .arg("--package")
        .arg(&package)
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{128}\n$").unwrap());
}

#[test]
fn build_unsupported_language_exits_non_zero() {
    let dir = support::project("name = \"edge-app\"\nlanguage = \"cobol\"\n");

    edgeship_cmd(dir.path())
        .current_dir(dir.path())
        .args(["build", "--non-interactive"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported language cobol"));
}

#[test]
fn json_mode_emits_error_events() {
    let dir = tempfile::tempdir().unwrap();
    edgeship_cmd(dir.path())
        .args(["--json", "validate", "--package", "missing.tar.gz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("\"event\":\"error\""));
}

#[test]
fn publish_builds_with_environment_manifest_before_deploying() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("fastly.stage.toml"),
        r"name = 'edge-stage'
language = 'other'

[scripts]
build = '''printf '\000asm\001\000\000\000' > bin/main.wasm'''
",
    )
    .unwrap();

    edgeship_cmd(dir.path())
        .current_dir(dir.path())
        .args(["publish", "--env", "stage", "--non-interactive"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Built package"))
        .stderr(predicate::str::contains("no API token found"));

    assert!(dir.path().join("pkg/edge-stage.tar.gz").is_file());
    assert!(!dir.path().join("fastly.toml").exists());
}
