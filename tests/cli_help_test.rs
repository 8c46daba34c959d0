//! CLI surface smoke tests: every operation is reachable from --help and
//! required arguments are enforced.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_module_lifecycle_commands() {
    let mut cmd = Command::cargo_bin("repeater-console").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("active"))
        .stdout(predicate::str::contains("frozen"))
        .stdout(predicate::str::contains("reload"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn help_lists_config_and_checker_commands() {
    let mut cmd = Command::cargo_bin("repeater-console").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("save-config"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("autofix"))
        .stdout(predicate::str::contains("list-configs"))
        .stdout(predicate::str::contains("init-config"));
}

#[test]
fn init_config_writes_a_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repeater-console.toml");

    let mut cmd = Command::cargo_bin("repeater-console").unwrap();
    cmd.arg("init-config")
        .arg("--path")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration written"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("default_port"));
}

#[test]
fn install_without_required_args_fails() {
    let mut cmd = Command::cargo_bin("repeater-console").unwrap();
    cmd.arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--app"));
}
