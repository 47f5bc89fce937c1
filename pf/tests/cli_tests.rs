//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("pf")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("daily-review"))
        .stdout(predicate::str::contains("reset"));
}

#[test]
fn test_version() {
    Command::cargo_bin("pf").unwrap().arg("--version").assert().success();
}

#[test]
fn test_unknown_subcommand_fails() {
    Command::cargo_bin("pf")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
