use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("stockdeck").unwrap();
    // Keep the test hermetic: no real token file, no real config file
    cmd.env("HOME", std::env::temp_dir().join("stockdeck-cli-tests"));
    cmd
}

#[test]
fn test_main_help_shows_about_and_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stockdeck"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("watchlists"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("version"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--help"));
}

#[test]
fn test_help_shows_usage_and_sections() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn test_version_command() {
    cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_login_command_help() {
    cmd()
        .args(["login", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--email"))
        .stdout(predicate::str::contains("--password"));
}

#[test]
fn test_watchlists_command_help() {
    cmd()
        .args(["watchlists", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("overview"));
}

#[test]
fn test_watchlists_requires_login() {
    cmd()
        .args(["watchlists", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_watch_requires_login() {
    cmd()
        .arg("watch")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_logout_without_session_is_graceful() {
    cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn test_unknown_command_exits_with_usage_error() {
    cmd().arg("frobnicate").assert().failure().code(2);
}

#[test]
fn test_no_args_prints_help() {
    cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}
