use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn slimgo() -> Command {
    let mut cmd = Command::cargo_bin("slimgo").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_existing_destination_is_refused_before_cloning() {
    let dir = tempdir().unwrap();

    slimgo()
        .arg(dir.path())
        .arg("--repo")
        .arg(dir.path().join("no-such-repo"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"))
        .stdout(predicate::str::contains("Cloning").not());

    // Nothing was cloned into it
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_destination_is_a_usage_error() {
    slimgo()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_extra_positional_is_a_usage_error() {
    let dir = tempdir().unwrap();

    slimgo()
        .arg(dir.path().join("a"))
        .arg(dir.path().join("b"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_options() {
    slimgo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--repo"))
        .stdout(predicate::str::contains("--keep"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_unknown_keep_group_fails_before_cloning() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("go");

    slimgo()
        .arg(&dest)
        .args(["--keep", "godoc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown group 'godoc'"));

    assert!(!dest.exists());
}

#[test]
fn test_invalid_denylist_file_is_reported() {
    let dir = tempdir().unwrap();
    let denylist = dir.path().join("denylist.toml");
    fs::write(&denylist, "[[group]]\nname = \"escape\"\npatterns = [\"../..\"]\n").unwrap();
    let dest = dir.path().join("go");

    slimgo()
        .arg(&dest)
        .arg("--denylist")
        .arg(&denylist)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("loading deny-list"))
        .stderr(predicate::str::contains("must not leave the tree root"));

    assert!(!dest.exists());
}

#[test]
fn test_clone_failure_exits_with_diagnostic() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("go");

    slimgo()
        .arg(&dest)
        .arg("--repo")
        .arg(dir.path().join("no-such-repo"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cloning"));
}

#[test]
fn test_phase_headers_are_not_repeated_as_log_lines() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("go");

    slimgo()
        .arg(&dest)
        .arg("--repo")
        .arg(dir.path().join("no-such-repo"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Cloning"))
        .stderr(predicate::str::contains("INFO").not());
}
