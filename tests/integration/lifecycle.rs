//! Tests for `list`, `load`, `unload`, `uninstall` and `rebuild`

use super::common::TestEnv;
use predicates::prelude::*;
use std::fs;

fn installed_pair() -> TestEnv {
    let mut env = TestEnv::new();
    env.publish("control", "2.1.0", &[]);
    env.publish("signal", "1.0.0", &["control (>= 2.0.0)"]);
    env.octpkg().args(["install", "signal"]).assert().success();
    env
}

#[test]
fn test_list_marks_loaded_packages() {
    let env = installed_pair();

    env.octpkg()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("signal "))
        .stdout(predicate::str::contains("signal*").not());

    env.octpkg()
        .args(["load", "signal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export OCTAVE_PATH="));

    env.octpkg()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("signal*"))
        .stdout(predicate::str::contains("control*"));
}

#[test]
fn test_load_puts_dependencies_first() {
    let env = installed_pair();
    env.octpkg().args(["load", "signal"]).assert().success();

    let path = fs::read_to_string(env.local_prefix().join("searchpath")).unwrap();
    let lines: Vec<&str> = path.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("control-2.1.0"));
    assert!(lines[1].ends_with("signal-1.0.0"));
}

#[test]
fn test_unload_blocked_by_loaded_dependent() {
    let env = installed_pair();
    env.octpkg().args(["load", "signal"]).assert().success();

    env.octpkg()
        .args(["unload", "control"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signal@1.0.0 depends on control"));

    env.octpkg().args(["unload", "signal"]).assert().success();
    env.octpkg().args(["unload", "control"]).assert().success();
}

#[test]
fn test_uninstall_respects_dependents() {
    let env = installed_pair();

    env.octpkg()
        .args(["uninstall", "control"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signal@1.0.0 needs control"));
    assert!(env.local_prefix().join("control-2.1.0").is_dir());

    env.octpkg()
        .args(["uninstall", "-nodeps", "control"])
        .assert()
        .success();
    assert!(!env.local_prefix().join("control-2.1.0").exists());
}

#[test]
fn test_rebuild_recovers_registry() {
    let env = installed_pair();
    fs::remove_file(env.local_prefix().join("registry.json")).unwrap();

    env.octpkg()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages installed."));

    env.octpkg()
        .arg("rebuild")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 package(s)"));

    env.octpkg()
        .args(["list", "-local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("control"))
        .stdout(predicate::str::contains("signal"));
}
