//! Tests for `octpkg install`

use super::common::TestEnv;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_install_by_name_picks_newest() {
    let mut env = TestEnv::new();
    env.publish("io", "2.6.3", &[]);
    env.publish("io", "2.6.2", &[]);

    env.octpkg()
        .args(["install", "io"])
        .assert()
        .success()
        .stdout(predicate::str::contains("io@2.6.3"));

    let dir = env.local_prefix().join("io-2.6.3");
    assert!(dir.join("fn.m").is_file());
    assert!(dir.join("packinfo").join("DESCRIPTION").is_file());
    let registry = fs::read_to_string(env.local_prefix().join("registry.json")).unwrap();
    assert!(registry.contains("\"io\""));
}

#[test]
fn test_dependencies_install_first() {
    let mut env = TestEnv::new();
    env.publish("control", "2.1.0", &[]);
    env.publish("control", "1.9.0", &[]);
    env.publish("signal", "1.0.0", &["control (>= 2.0.0)"]);

    let output = env.octpkg().args(["install", "signal"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let control = stdout.find("control@2.1.0").unwrap();
    let signal = stdout.find("signal@1.0.0").unwrap();
    assert!(control < signal);
    assert!(env.local_prefix().join("control-2.1.0").is_dir());
    assert!(env.local_prefix().join("signal-1.0.0").is_dir());
}

#[test]
fn test_resolve_only_installs_nothing() {
    let mut env = TestEnv::new();
    env.publish("io", "2.6.3", &[]);

    env.octpkg()
        .args(["install", "-resolve-only", "io"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installation plan:"))
        .stdout(predicate::str::contains("io@2.6.3"));

    assert!(!env.local_prefix().join("io-2.6.3").exists());
}

#[test]
fn test_unknown_package_suggests_name() {
    let mut env = TestEnv::new();
    env.publish("statistics", "1.6.0", &[]);

    env.octpkg()
        .args(["install", "statistic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did you mean 'statistics'"));
}

#[test]
fn test_reinstall_is_noop_without_force() {
    let mut env = TestEnv::new();
    env.publish("io", "2.6.3", &[]);

    env.octpkg().args(["install", "io"]).assert().success();
    env.octpkg()
        .args(["install", "io"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already installed"));
    env.octpkg()
        .args(["install", "-force", "io"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed io@2.6.3"));
}

#[test]
fn test_install_local_archive() {
    let mut env = TestEnv::new();
    let archive = env.publish("io", "2.6.3", &[]);

    env.octpkg()
        .args(["install", "-global"])
        .arg(&archive)
        .assert()
        .success();

    assert!(env.global_prefix().join("io-2.6.3").is_dir());
    assert!(!env.local_prefix().join("io-2.6.3").exists());
}

#[test]
fn test_unknown_flag_is_rejected() {
    let env = TestEnv::new();
    env.octpkg().args(["install", "-bogus", "io"]).assert().failure();
}

#[test]
fn test_dependency_cycle() {
    let mut env = TestEnv::new();
    env.publish("a", "1.0", &["b"]);
    env.publish("b", "1.0", &["a"]);

    env.octpkg()
        .args(["install", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency"));

    env.octpkg()
        .args(["install", "-force", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan is incomplete; nothing was installed."));

    assert!(!env.local_prefix().join("a-1.0").exists());
    assert!(!env.local_prefix().join("b-1.0").exists());
}
