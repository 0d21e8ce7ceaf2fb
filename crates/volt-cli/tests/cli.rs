// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use assert_cmd::Command;
use predicates::prelude::*;

fn volt(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("volt").expect("volt binary");
    cmd.arg("--config-dir").arg(config_dir);
    cmd
}

#[test]
fn latch_prints_state_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    volt(dir.path())
        .arg("latch")
        .assert()
        .success()
        .stdout(predicate::str::contains("power-on"))
        .stdout(predicate::str::contains("reset"))
        .stdout(predicate::str::contains("Qn"));
}

#[test]
fn clock_draws_one_strip_per_monitored_node() {
    let dir = tempfile::tempdir().expect("tempdir");
    volt(dir.path())
        .args(["clock", "--interval-ms", "20", "--run-ms", "160", "--no-wait"])
        .args(["--columns", "16"])
        .assert()
        .success()
        .stdout(predicate::str::contains("t = 0..160 ms"))
        .stdout(predicate::str::contains("  clk |__##__##__##__##|"))
        .stdout(predicate::str::contains(" clk2 |____####____####|"))
        .stdout(predicate::str::contains("  and |______##______##|"));
}

#[test]
fn zero_refresh_rate_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    volt(dir.path())
        .args(["--refresh-ms", "0", "clock", "--no-wait"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refresh rate"));
}

#[test]
fn saved_prefs_apply_to_later_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    volt(dir.path())
        .args(["--iteration-limit", "77", "prefs", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved"));
    assert!(dir.path().join("sim.json").is_file());

    volt(dir.path())
        .arg("prefs")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"iteration_limit\": 77"));
}
