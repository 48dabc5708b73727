// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup/shutdown lifecycle specs.

use crate::prelude::*;

#[test]
fn startup_creates_socket_pid_and_version_files() {
    let mut daemon = Daemon::new();
    daemon.start();

    assert!(daemon.socket_path().exists());
    assert!(daemon.state_path().join("daemon.pid").exists());
    assert!(daemon.state_path().join("daemon.version").exists());
}

#[test]
fn hello_reports_a_non_empty_version_string() {
    let mut daemon = Daemon::new();
    daemon.start();

    let assert = daemon.ctl(&["--daemon-version"]).success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(!stdout.trim().is_empty(), "version string should not be empty");
}

#[test]
fn exit_request_removes_the_control_socket() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["exit"]).success();

    let gone = wait_for(SPEC_WAIT_MAX_MS, || !daemon.socket_path().exists());
    assert!(gone, "control socket should be removed once Exit shuts the daemon down");
}

#[test]
fn second_daemon_refuses_to_start_against_a_locked_state_dir() {
    let mut daemon = Daemon::new();
    daemon.start();

    let exe = assert_cmd::cargo::cargo_bin("devmand");
    let output = std::process::Command::new(exe)
        .env("DEVMAND_STATE_DIR", daemon.state_path())
        .output()
        .expect("second devmand invocation should run to completion, not hang");

    assert!(!output.status.success(), "a second daemon against a locked state dir must not start");
}
