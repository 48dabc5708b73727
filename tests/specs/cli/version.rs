// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two distinct version surfaces: clap's own `--version` (the CLI
//! binary's build version, answerable with no daemon running) versus
//! `--daemon-version` (a live `Hello` handshake with the running daemon).

use crate::prelude::*;

#[test]
fn clap_version_flag_needs_no_running_daemon() {
    let daemon = Daemon::new();
    // Deliberately never started.
    let assert = daemon.ctl(&["--version"]).success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("devmandctl"));
}

#[test]
fn daemon_version_flag_fails_with_no_daemon_running() {
    let daemon = Daemon::new();
    daemon.ctl(&["--daemon-version"]).failure().code(1);
}

#[test]
fn daemon_version_flag_succeeds_against_a_running_daemon() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["--daemon-version"]).success();
}

#[test]
fn no_subcommand_prints_help_and_exits_successfully() {
    let mut daemon = Daemon::new();
    daemon.start();

    let assert = daemon.ctl(&[]).success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("Usage"));
}
