// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `devmandctl logs` specs - this command reads the daemon's log file
//! directly, so most of it works without a live control-socket connection.

use crate::prelude::*;

#[test]
fn reports_no_log_file_before_any_daemon_has_run() {
    let daemon = Daemon::new();
    // Deliberately never started - the state dir is empty.
    daemon.ctl(&["logs"]).success();
}

#[test]
fn returns_lines_written_since_startup() {
    let mut daemon = Daemon::new();
    daemon.start();

    let ready = wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::metadata(daemon.log_path()).map(|m| m.len() > 0).unwrap_or(false)
    });
    assert!(ready, "daemon should have written at least its startup line by now");

    let assert = daemon.ctl(&["logs"]).success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(!stdout.trim().is_empty());
}

#[test]
fn no_limit_flag_is_accepted_alongside_limit_conflict_rejected() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["logs", "--no-limit"]).success();
    daemon.ctl(&["logs", "--no-limit", "-n", "5"]).failure();
}

#[test]
fn json_output_shape_includes_log_path_and_lines() {
    let mut daemon = Daemon::new();
    daemon.start();

    wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::metadata(daemon.log_path()).map(|m| m.len() > 0).unwrap_or(false)
    });

    let assert = daemon.ctl(&["--output", "json", "logs"]).success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("logs --output json should be one object");
    assert!(value.get("log_path").is_some());
    assert!(value.get("lines").is_some());
}
