// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket protocol specs, driven entirely through `devmandctl`
//! against a real running daemon.

use crate::prelude::*;

fn status_json(daemon: &Daemon) -> serde_json::Value {
    let assert = daemon.ctl(&["--output", "json", "status"]).success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    serde_json::from_str(&stdout).expect("status --output json should print one JSON object")
}

#[test]
fn ping_returns_pong() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["ping"]).success().stdout("pong\n");
}

#[test]
fn status_reports_the_initial_worker_pool_shape() {
    let mut daemon = Daemon::new();
    daemon.start();

    let status = status_json(&daemon);
    assert_eq!(status["workers"], 0);
    assert_eq!(status["queued_events"], 0);
    assert_eq!(status["stop_exec_queue"], false);
    assert!(status["children_max"].as_u64().unwrap() > 0);
}

#[test]
fn stop_and_start_exec_queue_round_trip_through_status() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["stop"]).success();
    assert_eq!(status_json(&daemon)["stop_exec_queue"], true);

    daemon.ctl(&["start"]).success();
    assert_eq!(status_json(&daemon)["stop_exec_queue"], false);
}

#[test]
fn set_children_max_is_reflected_in_status() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["set-children-max", "3"]).success();
    assert_eq!(status_json(&daemon)["children_max"], 3);
}

#[test]
fn set_log_level_is_accepted() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["set-log-level", "0"]).success();
}

#[test]
fn set_env_accepts_a_well_formed_entry_and_its_removal() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["set-env", "ID_FOO=bar"]).success();
    daemon.ctl(&["set-env", "ID_FOO="]).success();
}

#[test]
fn set_env_rejects_an_entry_with_no_equals_sign() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["set-env", "not_an_assignment"]).failure();
}

#[test]
fn reload_is_accepted_with_no_workers_running() {
    let mut daemon = Daemon::new();
    daemon.start();

    daemon.ctl(&["reload"]).success();
}

#[test]
fn devmandctl_reports_not_running_against_a_dead_socket() {
    let daemon = Daemon::new();
    // Deliberately never started - no socket exists at this state dir.
    daemon.ctl(&["ping"]).failure().code(1);
}
