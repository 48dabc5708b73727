// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Read;

fn config_in(dir: &std::path::Path) -> Config {
    Config {
        socket_path: dir.join("daemon.sock"),
        lock_path: dir.join("daemon.pid"),
        version_path: dir.join("daemon.version"),
        log_path: dir.join("daemon.log"),
        marker_path: dir.join("queue.marker"),
        state_dir: dir.to_path_buf(),
    }
}

#[tokio::test]
async fn startup_writes_pid_and_version_and_binds_socket() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let result = startup(&config).await.unwrap();
    assert!(config.socket_path.exists());

    let mut pid_contents = String::new();
    std::fs::File::open(&config.lock_path).unwrap().read_to_string(&mut pid_contents).unwrap();
    assert_eq!(pid_contents.trim().parse::<u32>().unwrap(), std::process::id());

    drop(result.lock_file);
}

#[tokio::test]
async fn startup_fails_without_clobbering_an_already_running_daemons_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let first = startup(&config).await.unwrap();
    let second = startup(&config).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));
    assert!(config.socket_path.exists(), "second attempt must not remove the first's socket");
    drop(first.lock_file);
}
