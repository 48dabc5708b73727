// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test harness for the black-box specs: a throwaway
//! `DEVMAND_STATE_DIR` per test, a running `devmand` child process, and a
//! `devmandctl` runner against it.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin;
use assert_cmd::prelude::*;

pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Polls `cond` every 50ms until it returns true or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// An isolated `devmand` instance: its own state dir, and (once
/// [`Daemon::start`] is called) its own running child process, killed on
/// drop so a failing assertion never leaks a daemon into the next test.
pub struct Daemon {
    state_dir: tempfile::TempDir,
    child: Option<Child>,
}

impl Daemon {
    pub fn new() -> Self {
        Self { state_dir: tempfile::tempdir().expect("failed to create temp state dir"), child: None }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn socket_path(&self) -> PathBuf {
        self.state_path().join("daemon.sock")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_path().join("daemon.log")
    }

    /// Spawns `devmand` against this instance's state dir and waits for the
    /// control socket to appear.
    pub fn start(&mut self) -> &mut Self {
        let child = Command::new(cargo_bin("devmand"))
            .env("DEVMAND_STATE_DIR", self.state_path())
            .spawn()
            .expect("failed to spawn devmand");
        self.child = Some(child);

        let ready = wait_for(SPEC_WAIT_MAX_MS, || self.socket_path().exists());
        assert!(ready, "daemon did not create its control socket in time");
        self
    }

    /// Runs `devmandctl` with the given args against this instance.
    pub fn ctl(&self, args: &[&str]) -> Assert {
        Command::new(cargo_bin("devmandctl"))
            .env("DEVMAND_STATE_DIR", self.state_path())
            .args(args)
            .assert()
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
