// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown. Uses
//! `fs2::FileExt::try_lock_exclusive` for the PID lock and removes a stale
//! socket before `UnixListener::bind`; no WAL/snapshot replay step, since
//! this daemon has no on-disk job database to recover.

mod startup;
pub use startup::{shutdown, startup};

use crate::env;
use std::fs::File;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixListener;

/// Daemon configuration: every path under `DEVMAND_STATE_DIR`.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    pub marker_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            marker_path: state_dir.join("queue.marker"),
            state_dir,
        })
    }
}

/// Resources produced by a successful [`startup`], owned by the caller for
/// the lifetime of the daemon.
pub struct StartupResult {
    pub config: Config,
    /// Held to maintain the exclusive PID-file lock; released on drop.
    pub lock_file: File,
    pub listener: UnixListener,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind control socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("failed to bind netlink event source: {0}")]
    NetlinkBindFailed(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
