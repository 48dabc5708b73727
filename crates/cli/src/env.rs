// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal environment accessors mirroring `devmand-daemon`'s own `env.rs` -
//! the CLI resolves the same state directory so it can find the control
//! socket and log file without depending on the daemon crate itself.

use std::path::PathBuf;

/// `DEVMAND_STATE_DIR`, falling back to `$XDG_STATE_HOME/devmand` then
/// `~/.local/state/devmand`.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DEVMAND_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("devmand"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/state/devmand"))
}
