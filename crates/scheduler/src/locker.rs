// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-advisory-lock acquisition with inotify fallback.
//!
//! This is a "chicken-and-egg" inversion: watches are ordinarily requested
//! by rule options, but when the device is locked the rules haven't run
//! yet, so the scheduler unconditionally starts watching and lets the
//! worker tear the watch down later if no rule wanted it.

use crate::error::LockError;
use crate::ports::{FlockSource, InotifySource, WatchId};
use devmand_core::Device;

/// Result of a lock acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The shared lock was acquired; proceed with rule application.
    Acquired,
    /// Still contended after the inotify-backed retry. Rule application for
    /// this event is aborted with "busy" (dropped at the scheduler layer,
    /// no requeue); `watch` will fire a synthetic `change` later.
    Busy { watch: WatchId },
}

pub struct DeviceLocker<F, I> {
    flock: F,
    inotify: I,
}

impl<F: FlockSource, I: InotifySource> DeviceLocker<F, I> {
    pub fn new(flock: F, inotify: I) -> Self {
        Self { flock, inotify }
    }

    /// Whether locking applies to this device at all: only block-subsystem
    /// devices, never `remove` actions, never the synthetic kinds
    /// (dm-/md/drbd/loop/nbd/zram).
    pub fn applies_to(device: &Device) -> bool {
        device.is_block()
            && device.action != devmand_core::Action::Remove
            && !device.is_synthetic_block_kind()
    }

    /// Acquire a shared lock on `node` (already resolved to the whole-disk
    /// node by the caller - partitions are dereferenced to their parent
    /// before this is called).
    pub fn acquire(&self, node: &str) -> Result<LockOutcome, LockError> {
        let map_flock = |e| LockError::Flock { node: node.to_string(), source: e };
        let map_watch = |e| LockError::Watch { node: node.to_string(), source: e };

        if self.flock.try_lock_shared(node).map_err(map_flock)? {
            return Ok(LockOutcome::Acquired);
        }
        let watch = self.inotify.watch_close_write(node).map_err(map_watch)?;
        if self.flock.try_lock_shared(node).map_err(map_flock)? {
            self.inotify.unwatch(watch);
            return Ok(LockOutcome::Acquired);
        }
        Ok(LockOutcome::Busy { watch })
    }

    pub fn release(&self, node: &str) {
        self.flock.unlock(node);
    }
}

#[cfg(test)]
#[path = "locker_tests.rs"]
mod tests;
