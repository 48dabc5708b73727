// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk presence marker mirroring "the events list is non-empty",
//! owned exclusively by `owner_pid`.
//!
//! Deliberately the smallest possible on-disk-state idiom that fits: a
//! plain file touched/removed under `EventQueue::enqueue`/
//! `detach_and_free`'s marker calls, rather than a WAL/snapshot/
//! materialized-state machine - that machinery exists to recover a job
//! database across restarts, which is out of scope here.

use devmand_scheduler::ports::QueueMarker;
use std::path::PathBuf;
use tracing::warn;

pub struct FsQueueMarker {
    path: PathBuf,
}

impl FsQueueMarker {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl QueueMarker for FsQueueMarker {
    fn create(&self) {
        if let Err(e) = std::fs::write(&self.path, b"") {
            warn!(path = %self.path.display(), error = %e, "failed to create queue marker");
        }
    }

    fn remove(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove queue marker");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_remove_round_trips_the_marker_file() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FsQueueMarker::new(dir.path().join("queue.marker"));
        marker.create();
        assert!(dir.path().join("queue.marker").exists());
        marker.remove();
        assert!(!dir.path().join("queue.marker").exists());
    }

    #[test]
    fn remove_on_a_missing_marker_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FsQueueMarker::new(dir.path().join("missing.marker"));
        marker.remove();
    }
}
