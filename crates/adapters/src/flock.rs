// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory `flock(2)` locking over a block-device node, via `fs2`.

use devmand_scheduler::ports::FlockSource;
use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;

/// Holds one open file handle per locked node for the lifetime of the
/// lock - `flock(2)`'s lock is tied to the open file description, so the
/// fd must stay open between `try_lock_shared` and `unlock`.
#[derive(Default)]
pub struct FsFlock {
    handles: Mutex<HashMap<String, File>>,
}

impl FsFlock {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(node: &str) -> io::Result<File> {
        OpenOptions::new().read(true).open(node)
    }
}

impl FlockSource for FsFlock {
    fn try_lock_shared(&self, node: &str) -> Result<bool, io::Error> {
        let mut handles = self.handles.lock();
        if !handles.contains_key(node) {
            handles.insert(node.to_string(), Self::open(node)?);
        }
        let file = handles.get(node).expect("just inserted");
        match file.try_lock_shared() {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn try_lock_exclusive(&self, node: &str) -> Result<bool, io::Error> {
        let mut handles = self.handles.lock();
        if !handles.contains_key(node) {
            handles.insert(node.to_string(), Self::open(node)?);
        }
        let file = handles.get(node).expect("just inserted");
        match file.try_lock_exclusive() {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn unlock(&self, node: &str) {
        let mut handles = self.handles.lock();
        if let Some(file) = handles.remove(node) {
            let _ = FileExt::unlock(&file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn shared_lock_on_a_real_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node");
        std::fs::File::create(&path).unwrap().write_all(b"x").unwrap();
        let flock = FsFlock::new();
        let node = path.to_str().unwrap();

        assert!(flock.try_lock_shared(node).unwrap());
        flock.unlock(node);
    }

    #[test]
    fn exclusive_lock_blocks_a_second_exclusive_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node");
        std::fs::File::create(&path).unwrap().write_all(b"x").unwrap();
        let node = path.to_str().unwrap();

        let first = FsFlock::new();
        assert!(first.try_lock_exclusive(node).unwrap());

        let second = FsFlock::new();
        assert!(!second.try_lock_exclusive(node).unwrap(), "already held exclusively");
        first.unlock(node);
    }
}
