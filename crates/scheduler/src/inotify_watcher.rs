// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracks `IN_CLOSE_WRITE`/`IN_IGNORED` and synthesizes retrigger events.
//!
//! Shares its underlying watch registry with [`crate::DeviceLocker`]'s
//! inotify fallback: a watch installed because a device was locked
//! is serviced by the same `on_close_write` path as a watch installed for
//! whole-disk partition-table tracking.

use crate::ports::{InotifySource, PartitionProbe, WatchId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;

#[derive(Debug, Clone)]
struct WatchEntry {
    node: String,
    has_partitions: bool,
}

pub struct InotifyWatcher<S, P> {
    source: S,
    probe: P,
    watches: Mutex<HashMap<WatchId, WatchEntry>>,
}

impl<S: InotifySource, P: PartitionProbe> InotifyWatcher<S, P> {
    pub fn new(source: S, probe: P) -> Self {
        Self { source, probe, watches: Mutex::new(HashMap::new()) }
    }

    /// Install a watch, remembering whether `node` is a whole disk with
    /// partitions (affects how `on_close_write` resolves).
    pub fn watch(&self, node: &str, has_partitions: bool) -> Result<WatchId, io::Error> {
        let id = self.source.watch_close_write(node)?;
        self.watches.lock().insert(id, WatchEntry { node: node.to_string(), has_partitions });
        Ok(id)
    }

    pub fn unwatch(&self, watch: WatchId) {
        self.watches.lock().remove(&watch);
        self.source.unwatch(watch);
    }

    /// The underlying blocking source, for a worker to park on
    /// `wait_close_write` directly once a watch has been installed here.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// `IN_CLOSE_WRITE` fired on `watch`. Returns the devpaths that need a
    /// synthesized `change` event; empty if the kernel will emit its own
    /// (a successful partition-table reread on a whole disk).
    pub fn on_close_write(&self, watch: WatchId) -> Vec<String> {
        let Some(entry) = self.watches.lock().get(&watch).cloned() else {
            return Vec::new();
        };
        if !entry.has_partitions {
            return vec![entry.node];
        }
        match self.probe.try_reread_partition_table(&entry.node) {
            Ok(true) => Vec::new(),
            _ => {
                let mut out = vec![entry.node.clone()];
                out.extend(self.probe.partitions_of(&entry.node));
                out
            }
        }
    }

    /// `IN_IGNORED`: acted on by the rule engine
    /// when a `remove` event tears the watch down, not here - we only drop
    /// our own bookkeeping so it doesn't leak.
    pub fn on_ignored(&self, watch: WatchId) {
        self.watches.lock().remove(&watch);
    }
}

impl<S: InotifySource, P: PartitionProbe> InotifySource for InotifyWatcher<S, P> {
    fn watch_close_write(&self, node: &str) -> Result<WatchId, io::Error> {
        let has_partitions = !self.probe.partitions_of(node).is_empty();
        self.watch(node, has_partitions)
    }

    fn unwatch(&self, watch: WatchId) {
        self.watches.lock().remove(&watch);
        self.source.unwatch(watch);
    }
}

#[cfg(test)]
#[path = "inotify_watcher_tests.rs"]
mod tests;
