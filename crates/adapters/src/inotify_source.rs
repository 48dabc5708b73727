// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `IN_CLOSE_WRITE` watch management over the `inotify` crate, chosen
//! over the generic cross-platform `notify` crate this codebase would
//! otherwise reach for - a udev-alike only ever runs on Linux, so there's
//! no reason to pay for `notify`'s portability layer.
//!
//! [`BlockingInotifySource`] satisfies `devmand-scheduler`'s
//! [`InotifySource`] port for worker processes; the Supervisor itself
//! never constructs an inotify instance of its own.

use devmand_scheduler::ports::{InotifySource, WatchId};
use inotify::{Inotify, WatchDescriptor, WatchMask};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;

#[derive(Default)]
struct Registry {
    next: i32,
    by_id: HashMap<WatchId, WatchDescriptor>,
    by_wd: HashMap<WatchDescriptor, WatchId>,
}

/// A worker process's private inotify instance: each forked worker keeps
/// its own kernel inotify fd rather than sharing the Supervisor's, since
/// passing a fd across the fork would need raw fd reconstruction this
/// workspace's `forbid(unsafe_code)` rules out. A path can carry watches
/// from any number of independent inotify instances (worker and
/// Supervisor alike), so this still observes the same `IN_CLOSE_WRITE`
/// the Supervisor's own watcher would.
///
/// Used with [`BlockingInotifySource::wait_close_write`], a synchronous
/// blocking read, since the worker has no async runtime of its own - it
/// discards the Supervisor's event loop after fork.
pub struct BlockingInotifySource {
    inotify: Mutex<Inotify>,
    registry: Mutex<Registry>,
}

impl BlockingInotifySource {
    pub fn new() -> io::Result<Self> {
        Ok(Self { inotify: Mutex::new(Inotify::init()?), registry: Mutex::new(Registry::default()) })
    }

    /// Block until `watch` fires `IN_CLOSE_WRITE` or is torn down
    /// (`IN_IGNORED`). Returns `true` for a close-write, `false` otherwise.
    pub fn wait_close_write(&self, watch: WatchId) -> io::Result<bool> {
        let mut buffer = [0u8; 4096];
        loop {
            let events = {
                let mut inotify = self.inotify.lock();
                inotify.read_events_blocking(&mut buffer)?.collect::<Vec<_>>()
            };
            for event in events {
                let Some(id) = self.registry.lock().by_wd.get(&event.wd).copied() else {
                    continue;
                };
                if id != watch {
                    continue;
                }
                if event.mask.contains(inotify::EventMask::IGNORED) {
                    return Ok(false);
                }
                if event.mask.contains(inotify::EventMask::CLOSE_WRITE) {
                    return Ok(true);
                }
            }
        }
    }
}

impl InotifySource for BlockingInotifySource {
    fn watch_close_write(&self, node: &str) -> Result<WatchId, io::Error> {
        let wd = self.inotify.lock().watches().add(node, WatchMask::CLOSE_WRITE)?;
        let mut reg = self.registry.lock();
        reg.next += 1;
        let id = WatchId(reg.next);
        reg.by_id.insert(id, wd.clone());
        reg.by_wd.insert(wd, id);
        Ok(id)
    }

    fn unwatch(&self, watch: WatchId) {
        let mut reg = self.registry.lock();
        if let Some(wd) = reg.by_id.remove(&watch) {
            reg.by_wd.remove(&wd);
            let _ = self.inotify.lock().watches().remove(wd);
        }
    }
}
