// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow trait boundaries for the collaborators this crate deliberately
//! keeps out of scope, plus the OS-facing primitives (locking, inotify,
//! process spawn/signal) that the scheduler's algorithms are written
//! against.
//!
//! Concrete implementations live in `devmand-adapters` (sockets, rule
//! engine, real flock/inotify/fork) and `devmand-daemon` (the on-disk
//! marker), keeping this crate deterministic and unit-testable without a
//! kernel, a subprocess, or a filesystem.

use devmand_core::Device;
use std::io;

/// Outcome of rule application for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Rules ran to completion; `device` carries any enrichment.
    Applied,
    /// The device's backing node is held by another process.
    Busy,
    /// Rule application failed for a reason other than lock contention.
    Fatal(String),
}

/// The per-device rule-application capability, deliberately out of scope
/// here; the scheduler only calls `apply` and, periodically, `validate`.
pub trait RuleEngine: Send + Sync + 'static {
    /// Apply rules to `device`, returning the enriched record or a status.
    fn apply(&self, device: &mut Device) -> RuleOutcome;

    /// Cheap freshness probe used by the periodic reload check: true if the
    /// compiled rule set still matches what's on disk.
    fn validate(&self) -> bool;
}

/// Presence-marker side effect: mirrors "the events list is non-empty".
/// Implemented by daemon's `queue_marker` module; tests use [`NoopMarker`].
pub trait QueueMarker: Send + Sync + 'static {
    fn create(&self);
    fn remove(&self);
}

/// No-op marker for unit tests that don't care about the on-disk surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMarker;

impl QueueMarker for NoopMarker {
    fn create(&self) {}
    fn remove(&self) {}
}

/// Advisory shared/exclusive locking on a block-device node.
/// `try_lock_shared`/`try_lock_exclusive` return `Ok(false)` for
/// would-block rather than an error - only real failures are `Err`.
pub trait FlockSource: Send + Sync + 'static {
    fn try_lock_shared(&self, node: &str) -> Result<bool, io::Error>;
    fn try_lock_exclusive(&self, node: &str) -> Result<bool, io::Error>;
    fn unlock(&self, node: &str);
}

/// Opaque inotify watch descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub i32);

/// Installs/removes `IN_CLOSE_WRITE` watches.
pub trait InotifySource: Send + Sync + 'static {
    fn watch_close_write(&self, node: &str) -> Result<WatchId, io::Error>;
    fn unwatch(&self, watch: WatchId);
}

/// Lets an `Arc<impl InotifySource>` stand in for `I` directly, so a caller
/// can keep a second handle to the same instance alongside the one moved
/// into a [`crate::locker::DeviceLocker`] - e.g. a worker process waiting on
/// a watch its own `DeviceLocker::acquire` just installed, for a retrigger.
impl<T: InotifySource + ?Sized> InotifySource for std::sync::Arc<T> {
    fn watch_close_write(&self, node: &str) -> Result<WatchId, io::Error> {
        (**self).watch_close_write(node)
    }

    fn unwatch(&self, watch: WatchId) {
        (**self).unwatch(watch)
    }
}

/// Partition-table operations needed by the whole-disk re-trigger logic.
/// Both require sysfs/ioctl access, hence the trait boundary.
pub trait PartitionProbe: Send + Sync + 'static {
    /// Attempt a non-blocking exclusive lock plus a partition-table reread.
    /// `Ok(true)` means it succeeded (the kernel will emit its own events).
    fn try_reread_partition_table(&self, disk_node: &str) -> Result<bool, io::Error>;

    /// Devpaths of every partition of a whole-disk node.
    fn partitions_of(&self, disk_node: &str) -> Vec<String>;
}

/// Signals a worker may be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSignal {
    /// Sent on soft-kill completion and on a forced `kill_workers` sweep.
    Term,
    /// Sent when the per-event kill timer fires; `timeout_signal` defaults
    /// to a forced kill.
    Timeout,
}

/// One worker's private channels: device handoff and completion/signal
/// delivery.
pub trait WorkerChannel: Send + Sync + 'static {
    fn send_device(&self, device: &Device) -> Result<(), io::Error>;
    fn signal(&self, sig: KillSignal) -> Result<(), io::Error>;
}

/// A freshly spawned worker process and its private channel.
pub struct SpawnedWorker {
    pub pid: crate::worker::Pid,
    pub channel: Box<dyn WorkerChannel>,
}

/// Fork/exec abstraction. Named `spawn` rather than `fork` because the real
/// implementation re-execs the daemon binary in worker mode
/// (`std::process::Command`) rather than calling `fork(2)` directly - see
/// `devmand-adapters`.
pub trait ProcessSpawner: Send + Sync + 'static {
    fn spawn(&self) -> Result<SpawnedWorker, io::Error>;
}

/// Publishes a processed device to downstream consumers. A normal
/// completion publishes the worker's enriched `Device`; a worker-fatal
/// completion publishes the Supervisor's frozen kernel-side clone instead -
/// both paths call the same `send`.
pub trait EventSink: Send + Sync + 'static {
    fn send(&self, device: &Device) -> Result<(), io::Error>;
}

/// No-op sink for tests that don't care about the publish surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn send(&self, _device: &Device) -> Result<(), io::Error> {
        Ok(())
    }
}

/// Source of kernel uevents. Deliberately out of scope beyond the single
/// blocking-recv call the Supervisor loop selects on; implemented over
/// netlink in `devmand-adapters`.
pub trait EventSource: Send + Sync + 'static {
    fn recv(&self) -> Result<Device, io::Error>;
}

/// Persisted per-device state (name database / properties carried forward
/// across uevents for the same devpath), deliberately out of scope here
/// beyond the single delete call a worker-fatal reap makes.
pub trait DeviceDb: Send + Sync + 'static {
    /// Drop whatever state is keyed on `device`, as reap does for a worker
    /// that died mid-event: the worker never got to finish applying rules,
    /// so any prior record for this device should not outlive it.
    fn delete(&self, device: &Device);
}

/// No-op persisted-state handle for tests and for builds with no name
/// database configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDb;

impl DeviceDb for NoopDb {
    fn delete(&self, _device: &Device) {}
}
