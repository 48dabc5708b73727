// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device processing as it runs inside a worker process. `Manager`
//! never calls [`RuleEngine`] or [`DeviceLocker`] directly - those happen
//! here, in the worker's own address space, after it has received a device
//! over IPC and before it sends its identity-only completion datagram back.

use crate::locker::{DeviceLocker, LockOutcome};
use crate::ports::{EventSink, FlockSource, InotifySource, RuleEngine, RuleOutcome, WatchId};
use devmand_core::Device;

/// Outcome of processing one device inside a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Rules ran; `device` is the enriched record, already published.
    Applied,
    /// The device's node was locked by another process; dropped, no
    /// requeue. `watch` is set
    /// when the lock itself was contended (the caller should block on it
    /// and signal a retrigger); `None` when a `RuleOutcome::Busy` aborted
    /// processing after the lock was already released.
    Busy { watch: Option<WatchId> },
    /// Rule application failed for a reason other than lock contention.
    Fatal(String),
}

/// Process one device: resolve its backing node (whole-disk node for
/// partitions; `None` skips locking entirely, e.g. non-block subsystems),
/// acquire the advisory lock if it applies, run rules, and publish the
/// enriched record on success. Always releases the lock it took, even on
/// a rules failure - the lock must not outlive the worker's handling of
/// this one device.
pub fn process_device<F, I, R, K>(
    locker: &DeviceLocker<F, I>,
    rules: &R,
    sink: &K,
    mut device: Device,
    resolve_node: impl Fn(&Device) -> Option<String>,
) -> ProcessOutcome
where
    F: FlockSource,
    I: InotifySource,
    R: RuleEngine,
    K: EventSink,
{
    let node = if DeviceLocker::<F, I>::applies_to(&device) { resolve_node(&device) } else { None };

    if let Some(node) = &node {
        match locker.acquire(node) {
            Ok(LockOutcome::Acquired) => {}
            Ok(LockOutcome::Busy { watch }) => return ProcessOutcome::Busy { watch: Some(watch) },
            Err(e) => return ProcessOutcome::Fatal(e.to_string()),
        }
    }

    let outcome = match rules.apply(&mut device) {
        RuleOutcome::Applied => {
            let _ = sink.send(&device);
            ProcessOutcome::Applied
        }
        RuleOutcome::Busy => ProcessOutcome::Busy { watch: None },
        RuleOutcome::Fatal(msg) => ProcessOutcome::Fatal(msg),
    };

    if let Some(node) = &node {
        locker.release(node);
    }

    outcome
}

#[cfg(test)]
#[path = "worker_loop_tests.rs"]
mod tests;
