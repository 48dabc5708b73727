// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crate-level error taxonomy. [`QueueError`] lives
//! alongside [`crate::queue::EventQueue`] since it only ever surfaces from
//! `enqueue`; `LockError` is the advisory-lock/ioctl failure type real
//! `FlockSource`/`PartitionProbe` implementations in `devmand-adapters`
//! raise and that `DeviceLocker`'s caller maps onto the transient-vs-fatal
//! split.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("advisory lock on {node} failed: {source}")]
    Flock {
        node: String,
        #[source]
        source: std::io::Error,
    },
    #[error("inotify watch on {node} failed: {source}")]
    Watch {
        node: String,
        #[source]
        source: std::io::Error,
    },
    #[error("partition-table reread on {node} failed: {source}")]
    PartitionReread {
        node: String,
        #[source]
        source: std::io::Error,
    },
}
