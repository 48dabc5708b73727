// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! devmand-scheduler: the pure, deterministic core of the device event
//! manager.
//!
//! Everything here is synchronous and testable without a kernel, a
//! subprocess, or a filesystem - every OS-facing capability (locking,
//! inotify, process spawn/signal, publish) is a narrow trait in [`ports`],
//! implemented for real in `devmand-adapters` and `devmand-daemon`.

pub mod error;
pub mod event;
pub mod inotify_watcher;
pub mod locker;
pub mod manager;
pub mod ports;
pub mod pool;
pub mod queue;
pub mod worker;
pub mod worker_loop;

pub use error::LockError;
pub use event::{Event, EventState};
pub use inotify_watcher::InotifyWatcher;
pub use locker::{DeviceLocker, LockOutcome};
pub use manager::{Manager, ManagerEvent, IDLE_SWEEP_PERIOD};
pub use pool::{SpawnRefusal, TimerEvent, WorkerPool};
pub use queue::{CleanupMatch, EventQueue, QueueError};
pub use worker::{Pid, Worker};
pub use worker_loop::{process_device, ProcessOutcome};
