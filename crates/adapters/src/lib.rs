// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! devmand-adapters: concrete, OS-facing implementations of the narrow
//! trait boundaries `devmand-scheduler` defines in its `ports` module -
//! netlink uevent consumption, multicast publish, the rule-engine
//! capability, advisory locking, inotify, partition-table operations, and
//! worker process spawn/signal/IPC.
//!
//! Kept separate from `devmand-daemon` so every adapter stays swappable in
//! tests behind the scheduler's traits.

pub mod flock;
pub mod inotify_source;
pub mod netlink;
pub mod partition;
pub mod publish;
pub mod rules;
pub mod spawn;
