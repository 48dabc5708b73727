// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level black-box specs: every scenario here drives the
//! *compiled* `devmand`/`devmandctl` binaries through a throwaway state
//! directory via `assert_cmd`, rather than calling into the crates
//! directly.
//!
//! Scheduler dispatch scenarios (dependency serialization, ancestor
//! blocking, cross-subsystem devnum collisions, event timeouts,
//! reload-with-a-running-worker) are exercised exhaustively and
//! deterministically at the `devmand-scheduler` crate's own unit-test layer
//! instead (`manager_tests.rs`, `queue_tests.rs`, `pool_tests.rs`,
//! `locker_tests.rs`, `worker_loop_tests.rs`) - those need no real kernel
//! netlink socket or block device, so a fake clock and in-memory
//! `EventSource`/`EventSink` doubles let them run anywhere. What this
//! black-box layer covers instead is the operator-facing surface nothing
//! else touches: process startup/shutdown, the control-socket wire
//! protocol end to end, and `devmandctl`'s subcommands against a real
//! running daemon.

mod prelude;

mod cli;
mod daemon;
