// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `devmand` entry point. Kernel-command-line and CLI-flag parsing are out
//! of scope - the only flag this binary recognizes itself is `--worker`,
//! which `devmand-adapters::spawn::ChildProcessSpawner` passes when it
//! re-execs this same binary to stand up a worker process. Anything else
//! runs the Supervisor.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod control;
mod env;
mod lifecycle;
mod logging;
mod queue_marker;
mod supervisor;
mod worker_main;

fn main() {
    if std::env::args().any(|arg| arg == "--worker") {
        worker_main::run();
        return;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("devmand: failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    std::process::exit(runtime.block_on(supervisor::run()));
}
