// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! devmand-core: shared domain types for the device event manager.

pub mod macros;

pub mod clock;
pub mod device;
pub mod id;
pub mod seqnum;
pub mod worker;

pub use clock::{Clock, FakeClock, SystemClock};
pub use device::{Action, DevNum, Device};
pub use id::short;
pub use seqnum::Seqnum;
pub use worker::{WorkerId, WorkerState};
