// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Daemon reply to a [`crate::Request`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic acknowledgement for state-mutating requests.
    Ack,

    /// `PING` reply.
    Pong,

    /// `Hello` reply: protocol/daemon version.
    Hello { version: String },

    /// Operator status snapshot (supplemental `Status` request).
    Status {
        workers: usize,
        children_max: u32,
        queued_events: usize,
        stop_exec_queue: bool,
        uptime_secs: u64,
    },

    /// Request was malformed or rejected (§7 "source-level" errors).
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
