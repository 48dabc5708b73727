// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Operator request sent over the control socket.
///
/// Unknown/newer variants deserialize into [`Request::Unknown`] rather than
/// failing, matching a forward-compatible "unknown message types are
/// logged and ignored" contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Version/handshake probe.
    Hello,

    /// `PING` - no-op, runs at idle priority.
    Ping,

    /// `SET_LOG_LEVEL(int)`.
    SetLogLevel { level: i32 },

    /// `STOP_EXEC_QUEUE`.
    StopExecQueue,

    /// `START_EXEC_QUEUE`.
    StartExecQueue,

    /// `RELOAD`.
    Reload,

    /// `SET_ENV("k=v"` or `"k="` ``)``. Carried as the raw entry so the
    /// daemon performs the same malformed-input validation the kernel-side
    /// protocol does (no `=` is rejected at the daemon, not the wire layer).
    SetEnv { entry: String },

    /// `SET_CHILDREN_MAX(int)`.
    SetChildrenMax { value: i32 },

    /// `EXIT` - begin drain and shut down.
    Exit,

    /// Operator ergonomics beyond the base control protocol.
    Status,

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
