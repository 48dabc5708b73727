// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The monotonic sequence number that identifies an event within the queue.

use serde::{Deserialize, Serialize};

/// Strictly increasing per-source identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seqnum(pub u64);

impl std::fmt::Display for Seqnum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Seqnum {
    fn from(v: u64) -> Self {
        Seqnum(v)
    }
}
