// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The kernel device record, opaque to everything except the scheduler's
//! dependency predicate and locking logic.

use serde::{Deserialize, Serialize};

/// Kernel uevent action, as reported on the netlink socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Remove,
    Change,
    Move,
    Online,
    Offline,
    Bind,
    Unbind,
}

crate::simple_display! {
    Action {
        Add => "add",
        Remove => "remove",
        Change => "change",
        Move => "move",
        Online => "online",
        Offline => "offline",
        Bind => "bind",
        Unbind => "unbind",
    }
}

/// Major/minor device number, as exposed by `devnum` in the kernel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DevNum {
    pub major: u32,
    pub minor: u32,
}

impl DevNum {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// A single device record as consumed from `EventSource`.
///
/// Field-level contracts are intentionally narrow: the scheduler never
/// interprets `devpath`/`subsystem` beyond what the dependency predicate and
/// device-locking rules in the scheduler crate require. Everything else
/// (property maps, rule evaluation results) belongs to the rule-engine
/// boundary, out of scope here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub seqnum: u64,
    pub devpath: String,
    pub subsystem: String,
    pub devname: Option<String>,
    pub devnum: Option<DevNum>,
    pub ifindex: Option<i32>,
    pub devpath_old: Option<String>,
    pub action: Action,
    /// Operator/rule property overrides merged onto this device. Not
    /// inspected by the scheduler; carried verbatim for the rule engine and
    /// for enrichment round-tripping.
    #[serde(default)]
    pub properties: std::collections::BTreeMap<String, String>,
}

impl Device {
    /// True when this device names a whole disk or partition under the
    /// `block` subsystem.
    pub fn is_block(&self) -> bool {
        self.subsystem == "block"
    }

    /// Kinds excluded from advisory locking and read-only enforcement per
    /// the device-locking rules: device-mapper, MD RAID, DRBD, loopback,
    /// NBD, and zram nodes never get a real backing disk to lock.
    pub fn is_synthetic_block_kind(&self) -> bool {
        let Some(name) = self.devname.as_deref().and_then(|p| p.rsplit('/').next()) else {
            return false;
        };
        name.starts_with("dm-")
            || name.starts_with("md")
            || name.starts_with("drbd")
            || name.starts_with("loop")
            || name.starts_with("nbd")
            || name.starts_with("zram")
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
