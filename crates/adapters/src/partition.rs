// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-disk partition-table operations for the retrigger logic.
//!
//! `BLKRRPART`/`BLKROSET` are plain ioctls with no safe wrapper in any
//! crate this workspace reaches for, and `unsafe_code` is forbidden
//! outright - so both shell out to `blockdev(8)` (util-linux) rather than
//! calling the ioctl directly. `blockdev` issues the exact same ioctl; the
//! only cost is a fork/exec per call, which is negligible next to the
//! already-forked worker process making the call.

use devmand_scheduler::ports::PartitionProbe;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::Command;

#[derive(Default, Clone, Copy)]
pub struct SysfsPartitionProbe;

impl SysfsPartitionProbe {
    pub fn new() -> Self {
        Self
    }

    /// `/dev/sda` -> `sda`, the sysfs directory name under `/sys/block`.
    fn disk_name(disk_node: &str) -> Option<&str> {
        disk_node.rsplit('/').next()
    }
}

impl PartitionProbe for SysfsPartitionProbe {
    fn try_reread_partition_table(&self, disk_node: &str) -> Result<bool, io::Error> {
        let file = OpenOptions::new().read(true).open(disk_node)?;
        if file.try_lock_exclusive().is_err() {
            return Ok(false);
        }
        let status = Command::new("blockdev").arg("--rereadpt").arg(disk_node).status();
        let _ = FileExt::unlock(&file);
        match status {
            Ok(s) if s.success() => Ok(true),
            Ok(_) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn partitions_of(&self, disk_node: &str) -> Vec<String> {
        let Some(name) = Self::disk_name(disk_node) else {
            return Vec::new();
        };
        let sysfs_dir = Path::new("/sys/block").join(name);
        let Ok(entries) = std::fs::read_dir(&sysfs_dir) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let Ok(file_name) = entry.file_name().into_string() else { continue };
            if file_name.starts_with(name) && entry.path().join("partition").exists() {
                out.push(format!("/dev/{file_name}"));
            }
        }
        out.sort();
        out
    }
}

/// Writes `change` to a device node's sysfs `uevent` attribute, causing the
/// kernel to re-emit a fresh uevent through the normal netlink path - the
/// same mechanism `udevadm trigger` uses. Used both for the lock-release
/// retrigger (a worker releasing a contended node) and the whole-disk
/// re-trigger (a watched disk's partition table changed). Avoids minting a
/// synthetic seqnum the event queue's single monotonic counter would have to
/// reconcile against real kernel seqnums.
pub fn trigger_change(node: &str) -> io::Result<()> {
    let name = node
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty device node path"))?;
    let real = std::fs::canonicalize(Path::new("/sys/class/block").join(name))?;
    std::fs::write(real.join("uevent"), b"change")
}

/// `DEVMAND_BLOCKDEV_READ_ONLY` enforcement: set or clear the kernel
/// read-only flag on a whole-disk node via `blockdev --setro`/`--setrw`,
/// the `BLKROSET` equivalent.
pub fn set_read_only(disk_node: &str, read_only: bool) -> io::Result<()> {
    let flag = if read_only { "--setro" } else { "--setrw" };
    let status = Command::new("blockdev").arg(flag).arg(disk_node).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("blockdev {flag} {disk_node} exited with {status}")))
    }
}

/// Dereference a partition node to its parent whole-disk node, via the
/// `/sys/class/block/<name>` -> `/sys/block/<disk>/<name>` symlink every
/// partition carries. Non-partition nodes (no `partition` sysfs attribute)
/// resolve to themselves.
pub fn whole_disk_node(partition_node: &str) -> Option<String> {
    let name = partition_node.rsplit('/').next()?;
    whole_disk_name_under(Path::new("/sys/class/block"), name)
        .map(|disk| format!("/dev/{disk}"))
        .or_else(|| Some(partition_node.to_string()))
}

/// Testable core of [`whole_disk_node`]: `None` if `name` isn't a
/// partition at all under `class_root` (caller falls back to treating the
/// node as already whole-disk).
fn whole_disk_name_under(class_root: &Path, name: &str) -> Option<String> {
    let class_path = class_root.join(name);
    if !class_path.join("partition").exists() {
        return None;
    }
    let real = std::fs::canonicalize(&class_path).ok()?;
    let disk_name = real.parent()?.file_name()?.to_str()?.to_string();
    Some(disk_name)
}
