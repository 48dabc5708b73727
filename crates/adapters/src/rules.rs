// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal built-in `RuleEngine`.
//!
//! The rule *language* itself is out of scope here - only the capability
//! boundary (`apply`/`validate`) and the freshness-polling contract the
//! Supervisor drives periodically belong to this crate. What's here is
//! the smallest engine that satisfies that boundary: it stamps a handful
//! of builtin properties derived directly from the kernel record (no rule
//! files parsed), and treats "freshness" as "nothing under `rules_dir` has
//! a newer mtime than the last load" so the reload-on-change contract is
//! still real and testable even with no rule language behind it.

use devmand_core::Device;
use devmand_scheduler::ports::{RuleEngine, RuleOutcome};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::SystemTime;

pub struct BuiltinRuleEngine {
    rules_dir: PathBuf,
    loaded_at: Mutex<SystemTime>,
}

impl BuiltinRuleEngine {
    pub fn new(rules_dir: PathBuf) -> Self {
        let loaded_at = newest_mtime(&rules_dir).unwrap_or(SystemTime::UNIX_EPOCH);
        Self { rules_dir, loaded_at: Mutex::new(loaded_at) }
    }

    /// Builtin enrichment for block devices: a stable `DEVLINKS`-style
    /// property naming the node by major/minor, the one piece of
    /// enrichment every real rules.d ships regardless of site-local rules.
    fn enrich(device: &mut Device) {
        if let Some(devnum) = device.devnum {
            device
                .properties
                .entry("DEVLINKS".to_string())
                .or_insert_with(|| format!("/dev/block/{}:{}", devnum.major, devnum.minor));
        }
    }
}

impl RuleEngine for BuiltinRuleEngine {
    fn apply(&self, device: &mut Device) -> RuleOutcome {
        if device.devpath.is_empty() {
            return RuleOutcome::Fatal("device record missing devpath".to_string());
        }
        Self::enrich(device);
        RuleOutcome::Applied
    }

    fn validate(&self) -> bool {
        let mut loaded_at = self.loaded_at.lock();
        match newest_mtime(&self.rules_dir) {
            Some(newest) if newest > *loaded_at => {
                *loaded_at = newest;
                false
            }
            Some(newest) => {
                *loaded_at = newest;
                true
            }
            None => true,
        }
    }
}

fn newest_mtime(dir: &std::path::Path) -> Option<SystemTime> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .filter_map(|entry| entry.metadata().ok()?.modified().ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmand_core::{Action, DevNum};
    use std::collections::BTreeMap;
    use std::io::Write;

    fn device() -> Device {
        Device {
            seqnum: 1,
            devpath: "/devices/pci0000:00/ata1/block/sda".to_string(),
            subsystem: "block".to_string(),
            devname: Some("/dev/sda".to_string()),
            devnum: Some(DevNum::new(8, 0)),
            ifindex: None,
            devpath_old: None,
            action: Action::Add,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn applies_builtin_enrichment_for_a_block_device() {
        let dir = tempfile::tempdir().unwrap();
        let engine = BuiltinRuleEngine::new(dir.path().to_path_buf());
        let mut device = device();
        assert_eq!(engine.apply(&mut device), RuleOutcome::Applied);
        assert_eq!(device.properties.get("DEVLINKS").map(String::as_str), Some("/dev/block/8:0"));
    }

    #[test]
    fn rejects_a_device_with_no_devpath() {
        let dir = tempfile::tempdir().unwrap();
        let engine = BuiltinRuleEngine::new(dir.path().to_path_buf());
        let mut device = device();
        device.devpath.clear();
        assert!(matches!(engine.apply(&mut device), RuleOutcome::Fatal(_)));
    }

    #[test]
    fn validate_is_true_until_a_rule_file_is_touched_after_load() {
        let dir = tempfile::tempdir().unwrap();
        let engine = BuiltinRuleEngine::new(dir.path().to_path_buf());
        assert!(engine.validate());

        let mut file = std::fs::File::create(dir.path().join("10-local.rules")).unwrap();
        file.write_all(b"# placeholder").unwrap();
        drop(file);

        assert!(!engine.validate());
        // second call observes the now-recorded mtime as current
        assert!(engine.validate());
    }
}
