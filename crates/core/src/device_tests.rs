// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeMap;

fn device(devname: &str) -> Device {
    Device {
        seqnum: 1,
        devpath: "/devices/x".into(),
        subsystem: "block".into(),
        devname: Some(devname.into()),
        devnum: None,
        ifindex: None,
        devpath_old: None,
        action: Action::Add,
        properties: BTreeMap::new(),
    }
}

#[test]
fn action_display_matches_kernel_spelling() {
    assert_eq!(Action::Add.to_string(), "add");
    assert_eq!(Action::Unbind.to_string(), "unbind");
}

#[test]
fn loop_and_dm_devices_are_synthetic() {
    assert!(device("/dev/loop0").is_synthetic_block_kind());
    assert!(device("/dev/dm-3").is_synthetic_block_kind());
    assert!(device("/dev/md0").is_synthetic_block_kind());
    assert!(!device("/dev/sda").is_synthetic_block_kind());
}

#[test]
fn non_block_subsystem_is_not_block() {
    let mut d = device("/dev/sda");
    d.subsystem = "tty".into();
    assert!(!d.is_block());
}
