// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::WorkerId;

#[test]
fn new_ids_carry_the_prefix() {
    let id = WorkerId::new();
    assert!(id.as_str().starts_with(WorkerId::PREFIX));
    assert_eq!(id.as_str().len(), 23);
}

#[test]
fn from_string_round_trips() {
    let id = WorkerId::new();
    let parsed = WorkerId::from_string(id.as_str());
    assert_eq!(id, parsed);
}

#[test]
fn suffix_strips_prefix() {
    let id = WorkerId::from_string("wkr-abcdefghijklmnopqrs");
    assert_eq!(id.suffix(), "abcdefghijklmnopqrs");
}

#[test]
fn distinct_ids_are_not_equal() {
    assert_ne!(WorkerId::new(), WorkerId::new());
}
