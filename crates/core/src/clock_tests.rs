// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::new();
    let t0 = clock.now();
    clock.advance(Duration::from_secs(5));
    assert!(clock.now() > t0);
    assert_eq!(clock.now() - t0, Duration::from_secs(5));
}

#[test]
fn fake_clock_epoch_tracks_advance() {
    let clock = FakeClock::new();
    let e0 = clock.epoch_ms();
    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.epoch_ms(), e0 + 250);
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // Anything after 2020-01-01 in epoch millis.
    assert!(clock.epoch_ms() > 1_577_836_800_000);
}
