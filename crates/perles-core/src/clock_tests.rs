// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_both_views() {
    let clock = FakeClock::new();
    let start = clock.now();
    let start_wall = clock.utc_now();

    clock.advance(Duration::from_secs(30));

    assert_eq!(clock.now() - start, Duration::from_secs(30));
    assert_eq!(clock.utc_now() - start_wall, chrono::Duration::seconds(30));
}

#[test]
fn system_clock_is_monotonic_nondecreasing() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
