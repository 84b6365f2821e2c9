// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_advances_on_its_own() {
    let clock = SystemClock;
    let first = clock.now();
    std::thread::sleep(Duration::from_millis(1));
    assert!(clock.now() >= first);
}

#[test]
fn fake_clock_only_advances_when_told() {
    let clock = FakeClock::new();
    let first = clock.now();
    assert_eq!(clock.now(), first);
    clock.advance(Duration::from_secs(5));
    assert!(clock.now() > first);
}

#[test]
fn fake_clock_set_is_absolute() {
    let clock = FakeClock::new();
    let target = clock.now() + Duration::from_secs(60);
    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn fake_clock_is_cheaply_cloneable_and_shares_state() {
    let clock = FakeClock::new();
    let handle = clock.clone();
    handle.advance(Duration::from_secs(1));
    assert_eq!(clock.now(), handle.now());
}
