//! First-reference and rate-change behavior of `Clock`.

use streamclock::Clock;

#[test]
fn initial_update_anchors_reference_and_converts_with_full_penalties() {
    let clock = Clock::new(1000);
    clock.update(1_000_000, 5_000_000, false, false);

    let mut ts0 = 1_000_000;
    let rate = clock
        .convert_ts(5_000_000, &mut ts0, None, i64::MAX, false)
        .expect("reference was just established");

    assert_eq!(rate, 1000);
    // No drift/jitter samples yet: maxOffset = 0, decoder latency is still
    // the 1_000_000us sentinel, TsOffset is 0 (pts_delay starts at 0).
    assert_eq!(ts0, 5_000_000 + 1_000_000);
}

#[test]
fn rate_change_with_ref_equal_last_leaves_reference_system_unchanged() {
    let clock = Clock::new(1000);
    clock.update(1_000_000, 5_000_000, false, false);

    clock.change_rate(2000);

    let mut ts0 = 1_000_000;
    let rate = clock
        .convert_ts(5_000_000, &mut ts0, None, i64::MAX, false)
        .unwrap();

    assert_eq!(rate, 2000);
    // ref.system == last.system before the change, so ChangeRate leaves it
    // in place; converting the same stream instant gives the same result.
    assert_eq!(ts0, 5_000_000 + 1_000_000);
}

#[test]
fn get_rate_reports_current_rate() {
    let clock = Clock::new(1000);
    assert_eq!(clock.get_rate(), 1000);
    clock.change_rate(1500);
    assert_eq!(clock.get_rate(), 1500);
}
