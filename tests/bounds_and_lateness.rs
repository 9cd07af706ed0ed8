//! `OutOfBounds` rejection and the continuous-late self-healing reset.

use streamclock::Clock;

#[test]
fn zero_bound_always_rejects_a_future_timestamp() {
    let clock = Clock::new(1000);
    clock.update(1_000_000, 5_000_000, false, false);

    let mut ts0 = 1_000_000;
    let err = clock
        .convert_ts(5_000_000, &mut ts0, None, 0, false)
        .unwrap_err();

    match err {
        streamclock::ClockError::OutOfBounds { bound, .. } => assert_eq!(bound, 0),
        other => panic!("expected OutOfBounds, got {other:?}"),
    }
}

#[test]
fn no_reference_is_rejected_before_any_update() {
    let clock = Clock::new(1000);
    let mut ts0 = 1_000_000;
    let err = clock
        .convert_ts(0, &mut ts0, None, i64::MAX, false)
        .unwrap_err();
    assert_eq!(err, streamclock::ClockError::NoReference);
    assert_eq!(ts0, streamclock::TS_INVALID);
}

#[test]
fn continuous_lateness_resets_the_clock_after_the_limit() {
    let clock = Clock::new(1000);
    clock.update(0, 0, false, false);

    // With no drift/jitter samples and is_video=false, every conversion of
    // stream=0 yields the same ts0 (the INIT_DECODER_LATENCY sentinel).
    // Calling with a fixed `now` well past that keeps every call "late"
    // (now - ts0 >= 16_000us) without ever falling back in bounds.
    let mut last_err = None;
    for _ in 0..135u32 {
        let mut ts0 = 0;
        last_err = clock
            .convert_ts(1_100_000, &mut ts0, None, i64::MAX, false)
            .err();
        if last_err.is_some() {
            break;
        }
    }

    assert_eq!(last_err, Some(streamclock::ClockError::NoReference));
}
