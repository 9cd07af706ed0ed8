//! The clock itself: reference anchor, drift/latency filters, and the
//! stream-time ↔ system-time conversion entry points.
//!
//! Every operation locks a single [`parking_lot::Mutex`] around the full
//! state for the duration of its critical section. There are no suspension
//! points inside a locked section and no condition variables — callers are
//! expected to invoke these methods from ordinary blocking threads, which is
//! why `Clock` does not pull in an async runtime.

use std::fmt;

use parking_lot::Mutex;

use crate::average::Average;
use crate::config::ClockConfig;
use crate::error::ClockError;
use crate::latency::{decoder_latency_sample, LatencyStats, PcrRing};
use crate::point::ClockPoint;
use crate::time::{
    Mtime, BUFFERING_RATE, BUFFERING_TARGET, CONTINUOUS_LATE_LIMIT, LATE_COUNT, LATE_THRESHOLD_US,
    MAX_GAP, MEAN_PTS_GAP, MIN_CR_AVERAGE, RATE_DEFAULT, TS_INVALID,
};

const _: () = assert!(LATE_COUNT == 3, "median-of-three below assumes exactly 3 samples");

/// The `(stream_start, system_start, stream_elapsed, system_elapsed)`
/// snapshot returned by [`Clock::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockPosition {
    /// Stream time of the current reference anchor.
    pub ref_stream: Mtime,
    /// System time of the current reference anchor.
    pub ref_system: Mtime,
    /// Stream time elapsed since the reference was established.
    pub stream_duration: Mtime,
    /// System time elapsed since the reference was established.
    pub system_duration: Mtime,
}

struct Inner {
    last: ClockPoint,
    reference: ClockPoint,
    has_reference: bool,
    ts_max: Mtime,
    buffering_duration: Mtime,
    next_drift_update: Mtime,
    drift: Average,
    late: [Mtime; LATE_COUNT],
    late_index: usize,
    continuous_late_count: u32,
    external_clock: Mtime,
    has_external_clock: bool,
    paused: bool,
    rate: i64,
    pts_delay: Mtime,
    pause_date: Mtime,
    pcr_ring: PcrRing,
    latency: LatencyStats,
}

impl Inner {
    fn stream_to_system(&self, stream: Mtime) -> Mtime {
        if !self.has_reference {
            return TS_INVALID;
        }
        (stream - self.reference.stream) * self.rate / RATE_DEFAULT + self.reference.system
    }

    fn system_to_stream(&self, system: Mtime) -> Mtime {
        debug_assert!(self.has_reference);
        (system - self.reference.system) * RATE_DEFAULT / self.rate + self.reference.stream
    }

    fn ts_offset(&self) -> Mtime {
        self.pts_delay * (self.rate - RATE_DEFAULT) / RATE_DEFAULT
    }

    fn do_reset(&mut self) {
        self.has_reference = false;
        self.reference = ClockPoint::INVALID;
        self.has_external_clock = false;
        self.ts_max = TS_INVALID;
    }

    fn diagnostic(&self, now: Mtime) -> String {
        format!(
            "ts_max={},drift(mean={},jitter={}),latency_max={},pts_delay={},ref=({},{}),last=({},{}),late_count={},now={}",
            self.ts_max,
            self.drift.get(),
            self.drift.max_offset(),
            self.latency.max(),
            self.pts_delay,
            self.reference.stream,
            self.reference.system,
            self.last.stream,
            self.last.system,
            self.continuous_late_count,
            now,
        )
    }
}

/// Maps timestamps carried by a source stream (PCR/PTS) to the local
/// wall-clock instant at which the corresponding frame should be presented.
///
/// See the crate root documentation for the concurrency model. `Clock` is
/// `Send + Sync` and cheap to share behind an `Arc` across decoder/output
/// threads.
pub struct Clock {
    inner: Mutex<Inner>,
}

impl Clock {
    /// Create a clock at the given playback rate (`RATE_DEFAULT` = real-time).
    #[must_use]
    pub fn new(rate: i64) -> Self {
        Self::with_config(ClockConfig {
            rate,
            ..ClockConfig::default()
        })
    }

    /// Create a clock from an explicit [`ClockConfig`].
    #[must_use]
    pub fn with_config(config: ClockConfig) -> Self {
        let cr_average = config.cr_average.max(MIN_CR_AVERAGE);
        Self {
            inner: Mutex::new(Inner {
                last: ClockPoint::INVALID,
                reference: ClockPoint::INVALID,
                has_reference: false,
                ts_max: TS_INVALID,
                buffering_duration: 0,
                next_drift_update: TS_INVALID,
                drift: Average::new(cr_average),
                late: [0; LATE_COUNT],
                late_index: 0,
                continuous_late_count: 0,
                external_clock: TS_INVALID,
                has_external_clock: false,
                paused: false,
                rate: config.rate,
                pts_delay: config.pts_delay,
                pause_date: TS_INVALID,
                pcr_ring: PcrRing::new(),
                latency: LatencyStats::new(),
            }),
        }
    }

    /// Feed a fresh `(stream, system)` observation.
    ///
    /// Re-anchors the reference point on the first call and on any
    /// discontinuity larger than `MAX_GAP`. Updates the drift estimate when
    /// `can_pace_control` is false (we don't control the source's pace, so
    /// comparing the stream clock against the system clock is meaningful).
    /// Returns the "late" flag, which this implementation always reports as
    /// `false` — lateness is tracked inside [`Clock::convert_ts`] instead, via
    /// the continuous-late self-check.
    ///
    /// Drift sampling is *not* rate-limited: `next_drift_update` is set to
    /// the current sample's system time on every call rather than some
    /// interval in the future, matching the shipped behavior this crate is
    /// grounded on (an earlier throttle was dead code there).
    pub fn update(&self, stream: Mtime, system: Mtime, can_pace_control: bool, buffering_allowed: bool) -> bool {
        debug_assert!(stream > TS_INVALID && system > TS_INVALID);
        let mut inner = self.inner.lock();

        let mut reset_reference = false;

        if !inner.has_reference {
            reset_reference = true;
        } else if inner.last.stream > TS_INVALID {
            let gap = inner.last.stream - stream;
            if gap > MAX_GAP || gap < -MAX_GAP {
                tracing::warn!(
                    last_stream = inner.last.stream,
                    stream,
                    gap,
                    "clock gap, unexpected stream discontinuity; re-anchoring reference"
                );
                inner.ts_max = TS_INVALID;
                reset_reference = true;
            }
        }

        if reset_reference {
            inner.next_drift_update = TS_INVALID;
            inner.drift.reset();
            inner.latency = LatencyStats::new();
            inner.has_reference = true;
            inner.reference = ClockPoint::new(stream, (inner.ts_max + MEAN_PTS_GAP).max(system));
            inner.has_external_clock = false;
        }

        if !can_pace_control && inner.next_drift_update < system {
            let converted = inner.system_to_stream(system);
            let sample = converted - stream;
            inner.drift.update(sample);
            inner.next_drift_update = system;
        }

        if !can_pace_control || reset_reference {
            inner.buffering_duration = 0;
        } else if buffering_allowed {
            let duration = (stream - inner.last.stream).max(0);
            inner.buffering_duration += (duration * BUFFERING_RATE + 255) / 256;
            inner.buffering_duration = inner.buffering_duration.min(BUFFERING_TARGET);
        }

        inner.last = ClockPoint::new(stream, system);
        inner.pcr_ring.push(inner.last);

        false
    }

    /// Convert `*ts0` (and, if present, `*ts1`) from stream time to system
    /// time, applying drift correction, network-jitter and decoder-latency
    /// compensation, and the rate-change presentation offset.
    ///
    /// `now` stands in for the abstract monotonic local clock the engine is
    /// specified against; callers supply it rather than the clock reaching
    /// out to a global time source, which keeps every numeric property in
    /// this crate's tests reproducible.
    ///
    /// Returns the current playback rate on success. `ts_max` is updated
    /// from `*ts0` but deliberately not from `*ts1` (a lookahead timestamp
    /// used for read-ahead decisions, not for the late-detection bookkeeping).
    pub fn convert_ts(
        &self,
        now: Mtime,
        ts0: &mut Mtime,
        mut ts1: Option<&mut Mtime>,
        bound: Mtime,
        is_video: bool,
    ) -> Result<i64, ClockError> {
        let (rate, ts_delay, ts_buffering) = {
            let mut inner = self.inner.lock();
            let rate = inner.rate;

            if !inner.has_reference {
                tracing::error!(ts0 = *ts0, "timestamp conversion failed: no reference clock");
                *ts0 = TS_INVALID;
                if let Some(ts1) = ts1.as_deref_mut() {
                    *ts1 = TS_INVALID;
                }
                return Err(ClockError::NoReference);
            }

            if is_video {
                let sample = decoder_latency_sample(&inner.pcr_ring, *ts0, now);
                inner.latency.update(sample);
            }

            let ts_buffering = inner.buffering_duration * inner.rate / RATE_DEFAULT;
            let ts_delay = inner.ts_offset() + inner.drift.max_offset() + inner.latency.max();

            if *ts0 > TS_INVALID {
                *ts0 = inner.stream_to_system(*ts0 + inner.drift.get());
                inner.ts_max = inner.ts_max.max(*ts0);
                *ts0 += ts_delay;
            }

            if let Some(ts1) = ts1.as_deref_mut() {
                if *ts1 > TS_INVALID {
                    *ts1 = inner.stream_to_system(*ts1 + inner.drift.get()) + ts_delay;
                }
            }

            if now - *ts0 >= LATE_THRESHOLD_US {
                inner.continuous_late_count += 1;
                if inner.continuous_late_count > CONTINUOUS_LATE_LIMIT {
                    tracing::error!(
                        diagnostic = %inner.diagnostic(now),
                        "conversion continuously late; resetting clock reference"
                    );
                    inner.do_reset();
                    inner.continuous_late_count = 0;
                }
            } else {
                inner.continuous_late_count = 0;
            }

            (rate, ts_delay, ts_buffering)
        };

        if bound != Mtime::MAX && *ts0 > TS_INVALID && *ts0 >= now + ts_delay + ts_buffering + bound {
            tracing::error!(
                delay = ts_delay,
                buffering = ts_buffering,
                bound,
                "timestamp conversion failed: result exceeds caller bound"
            );
            return Err(ClockError::OutOfBounds {
                delay: ts_delay,
                buffering: ts_buffering,
                bound,
            });
        }

        Ok(rate)
    }

    /// Clear the reference and external-clock flag, and reset `ts_max`.
    /// Filter state (drift, latency, buffering) is left untouched.
    pub fn reset(&self) {
        self.inner.lock().do_reset();
    }

    /// Change the playback rate, preserving the system instant at which
    /// `last.stream` was expected to play.
    pub fn change_rate(&self, new_rate: i64) {
        let mut inner = self.inner.lock();
        if inner.has_reference {
            inner.reference.system =
                inner.last.system - (inner.last.system - inner.reference.system) * new_rate / inner.rate;
        }
        inner.rate = new_rate;
    }

    /// Transition into or out of pause. `paused` must differ from the
    /// current pause state (checked with `debug_assert!`; a repeated call
    /// with the same state is a caller bug).
    pub fn change_pause(&self, paused: bool, date: Mtime) {
        let mut inner = self.inner.lock();
        debug_assert_ne!(inner.paused, paused, "change_pause called with no actual state change");

        if inner.paused {
            let duration = date - inner.pause_date;
            if inner.has_reference && duration > 0 {
                inner.reference.system += duration;
                inner.last.system += duration;
            }
        }
        inner.pause_date = date;
        inner.paused = paused;
    }

    /// The system instant at which the caller should next wake up to feed
    /// the clock, accounting for drift and outstanding buffering slack.
    /// Returns 0 if the clock has no reference yet.
    #[must_use]
    pub fn get_wakeup(&self) -> Mtime {
        let inner = self.inner.lock();
        if inner.has_reference {
            inner.stream_to_system(inner.last.stream + inner.drift.get() - inner.buffering_duration)
        } else {
            0
        }
    }

    /// Snapshot of the reference anchor and how far playback has progressed
    /// since it was established.
    pub fn state(&self) -> Result<ClockPosition, ClockError> {
        let inner = self.inner.lock();
        if !inner.has_reference {
            return Err(ClockError::NoReference);
        }
        Ok(ClockPosition {
            ref_stream: inner.reference.stream,
            ref_system: inner.reference.system,
            stream_duration: inner.last.stream - inner.reference.stream,
            system_duration: inner.last.system - inner.reference.system,
        })
    }

    /// Defer drift sampling to start ~33ms after `system`. Requires a
    /// reference to already exist (`debug_assert!`).
    pub fn change_drift_start_point(&self, system: Mtime) {
        let mut inner = self.inner.lock();
        debug_assert!(inner.has_reference);
        inner.next_drift_update = system + 33_000;
    }

    /// Shift the reference's system origin. If `absolute`, `system` becomes
    /// the new origin outright (after backing out the current rate offset);
    /// otherwise `system` is treated as a sample of an external clock and
    /// only the *change* since the first such sample is applied. Requires a
    /// reference to already exist (`debug_assert!`).
    pub fn change_system_origin(&self, absolute: bool, system: Mtime) {
        let mut inner = self.inner.lock();
        debug_assert!(inner.has_reference);

        let offset = if absolute {
            system - inner.reference.system - inner.ts_offset()
        } else {
            if !inner.has_external_clock {
                inner.has_external_clock = true;
                inner.external_clock = system;
            }
            system - inner.external_clock
        };

        inner.reference.system += offset;
        inner.last.system += offset;
    }

    /// The reference's system origin, and optionally the current presentation delay.
    pub fn get_system_origin(&self) -> (Mtime, Mtime) {
        let inner = self.inner.lock();
        debug_assert!(inner.has_reference);
        (inner.reference.system, inner.pts_delay)
    }

    /// Raise the presentation delay (never lowers it) and, if it changed,
    /// rescale the drift estimator's legacy divider. Shifts the recent
    /// lateness samples by the delay delta so they stay comparable to the
    /// new delay, dropping any that would go negative.
    pub fn set_jitter(&self, new_pts_delay: Mtime, cr_average: i64) {
        let mut inner = self.inner.lock();

        let delta = new_pts_delay - inner.pts_delay;
        let mut shifted: [Mtime; LATE_COUNT] = [0; LATE_COUNT];
        for (i, slot) in shifted.iter_mut().enumerate() {
            let idx = (inner.late_index + 1 + i) % LATE_COUNT;
            *slot = (inner.late[idx] - delta).max(0);
        }

        inner.late = [0; LATE_COUNT];
        inner.late_index = 0;
        for value in shifted {
            if value <= 0 {
                continue;
            }
            inner.late[inner.late_index] = value;
            inner.late_index = (inner.late_index + 1) % LATE_COUNT;
        }

        if inner.pts_delay < new_pts_delay {
            inner.pts_delay = new_pts_delay;
        }

        let cr_average = cr_average.max(MIN_CR_AVERAGE);
        if inner.drift.divider() != cr_average {
            inner.drift.rescale(cr_average);
        }
    }

    /// The current jitter-calibrated presentation delay: `pts_delay` plus
    /// the median of the last three recorded positive-lateness samples.
    #[must_use]
    pub fn get_jitter(&self) -> Mtime {
        let inner = self.inner.lock();
        let p = inner.late;
        let median = p[0] + p[1] + p[2] - p[0].min(p[1]).min(p[2]) - p[0].max(p[1]).max(p[2]);
        inner.pts_delay + median
    }

    /// The current playback rate.
    #[must_use]
    pub fn get_rate(&self) -> i64 {
        self.inner.lock().rate
    }

    /// A single-line diagnostic string of the clock's internal state, for
    /// logging. Not a compatibility surface — its layout may change.
    #[must_use]
    pub fn diagnostic(&self, now: Mtime) -> String {
        self.inner.lock().diagnostic(now)
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Clock")
            .field("has_reference", &inner.has_reference)
            .field("rate", &inner.rate)
            .field("ts_max", &inner.ts_max)
            .field("paused", &inner.paused)
            .field("pts_delay", &inner.pts_delay)
            .field("continuous_late_count", &inner.continuous_late_count)
            .finish_non_exhaustive()
    }
}
