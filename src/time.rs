//! Time representation shared across the clock.
//!
//! All timestamps are signed microseconds in one of two clock domains:
//! stream time (PCR/PTS as carried by the source) and system time (the
//! local monotonic wall clock). [`Mtime`] makes no distinction between the
//! two at the type level — the domain is tracked by which field of
//! [`crate::point::ClockPoint`] a value lives in and by which conversion
//! function produced it.

/// Signed microsecond timestamp, in either stream or system clock domain.
pub type Mtime = i64;

/// Sentinel meaning "no value". Compares less than any real timestamp.
pub const TS_INVALID: Mtime = i64::MIN / 2;

/// Rate scaling factor: `rate == RATE_DEFAULT` means real-time (1.0x) playback.
pub const RATE_DEFAULT: i64 = 1000;

/// Maximum allowed gap between consecutive stream timestamps before the
/// clock treats the input as discontinuous and re-anchors its reference.
pub const MAX_GAP: Mtime = 60 * 1_000_000;

/// Presentation-time gap assumed across a reset (e.g. a DVD chapter change
/// where the new chapter's PCR starts near zero).
pub const MEAN_PTS_GAP: Mtime = 300_000;

/// Rate, in 1/256ths, at which accumulated buffering is allowed to grow
/// per microsecond of stream time consumed while pacing is under our control.
pub const BUFFERING_RATE: i64 = 48;

/// Upper bound on accumulated buffering duration (µs).
pub const BUFFERING_TARGET: Mtime = 100_000;

/// Initial / sentinel value for the decoder latency estimate (µs).
pub const INIT_DECODER_LATENCY: Mtime = 1_000_000;

/// Number of recent positive-lateness samples retained for jitter calibration.
pub const LATE_COUNT: usize = 3;

/// Capacity of the recent-PCR ring used to resolve decoder-arrival time.
pub const PCR_RING_SIZE: usize = 100;

/// Window size, in samples, over which the drift estimator recomputes its
/// windowed mean/variance from scratch.
pub const STATICS_CIRCLE: i64 = 300;

/// Window size, in samples, over which the decoder-latency estimator
/// recomputes its windowed mean from scratch.
pub const LATENCY_CIRCLE: i64 = 180;

/// Bias added to each decoder-latency sample so the result is never zero or
/// negative when the local time source only has millisecond granularity.
/// Callers with a microsecond-accurate `now()` will see a constant 500µs
/// overestimate; see `DESIGN.md` at the repository root for the rationale.
pub const DECODER_LATENCY_BIAS_US: Mtime = 500;

/// Number of consecutive "presented too late" `ConvertTS` calls tolerated
/// before the clock gives up on its current reference and resets itself.
pub const CONTINUOUS_LATE_LIMIT: u32 = 132;

/// Threshold (µs) past which a converted timestamp counts as "late" for the
/// continuous-late self-check.
pub const LATE_THRESHOLD_US: Mtime = 16_000;

/// Minimum legacy-average divider accepted by [`crate::average::Average::rescale`].
pub const MIN_CR_AVERAGE: i64 = 10;
