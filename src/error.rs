//! Error types returned by [`crate::Clock`] operations.

use crate::time::Mtime;

/// Errors surfaced by [`crate::Clock::convert_ts`].
///
/// Preconditions violated by the caller (pausing a clock that's already
/// paused, shifting the origin of an unreferenced clock, and so on) are
/// programmer errors, not members of this enum: they are checked with
/// `debug_assert!` so a debug build fails fast while a release build keeps
/// the original contract that misuse is undefined behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// `convert_ts` or `state` was called before any successful `update`.
    #[error("timestamp conversion failed: no reference clock")]
    NoReference,

    /// The conversion succeeded numerically, but the result exceeds the
    /// caller-supplied bound. The caller-visible output timestamp still
    /// holds the computed value — this is informational, not a rollback.
    #[error(
        "timestamp conversion out of bounds (delay {delay}, buffering {buffering}, bound {bound})"
    )]
    OutOfBounds {
        /// Total presentation delay (`TsOffset + network jitter + decoder latency`) applied.
        delay: Mtime,
        /// Accumulated buffering duration, converted to system-clock units.
        buffering: Mtime,
        /// The caller-supplied bound that was exceeded.
        bound: Mtime,
    },
}
