//! # streamclock
//!
//! Stream-to-system timestamp mapping for a media input pipeline.
//!
//! A [`Clock`] anchors a source stream's own timestamps (PCR/PTS-style,
//! microsecond units, arbitrary origin) to the local system clock, and keeps
//! that mapping accurate in the presence of clock drift, network jitter, and
//! decoder latency. It does this by averaging repeated `(stream, system)`
//! observations ([`Clock::update`]) and applying the resulting affine map
//! plus correction terms whenever a caller asks to convert a timestamp
//! ([`Clock::convert_ts`]).
//!
//! ## Concurrency
//!
//! `Clock` serializes all operations behind a single internal
//! [`parking_lot::Mutex`]. Every method is synchronous and short — there are
//! no suspension points inside the lock — so `Clock` can be shared behind an
//! `Arc` across ordinary blocking threads without pulling in an async
//! runtime. Callers that do run under `tokio` or similar can call these
//! methods directly from async code; just don't hold the clock across an
//! `.await`.
//!
//! ## Example
//!
//! ```rust
//! use streamclock::Clock;
//!
//! let clock = Clock::new(streamclock::RATE_DEFAULT);
//! clock.update(0, 1_000_000, false, false);
//! clock.update(90_000, 1_001_000, false, false);
//!
//! let mut pts = 90_000;
//! let rate = clock.convert_ts(1_001_500, &mut pts, None, i64::MAX, false)
//!     .expect("reference established by the prior updates");
//! assert_eq!(rate, streamclock::RATE_DEFAULT);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod average;
mod clock;
mod config;
/// Error types returned by clock operations.
pub mod error;
mod latency;
mod point;
mod time;

pub use clock::{Clock, ClockPosition};
pub use config::{ClockConfig, ClockConfigBuilder};
pub use error::ClockError;
pub use time::{Mtime, RATE_DEFAULT, TS_INVALID};
