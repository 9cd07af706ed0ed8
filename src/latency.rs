//! Decoder-latency estimator and the recent-PCR ring that feeds it.

use crate::point::ClockPoint;
use crate::time::{Mtime, DECODER_LATENCY_BIAS_US, INIT_DECODER_LATENCY, LATENCY_CIRCLE, PCR_RING_SIZE};

/// Decaying maximum and windowed mean of recent decoder-latency samples.
///
/// Mirrors [`crate::average::Average`]'s residue-arithmetic pattern over a
/// [`LATENCY_CIRCLE`]-sample window, but tracks a decaying *maximum* rather
/// than a variance-derived envelope: [`LatencyStats::max`] is deliberately
/// the conservative figure callers add to their presentation delay, not the
/// mean latency.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    means: Mtime,
    residue: Mtime,
    count: Mtime,
    max: Mtime,
    max_count: Mtime,
}

impl LatencyStats {
    /// `count = 0`, `means = max = INIT_DECODER_LATENCY`, and `max_count` set
    /// far in the future so the first real samples don't immediately decay it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            means: INIT_DECODER_LATENCY,
            residue: 0,
            count: 0,
            max: INIT_DECODER_LATENCY,
            max_count: 205_000,
        }
    }

    /// Fold a new latency sample (already bias-adjusted) into the window.
    pub fn update(&mut self, latency: Mtime) {
        let index = self.count % LATENCY_CIRCLE;
        if index == 0 {
            self.means = 0;
            self.residue = 0;
        }

        let tmp = self.means * index + latency + self.residue;
        self.means = tmp.div_euclid(index + 1);
        self.residue = tmp.rem_euclid(index + 1);

        if latency > self.max || self.max == INIT_DECODER_LATENCY {
            self.max = if self.max == INIT_DECODER_LATENCY {
                self.means
            } else {
                (latency * 3 + self.max) / 4
            };
            self.max_count = self.count;
        }

        if self.count - self.max_count >= 2 {
            self.max = (self.means + latency) / 2;
            self.max_count = self.count;
        }

        self.count += 1;
    }

    /// The decaying maximum latency estimate — what `ConvertTS` adds to the
    /// presentation delay. Intentionally the max, not the mean.
    #[must_use]
    pub const fn max(&self) -> Mtime {
        self.max
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded circular record of recent `(stream, system)` pairs observed on
/// `Update`, used to resolve "when did this stream instant arrive".
#[derive(Debug, Clone)]
pub struct PcrRing {
    entries: [ClockPoint; PCR_RING_SIZE],
    write_index: usize,
}

impl PcrRing {
    /// A ring with every slot zero-initialised (compares less than any real
    /// stream time, so an unfilled ring degrades gracefully).
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: [ClockPoint::default(); PCR_RING_SIZE],
            write_index: 0,
        }
    }

    /// Record a new observation, overwriting the oldest entry.
    pub fn push(&mut self, point: ClockPoint) {
        self.entries[self.write_index] = point;
        self.write_index = (self.write_index + 1) % PCR_RING_SIZE;
    }

    /// Resolve the wall-clock arrival instant of stream time `stream`.
    ///
    /// Scans newest-to-oldest. An exact match returns its `system` value
    /// directly; otherwise the first entry older than `stream` is
    /// extrapolated at unit rate (`stream - entry.stream + entry.system`),
    /// deliberately *not* through the affine map. A full loop with no match
    /// falls back to the last entry examined (the oldest), which — being
    /// zero-initialised on an unfilled ring — still compares below `stream`.
    #[must_use]
    pub fn arrival_time(&self, stream: Mtime) -> Mtime {
        let newest = (self.write_index + PCR_RING_SIZE - 1) % PCR_RING_SIZE;
        let mut i = newest;
        let mut system = 0;
        loop {
            let entry = self.entries[i];
            if entry.stream == stream {
                system = entry.system;
                break;
            }
            if entry.stream < stream {
                system = stream - entry.stream + entry.system;
                break;
            }
            i = (i + PCR_RING_SIZE - 1) % PCR_RING_SIZE;
            if i == newest {
                // Full loop with no match: keep the degenerate fallback,
                // matching the original's uninitialized-to-zero behavior.
                break;
            }
        }
        system
    }
}

impl Default for PcrRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute a decoder-latency sample for `stream` observed at `now`, looking
/// up its arrival instant in `ring` and applying the millisecond-granularity
/// bias.
#[must_use]
pub fn decoder_latency_sample(ring: &PcrRing, stream: Mtime, now: Mtime) -> Mtime {
    let arrival = ring.arrival_time(stream);
    now + DECODER_LATENCY_BIAS_US - arrival
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_report_sentinel_max() {
        let stats = LatencyStats::new();
        assert_eq!(stats.max(), INIT_DECODER_LATENCY);
    }

    #[test]
    fn first_raise_sets_max_from_means_not_raw_sample() {
        let mut stats = LatencyStats::new();
        stats.update(10_000);
        // First sample: means becomes 10_000, and since max was the sentinel,
        // the first-raise branch sets max = means (not the raw sample, though
        // here they coincide because the window just started).
        assert_eq!(stats.max(), 10_000);
    }

    #[test]
    fn subsequent_raise_uses_weighted_average() {
        let mut stats = LatencyStats::new();
        stats.update(1_000);
        let after_first = stats.max();
        stats.update(5_000);
        // second sample is a new raise since 5000 > max; uses (3*5000+max)/4
        assert_eq!(stats.max(), (5_000 * 3 + after_first) / 4);
    }

    #[test]
    fn decays_after_two_quiet_samples() {
        let mut stats = LatencyStats::new();
        stats.update(50_000);
        let peak = stats.max();
        stats.update(0);
        stats.update(0);
        assert!(stats.max() <= peak);
    }

    #[test]
    fn pcr_ring_exact_match_returns_system_directly() {
        let mut ring = PcrRing::new();
        ring.push(ClockPoint::new(100, 1_000));
        ring.push(ClockPoint::new(200, 2_000));
        assert_eq!(ring.arrival_time(200), 2_000);
        assert_eq!(ring.arrival_time(100), 1_000);
    }

    #[test]
    fn pcr_ring_extrapolates_at_unit_rate_for_missing_stream() {
        let mut ring = PcrRing::new();
        ring.push(ClockPoint::new(100, 1_000));
        ring.push(ClockPoint::new(200, 2_000));
        // No exact entry for 250; nearest older is (200, 2000).
        assert_eq!(ring.arrival_time(250), 250 - 200 + 2_000);
    }

    #[test]
    fn pcr_ring_wraps_and_overwrites_oldest() {
        let mut ring = PcrRing::new();
        for i in 0..(PCR_RING_SIZE + 1) {
            ring.push(ClockPoint::new((i * 100) as Mtime, (i * 100) as Mtime));
        }
        // The very first entry (stream=0) should have been overwritten.
        assert_eq!(ring.arrival_time(0), 100);
    }

    #[test]
    fn decoder_latency_sample_applies_bias() {
        let mut ring = PcrRing::new();
        ring.push(ClockPoint::new(100, 1_000));
        let sample = decoder_latency_sample(&ring, 100, 2_000);
        assert_eq!(sample, 2_000 + DECODER_LATENCY_BIAS_US - 1_000);
    }
}
