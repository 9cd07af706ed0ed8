//! Construction-time configuration for [`crate::Clock`].

use crate::time::{Mtime, MIN_CR_AVERAGE, RATE_DEFAULT};

/// Configuration for constructing a [`crate::Clock`].
///
/// Most callers only ever set `rate` and reach for [`crate::Clock::new`]
/// directly; `cr_average` and `pts_delay` exist for the few call sites that
/// know their legacy-filter window or initial presentation delay up front
/// instead of discovering it later through [`crate::Clock::set_jitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    /// Initial playback rate (`RATE_DEFAULT` = real-time).
    pub rate: i64,

    /// Initial window size (divider) for the drift estimator's legacy
    /// exponential filter. Clamped to at least `MIN_CR_AVERAGE` (10).
    pub cr_average: i64,

    /// Initial presentation delay, in microseconds.
    pub pts_delay: Mtime,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            rate: RATE_DEFAULT,
            cr_average: MIN_CR_AVERAGE,
            pts_delay: 0,
        }
    }
}

impl ClockConfig {
    /// Create a config builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ClockConfigBuilder {
        ClockConfigBuilder::default()
    }
}

/// Builder for [`ClockConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClockConfigBuilder {
    config: ClockConfig,
}

impl ClockConfigBuilder {
    /// Set the initial playback rate.
    #[must_use]
    pub fn rate(mut self, rate: i64) -> Self {
        self.config.rate = rate;
        self
    }

    /// Set the initial legacy-filter divider (clamped to `MIN_CR_AVERAGE` at build time).
    #[must_use]
    pub fn cr_average(mut self, cr_average: i64) -> Self {
        self.config.cr_average = cr_average;
        self
    }

    /// Set the initial presentation delay.
    #[must_use]
    pub fn pts_delay(mut self, pts_delay: Mtime) -> Self {
        self.config.pts_delay = pts_delay;
        self
    }

    /// Build the configuration, clamping `cr_average` to its minimum.
    #[must_use]
    pub fn build(mut self) -> ClockConfig {
        self.config.cr_average = self.config.cr_average.max(MIN_CR_AVERAGE);
        self.config
    }
}
