// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pacer configuration.

use thiserror::Error;

use crate::latency::{AsymmetricIir, LatencyEstimate};
use crate::time::Duration;

/// Configuration for a [`Pacer`](crate::pacer::Pacer).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacerConfig {
    /// Seed for the smoothed wake-up to begin time.
    pub initial_cpu_time: Duration,
    /// Seed for the smoothed begin to delivery time.
    pub initial_draw_time: Duration,
    /// Fixed time between application delivery and compositor wake-up.
    pub margin: Duration,
    /// IIR weight of the old estimate when a sample is larger (0.0–1.0).
    pub alpha_rising: f64,
    /// IIR weight of the old estimate when a sample is smaller (0.0–1.0).
    pub alpha_falling: f64,
    /// Display period assumed until the compositor sends a timing sample.
    pub fallback_period: Duration,
    /// Upper bound on the chosen period, in multiples of the display period.
    ///
    /// `None` lets the period grow as far as the latency estimates demand.
    pub max_period_multiple: Option<u32>,
}

impl PacerConfig {
    /// 2 ms CPU, draw and margin seeds with symmetric 0.8 smoothing.
    #[must_use]
    pub const fn conservative() -> Self {
        Self {
            initial_cpu_time: Duration::from_millis(2),
            initial_draw_time: Duration::from_millis(2),
            margin: Duration::from_millis(2),
            alpha_rising: 0.8,
            alpha_falling: 0.8,
            fallback_period: Duration::from_millis(16),
            max_period_multiple: None,
        }
    }

    /// Like [`conservative`](Self::conservative), but follows latency
    /// spikes quickly and improvements slowly.
    #[must_use]
    pub const fn responsive() -> Self {
        Self {
            alpha_rising: 0.5,
            alpha_falling: 0.9,
            ..Self::conservative()
        }
    }

    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, alpha) in [
            ("alpha_rising", self.alpha_rising),
            ("alpha_falling", self.alpha_falling),
        ] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(ConfigError::AlphaOutOfRange { name, value: alpha });
            }
        }
        if self.fallback_period == Duration::ZERO {
            return Err(ConfigError::ZeroFallbackPeriod);
        }
        if self.max_period_multiple == Some(0) {
            return Err(ConfigError::ZeroPeriodCap);
        }
        Ok(())
    }

    pub(crate) const fn initial_estimate(&self) -> LatencyEstimate {
        LatencyEstimate {
            cpu_time: self.initial_cpu_time,
            draw_time: self.initial_draw_time,
            margin: self.margin,
        }
    }

    pub(crate) const fn filter(&self) -> AsymmetricIir {
        AsymmetricIir {
            alpha_rising: self.alpha_rising,
            alpha_falling: self.alpha_falling,
        }
    }
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Why a [`PacerConfig`] was rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A filter coefficient is NaN or outside `0.0..=1.0`.
    #[error("{name} must be within 0.0..=1.0, got {value}")]
    AlphaOutOfRange {
        /// Which coefficient.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The fallback display period is zero.
    #[error("fallback_period must be non-zero")]
    ZeroFallbackPeriod,
    /// The period cap is zero periods.
    #[error("max_period_multiple must be at least 1")]
    ZeroPeriodCap,
}
