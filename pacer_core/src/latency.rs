// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive application latency model.
//!
//! The pacer tracks two independently varying latencies: CPU time (wake-up
//! to begin) and draw time (begin to delivery). Each is smoothed by an
//! [`AsymmetricIir`] filter, which can weight rising samples differently from
//! falling ones. A fixed safety margin is added on top and never adapts.

use crate::time::Duration;

/// First-order IIR smoothing with separate coefficients for rising and
/// falling samples.
///
/// `filtered = α·filtered + (1 − α)·sample`, where α is
/// [`alpha_rising`](Self::alpha_rising) when the sample is above the current
/// estimate and [`alpha_falling`](Self::alpha_falling) otherwise. A larger α
/// means more smoothing and a slower response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AsymmetricIir {
    /// Weight of the previous estimate when the sample is larger.
    pub alpha_rising: f64,
    /// Weight of the previous estimate when the sample is smaller or equal.
    pub alpha_falling: f64,
}

impl AsymmetricIir {
    /// A filter using the same α in both directions.
    #[must_use]
    pub const fn symmetric(alpha: f64) -> Self {
        Self {
            alpha_rising: alpha,
            alpha_falling: alpha,
        }
    }

    /// The coefficient used to blend `sample` into `current`.
    #[inline]
    #[must_use]
    pub fn alpha_for(&self, current: Duration, sample: Duration) -> f64 {
        if current < sample {
            self.alpha_rising
        } else {
            self.alpha_falling
        }
    }

    /// Returns `current` with `sample` blended in.
    ///
    /// Blending happens in floating-point seconds so that small corrections
    /// are not lost to integer truncation.
    #[must_use]
    pub fn apply(&self, current: Duration, sample: Duration) -> Duration {
        let alpha = self.alpha_for(current, sample);
        let a = current.as_secs_f64() * alpha;
        let b = sample.as_secs_f64() * (1.0 - alpha);
        Duration::from_secs_f64(a + b)
    }
}

/// Snapshot of the latency model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LatencyEstimate {
    /// Smoothed time between wake-up and begin.
    pub cpu_time: Duration,
    /// Smoothed time between begin and delivery.
    pub draw_time: Duration,
    /// Fixed margin between delivery and compositor wake-up.
    pub margin: Duration,
}

impl LatencyEstimate {
    /// Application time: CPU plus draw.
    #[inline]
    #[must_use]
    pub const fn app_time(&self) -> Duration {
        self.cpu_time.saturating_add(self.draw_time)
    }
}

/// The latency estimates plus the filter that updates them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencyModel {
    estimate: LatencyEstimate,
    filter: AsymmetricIir,
}

impl LatencyModel {
    /// Creates a model seeded with `initial`.
    #[must_use]
    pub const fn new(initial: LatencyEstimate, filter: AsymmetricIir) -> Self {
        Self {
            estimate: initial,
            filter,
        }
    }

    /// The current estimates.
    #[inline]
    #[must_use]
    pub const fn estimate(&self) -> LatencyEstimate {
        self.estimate
    }

    /// The filter coefficients.
    #[inline]
    #[must_use]
    pub const fn filter(&self) -> AsymmetricIir {
        self.filter
    }

    /// Folds one delivered frame's measurements into the estimates.
    pub fn observe(&mut self, cpu_sample: Duration, draw_sample: Duration) {
        self.estimate.cpu_time = self.filter.apply(self.estimate.cpu_time, cpu_sample);
        self.estimate.draw_time = self.filter.apply(self.estimate.draw_time, draw_sample);
    }
}
