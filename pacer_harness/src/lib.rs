// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulation and pacing-quality grading for tests and demos.
//!
//! - [`sim`] drives a [`Pacer`](pacer_core::pacer::Pacer) against a
//!   simulated display on manual time.
//! - [`PacingTracker`] turns per-frame outcomes into a rolling late rate,
//!   a letter grade and an ASCII sparkline.

pub mod sim;

use sim::FrameOutcome;

/// Per-frame metrics sample fed into [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingSample {
    /// Time from predicted wake-up to predicted display, in ms.
    pub wake_to_display_ms: f64,
    /// Predicted minus actual delivery time, in ms; negative means late.
    pub delivery_error_ms: f64,
    /// Whether the frame was shown after its predicted display time.
    pub missed_display: bool,
}

impl PacingSample {
    /// Builds a sample from a delivered frame; `None` for discarded frames.
    #[must_use]
    pub fn from_outcome(outcome: &FrameOutcome) -> Option<Self> {
        let delivered = outcome.delivered()?;
        let p = &outcome.prediction;
        Some(Self {
            wake_to_display_ms: (p.predicted_display_time - p.wake_up_time).as_millis_f64(),
            delivery_error_ms: delivered.delivery_error_ns as f64 / 1_000_000.0,
            missed_display: outcome.missed_display(),
        })
    }
}

/// Letter grade for pacing quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingGrade {
    /// Delivers close to the deadline and almost never misses.
    A,
    /// Good pacing with occasional misses.
    B,
    /// Degraded but usable.
    C,
    /// Poor pacing.
    D,
}

impl PacingGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingReport {
    /// Current grade.
    pub grade: PacingGrade,
    /// Missed displays per 1000 observed frames.
    pub late_rate_per_1000: f64,
    /// Current frame's delivery error in milliseconds.
    pub delivery_error_ms: f64,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total frames that missed their display.
    pub late_frames: u64,
}

/// Rolling pacing tracker with fixed-size wake-to-display history.
#[derive(Debug)]
pub struct PacingTracker<const N: usize> {
    history_ms: [f64; N],
    cursor: usize,
    total_frames: u64,
    late_frames: u64,
}

impl<const N: usize> Default for PacingTracker<N> {
    fn default() -> Self {
        Self::new(7.0)
    }
}

impl<const N: usize> PacingTracker<N> {
    /// Creates a tracker with `seed_ms` prefilled in the history.
    #[must_use]
    pub const fn new(seed_ms: f64) -> Self {
        Self {
            history_ms: [seed_ms; N],
            cursor: 0,
            total_frames: 0,
            late_frames: 0,
        }
    }

    /// Observes one frame and returns an updated report.
    #[must_use]
    pub fn observe(&mut self, sample: PacingSample) -> PacingReport {
        self.total_frames = self.total_frames.saturating_add(1);
        self.history_ms[self.cursor] = sample.wake_to_display_ms;
        self.cursor = (self.cursor + 1) % N;

        if sample.missed_display {
            self.late_frames = self.late_frames.saturating_add(1);
        }

        let late_rate = self.late_frames as f64 * 1000.0 / self.total_frames as f64;
        let grade = grade_for(sample.delivery_error_ms.abs(), late_rate);

        PacingReport {
            grade,
            late_rate_per_1000: late_rate,
            delivery_error_ms: sample.delivery_error_ms,
            total_frames: self.total_frames,
            late_frames: self.late_frames,
        }
    }

    /// Returns the wake-to-display history oldest→newest.
    #[must_use]
    pub fn history(&self) -> [f64; N] {
        core::array::from_fn(|i| self.history_ms[(self.cursor + i) % N])
    }

    /// Returns an ASCII sparkline over [`history`](Self::history).
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        self.history()
            .iter()
            .map(|v| {
                let t = (v.clamp(min_ms, max_ms) - min_ms) / (max_ms - min_ms);
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "index is clamped to ASCII level count"
                )]
                let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
                LEVELS[level] as char
            })
            .collect()
    }
}

fn grade_for(delivery_error_abs_ms: f64, late_rate_per_1000: f64) -> PacingGrade {
    if delivery_error_abs_ms < 2.0 && late_rate_per_1000 < 1.0 {
        PacingGrade::A
    } else if delivery_error_abs_ms < 4.0 && late_rate_per_1000 < 10.0 {
        PacingGrade::B
    } else if delivery_error_abs_ms < 8.0 && late_rate_per_1000 < 50.0 {
        PacingGrade::C
    } else {
        PacingGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_core::config::PacerConfig;
    use pacer_core::time::{Duration, HostTime};
    use pacer_core::trace::Tracer;
    use sim::{RenderLoop, SimulatedDisplay, Workload};

    fn sample(error_ms: f64, missed: bool) -> PacingSample {
        PacingSample {
            wake_to_display_ms: 7.0,
            delivery_error_ms: error_ms,
            missed_display: missed,
        }
    }

    #[test]
    fn late_rate_accumulates() {
        let mut t = PacingTracker::<8>::default();
        let mut last = None;
        for i in 0..10 {
            last = Some(t.observe(sample(0.5, i < 2)));
        }
        let report = last.unwrap();
        assert!((report.late_rate_per_1000 - 200.0).abs() < 1e-6);
        assert_eq!(report.late_frames, 2);
        assert_eq!(report.total_frames, 10);
        assert_eq!(report.grade, PacingGrade::D);
    }

    #[test]
    fn grade_tracks_delivery_error() {
        let mut t = PacingTracker::<4>::default();
        assert_eq!(t.observe(sample(1.0, false)).grade, PacingGrade::A);
        assert_eq!(t.observe(sample(-3.0, false)).grade, PacingGrade::B);
        assert_eq!(t.observe(sample(6.0, false)).grade, PacingGrade::C);
        assert_eq!(t.observe(sample(9.0, false)).grade, PacingGrade::D);
    }

    #[test]
    fn history_and_sparkline_wrap() {
        let mut t = PacingTracker::<4>::new(0.0);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            let _ = t.observe(PacingSample {
                wake_to_display_ms: v,
                ..sample(0.0, false)
            });
        }
        assert_eq!(t.history(), [2.0, 3.0, 4.0, 5.0]);
        assert_eq!(t.sparkline_ascii(2.0, 5.0), " -*@");
    }

    #[test]
    fn simulated_session_grades_well() {
        let display = SimulatedDisplay::new(HostTime(0), Duration(16_000_000), Duration(1_000_000));
        let mut rl = RenderLoop::new(PacerConfig::default(), display, HostTime(1_000_000));
        let mut tracker = PacingTracker::<16>::default();
        let mut report = None;
        for _ in 0..60 {
            let outcome = rl.run_frame(Workload::short(), &mut Tracer::none());
            report = PacingSample::from_outcome(&outcome).map(|s| tracker.observe(s));
        }
        let report = report.unwrap();
        assert_eq!(report.late_frames, 0);
        assert_eq!(report.grade, PacingGrade::A);
    }
}
