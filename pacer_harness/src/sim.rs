// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic display and render loop simulation.
//!
//! [`SimulatedDisplay`] stands in for the compositor: it produces
//! [`DisplayTimingSample`]s on a fixed vblank grid. [`RenderLoop`] plays the
//! application, driving a [`Pacer`] on a [`ManualClock`] through one frame at
//! a time with a chosen [`Workload`].

use pacer_core::clock::{Clock, ManualClock};
use pacer_core::config::PacerConfig;
use pacer_core::pacer::{DeliveredFrame, DiscardedFrame, Pacer};
use pacer_core::time::{Duration, HostTime};
use pacer_core::timing::{DisplayTimingSample, FramePrediction, TimingPoint};
use pacer_core::trace::{
    DeliveredEvent, DiscardedEvent, PointEvent, PredictEvent, TimingSampleEvent, Tracer,
};
use tracing::debug;

/// A display refreshing on a fixed grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulatedDisplay {
    /// A vblank on the grid.
    pub origin: HostTime,
    /// Time between vblanks.
    pub refresh_period: Duration,
    /// Time the compositor needs between delivery and vblank.
    pub extra: Duration,
}

impl SimulatedDisplay {
    /// Creates a display.
    ///
    /// # Panics
    ///
    /// Panics if `refresh_period` is zero.
    #[must_use]
    pub const fn new(origin: HostTime, refresh_period: Duration, extra: Duration) -> Self {
        assert!(
            refresh_period.nanos() != 0,
            "a display needs a non-zero refresh period"
        );
        Self {
            origin,
            refresh_period,
            extra,
        }
    }

    /// First vblank strictly after `now`.
    #[must_use]
    pub fn next_vblank_after(&self, now: HostTime) -> HostTime {
        if now < self.origin {
            return self.origin;
        }
        let steps = (now - self.origin).nanos() / self.refresh_period.nanos() + 1;
        self.origin
            .saturating_add(self.refresh_period.saturating_mul(steps))
    }

    /// First vblank at or after `t`.
    #[must_use]
    pub fn vblank_at_or_after(&self, t: HostTime) -> HostTime {
        self.next_vblank_after(t.saturating_sub(Duration(1)))
    }

    /// The vblank a frame delivered at `delivered` makes it onto.
    #[must_use]
    pub fn presentation_for(&self, delivered: HostTime) -> HostTime {
        self.vblank_at_or_after(delivered.saturating_add(self.extra))
    }

    /// What the compositor would report at `now`.
    #[must_use]
    pub fn sample_at(&self, now: HostTime) -> DisplayTimingSample {
        DisplayTimingSample {
            predicted_display_time: self.next_vblank_after(now),
            predicted_display_period: self.refresh_period,
            extra: self.extra,
        }
    }
}

/// How long the application takes for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Workload {
    /// Oversleep past the predicted wake-up time.
    pub wake_delay: Duration,
    /// Wake-up to begin.
    pub cpu_time: Duration,
    /// Begin to delivery.
    pub draw_time: Duration,
}

impl Workload {
    /// A light frame: 20 µs oversleep, 20 µs CPU, 1.2 ms draw.
    #[must_use]
    pub const fn short() -> Self {
        Self {
            wake_delay: Duration::from_micros(20),
            cpu_time: Duration::from_micros(20),
            draw_time: Duration::from_micros(1_200),
        }
    }

    /// A heavy frame: 20 µs oversleep, 1 ms CPU, 4 ms draw.
    #[must_use]
    pub const fn long() -> Self {
        Self {
            wake_delay: Duration::from_micros(20),
            cpu_time: Duration::from_millis(1),
            draw_time: Duration::from_millis(4),
        }
    }
}

/// How a simulated frame ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEnd {
    /// Delivered to the compositor.
    Delivered(DeliveredFrame),
    /// Dropped after beginning.
    Discarded(DiscardedFrame),
}

/// Result of [`RenderLoop::run_frame`] or [`RenderLoop::discard_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOutcome {
    /// What the pacer predicted.
    pub prediction: FramePrediction,
    /// How the frame ended.
    pub end: FrameEnd,
    /// The vblank the frame was shown on; `None` if discarded.
    pub presented_at: Option<HostTime>,
}

impl FrameOutcome {
    /// Whether the frame was shown after its predicted display time.
    #[must_use]
    pub fn missed_display(&self) -> bool {
        self.presented_at
            .is_some_and(|t| t > self.prediction.predicted_display_time)
    }

    /// The delivery report, if the frame was delivered.
    #[must_use]
    pub fn delivered(&self) -> Option<&DeliveredFrame> {
        match &self.end {
            FrameEnd::Delivered(frame) => Some(frame),
            FrameEnd::Discarded(_) => None,
        }
    }
}

/// An application render loop on simulated time.
#[derive(Debug)]
pub struct RenderLoop {
    pacer: Pacer<ManualClock>,
    clock: ManualClock,
    display: SimulatedDisplay,
}

impl RenderLoop {
    /// Creates a loop whose clock starts at `start`.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid.
    #[must_use]
    pub fn new(config: PacerConfig, display: SimulatedDisplay, start: HostTime) -> Self {
        let clock = ManualClock::new(start);
        Self {
            pacer: Pacer::with_clock(config, clock.clone()),
            clock,
            display,
        }
    }

    /// The pacer under test.
    #[must_use]
    pub fn pacer(&self) -> &Pacer<ManualClock> {
        &self.pacer
    }

    /// The shared simulated clock.
    #[must_use]
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// The current display.
    #[must_use]
    pub fn display(&self) -> &SimulatedDisplay {
        &self.display
    }

    /// Switches to a different display mode from the next frame on.
    pub fn set_display(&mut self, display: SimulatedDisplay) {
        self.display = display;
    }

    /// Runs one frame to delivery.
    pub fn run_frame(&mut self, workload: Workload, tracer: &mut Tracer<'_>) -> FrameOutcome {
        let prediction = self.start_frame(workload, tracer);

        self.clock.advance(workload.draw_time);
        let delivered = self.pacer.mark_delivered(prediction.frame_id);
        tracer.delivered(&DeliveredEvent::from(&delivered));

        let delivered_at = delivered.timestamps.delivered;
        let presented_at = self.display.presentation_for(delivered_at);
        let outcome = FrameOutcome {
            prediction,
            end: FrameEnd::Delivered(delivered),
            presented_at: Some(presented_at),
        };
        if outcome.missed_display() {
            debug!(
                frame_id = prediction.frame_id.get(),
                "missed display by {:.3}ms",
                (presented_at - prediction.predicted_display_time).as_millis_f64()
            );
        }
        outcome
    }

    /// Runs one frame through begin, then drops it.
    pub fn discard_frame(&mut self, workload: Workload, tracer: &mut Tracer<'_>) -> FrameOutcome {
        let prediction = self.start_frame(workload, tracer);

        let discarded = self.pacer.mark_discarded(prediction.frame_id);
        tracer.discarded(&DiscardedEvent::from(&discarded));

        FrameOutcome {
            prediction,
            end: FrameEnd::Discarded(discarded),
            presented_at: None,
        }
    }

    /// Ingest, predict, sleep, wake up and begin.
    fn start_frame(&mut self, workload: Workload, tracer: &mut Tracer<'_>) -> FramePrediction {
        let now = self.clock.now();
        let sample = self.display.sample_at(now);
        self.pacer.ingest_timing_sample(
            sample.predicted_display_time,
            sample.predicted_display_period,
            sample.extra,
        );
        tracer.timing_sample(&TimingSampleEvent {
            received_at: now,
            sample,
        });

        let prediction = self.pacer.predict();
        tracer.predict(&PredictEvent::new(&prediction, now));

        self.clock.advance_to(prediction.wake_up_time);
        self.clock.advance(workload.wake_delay);
        self.mark(prediction, TimingPoint::WakeUp, tracer);

        self.clock.advance(workload.cpu_time);
        self.mark(prediction, TimingPoint::Begin, tracer);

        prediction
    }

    fn mark(&mut self, prediction: FramePrediction, point: TimingPoint, tracer: &mut Tracer<'_>) {
        let when = self.clock.now();
        self.pacer.mark_point(prediction.frame_id, point, when);
        tracer.point(&PointEvent {
            frame_id: prediction.frame_id,
            point,
            when,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn display_60ish() -> SimulatedDisplay {
        SimulatedDisplay::new(HostTime(0), Duration(16 * MS), Duration(MS))
    }

    fn run(render_loop: &mut RenderLoop, workload: Workload, frames: usize) -> Vec<FrameOutcome> {
        let mut tracer = Tracer::none();
        (0..frames)
            .map(|_| render_loop.run_frame(workload, &mut tracer))
            .collect()
    }

    #[test]
    fn display_grid_math() {
        let d = display_60ish();
        assert_eq!(d.next_vblank_after(HostTime(0)), HostTime(16 * MS));
        assert_eq!(
            d.next_vblank_after(HostTime(16 * MS - 1)),
            HostTime(16 * MS)
        );
        assert_eq!(d.vblank_at_or_after(HostTime(16 * MS)), HostTime(16 * MS));
        // Delivery 0.5 ms before vblank misses the 1 ms compositor window.
        assert_eq!(d.presentation_for(HostTime(31_500_000)), HostTime(48 * MS));
        assert_eq!(d.presentation_for(HostTime(31 * MS)), HostTime(32 * MS));

        let s = d.sample_at(HostTime(20 * MS));
        assert_eq!(s.predicted_display_time, HostTime(32 * MS));
        assert_eq!(s.predicted_display_period, Duration(16 * MS));
    }

    #[test]
    fn faster_than_expected() {
        let mut rl = RenderLoop::new(PacerConfig::default(), display_60ish(), HostTime(MS));
        let outcomes = run(&mut rl, Workload::short(), 60);

        assert!(outcomes.iter().all(|o| !o.missed_display()));
        for pair in outcomes.windows(2) {
            let step = pair[1].prediction.predicted_display_time
                - pair[0].prediction.predicted_display_time;
            assert_eq!(step, Duration(16 * MS), "one frame per refresh");
        }

        let e = rl.pacer().latency();
        assert!(e.cpu_time.nanos().abs_diff(20_000) < 1_000, "{e:?}");
        assert!(e.draw_time.nanos().abs_diff(1_200_000) < 1_000, "{e:?}");
    }

    #[test]
    fn slower_than_expected() {
        let mut rl = RenderLoop::new(PacerConfig::default(), display_60ish(), HostTime(MS));
        let outcomes = run(&mut rl, Workload::long(), 60);

        assert!(outcomes.iter().all(|o| !o.missed_display()));
        let e = rl.pacer().latency();
        assert!(e.app_time().nanos().abs_diff(5 * MS) < 10_000, "{e:?}");

        // Waking earlier to fit the heavier frame.
        let last = outcomes.last().unwrap().prediction;
        let lead = last.predicted_display_time - last.wake_up_time;
        assert!(lead.nanos().abs_diff(8 * MS) < 10_000, "lead {lead:?}");
    }

    #[test]
    fn overload_halves_the_frame_rate() {
        let mut rl = RenderLoop::new(PacerConfig::default(), display_60ish(), HostTime(MS));
        let heavy = Workload {
            draw_time: Duration(20 * MS),
            ..Workload::long()
        };
        let outcomes = run(&mut rl, heavy, 60);

        for o in &outcomes[40..] {
            assert_eq!(o.prediction.predicted_display_period, Duration(32 * MS));
            assert!(!o.missed_display(), "{o:?}");
        }
    }

    #[test]
    fn discarded_frames_do_not_teach_the_model() {
        let mut rl = RenderLoop::new(PacerConfig::default(), display_60ish(), HostTime(MS));
        let _ = run(&mut rl, Workload::short(), 10);
        let before = rl.pacer().latency();

        let slow = Workload {
            cpu_time: Duration(30 * MS),
            ..Workload::short()
        };
        let outcome = rl.discard_frame(slow, &mut Tracer::none());

        assert!(outcome.delivered().is_none());
        assert_eq!(outcome.presented_at, None);
        assert!(!outcome.missed_display());
        assert_eq!(rl.pacer().latency(), before);
        assert_eq!(rl.pacer().in_flight(), 0);

        let next = rl.run_frame(Workload::short(), &mut Tracer::none());
        assert!(
            next.prediction.predicted_display_time > outcome.prediction.predicted_display_time
        );
    }

    #[test]
    fn follows_refresh_rate_switch() {
        let mut rl = RenderLoop::new(PacerConfig::default(), display_60ish(), HostTime(MS));
        let _ = run(&mut rl, Workload::short(), 5);

        let now = rl.clock().now();
        let display_90hz = SimulatedDisplay::new(now, Duration(11_111_111), Duration(MS));
        rl.set_display(display_90hz);
        let outcomes = run(&mut rl, Workload::short(), 10);

        for o in &outcomes {
            assert_eq!(o.prediction.predicted_display_period, Duration(11_111_111));
            assert!(!o.missed_display());
        }
        assert_eq!(rl.display().refresh_period, Duration(11_111_111));
    }
}
