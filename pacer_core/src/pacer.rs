// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The application frame pacer.
//!
//! A [`Pacer`] tells an application render loop when to wake up so that its
//! next frame is delivered just in time for a future display refresh, and
//! learns from each delivered frame how long CPU setup and drawing take.
//! See the [`Pacer`] struct docs for the call sequence and contract.

use tracing::{debug, trace, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{ConfigError, PacerConfig};
use crate::latency::{LatencyEstimate, LatencyModel};
use crate::slot::{DEFAULT_FRAME_SLOTS, FrameId, FrameSlot, SlotRing, SlotState};
use crate::time::{Duration, HostTime};
use crate::timing::{
    DisplayTimingSample, FramePrediction, FrameTimestamps, TimingInput, TimingPoint,
};

/// What [`Pacer::mark_delivered`] learned from a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveredFrame {
    /// The delivered frame.
    pub frame_id: FrameId,
    /// When each milestone happened.
    pub timestamps: FrameTimestamps,
    /// When the frame was predicted to be displayed.
    pub predicted_display_time: HostTime,
    /// The display period chosen for the frame.
    pub predicted_display_period: Duration,
    /// When the frame should have been delivered.
    pub predicted_delivery_time: HostTime,
    /// Predicted minus actual delivery time; negative means late.
    pub delivery_error_ns: i64,
    /// Measured wake-up to begin time.
    pub cpu_sample: Duration,
    /// Measured begin to delivery time.
    pub draw_sample: Duration,
    /// Latency estimates before this frame was folded in.
    pub previous: LatencyEstimate,
    /// Latency estimates after this frame was folded in.
    pub updated: LatencyEstimate,
}

impl DeliveredFrame {
    /// Whether the frame arrived after its predicted delivery time.
    #[must_use]
    pub const fn is_late(&self) -> bool {
        self.delivery_error_ns < 0
    }
}

/// What [`Pacer::mark_discarded`] recorded about a dropped frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscardedFrame {
    /// The discarded frame.
    pub frame_id: FrameId,
    /// The state the frame was in when it was dropped.
    pub state: SlotState,
    /// When each milestone happened; `delivered` is the discard time.
    pub timestamps: FrameTimestamps,
}

/// Predictive frame pacer for one application session.
///
/// # Call sequence
///
/// ```rust,ignore
/// let prediction = pacer.predict();
/// sleep_until(prediction.wake_up_time);
/// pacer.mark_point(prediction.frame_id, TimingPoint::WakeUp, clock.now());
/// pacer.mark_point(prediction.frame_id, TimingPoint::Begin, clock.now());
/// // ... render and submit ...
/// pacer.mark_delivered(prediction.frame_id);
/// ```
///
/// Meanwhile the compositor pushes display timing through
/// [`Pacer::ingest_timing_sample`] or a [`TimingInput`] handle from
/// [`Pacer::timing_input`], from any thread.
///
/// # Contract
///
/// At most `N` frames may be in flight. Frame `id` occupies slot `id mod N`
/// and must follow the slot state machine documented in
/// [`slot`](crate::slot). Breaking the contract (predicting into an occupied
/// slot, marking an unknown frame, or marking out of order) is a bug in the
/// caller and panics, in release builds too: carrying on would silently feed
/// the latency model garbage.
///
/// The frame-oriented methods take `&mut self`, so they are serialized by
/// construction. Only timing ingestion goes through `&self`.
#[derive(Debug)]
pub struct Pacer<C = MonotonicClock, const N: usize = DEFAULT_FRAME_SLOTS> {
    clock: C,
    config: PacerConfig,
    slots: SlotRing<N>,
    frame_counter: i64,
    latency: LatencyModel,
    input: TimingInput,
    last_returned: HostTime,
    warned_no_sample: bool,
}

impl Pacer {
    /// Creates a pacer on the system monotonic clock.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`PacerConfig::validate`].
    #[must_use]
    pub fn new(config: PacerConfig) -> Self {
        Self::with_clock(config, MonotonicClock)
    }
}

impl<C: Clock, const N: usize> Pacer<C, N> {
    /// Creates a pacer reading time from `clock`.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`PacerConfig::validate`], or if `N` is zero.
    #[must_use]
    pub fn with_clock(config: PacerConfig, clock: C) -> Self {
        match Self::try_with_clock(config, clock) {
            Ok(pacer) => pacer,
            Err(err) => panic!("invalid pacer configuration: {err}"),
        }
    }

    /// Creates a pacer reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`PacerConfig::validate`].
    ///
    /// # Panics
    ///
    /// Panics if `N` is zero.
    pub fn try_with_clock(config: PacerConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            clock,
            config,
            slots: SlotRing::new(),
            frame_counter: 0,
            latency: LatencyModel::new(config.initial_estimate(), config.filter()),
            input: TimingInput::new(),
            last_returned: HostTime::ZERO,
            warned_no_sample: false,
        })
    }

    /// Predicts the next frame and reserves a slot for it.
    ///
    /// The returned display time is strictly later than every display time
    /// returned before, and the wake-up time is in the future as of this
    /// call.
    ///
    /// # Panics
    ///
    /// Panics if the slot for the new frame id is still in use, i.e. `N`
    /// frames are already in flight.
    pub fn predict(&mut self) -> FramePrediction {
        self.frame_counter += 1;
        let frame_id = FrameId(self.frame_counter);
        trace!(frame_id = frame_id.get(), "predict");

        let now = self.clock.now();
        let sample = self.input.load();
        let estimate = self.latency.estimate();

        let base_period = self.base_period(&sample);
        let period = select_period(base_period, &estimate, self.config.max_period_multiple);

        let compositor_time = estimate.margin.saturating_add(sample.extra);
        let app_and_compositor_time = estimate.app_time().saturating_add(compositor_time);

        // Never regress, and leave enough time to do the work.
        let floor = self
            .last_returned
            .max(now.saturating_add(app_and_compositor_time));
        let display_time = next_display_after(sample.predicted_display_time, period, floor);

        let wake_up_time = display_time.saturating_sub(app_and_compositor_time);
        let delivery_time = display_time.saturating_sub(compositor_time);

        self.slots
            .vacant_mut(frame_id)
            .predict(frame_id, display_time, period, delivery_time, now);
        self.last_returned = display_time;

        FramePrediction {
            frame_id,
            wake_up_time,
            predicted_display_time: display_time,
            predicted_display_period: period,
        }
    }

    /// Records that the render loop reached `point` for `frame_id`.
    ///
    /// For [`TimingPoint::WakeUp`] the caller's `when` is stored. For
    /// [`TimingPoint::Begin`] the pacer reads its own clock instead, so the
    /// latency model never depends on a caller's notion of time.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is not in flight, if the frame is not in the
    /// state `point` requires, or if `point` is [`TimingPoint::Submit`].
    pub fn mark_point(&mut self, frame_id: FrameId, point: TimingPoint, when: HostTime) {
        trace!(frame_id = frame_id.get(), ?point, "mark_point");

        let slot = self.slots.occupied_mut(frame_id);
        match point {
            TimingPoint::WakeUp => slot.wake_up(when),
            TimingPoint::Begin => slot.begin(self.clock.now()),
            TimingPoint::Submit => {
                panic!("the application pacer does not track {point:?} (frame {frame_id})")
            }
        }
    }

    /// Drops `frame_id` without feeding the latency model.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is not in flight or has not woken up yet.
    pub fn mark_discarded(&mut self, frame_id: FrameId) -> DiscardedFrame {
        trace!(frame_id = frame_id.get(), "mark_discarded");

        let now = self.clock.now();
        let slot = self.slots.occupied_mut(frame_id);
        let state = slot.state;
        let frame = slot.discard(now);
        DiscardedFrame {
            frame_id,
            state,
            timestamps: frame.timestamps,
        }
    }

    /// Completes `frame_id` and folds its measured CPU and draw times into
    /// the latency model.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is not in flight or has not begun.
    pub fn mark_delivered(&mut self, frame_id: FrameId) -> DeliveredFrame {
        trace!(frame_id = frame_id.get(), "mark_delivered");

        let now = self.clock.now();
        let frame = self.slots.occupied_mut(frame_id).deliver(now);
        let when = frame.timestamps;

        let predicted = frame.predicted_delivery_time;
        let delivery_error_ns = predicted.signed_nanos_since(when.delivered);
        // A caller-supplied wake-up after our own begin reading counts as zero.
        let cpu_sample = when.begin.saturating_duration_since(when.wait_woke);
        let draw_sample = when.delivered.saturating_duration_since(when.begin);

        let previous = self.latency.estimate();
        self.latency.observe(cpu_sample, draw_sample);
        let updated = self.latency.estimate();

        let late = delivery_error_ns < 0;
        debug!(
            frame_id = frame_id.get(),
            period_ms = frame.predicted_display_period.as_millis_f64(),
            cpu_old_ms = previous.cpu_time.as_millis_f64(),
            cpu_new_ms = cpu_sample.as_millis_f64(),
            draw_old_ms = previous.draw_time.as_millis_f64(),
            draw_new_ms = draw_sample.as_millis_f64(),
            "delivered frame {:.2}ms {}",
            Duration(delivery_error_ns.unsigned_abs()).as_millis_f64(),
            if late { "late" } else { "early" },
        );

        DeliveredFrame {
            frame_id,
            timestamps: when,
            predicted_display_time: frame.predicted_display_time,
            predicted_display_period: frame.predicted_display_period,
            predicted_delivery_time: frame.predicted_delivery_time,
            delivery_error_ns,
            cpu_sample,
            draw_sample,
            previous,
            updated,
        }
    }

    /// Replaces the display timing the next prediction starts from.
    ///
    /// Safe to call while another thread holds a [`TimingInput`] from the
    /// same pacer.
    pub fn ingest_timing_sample(
        &self,
        predicted_display_time: HostTime,
        predicted_display_period: Duration,
        extra: Duration,
    ) {
        self.input
            .ingest(predicted_display_time, predicted_display_period, extra);
    }

    /// A handle that feeds this pacer's timing sample from another thread.
    #[must_use]
    pub fn timing_input(&self) -> TimingInput {
        self.input.clone()
    }

    /// The most recently ingested display timing.
    #[must_use]
    pub fn timing_sample(&self) -> DisplayTimingSample {
        self.input.load()
    }

    /// The current latency estimates.
    #[must_use]
    pub fn latency(&self) -> LatencyEstimate {
        self.latency.estimate()
    }

    /// The configuration this pacer was built with.
    #[must_use]
    pub fn config(&self) -> &PacerConfig {
        &self.config
    }

    /// The clock this pacer reads.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Id of the most recently predicted frame, or 0 before the first.
    #[must_use]
    pub fn frame_counter(&self) -> i64 {
        self.frame_counter
    }

    /// The display time returned by the most recent prediction.
    #[must_use]
    pub fn last_returned(&self) -> HostTime {
        self.last_returned
    }

    /// The record for `frame_id`, if it is in flight.
    #[must_use]
    pub fn frame(&self, frame_id: FrameId) -> Option<&FrameSlot> {
        let slot = self.slots.slot_for(frame_id);
        (slot.frame_id == Some(frame_id)).then_some(slot)
    }

    /// State of `frame_id`, or `None` if it is not in flight.
    #[must_use]
    pub fn slot_state(&self, frame_id: FrameId) -> Option<SlotState> {
        self.frame(frame_id).map(|slot| slot.state)
    }

    /// Number of frames currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.slots.in_flight()
    }

    fn base_period(&mut self, sample: &DisplayTimingSample) -> Duration {
        if sample.predicted_display_period != Duration::ZERO {
            return sample.predicted_display_period;
        }
        if !self.warned_no_sample {
            warn!(
                fallback_ms = self.config.fallback_period.as_millis_f64(),
                "predicting before any display timing sample; using fallback period"
            );
            self.warned_no_sample = true;
        }
        self.config.fallback_period
    }
}

/// Smallest whole multiple of `base` that fits both the CPU and the draw
/// estimate on its own, optionally capped.
fn select_period(base: Duration, estimate: &LatencyEstimate, cap: Option<u32>) -> Duration {
    let multiple = estimate
        .cpu_time
        .div_ceil(base)
        .max(estimate.draw_time.div_ceil(base))
        .max(1);
    let multiple = match cap {
        Some(cap) => multiple.min(u64::from(cap)),
        None => multiple,
    };
    base.saturating_mul(multiple)
}

/// First time on the grid `from + k * period` (`k >= 0`) strictly after
/// `floor`.
fn next_display_after(from: HostTime, period: Duration, floor: HostTime) -> HostTime {
    if from > floor {
        return from;
    }
    let steps = (floor - from).nanos() / period.nanos() + 1;
    from.saturating_add(period.saturating_mul(steps))
}
