// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timing data exchanged with the render loop and the compositor.
//!
//! - [`DisplayTimingSample`]: the compositor's latest view of the display,
//!   pushed through [`TimingInput`].
//! - [`FramePrediction`]: what [`Pacer::predict`](crate::pacer::Pacer::predict)
//!   hands the render loop.
//! - [`TimingPoint`]: the milestones a render loop reports while working on a
//!   frame.
//! - [`FrameTimestamps`]: when each milestone actually happened.
//!
//! # Data flow
//!
//! 1. The compositor thread calls [`TimingInput::ingest`] whenever it has a
//!    fresh display prediction.
//! 2. The render thread calls `predict`, sleeps until
//!    [`FramePrediction::wake_up_time`], reports [`TimingPoint::WakeUp`] and
//!    [`TimingPoint::Begin`], renders, and reports delivery.
//! 3. Delivery feeds the measured CPU and draw times back into the latency
//!    model used by the next `predict`.

use std::sync::{Arc, Mutex, PoisonError};

use crate::slot::FrameId;
use crate::time::{Duration, HostTime};

/// A milestone in the life of a frame on the render thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimingPoint {
    /// Woke up after sleeping until the predicted wake-up time.
    WakeUp,
    /// Began CPU-side work for the GPU.
    Begin,
    /// Submitted work to the GPU. Not accepted by the application pacer.
    Submit,
}

/// The compositor's most recent display prediction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DisplayTimingSample {
    /// When the compositor expects its next frame to be displayed.
    pub predicted_display_time: HostTime,
    /// The display refresh period the hardware is running at.
    pub predicted_display_period: Duration,
    /// Extra time the compositor needs between application delivery and
    /// display, on top of the pacer's own margin.
    pub extra: Duration,
}

/// The result of [`Pacer::predict`](crate::pacer::Pacer::predict).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FramePrediction {
    /// Identifier for the new frame; pass it to every later `mark_*` call.
    pub frame_id: FrameId,
    /// When the render loop should wake up and start the frame.
    pub wake_up_time: HostTime,
    /// When the frame is expected to be shown.
    pub predicted_display_time: HostTime,
    /// The display period chosen for this frame; a whole multiple of the
    /// hardware period.
    pub predicted_display_period: Duration,
}

/// When each milestone of a frame happened.
///
/// Fields stay at [`HostTime::ZERO`] until the milestone is recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameTimestamps {
    /// When the prediction was made.
    pub predicted: HostTime,
    /// When the render loop reported waking up (caller-supplied).
    pub wait_woke: HostTime,
    /// When the render loop reported beginning work (pacer-measured).
    pub begin: HostTime,
    /// When the frame was delivered or discarded (pacer-measured).
    pub delivered: HostTime,
}

/// Cloneable, thread-safe handle for pushing [`DisplayTimingSample`]s into a
/// pacer.
///
/// Every handle obtained from the same pacer writes the same slot; the
/// newest write wins.
#[derive(Clone, Debug, Default)]
pub struct TimingInput {
    sample: Arc<Mutex<DisplayTimingSample>>,
}

impl TimingInput {
    /// Creates a handle holding an all-zero sample.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored sample.
    pub fn ingest(
        &self,
        predicted_display_time: HostTime,
        predicted_display_period: Duration,
        extra: Duration,
    ) {
        self.store(DisplayTimingSample {
            predicted_display_time,
            predicted_display_period,
            extra,
        });
    }

    /// Replaces the stored sample.
    pub fn store(&self, sample: DisplayTimingSample) {
        // The sample is plain data; a panic elsewhere cannot leave it torn.
        *self.sample.lock().unwrap_or_else(PoisonError::into_inner) = sample;
    }

    /// Returns a copy of the stored sample.
    #[must_use]
    pub fn load(&self) -> DisplayTimingSample {
        *self.sample.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
