// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured pacing events.
//!
//! This module provides a [`PacingSink`] trait with one method per pacer
//! operation. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn PacingSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing. When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events are built from what the [`Pacer`](crate::pacer::Pacer) returns, so
//! the render loop that owns the pacer decides what gets traced.

use crate::pacer::{DeliveredFrame, DiscardedFrame};
use crate::slot::{FrameId, SlotState};
use crate::time::{Duration, HostTime};
use crate::timing::{DisplayTimingSample, FramePrediction, FrameTimestamps, TimingPoint};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictEvent {
    /// The new frame.
    pub frame_id: FrameId,
    /// When the prediction was made.
    pub predicted_at: HostTime,
    /// When the render loop should wake up.
    pub wake_up_time: HostTime,
    /// When the frame should be displayed.
    pub predicted_display_time: HostTime,
    /// The chosen display period.
    pub predicted_display_period: Duration,
}

impl PredictEvent {
    /// Creates a `PredictEvent` from a [`FramePrediction`] plus the time it
    /// was made (which the prediction itself does not carry).
    #[must_use]
    pub fn new(prediction: &FramePrediction, predicted_at: HostTime) -> Self {
        Self {
            frame_id: prediction.frame_id,
            predicted_at,
            wake_up_time: prediction.wake_up_time,
            predicted_display_time: prediction.predicted_display_time,
            predicted_display_period: prediction.predicted_display_period,
        }
    }
}

/// Emitted when the render loop marks a timing point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointEvent {
    /// The frame.
    pub frame_id: FrameId,
    /// Which milestone.
    pub point: TimingPoint,
    /// When it happened.
    pub when: HostTime,
}

/// Emitted when a frame is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveredEvent {
    /// The frame.
    pub frame_id: FrameId,
    /// When each milestone happened.
    pub timestamps: FrameTimestamps,
    /// When the frame should be displayed.
    pub predicted_display_time: HostTime,
    /// When the frame should have been delivered.
    pub predicted_delivery_time: HostTime,
    /// The display period chosen for the frame.
    pub predicted_display_period: Duration,
    /// Predicted minus actual delivery time; negative means late.
    pub delivery_error_ns: i64,
    /// Smoothed CPU time after this frame.
    pub cpu_time: Duration,
    /// Smoothed draw time after this frame.
    pub draw_time: Duration,
}

impl From<&DeliveredFrame> for DeliveredEvent {
    fn from(frame: &DeliveredFrame) -> Self {
        Self {
            frame_id: frame.frame_id,
            timestamps: frame.timestamps,
            predicted_display_time: frame.predicted_display_time,
            predicted_delivery_time: frame.predicted_delivery_time,
            predicted_display_period: frame.predicted_display_period,
            delivery_error_ns: frame.delivery_error_ns,
            cpu_time: frame.updated.cpu_time,
            draw_time: frame.updated.draw_time,
        }
    }
}

/// Emitted when a frame is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscardedEvent {
    /// The frame.
    pub frame_id: FrameId,
    /// The state it was dropped from.
    pub state: SlotState,
    /// When it was dropped.
    pub discarded_at: HostTime,
}

impl From<&DiscardedFrame> for DiscardedEvent {
    fn from(frame: &DiscardedFrame) -> Self {
        Self {
            frame_id: frame.frame_id,
            state: frame.state,
            discarded_at: frame.timestamps.delivered,
        }
    }
}

/// Emitted when the compositor pushes a display timing sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingSampleEvent {
    /// When the sample arrived.
    pub received_at: HostTime,
    /// The sample.
    pub sample: DisplayTimingSample,
}

// ---------------------------------------------------------------------------
// PacingSink trait
// ---------------------------------------------------------------------------

/// Receives pacing events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait PacingSink {
    /// Called after a prediction.
    fn on_predict(&mut self, e: &PredictEvent) {
        _ = e;
    }

    /// Called when a timing point is marked.
    fn on_point(&mut self, e: &PointEvent) {
        _ = e;
    }

    /// Called when a frame is delivered.
    fn on_delivered(&mut self, e: &DeliveredEvent) {
        _ = e;
    }

    /// Called when a frame is discarded.
    fn on_discarded(&mut self, e: &DiscardedEvent) {
        _ = e;
    }

    /// Called when a display timing sample is ingested.
    fn on_timing_sample(&mut self, e: &TimingSampleEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`PacingSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl PacingSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`PacingSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn PacingSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn PacingSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn PacingSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PredictEvent`].
    #[inline]
    pub fn predict(&mut self, e: &PredictEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_predict(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PointEvent`].
    #[inline]
    pub fn point(&mut self, e: &PointEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_point(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DeliveredEvent`].
    #[inline]
    pub fn delivered(&mut self, e: &DeliveredEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delivered(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DiscardedEvent`].
    #[inline]
    pub fn discarded(&mut self, e: &DiscardedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_discarded(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TimingSampleEvent`].
    #[inline]
    pub fn timing_sample(&mut self, e: &TimingSampleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_timing_sample(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
