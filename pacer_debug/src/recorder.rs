// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`PacingSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use pacer_core::slot::{FrameId, SlotState};
use pacer_core::time::{Duration, HostTime};
use pacer_core::timing::{DisplayTimingSample, FrameTimestamps, TimingPoint};
use pacer_core::trace::{
    DeliveredEvent, DiscardedEvent, PacingSink, PointEvent, PredictEvent, TimingSampleEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PREDICT: u8 = 1;
const TAG_POINT: u8 = 2;
const TAG_DELIVERED: u8 = 3;
const TAG_DISCARDED: u8 = 4;
const TAG_TIMING_SAMPLE: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`PacingSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.nanos());
    }

    fn write_duration(&mut self, d: Duration) {
        self.write_u64(d.nanos());
    }

    fn write_timestamps(&mut self, t: &FrameTimestamps) {
        self.write_time(t.predicted);
        self.write_time(t.wait_woke);
        self.write_time(t.begin);
        self.write_time(t.delivered);
    }

    fn write_point(&mut self, p: TimingPoint) {
        self.write_u8(match p {
            TimingPoint::WakeUp => 0,
            TimingPoint::Begin => 1,
            TimingPoint::Submit => 2,
        });
    }

    fn write_state(&mut self, s: SlotState) {
        self.write_u8(match s {
            SlotState::Ready => 0,
            SlotState::Predicted => 1,
            SlotState::WaitLeft => 2,
            SlotState::Begun => 3,
        });
    }
}

impl PacingSink for RecorderSink {
    fn on_predict(&mut self, e: &PredictEvent) {
        self.write_u8(TAG_PREDICT);
        self.write_i64(e.frame_id.get());
        self.write_time(e.predicted_at);
        self.write_time(e.wake_up_time);
        self.write_time(e.predicted_display_time);
        self.write_duration(e.predicted_display_period);
    }

    fn on_point(&mut self, e: &PointEvent) {
        self.write_u8(TAG_POINT);
        self.write_i64(e.frame_id.get());
        self.write_point(e.point);
        self.write_time(e.when);
    }

    fn on_delivered(&mut self, e: &DeliveredEvent) {
        self.write_u8(TAG_DELIVERED);
        self.write_i64(e.frame_id.get());
        self.write_timestamps(&e.timestamps);
        self.write_time(e.predicted_display_time);
        self.write_time(e.predicted_delivery_time);
        self.write_duration(e.predicted_display_period);
        self.write_i64(e.delivery_error_ns);
        self.write_duration(e.cpu_time);
        self.write_duration(e.draw_time);
    }

    fn on_discarded(&mut self, e: &DiscardedEvent) {
        self.write_u8(TAG_DISCARDED);
        self.write_i64(e.frame_id.get());
        self.write_state(e.state);
        self.write_time(e.discarded_at);
    }

    fn on_timing_sample(&mut self, e: &TimingSampleEvent) {
        self.write_u8(TAG_TIMING_SAMPLE);
        self.write_time(e.received_at);
        self.write_time(e.sample.predicted_display_time);
        self.write_duration(e.sample.predicted_display_period);
        self.write_duration(e.sample.extra);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`PredictEvent`].
    Predict(PredictEvent),
    /// A [`PointEvent`].
    Point(PointEvent),
    /// A [`DeliveredEvent`].
    Delivered(DeliveredEvent),
    /// A [`DiscardedEvent`].
    Discarded(DiscardedEvent),
    /// A [`TimingSampleEvent`].
    TimingSample(TimingSampleEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const LEN: usize>(&mut self) -> Option<[u8; LEN]> {
        let bytes = self.data.get(self.pos..self.pos + LEN)?;
        self.pos += LEN;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_i64(&mut self) -> Option<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    fn read_frame_id(&mut self) -> Option<FrameId> {
        self.read_i64().map(FrameId)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_duration(&mut self) -> Option<Duration> {
        self.read_u64().map(Duration)
    }

    fn read_timestamps(&mut self) -> Option<FrameTimestamps> {
        Some(FrameTimestamps {
            predicted: self.read_time()?,
            wait_woke: self.read_time()?,
            begin: self.read_time()?,
            delivered: self.read_time()?,
        })
    }

    fn read_point(&mut self) -> Option<TimingPoint> {
        Some(match self.read_u8()? {
            0 => TimingPoint::WakeUp,
            1 => TimingPoint::Begin,
            _ => TimingPoint::Submit,
        })
    }

    fn read_state(&mut self) -> Option<SlotState> {
        Some(match self.read_u8()? {
            0 => SlotState::Ready,
            1 => SlotState::Predicted,
            2 => SlotState::WaitLeft,
            _ => SlotState::Begun,
        })
    }

    fn decode_predict(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Predict(PredictEvent {
            frame_id: self.read_frame_id()?,
            predicted_at: self.read_time()?,
            wake_up_time: self.read_time()?,
            predicted_display_time: self.read_time()?,
            predicted_display_period: self.read_duration()?,
        }))
    }

    fn decode_point(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Point(PointEvent {
            frame_id: self.read_frame_id()?,
            point: self.read_point()?,
            when: self.read_time()?,
        }))
    }

    fn decode_delivered(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Delivered(DeliveredEvent {
            frame_id: self.read_frame_id()?,
            timestamps: self.read_timestamps()?,
            predicted_display_time: self.read_time()?,
            predicted_delivery_time: self.read_time()?,
            predicted_display_period: self.read_duration()?,
            delivery_error_ns: self.read_i64()?,
            cpu_time: self.read_duration()?,
            draw_time: self.read_duration()?,
        }))
    }

    fn decode_discarded(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Discarded(DiscardedEvent {
            frame_id: self.read_frame_id()?,
            state: self.read_state()?,
            discarded_at: self.read_time()?,
        }))
    }

    fn decode_timing_sample(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TimingSample(TimingSampleEvent {
            received_at: self.read_time()?,
            sample: DisplayTimingSample {
                predicted_display_time: self.read_time()?,
                predicted_display_period: self.read_duration()?,
                extra: self.read_duration()?,
            },
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PREDICT => self.decode_predict(),
            TAG_POINT => self.decode_point(),
            TAG_DELIVERED => self.decode_delivered(),
            TAG_DISCARDED => self.decode_discarded(),
            TAG_TIMING_SAMPLE => self.decode_timing_sample(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_predict() -> PredictEvent {
        PredictEvent {
            frame_id: FrameId(7),
            predicted_at: HostTime(50_000_000),
            wake_up_time: HostTime(93_000_000),
            predicted_display_time: HostTime(100_000_000),
            predicted_display_period: Duration(11_111_111),
        }
    }

    fn sample_delivered() -> DeliveredEvent {
        DeliveredEvent {
            frame_id: FrameId(7),
            timestamps: FrameTimestamps {
                predicted: HostTime(50_000_000),
                wait_woke: HostTime(93_000_000),
                begin: HostTime(96_000_000),
                delivered: HostTime(98_500_000),
            },
            predicted_display_time: HostTime(100_000_000),
            predicted_delivery_time: HostTime(97_000_000),
            predicted_display_period: Duration(11_111_111),
            delivery_error_ns: -1_500_000,
            cpu_time: Duration(2_200_000),
            draw_time: Duration(2_100_000),
        }
    }

    #[test]
    fn records_a_frame_lifecycle_in_order() {
        let mut rec = RecorderSink::new();
        let sample = TimingSampleEvent {
            received_at: HostTime(40_000_000),
            sample: DisplayTimingSample {
                predicted_display_time: HostTime(100_000_000),
                predicted_display_period: Duration(11_111_111),
                extra: Duration(1_000_000),
            },
        };
        let wake = PointEvent {
            frame_id: FrameId(7),
            point: TimingPoint::WakeUp,
            when: HostTime(93_000_000),
        };
        let discarded = DiscardedEvent {
            frame_id: FrameId(8),
            state: SlotState::WaitLeft,
            discarded_at: HostTime(104_000_000),
        };

        rec.on_timing_sample(&sample);
        rec.on_predict(&sample_predict());
        rec.on_point(&wake);
        rec.on_delivered(&sample_delivered());
        rec.on_discarded(&discarded);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::TimingSample(sample),
                RecordedEvent::Predict(sample_predict()),
                RecordedEvent::Point(wake),
                RecordedEvent::Delivered(sample_delivered()),
                RecordedEvent::Discarded(discarded),
            ]
        );
    }

    #[test]
    fn negative_delivery_error_survives() {
        let mut rec = RecorderSink::new();
        rec.on_delivered(&sample_delivered());
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::Delivered(e)) => assert_eq!(e.delivery_error_ns, -1_500_000),
            other => panic!("expected Delivered, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_predict(&sample_predict());
        rec.on_predict(&sample_predict());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];

        let events: Vec<_> = decode(cut).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_predict(&sample_predict());
        let mut bytes = rec.into_bytes();
        bytes.push(0xff);
        bytes.extend_from_slice(&[0; 16]);

        assert_eq!(decode(&bytes).count(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
