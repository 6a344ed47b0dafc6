// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`PacingSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in milliseconds.

use std::io::Write;

use pacer_core::time::{Duration, HostTime};
use pacer_core::trace::{
    DeliveredEvent, DiscardedEvent, PacingSink, PointEvent, PredictEvent, TimingSampleEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    Duration(t.nanos()).as_millis_f64()
}

impl<W: Write> PacingSink for PrettyPrintSink<W> {
    fn on_predict(&mut self, e: &PredictEvent) {
        let _ = writeln!(
            self.writer,
            "[predict] frame={} at={:.3}ms wake={:.3}ms display={:.3}ms period={:.3}ms",
            e.frame_id,
            ms(e.predicted_at),
            ms(e.wake_up_time),
            ms(e.predicted_display_time),
            e.predicted_display_period.as_millis_f64(),
        );
    }

    fn on_point(&mut self, e: &PointEvent) {
        let _ = writeln!(
            self.writer,
            "[point] frame={} {:?} at {:.3}ms",
            e.frame_id,
            e.point,
            ms(e.when),
        );
    }

    fn on_delivered(&mut self, e: &DeliveredEvent) {
        let verdict = if e.delivery_error_ns < 0 {
            "LATE"
        } else {
            "early"
        };
        let _ = writeln!(
            self.writer,
            "[delivered] frame={} {:.3}ms {verdict} cpu={:.3}ms draw={:.3}ms",
            e.frame_id,
            Duration(e.delivery_error_ns.unsigned_abs()).as_millis_f64(),
            e.cpu_time.as_millis_f64(),
            e.draw_time.as_millis_f64(),
        );
    }

    fn on_discarded(&mut self, e: &DiscardedEvent) {
        let _ = writeln!(
            self.writer,
            "[discarded] frame={} from {:?} at {:.3}ms",
            e.frame_id,
            e.state,
            ms(e.discarded_at),
        );
    }

    fn on_timing_sample(&mut self, e: &TimingSampleEvent) {
        let _ = writeln!(
            self.writer,
            "[sample] at={:.3}ms display={:.3}ms period={:.3}ms extra={:.3}ms",
            ms(e.received_at),
            ms(e.sample.predicted_display_time),
            e.sample.predicted_display_period.as_millis_f64(),
            e.sample.extra.as_millis_f64(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_core::slot::FrameId;
    use pacer_core::timing::FrameTimestamps;

    #[test]
    fn pretty_print_predict() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_predict(&PredictEvent {
            frame_id: FrameId(1),
            predicted_at: HostTime(50_000_000),
            wake_up_time: HostTime(93_000_000),
            predicted_display_time: HostTime(100_000_000),
            predicted_display_period: Duration(11_111_111),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("[predict]"), "got: {output}");
        assert!(output.contains("frame=1"), "got: {output}");
        assert!(output.contains("period=11.111ms"), "got: {output}");
    }

    #[test]
    fn late_delivery_is_flagged() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_delivered(&DeliveredEvent {
            frame_id: FrameId(4),
            timestamps: FrameTimestamps::default(),
            predicted_display_time: HostTime(100_000_000),
            predicted_delivery_time: HostTime(97_000_000),
            predicted_display_period: Duration(11_111_111),
            delivery_error_ns: -2_500_000,
            cpu_time: Duration(2_000_000),
            draw_time: Duration(3_000_000),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("2.500ms LATE"), "got: {output}");
    }
}
