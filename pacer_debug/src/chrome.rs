// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each delivered frame becomes three duration spans on the render track:
//! `sleep` (prediction to wake-up), `cpu` (wake-up to begin) and `draw`
//! (begin to delivery). Compositor samples go on their own track.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use pacer_core::time::{Duration, HostTime};

use crate::recorder::{RecordedEvent, decode};

const RENDER_TID: u32 = 0;
const COMPOSITOR_TID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are written in microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Predict(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "predict",
                    "cat": "Pacer",
                    "ts": time_us(e.predicted_at),
                    "pid": 0,
                    "tid": RENDER_TID,
                    "s": "t",
                    "args": {
                        "frame_id": e.frame_id.get(),
                        "wake_up_us": time_us(e.wake_up_time),
                        "display_us": time_us(e.predicted_display_time),
                        "period_us": duration_us(e.predicted_display_period),
                    }
                }));
            }
            RecordedEvent::Point(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.point),
                    "cat": "Frame",
                    "ts": time_us(e.when),
                    "pid": 0,
                    "tid": RENDER_TID,
                    "s": "t",
                    "args": {
                        "frame_id": e.frame_id.get(),
                    }
                }));
            }
            RecordedEvent::Delivered(e) => {
                let t = e.timestamps;
                // Offset so viewers do not nest `cpu` inside `sleep`.
                let cpu_start = t.wait_woke.saturating_add(Duration(1));
                for (name, start, end) in [
                    ("sleep", t.predicted, t.wait_woke),
                    ("cpu", cpu_start, t.begin),
                    ("draw", t.begin, t.delivered),
                ] {
                    events.push(json!({
                        "ph": "X",
                        "name": name,
                        "cat": "Frame",
                        "ts": time_us(start),
                        "dur": duration_us(end.saturating_duration_since(start)),
                        "pid": 0,
                        "tid": RENDER_TID,
                        "args": {
                            "frame_id": e.frame_id.get(),
                        }
                    }));
                }
                events.push(json!({
                    "ph": "C",
                    "name": "latency",
                    "ts": time_us(t.delivered),
                    "pid": 0,
                    "args": {
                        "cpu_ms": e.cpu_time.as_millis_f64(),
                        "draw_ms": e.draw_time.as_millis_f64(),
                    }
                }));
                let verdict = if e.delivery_error_ns < 0 {
                    "late"
                } else {
                    "early"
                };
                events.push(json!({
                    "ph": "i",
                    "name": verdict,
                    "cat": "Frame",
                    "ts": time_us(t.delivered),
                    "pid": 0,
                    "tid": RENDER_TID,
                    "s": "t",
                    "args": {
                        "frame_id": e.frame_id.get(),
                        "error_us": e.delivery_error_ns as f64 / 1000.0,
                        "display_us": time_us(e.predicted_display_time),
                    }
                }));
            }
            RecordedEvent::Discarded(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "discarded",
                    "cat": "Frame",
                    "ts": time_us(e.discarded_at),
                    "pid": 0,
                    "tid": RENDER_TID,
                    "s": "t",
                    "args": {
                        "frame_id": e.frame_id.get(),
                        "state": format!("{:?}", e.state),
                    }
                }));
            }
            RecordedEvent::TimingSample(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "timing_sample",
                    "cat": "Compositor",
                    "ts": time_us(e.received_at),
                    "pid": 0,
                    "tid": COMPOSITOR_TID,
                    "s": "t",
                    "args": {
                        "display_us": time_us(e.sample.predicted_display_time),
                        "period_us": duration_us(e.sample.predicted_display_period),
                        "extra_us": duration_us(e.sample.extra),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn time_us(t: HostTime) -> f64 {
    duration_us(Duration(t.nanos()))
}

fn duration_us(d: Duration) -> f64 {
    d.nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use pacer_core::slot::{FrameId, SlotState};
    use pacer_core::timing::{FrameTimestamps, TimingPoint};
    use pacer_core::trace::{DeliveredEvent, DiscardedEvent, PacingSink, PointEvent};

    fn export_to_values(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        serde_json::from_str(&json_str).unwrap()
    }

    #[test]
    fn delivered_frame_becomes_spans() {
        let mut rec = RecorderSink::new();
        rec.on_delivered(&DeliveredEvent {
            frame_id: FrameId(1),
            timestamps: FrameTimestamps {
                predicted: HostTime(1_000_000),
                wait_woke: HostTime(5_000_000),
                begin: HostTime(6_000_000),
                delivered: HostTime(9_000_000),
            },
            predicted_display_time: HostTime(12_000_000),
            predicted_delivery_time: HostTime(10_000_000),
            predicted_display_period: Duration(11_111_111),
            delivery_error_ns: 1_000_000,
            cpu_time: Duration(1_000_000),
            draw_time: Duration(3_000_000),
        });

        let parsed = export_to_values(&rec);
        assert_eq!(parsed.len(), 5);

        let spans: Vec<_> = parsed.iter().filter(|e| e["ph"] == "X").collect();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0]["name"], "sleep");
        assert_eq!(spans[0]["ts"], 1000.0);
        assert_eq!(spans[0]["dur"], 4000.0);
        assert_eq!(spans[1]["name"], "cpu");
        let sleep_end = spans[0]["ts"].as_f64().unwrap() + spans[0]["dur"].as_f64().unwrap();
        let cpu_start = spans[1]["ts"].as_f64().unwrap();
        let cpu_end = cpu_start + spans[1]["dur"].as_f64().unwrap();
        assert!(cpu_start > sleep_end, "cpu starts inside sleep");
        assert!((cpu_start - 5000.001).abs() < 1e-6, "got {cpu_start}");
        assert!((cpu_end - 6000.0).abs() < 1e-6, "got {cpu_end}");
        assert_eq!(spans[2]["name"], "draw");
        assert_eq!(spans[2]["dur"], 3000.0);

        assert_eq!(parsed[3]["ph"], "C");
        assert_eq!(parsed[3]["args"]["draw_ms"], 3.0);
        assert_eq!(parsed[4]["name"], "early");
    }

    #[test]
    fn points_and_discards_are_instants() {
        let mut rec = RecorderSink::new();
        rec.on_point(&PointEvent {
            frame_id: FrameId(2),
            point: TimingPoint::WakeUp,
            when: HostTime(2_000),
        });
        rec.on_discarded(&DiscardedEvent {
            frame_id: FrameId(2),
            state: SlotState::Begun,
            discarded_at: HostTime(3_000),
        });

        let parsed = export_to_values(&rec);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "WakeUp");
        assert_eq!(parsed[0]["ts"], 2.0);
        assert_eq!(parsed[1]["name"], "discarded");
        assert_eq!(parsed[1]["args"]["state"], "Begun");
    }

    #[test]
    fn export_empty_recording() {
        let parsed = export_to_values(&RecorderSink::new());
        assert!(parsed.is_empty());
    }
}
