// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated render loop that exercises the pacer and its diagnostics.
//!
//! Runs a session of synthetic frames through a
//! [`RenderLoop`](pacer_harness::sim::RenderLoop) on a 90 Hz display,
//! switching between light, heavy, dropped and overloaded frames. Events go
//! to both a [`PrettyPrintSink`](pacer_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](pacer_debug::recorder::RecorderSink), and the recording
//! is exported as a Chrome trace JSON file.
//!
//! Usage: `pacer_demo [OUTPUT]` (default `pacer_trace.json`). Set `RUST_LOG`
//! to change log verbosity.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pacer_core::config::PacerConfig;
use pacer_core::time::{Duration, HostTime};
use pacer_core::trace::{
    DeliveredEvent, DiscardedEvent, PacingSink, PointEvent, PredictEvent, TimingSampleEvent,
    Tracer,
};
use pacer_debug::pretty::PrettyPrintSink;
use pacer_debug::recorder::RecorderSink;
use pacer_harness::sim::{RenderLoop, SimulatedDisplay, Workload};
use pacer_harness::{PacingSample, PacingTracker};

const FRAME_COUNT: u32 = 120;
const DEFAULT_LOG_FILTER: &str = "pacer_core=debug,pacer_harness=debug";
/// 90 Hz refresh interval in nanoseconds.
const REFRESH_INTERVAL_NS: u64 = 11_111_111;

/// Forwards every event to both sinks.
struct FanOut<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl PacingSink for FanOut<'_> {
    fn on_predict(&mut self, e: &PredictEvent) {
        self.pretty.on_predict(e);
        self.recorder.on_predict(e);
    }

    fn on_point(&mut self, e: &PointEvent) {
        self.pretty.on_point(e);
        self.recorder.on_point(e);
    }

    fn on_delivered(&mut self, e: &DeliveredEvent) {
        self.pretty.on_delivered(e);
        self.recorder.on_delivered(e);
    }

    fn on_discarded(&mut self, e: &DiscardedEvent) {
        self.pretty.on_discarded(e);
        self.recorder.on_discarded(e);
    }

    fn on_timing_sample(&mut self, e: &TimingSampleEvent) {
        self.pretty.on_timing_sample(e);
        self.recorder.on_timing_sample(e);
    }
}

/// What the simulated application does on frame `i`.
fn workload_for(i: u32) -> (Workload, bool) {
    match i {
        0..40 => (Workload::short(), false),
        40..80 => (Workload::long(), i % 10 == 5),
        _ => (
            Workload {
                draw_time: Duration::from_millis(14),
                ..Workload::long()
            },
            false,
        ),
    }
}

fn main() -> anyhow::Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pacer_trace.json".into());

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    // -- simulated session -------------------------------------------------
    let display = SimulatedDisplay::new(
        HostTime::ZERO,
        Duration(REFRESH_INTERVAL_NS),
        Duration::from_millis(1),
    );
    let mut render_loop =
        RenderLoop::new(PacerConfig::responsive(), display, HostTime(1_000_000_000));
    let mut tracker = PacingTracker::<32>::default();

    {
        let mut fan_out = FanOut {
            pretty: &mut pretty,
            recorder: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut fan_out);

        for i in 0..FRAME_COUNT {
            let (workload, drop_frame) = workload_for(i);
            let outcome = if drop_frame {
                render_loop.discard_frame(workload, &mut tracer)
            } else {
                render_loop.run_frame(workload, &mut tracer)
            };

            if let Some(sample) = PacingSample::from_outcome(&outcome) {
                let report = tracker.observe(sample);
                if i % 20 == 19 {
                    info!(
                        frame = i + 1,
                        grade = report.grade.as_str(),
                        late_per_1000 = report.late_rate_per_1000,
                        "wake-to-display [{}]",
                        tracker.sparkline_ascii(0.0, 30.0),
                    );
                }
            }
        }
    }

    let latency = render_loop.pacer().latency();
    info!(
        cpu_ms = latency.cpu_time.as_millis_f64(),
        draw_ms = latency.draw_time.as_millis_f64(),
        "final latency estimate"
    );

    // -- export Chrome trace -----------------------------------------------
    let file = File::create(&path).with_context(|| format!("failed to create {path}"))?;
    let mut writer = BufWriter::new(file);
    pacer_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .with_context(|| format!("failed to write Chrome trace to {path}"))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {path}"))?;

    println!("Wrote {path} ({FRAME_COUNT} frames)");
    Ok(())
}
