// Copyright 2026 the Pacer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Predictive frame pacing for application render loops.
//!
//! `pacer_core` tells a render loop when to wake up so that its next frame is
//! delivered just in time for a future display refresh. It learns how long
//! the application takes from the frames it actually delivers, and keeps at
//! most a fixed number of frames in flight.
//!
//! # Architecture
//!
//! ```text
//!   Compositor thread
//!       │ TimingInput::ingest()
//!       ▼
//!   DisplayTimingSample ──► Pacer::predict() ──► FramePrediction
//!                                ▲                    │
//!                                │                    ▼
//!                          LatencyModel         render loop sleeps,
//!                                ▲              mark_point(WakeUp),
//!                                │              mark_point(Begin),
//!                                │              renders
//!                                │                    │
//!                                └── mark_delivered() ┘
//! ```
//!
//! **[`pacer`]**: The [`Pacer`](pacer::Pacer) itself, covering prediction, timing
//! points, delivery and discard.
//!
//! **[`slot`]**: Fixed ring of in-flight frame records and the state machine
//! each record follows. Illegal transitions panic.
//!
//! **[`latency`]**: CPU and draw time estimates smoothed by an asymmetric
//! IIR filter.
//!
//! **[`timing`]**: Data exchanged with the render loop and the compositor,
//! including the thread-safe [`TimingInput`](timing::TimingInput) handle.
//!
//! **[`config`]**: [`PacerConfig`](config::PacerConfig) presets and
//! validation.
//!
//! **[`clock`]**: The [`Clock`](clock::Clock) trait with system and manual
//! implementations.
//!
//! **[`time`]**: Nanosecond [`HostTime`](time::HostTime) and
//! [`Duration`](time::Duration).
//!
//! **[`trace`]**: [`PacingSink`](trace::PacingSink) trait and event types
//! for pacing instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod clock;
pub mod config;
pub mod latency;
pub mod pacer;
pub mod slot;
pub mod time;
pub mod timing;
pub mod trace;
