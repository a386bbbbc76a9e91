// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};
use strata_core::trace::SurfaceChange;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Phases become duration slices; everything else becomes an instant event at
/// the most recent phase timestamp.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Ticks, surfaces, and summaries carry no timestamp of their own.
    let mut last_ts = 0_u64;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameTick(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameTick",
                    "cat": "Scheduler",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "dropped_ticks": e.dropped_ticks,
                        "deferred": e.deferred,
                    }
                }));
            }
            RecordedEvent::SceneUpdate(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "SceneUpdate",
                    "cat": "Frame",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "kind": format!("{:?}", e.kind),
                        "visuals": e.visuals,
                        "layers": e.layers,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                last_ts = e.timestamp_us;
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": e.timestamp_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = e.timestamp_us;
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Frame",
                    "ts": e.timestamp_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::Surface(e) => {
                let name = match e.change {
                    SurfaceChange::Created => "SurfaceCreated",
                    SurfaceChange::Recreated => "SurfaceRecreated",
                    SurfaceChange::Disposed => "SurfaceDisposed",
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Surface",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "layer": e.layer_root.index(),
                        "width": e.width,
                        "height": e.height,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "kind": format!("{:?}", s.kind),
                        "build_us": s.build_us,
                        "paint_us": s.paint_us,
                        "composite_us": s.composite_us,
                        "layer_count": s.layer_count,
                        "painted_layers": s.painted_layers,
                    }
                }));
            }
            RecordedEvent::DamageRectsCount {
                frame_index,
                layer_root,
                count,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DamageRects",
                    "cat": "Rich",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "layer": layer_root.index(),
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
