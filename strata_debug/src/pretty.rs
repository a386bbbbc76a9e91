// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use strata_core::trace::{
    BuildKind, DamageRect, FrameSummary, FrameTickEvent, PhaseBeginEvent, PhaseEndEvent,
    SceneUpdateEvent, SurfaceChange, SurfaceEvent, TraceSink,
};
use strata_core::visual::VisualId;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
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
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
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

fn kind_name(kind: BuildKind) -> &'static str {
    match kind {
        BuildKind::Full => "full",
        BuildKind::Incremental => "incremental",
    }
}

fn visual(v: VisualId) -> String {
    format!("{}@{}", v.index(), v.generation())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] frame={} dropped={} deferred={}",
            e.frame_index, e.dropped_ticks, e.deferred,
        );
    }

    fn on_scene_update(&mut self, e: &SceneUpdateEvent) {
        let _ = writeln!(
            self.writer,
            "[scene] frame={} {} visuals={} layers={}",
            e.frame_index,
            kind_name(e.kind),
            e.visuals,
            e.layers,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {}µs",
            e.frame_index,
            e.phase.name(),
            e.timestamp_us,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {}µs",
            e.frame_index,
            e.phase.name(),
            e.timestamp_us,
        );
    }

    fn on_surface(&mut self, e: &SurfaceEvent) {
        let change = match e.change {
            SurfaceChange::Created => "created",
            SurfaceChange::Recreated => "recreated",
            SurfaceChange::Disposed => "disposed",
        };
        let _ = writeln!(
            self.writer,
            "[surface] frame={} layer={} {change} {}x{}",
            e.frame_index,
            visual(e.layer_root),
            e.width,
            e.height,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} {} build={}µs paint={}µs composite={}µs \
             layers={} painted={}",
            s.frame_index,
            kind_name(s.kind),
            s.build_us,
            s.paint_us,
            s.composite_us,
            s.layer_count,
            s.painted_layers,
        );
    }

    fn on_damage_rects(&mut self, frame_index: u64, layer_root: VisualId, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} layer={} rects={}",
            visual(layer_root),
            rects.len(),
        );
    }
}
