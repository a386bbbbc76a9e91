// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the renderer calls at each stage of a frame. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during a frame and
//! produces a [`FrameSummary`] at the end.
//!
//! Timestamps are microseconds on a monotonic clock chosen by the caller; only
//! differences between them are meaningful.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`DamageRect`] events plus the
//!   corresponding `TraceSink` method.

use crate::visual::VisualId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Scene building (full or incremental).
    Build,
    /// Repainting dirty regions onto layer surfaces.
    Paint,
    /// Handing layer surfaces to the render target.
    Composite,
}

impl PhaseKind {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Paint => "paint",
            Self::Composite => "composite",
        }
    }
}

/// How a frame's scene was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildKind {
    /// `update_all`: the scene was rebuilt from scratch.
    Full,
    /// One `update` call per changed visual.
    Incremental,
}

/// What happened to a layer's backing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceChange {
    /// A surface was created for a new layer.
    Created,
    /// An existing layer got a new surface after a size change.
    Recreated,
    /// The layer is gone and its surface was released.
    Disposed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a tick schedules a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameTickEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Ticks dropped since the previous scheduled frame because a build was
    /// still in flight.
    pub dropped_ticks: u64,
    /// Whether this frame was scheduled by a tick deferred while a build was
    /// in flight.
    pub deferred: bool,
}

/// Emitted after the scene builder finishes.
#[derive(Clone, Copy, Debug)]
pub struct SceneUpdateEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Full or incremental.
    pub kind: BuildKind,
    /// Number of `update` calls made (0 for a full build).
    pub visuals: u32,
    /// Number of layers in the resulting scene.
    pub layers: u32,
}

/// Marks the beginning of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Timestamp at the start of the phase, in microseconds.
    pub timestamp_us: u64,
}

/// Marks the end of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Timestamp at the end of the phase, in microseconds.
    pub timestamp_us: u64,
}

/// Emitted when a layer surface is created, recreated, or disposed.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Owner of the layer.
    pub layer_root: VisualId,
    /// What happened.
    pub change: SurfaceChange,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
}

/// Per-frame timing summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Full or incremental build.
    pub kind: BuildKind,
    /// Build phase duration in microseconds (0 if not measured).
    pub build_us: u64,
    /// Paint phase duration in microseconds (0 if not measured).
    pub paint_us: u64,
    /// Composite phase duration in microseconds (0 if not measured).
    pub composite_us: u64,
    /// Number of layers in the scene.
    pub layer_count: u32,
    /// Number of layers repainted this frame.
    pub painted_layers: u32,
}

/// An axis-aligned damage rectangle in whole pixels.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(feature = "trace-rich")]
impl DamageRect {
    /// Returns the smallest pixel rectangle covering `rect`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "damage is bounded by the surface size, far below i32::MAX"
    )]
    pub fn from_rect(rect: kurbo::Rect) -> Self {
        let r = rect.abs().expand();
        Self {
            x: r.x0 as i32,
            y: r.y0 as i32,
            width: r.width() as u32,
            height: r.height() as u32,
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a tick schedules a frame.
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        _ = e;
    }

    /// Called after the scene builder finishes.
    fn on_scene_update(&mut self, e: &SceneUpdateEvent) {
        _ = e;
    }

    /// Called at the beginning of a frame phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a layer surface is created, recreated, or disposed.
    fn on_surface(&mut self, e: &SurfaceEvent) {
        _ = e;
    }

    /// Called with a per-frame timing summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the rectangles repainted on one layer (requires
    /// `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, layer_root: VisualId, rects: &[DamageRect]) {
        _ = (frame_index, layer_root, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
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
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
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

    /// Creates a tracer for an optional sink.
    #[inline]
    #[must_use]
    pub fn from_option(sink: Option<&'a mut dyn TraceSink>) -> Self {
        match sink {
            Some(sink) => Self::new(sink),
            None => Self::none(),
        }
    }

    /// Emits a [`FrameTickEvent`].
    #[inline]
    pub fn frame_tick(&mut self, e: &FrameTickEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_tick(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SceneUpdateEvent`].
    #[inline]
    pub fn scene_update(&mut self, e: &SceneUpdateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scene_update(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceEvent`].
    #[inline]
    pub fn surface(&mut self, e: &SurfaceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits the rectangles repainted on one layer (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, layer_root: VisualId, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, layer_root, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    kind: BuildKind,
    phase_starts: [Option<u64>; 3],
    phase_ends: [Option<u64>; 3],
    layer_count: u32,
    painted_layers: u32,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for one frame.
    #[must_use]
    pub fn new(frame_index: u64, kind: BuildKind) -> Self {
        Self {
            frame_index,
            kind,
            phase_starts: [None; 3],
            phase_ends: [None; 3],
            layer_count: 0,
            painted_layers: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, timestamp_us: u64) {
        self.phase_starts[phase_index(phase)] = Some(timestamp_us);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, timestamp_us: u64) {
        self.phase_ends[phase_index(phase)] = Some(timestamp_us);
    }

    /// Sets the number of layers in the scene.
    pub fn set_layer_count(&mut self, count: u32) {
        self.layer_count = count;
    }

    /// Sets the number of layers repainted this frame.
    pub fn set_painted_layers(&mut self, count: u32) {
        self.painted_layers = count;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            kind: self.kind,
            build_us: self.phase_duration(PhaseKind::Build),
            paint_us: self.phase_duration(PhaseKind::Paint),
            composite_us: self.phase_duration(PhaseKind::Composite),
            layer_count: self.layer_count,
            painted_layers: self.painted_layers,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Build => 0,
        PhaseKind::Paint => 1,
        PhaseKind::Composite => 2,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
