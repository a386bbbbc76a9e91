// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Damage events ([`on_damage_rects`](TraceSink::on_damage_rects)) store the
//! layer and the rectangle count only.

use strata_core::trace::{
    BuildKind, DamageRect, FrameSummary, FrameTickEvent, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, SceneUpdateEvent, SurfaceChange, SurfaceEvent, TraceSink,
};
use strata_core::visual::VisualId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_TICK: u8 = 1;
const TAG_SCENE_UPDATE: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_SURFACE: u8 = 5;
const TAG_FRAME_SUMMARY: u8 = 6;
const TAG_DAMAGE_RECTS_COUNT: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
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

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_visual(&mut self, v: VisualId) {
        self.write_u32(v.index());
        self.write_u32(v.generation());
    }

    fn write_kind(&mut self, k: BuildKind) {
        self.write_u8(match k {
            BuildKind::Full => 0,
            BuildKind::Incremental => 1,
        });
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Build => 0,
            PhaseKind::Paint => 1,
            PhaseKind::Composite => 2,
        });
    }

    fn write_change(&mut self, c: SurfaceChange) {
        self.write_u8(match c {
            SurfaceChange::Created => 0,
            SurfaceChange::Recreated => 1,
            SurfaceChange::Disposed => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        self.write_u8(TAG_FRAME_TICK);
        self.write_u64(e.frame_index);
        self.write_u64(e.dropped_ticks);
        self.write_bool(e.deferred);
    }

    fn on_scene_update(&mut self, e: &SceneUpdateEvent) {
        self.write_u8(TAG_SCENE_UPDATE);
        self.write_u64(e.frame_index);
        self.write_kind(e.kind);
        self.write_u32(e.visuals);
        self.write_u32(e.layers);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp_us);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp_us);
    }

    fn on_surface(&mut self, e: &SurfaceEvent) {
        self.write_u8(TAG_SURFACE);
        self.write_u64(e.frame_index);
        self.write_visual(e.layer_root);
        self.write_change(e.change);
        self.write_u32(e.width);
        self.write_u32(e.height);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_kind(s.kind);
        self.write_u64(s.build_us);
        self.write_u64(s.paint_us);
        self.write_u64(s.composite_us);
        self.write_u32(s.layer_count);
        self.write_u32(s.painted_layers);
    }

    fn on_damage_rects(&mut self, frame_index: u64, layer_root: VisualId, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS_COUNT);
        self.write_u64(frame_index);
        self.write_visual(layer_root);
        self.write_u32(u32::try_from(rects.len()).unwrap_or(u32::MAX));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameTickEvent`].
    FrameTick(FrameTickEvent),
    /// A [`SceneUpdateEvent`].
    SceneUpdate(SceneUpdateEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`SurfaceEvent`].
    Surface(SurfaceEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// Damage-rect count for one layer in a frame.
    DamageRectsCount {
        /// Frame counter.
        frame_index: u64,
        /// Owner of the repainted layer.
        layer_root: VisualId,
        /// Number of damage rects.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
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
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_visual(&mut self) -> Option<VisualId> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(VisualId::new(index, generation))
    }

    fn read_kind(&mut self) -> Option<BuildKind> {
        Some(match self.read_u8()? {
            0 => BuildKind::Full,
            _ => BuildKind::Incremental,
        })
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Build,
            1 => PhaseKind::Paint,
            _ => PhaseKind::Composite,
        })
    }

    fn read_change(&mut self) -> Option<SurfaceChange> {
        Some(match self.read_u8()? {
            0 => SurfaceChange::Created,
            1 => SurfaceChange::Recreated,
            _ => SurfaceChange::Disposed,
        })
    }

    fn decode_frame_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameTick(FrameTickEvent {
            frame_index: self.read_u64()?,
            dropped_ticks: self.read_u64()?,
            deferred: self.read_bool()?,
        }))
    }

    fn decode_scene_update(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SceneUpdate(SceneUpdateEvent {
            frame_index: self.read_u64()?,
            kind: self.read_kind()?,
            visuals: self.read_u32()?,
            layers: self.read_u32()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp_us: self.read_u64()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp_us: self.read_u64()?,
        }))
    }

    fn decode_surface(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Surface(SurfaceEvent {
            frame_index: self.read_u64()?,
            layer_root: self.read_visual()?,
            change: self.read_change()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            kind: self.read_kind()?,
            build_us: self.read_u64()?,
            paint_us: self.read_u64()?,
            composite_us: self.read_u64()?,
            layer_count: self.read_u32()?,
            painted_layers: self.read_u32()?,
        }))
    }

    fn decode_damage_rects_count(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let layer_root = self.read_visual()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::DamageRectsCount {
            frame_index,
            layer_root,
            count,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_TICK => self.decode_frame_tick(),
            TAG_SCENE_UPDATE => self.decode_scene_update(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_SURFACE => self.decode_surface(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_DAMAGE_RECTS_COUNT => self.decode_damage_rects_count(),
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

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            kind: BuildKind::Incremental,
            build_us: 120,
            paint_us: 340,
            composite_us: 56,
            layer_count: 3,
            painted_layers: 2,
        }
    }

    #[test]
    fn frame_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_summary();
        rec.on_frame_summary(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1, "one event");
        match &events[0] {
            RecordedEvent::FrameSummary(s) => {
                assert_eq!(s.frame_index, orig.frame_index, "frame");
                assert_eq!(s.kind, orig.kind, "kind");
                assert_eq!(s.build_us, orig.build_us, "build");
                assert_eq!(s.paint_us, orig.paint_us, "paint");
                assert_eq!(s.composite_us, orig.composite_us, "composite");
                assert_eq!(s.layer_count, orig.layer_count, "layers");
                assert_eq!(s.painted_layers, orig.painted_layers, "painted");
            }
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn surface_events_keep_the_layer_identity() {
        let mut rec = RecorderSink::new();
        rec.on_surface(&SurfaceEvent {
            frame_index: 2,
            layer_root: VisualId::new(9, 3),
            change: SurfaceChange::Disposed,
            width: 320,
            height: 200,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::Surface(e)] => {
                assert_eq!(e.layer_root, VisualId::new(9, 3), "layer");
                assert_eq!(e.change, SurfaceChange::Disposed, "change");
                assert_eq!((e.width, e.height), (320, 200), "size");
            }
            other => panic!("expected one Surface event, got {other:?}"),
        }
    }

    #[test]
    fn frame_sequence_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_frame_tick(&FrameTickEvent {
            frame_index: 7,
            dropped_ticks: 1,
            deferred: true,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 7,
            phase: PhaseKind::Build,
            timestamp_us: 1000,
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 7,
            phase: PhaseKind::Build,
            timestamp_us: 1100,
        });
        rec.on_scene_update(&SceneUpdateEvent {
            frame_index: 7,
            kind: BuildKind::Incremental,
            visuals: 4,
            layers: 3,
        });
        rec.on_damage_rects(7, VisualId::new(0, 0), &[]);
        rec.on_frame_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6, "all events decoded");
        assert!(
            matches!(
                events[0],
                RecordedEvent::FrameTick(FrameTickEvent {
                    dropped_ticks: 1,
                    deferred: true,
                    ..
                })
            ),
            "tick"
        );
        assert!(matches!(events[1], RecordedEvent::PhaseBegin(_)), "begin");
        assert!(matches!(events[2], RecordedEvent::PhaseEnd(_)), "end");
        assert!(
            matches!(
                events[3],
                RecordedEvent::SceneUpdate(SceneUpdateEvent { visuals: 4, .. })
            ),
            "scene update"
        );
        assert!(
            matches!(
                events[4],
                RecordedEvent::DamageRectsCount { frame_index: 7, count: 0, .. }
            ),
            "damage"
        );
        assert!(matches!(events[5], RecordedEvent::FrameSummary(_)), "summary");
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_frame_summary(&sample_summary());
        rec.on_frame_summary(&sample_summary());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 1, "partial record dropped");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty(), "no events");
    }
}
