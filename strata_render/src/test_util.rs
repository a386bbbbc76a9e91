// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording test doubles for the renderer's collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashMap;
use kurbo::{Affine, Point, Rect};
use parking_lot::Mutex;
use strata_core::builder::{SceneBuilder, SceneUpdate};
use strata_core::draw::{Color, ImageId};
use strata_core::error::SceneError;
use strata_core::scene::Scene;
use strata_core::visual::{VisualId, VisualTree};

use crate::dispatch::{DispatchPriority, Dispatcher, Job, TaskQueue};
use crate::surface::{
    CompositeLayer, LayerFactory, LayerSurface, PixelSize, RenderTarget, SurfaceError,
};

/// One recorded surface call, with geometry already mapped to surface
/// coordinates.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Clear(Rect),
    Fill(Rect, Color),
    Image(ImageId, Rect, f32),
    Text(Point, String, Color),
    PushClip(Rect),
    PopClip,
}

type OpLog = Arc<Mutex<Vec<Op>>>;

/// A [`LayerSurface`] that records every call.
#[derive(Debug)]
pub(crate) struct RecordingSurface {
    size: PixelSize,
    transform: Affine,
    depth: isize,
    ops: OpLog,
}

impl RecordingSurface {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self::with_log(PixelSize::new(width, height), OpLog::default())
    }

    fn with_log(size: PixelSize, ops: OpLog) -> Self {
        Self {
            size,
            transform: Affine::IDENTITY,
            depth: 0,
            ops,
        }
    }

    pub(crate) fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    pub(crate) fn fills(&self) -> Vec<(Rect, Color)> {
        fills_of(&self.ops.lock())
    }

    pub(crate) fn clip_depth(&self) -> isize {
        self.depth
    }
}

fn fills_of(ops: &[Op]) -> Vec<(Rect, Color)> {
    ops.iter()
        .filter_map(|op| match op {
            Op::Fill(rect, color) => Some((*rect, *color)),
            _ => None,
        })
        .collect()
}

impl LayerSurface for RecordingSurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn push_clip(&mut self, rect: Rect) {
        self.depth += 1;
        let rect = self.transform.transform_rect_bbox(rect);
        self.ops.lock().push(Op::PushClip(rect));
    }

    fn pop_clip(&mut self) {
        self.depth -= 1;
        self.ops.lock().push(Op::PopClip);
    }

    fn clear(&mut self, rect: Rect) {
        let rect = self.transform.transform_rect_bbox(rect);
        self.ops.lock().push(Op::Clear(rect));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = self.transform.transform_rect_bbox(rect);
        self.ops.lock().push(Op::Fill(rect, color));
    }

    fn draw_image(&mut self, image: ImageId, dest: Rect, opacity: f32) {
        let dest = self.transform.transform_rect_bbox(dest);
        self.ops.lock().push(Op::Image(image, dest, opacity));
    }

    fn draw_text(&mut self, origin: Point, text: &str, _size: f32, color: Color) {
        let origin = self.transform * origin;
        self.ops.lock().push(Op::Text(origin, text.into(), color));
    }
}

#[derive(Debug, Default)]
struct FactoryLog {
    created: Vec<(VisualId, PixelSize)>,
    disposed: Vec<VisualId>,
    ops: HashMap<VisualId, OpLog>,
    live: usize,
}

/// A [`LayerFactory`] handing out [`RecordingSurface`]s.
///
/// Clones share one log, so a test can keep a handle after boxing the factory
/// into a renderer.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingFactory {
    log: Arc<Mutex<FactoryLog>>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes the next `create_layer` call fail.
    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn created(&self) -> Vec<(VisualId, PixelSize)> {
        self.log.lock().created.clone()
    }

    pub(crate) fn disposed(&self) -> Vec<VisualId> {
        self.log.lock().disposed.clone()
    }

    pub(crate) fn live(&self) -> usize {
        self.log.lock().live
    }

    /// Returns the calls made on the newest surface of `layer_root`.
    pub(crate) fn ops(&self, layer_root: VisualId) -> Vec<Op> {
        self.log
            .lock()
            .ops
            .get(&layer_root)
            .map(|ops| ops.lock().clone())
            .unwrap_or_default()
    }

    pub(crate) fn fills(&self, layer_root: VisualId) -> Vec<(Rect, Color)> {
        fills_of(&self.ops(layer_root))
    }

    /// Forgets the calls recorded so far on every surface.
    pub(crate) fn clear_ops(&self) {
        for ops in self.log.lock().ops.values() {
            ops.lock().clear();
        }
    }
}

impl LayerFactory for RecordingFactory {
    fn create_layer(
        &mut self,
        layer_root: VisualId,
        size: PixelSize,
    ) -> Result<Box<dyn LayerSurface>, SurfaceError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SurfaceError::AllocationFailed(size));
        }
        let ops = OpLog::default();
        let mut log = self.log.lock();
        log.created.push((layer_root, size));
        log.ops.insert(layer_root, Arc::clone(&ops));
        log.live += 1;
        Ok(Box::new(RecordingSurface::with_log(size, ops)))
    }

    fn dispose_layer(&mut self, layer_root: VisualId, _surface: Box<dyn LayerSurface>) {
        let mut log = self.log.lock();
        log.disposed.push(layer_root);
        log.live -= 1;
    }
}

/// A [`RenderTarget`] recording each composite as `(layer_root, opacity)`
/// pairs.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingTarget {
    composites: Arc<Mutex<Vec<Vec<(VisualId, f32)>>>>,
}

impl RecordingTarget {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn count(&self) -> usize {
        self.composites.lock().len()
    }

    pub(crate) fn last(&self) -> Vec<(VisualId, f32)> {
        self.composites.lock().last().cloned().unwrap_or_default()
    }
}

impl RenderTarget for RecordingTarget {
    fn composite(&mut self, layers: &[CompositeLayer<'_>]) -> Result<(), SurfaceError> {
        self.composites
            .lock()
            .push(layers.iter().map(|l| (l.layer_root, l.opacity)).collect());
        Ok(())
    }
}

/// A queueing [`Dispatcher`] that records the priority of every post.
#[derive(Debug, Default)]
pub(crate) struct RecordingDispatcher {
    queue: TaskQueue,
    priorities: Mutex<Vec<DispatchPriority>>,
}

impl RecordingDispatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn priorities(&self) -> Vec<DispatchPriority> {
        self.priorities.lock().clone()
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn run_pending(&self) -> usize {
        self.queue.run_pending()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn post(&self, priority: DispatchPriority, job: Job) {
        self.priorities.lock().push(priority);
        self.queue.post(priority, job);
    }
}

/// A builder entry point invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BuildCall {
    UpdateAll,
    Update(VisualId),
}

/// Shared log of builder calls.
#[derive(Clone, Debug, Default)]
pub(crate) struct BuildLog(Arc<Mutex<Vec<BuildCall>>>);

impl BuildLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<BuildCall> {
        self.0.lock().clone()
    }
}

/// A [`SceneUpdate`] that logs each call and forwards it to a
/// [`SceneBuilder`].
#[derive(Debug)]
pub(crate) struct RecordingBuilder {
    log: BuildLog,
    inner: SceneBuilder,
}

impl RecordingBuilder {
    pub(crate) fn new(log: &BuildLog) -> Self {
        Self {
            log: log.clone(),
            inner: SceneBuilder::new(),
        }
    }
}

impl<T: VisualTree + ?Sized> SceneUpdate<T> for RecordingBuilder {
    fn update_all(&mut self, tree: &T, scene: &mut Scene) -> Result<(), SceneError> {
        self.log.0.lock().push(BuildCall::UpdateAll);
        self.inner.update_all(tree, scene)
    }

    fn update(&mut self, tree: &T, scene: &mut Scene, visual: VisualId) -> Result<(), SceneError> {
        self.log.0.lock().push(BuildCall::Update(visual));
        self.inner.update(tree, scene, visual)
    }
}
