// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The deferred frame loop.
//!
//! [`DeferredRenderer`] turns ticks into frames:
//!
//! ```text
//!   tick ──► schedule (batch dirty visuals) ──► Dispatcher::post
//!                                                  │
//!   ┌──────────────────────────────────────────────┘
//!   ▼  owning context
//!   build (update_all | update × N) ──► sync surfaces ──► paint dirty ──► composite ──► publish
//! ```
//!
//! At most one frame is in flight. Ticks arriving meanwhile are dropped or
//! deferred according to [`TickPolicy`].

use std::fmt;
use std::mem;
use std::sync::{Arc, Weak};
use std::time::Instant;

use hashbrown::{HashMap, HashSet};
use kurbo::Rect;
use log::{debug, error, trace};
use parking_lot::{Mutex, RwLock};
use strata_core::builder::{SceneBuilder, SceneUpdate};
use strata_core::error::SceneError;
use strata_core::scene::Scene;
#[cfg(feature = "trace-rich")]
use strata_core::trace::DamageRect;
use strata_core::trace::{
    BuildKind, FrameSummaryBuilder, FrameTickEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    SceneUpdateEvent, SurfaceChange, SurfaceEvent, TraceSink, Tracer,
};
use strata_core::visual::{VisualId, VisualTree};

use crate::config::{RendererConfig, TickPolicy};
use crate::dispatch::Dispatcher;
use crate::error::RenderError;
use crate::paint::paint_layer;
use crate::surface::{CompositeLayer, LayerFactory, LayerSurface, PixelSize, RenderTarget};
use crate::tick::{TickSource, TickToken};

/// Where the frame loop currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// Not subscribed to ticks. The initial phase.
    Stopped,
    /// Waiting for the next tick.
    Idle,
    /// A frame job has been posted and is building the scene.
    AwaitingSceneUpdate,
    /// The frame job is painting and compositing.
    Compositing,
    /// A frame failed. Ticks are ignored until [`DeferredRenderer::reset`].
    Faulted,
}

/// What the last completed frame did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameOutcome {
    /// Frame counter.
    pub frame_index: u64,
    /// Full or incremental build.
    pub kind: BuildKind,
    /// Number of layers in the published scene.
    pub layer_count: u32,
    /// Number of layers repainted.
    pub painted_layers: u32,
    /// Whether the render target was composited.
    pub composited: bool,
}

/// Work captured by one tick.
#[derive(Debug)]
struct Batch {
    full: bool,
    visuals: Vec<VisualId>,
    tick: FrameTickEvent,
}

#[derive(Debug)]
struct Control {
    phase: RenderPhase,
    pending: Vec<VisualId>,
    pending_set: HashSet<VisualId>,
    full_build: bool,
    frame_index: u64,
    dropped_ticks: u64,
    deferred: bool,
    error: Option<RenderError>,
    last_outcome: Option<FrameOutcome>,
}

impl Control {
    fn new() -> Self {
        Self {
            phase: RenderPhase::Stopped,
            pending: Vec::new(),
            pending_set: HashSet::new(),
            full_build: true,
            frame_index: 0,
            dropped_ticks: 0,
            deferred: false,
            error: None,
            last_outcome: None,
        }
    }

    fn has_work(&self) -> bool {
        self.full_build || !self.pending.is_empty()
    }

    /// Moves the accumulated work into a batch and marks a frame in flight.
    fn schedule(&mut self, deferred: bool) -> Batch {
        self.phase = RenderPhase::AwaitingSceneUpdate;
        self.frame_index += 1;
        self.pending_set.clear();
        Batch {
            full: mem::take(&mut self.full_build),
            visuals: mem::take(&mut self.pending),
            tick: FrameTickEvent {
                frame_index: self.frame_index,
                dropped_ticks: mem::take(&mut self.dropped_ticks),
                deferred,
            },
        }
    }
}

struct FrameState<T: ?Sized> {
    builder: Box<dyn SceneUpdate<T> + Send>,
    factory: Box<dyn LayerFactory>,
    target: Box<dyn RenderTarget>,
    surfaces: HashMap<VisualId, Box<dyn LayerSurface>>,
    sink: Option<Box<dyn TraceSink + Send>>,
    epoch: Instant,
}

impl<T: ?Sized> FrameState<T> {
    fn dispose_all(&mut self) {
        for (layer_root, surface) in self.surfaces.drain() {
            debug!("disposing layer surface for {layer_root:?}");
            self.factory.dispose_layer(layer_root, surface);
        }
    }
}

struct Shared<T> {
    tree: Arc<RwLock<T>>,
    dispatcher: Arc<dyn Dispatcher>,
    config: RendererConfig,
    control: Mutex<Control>,
    // Lock order: `frame` before `control`.
    frame: Mutex<FrameState<T>>,
    scene: RwLock<Option<Arc<Scene>>>,
}

impl<T: VisualTree + Send + Sync + 'static> Shared<T> {
    fn on_tick(self: &Arc<Self>) {
        let batch = {
            let mut control = self.control.lock();
            match control.phase {
                RenderPhase::Stopped | RenderPhase::Faulted => return,
                RenderPhase::AwaitingSceneUpdate | RenderPhase::Compositing => {
                    match self.config.tick_policy {
                        TickPolicy::Drop => {
                            control.dropped_ticks += 1;
                            trace!(
                                "tick dropped: frame {} still in flight",
                                control.frame_index
                            );
                        }
                        TickPolicy::Defer => control.deferred = true,
                    }
                    return;
                }
                RenderPhase::Idle => {}
            }
            if !control.has_work() {
                return;
            }
            control.schedule(false)
        };
        self.post(batch);
    }

    fn post(self: &Arc<Self>, batch: Batch) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.dispatcher.post(
            self.config.priority,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.run_frame(batch);
                }
            }),
        );
    }

    fn run_frame(self: &Arc<Self>, batch: Batch) {
        let mut frame = self.frame.lock();
        let frame_index = batch.tick.frame_index;
        {
            let control = self.control.lock();
            // Stopped, or restarted with a newer frame, after this one was posted.
            if control.phase != RenderPhase::AwaitingSceneUpdate
                || control.frame_index != frame_index
            {
                return;
            }
        }

        let result = self.produce_frame(&mut frame, batch);

        let next = {
            let mut control = self.control.lock();
            match result {
                Ok(outcome) => {
                    control.last_outcome = Some(outcome);
                    control.phase = RenderPhase::Idle;
                }
                Err(err) => {
                    error!("frame {frame_index} failed: {err}");
                    control.error = Some(err);
                    control.phase = RenderPhase::Faulted;
                }
            }
            let deferred = mem::take(&mut control.deferred);
            (deferred && control.phase == RenderPhase::Idle && control.has_work())
                .then(|| control.schedule(true))
        };
        drop(frame);

        if let Some(batch) = next {
            self.post(batch);
        }
    }

    fn produce_frame(
        &self,
        frame: &mut FrameState<T>,
        batch: Batch,
    ) -> Result<FrameOutcome, RenderError> {
        let frame_index = batch.tick.frame_index;
        let FrameState {
            builder,
            factory,
            target,
            surfaces,
            sink,
            epoch,
        } = frame;
        let epoch = *epoch;
        let build_start = elapsed_us(epoch);
        let mut tracer = Tracer::from_option(sink.as_deref_mut().map(|s| s as &mut dyn TraceSink));
        tracer.frame_tick(&batch.tick);

        // -- Build --
        let previous = self.scene.read().clone();
        let tree = self.tree.read();
        let full = batch.full
            || previous
                .as_ref()
                .is_none_or(|scene| scene.size() != tree.client_size());
        let kind = if full {
            BuildKind::Full
        } else {
            BuildKind::Incremental
        };
        let mut summary = FrameSummaryBuilder::new(frame_index, kind);
        summary.phase_begin(PhaseKind::Build, build_start);
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Build,
            timestamp_us: build_start,
        });

        let (mut scene, updates) = match previous {
            Some(previous) if !full => {
                let mut scene = previous.fork();
                for &visual in &batch.visuals {
                    builder.update(&*tree, &mut scene, visual)?;
                }
                (scene, batch.visuals.len())
            }
            _ => {
                let mut scene = Scene::new(&*tree)?;
                builder.update_all(&*tree, &mut scene)?;
                (scene, 0)
            }
        };
        drop(tree);

        let build_end = elapsed_us(epoch);
        summary.phase_end(PhaseKind::Build, build_end);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Build,
            timestamp_us: build_end,
        });
        let layer_count = count(scene.layers().len());
        tracer.scene_update(&SceneUpdateEvent {
            frame_index,
            kind,
            visuals: count(updates),
            layers: layer_count,
        });
        summary.set_layer_count(layer_count);

        self.control.lock().phase = RenderPhase::Compositing;

        // -- Surfaces --
        let size = PixelSize::try_from_size(scene.size())?;
        let layers = scene.layers();
        let stale: Vec<VisualId> = surfaces
            .iter()
            .filter(|(root, surface)| !layers.contains(**root) || surface.size() != size)
            .map(|(root, _)| *root)
            .collect();
        let mut resized = HashSet::new();
        for layer_root in stale {
            let Some(surface) = surfaces.remove(&layer_root) else {
                continue;
            };
            if layers.contains(layer_root) {
                resized.insert(layer_root);
            } else {
                debug!("layer {layer_root:?} removed, disposing its surface");
                tracer.surface(&SurfaceEvent {
                    frame_index,
                    layer_root,
                    change: SurfaceChange::Disposed,
                    width: surface.size().width,
                    height: surface.size().height,
                });
            }
            factory.dispose_layer(layer_root, surface);
        }

        let mut fresh = HashSet::new();
        if !size.is_empty() {
            for layer_root in layers.roots() {
                if surfaces.contains_key(&layer_root) {
                    continue;
                }
                let surface = factory.create_layer(layer_root, size)?;
                let change = if resized.contains(&layer_root) {
                    SurfaceChange::Recreated
                } else {
                    SurfaceChange::Created
                };
                debug!("{change:?} {size} surface for layer {layer_root:?}");
                tracer.surface(&SurfaceEvent {
                    frame_index,
                    layer_root,
                    change,
                    width: size.width,
                    height: size.height,
                });
                surfaces.insert(layer_root, surface);
                fresh.insert(layer_root);
            }
        }

        // -- Paint --
        let composited = !size.is_empty() && (layers.has_dirty() || !fresh.is_empty());
        let mut painted = 0_u32;
        if composited {
            let paint_start = elapsed_us(epoch);
            summary.phase_begin(PhaseKind::Paint, paint_start);
            tracer.phase_begin(&PhaseBeginEvent {
                frame_index,
                phase: PhaseKind::Paint,
                timestamp_us: paint_start,
            });
            for layer in layers {
                let layer_root = layer.layer_root();
                let areas: Vec<Rect> = if fresh.contains(&layer_root) {
                    vec![size.to_rect()]
                } else {
                    layer.dirty().iter().collect()
                };
                if areas.is_empty() {
                    continue;
                }
                let surface = surfaces.get_mut(&layer_root).ok_or(SceneError::LayerNotFound {
                    visual: layer_root,
                    layer_root,
                })?;
                #[cfg(feature = "trace-rich")]
                {
                    let rects: Vec<DamageRect> =
                        areas.iter().map(|r| DamageRect::from_rect(*r)).collect();
                    tracer.damage_rects(frame_index, layer_root, &rects);
                }
                paint_layer(&scene, layer_root, areas.into_iter(), &mut **surface);
                painted += 1;
            }
            let paint_end = elapsed_us(epoch);
            summary.phase_end(PhaseKind::Paint, paint_end);
            tracer.phase_end(&PhaseEndEvent {
                frame_index,
                phase: PhaseKind::Paint,
                timestamp_us: paint_end,
            });
        }
        scene.layers_mut().clear_dirty();

        // -- Composite --
        if composited {
            let composite_start = elapsed_us(epoch);
            summary.phase_begin(PhaseKind::Composite, composite_start);
            tracer.phase_begin(&PhaseBeginEvent {
                frame_index,
                phase: PhaseKind::Composite,
                timestamp_us: composite_start,
            });
            let mut entries = Vec::with_capacity(scene.layers().len());
            for layer_root in scene.layers().roots() {
                let owner = scene.find_node(layer_root)?;
                let surface = surfaces.get(&layer_root).ok_or(SceneError::LayerNotFound {
                    visual: layer_root,
                    layer_root,
                })?;
                entries.push(CompositeLayer {
                    layer_root,
                    surface: &**surface,
                    opacity: owner.opacity(),
                    clip: owner.clip(),
                });
            }
            target.composite(&entries)?;
            let composite_end = elapsed_us(epoch);
            summary.phase_end(PhaseKind::Composite, composite_end);
            tracer.phase_end(&PhaseEndEvent {
                frame_index,
                phase: PhaseKind::Composite,
                timestamp_us: composite_end,
            });
        }

        // -- Publish --
        *self.scene.write() = Some(Arc::new(scene));

        summary.set_painted_layers(painted);
        tracer.frame_summary(&summary.finish());
        Ok(FrameOutcome {
            frame_index,
            kind,
            layer_count,
            painted_layers: painted,
            composited,
        })
    }
}

fn elapsed_us(epoch: Instant) -> u64 {
    u64::try_from(epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// A retained-mode renderer that builds scenes off the tick path.
///
/// Ticks from a [`TickSource`] schedule frame jobs through a [`Dispatcher`].
/// Each job runs on the tree's owning context and:
///
/// 1. builds the next [`Scene`], in full on the first frame, after
///    [`invalidate_all`](Self::invalidate_all), or when the client size
///    changed, and otherwise with one incremental update per visual passed to
///    [`add_dirty`](Self::add_dirty);
/// 2. releases surfaces of layers that are gone and creates surfaces for new
///    ones through the [`LayerFactory`];
/// 3. repaints the dirty regions of every layer (new surfaces in full);
/// 4. hands every layer to the [`RenderTarget`] in paint order;
/// 5. publishes the scene, replacing the previous [`Arc<Scene>`].
///
/// Nothing is painted or composited if no layer is dirty and no surface was
/// created. The first error aborts the frame and moves the renderer to
/// [`RenderPhase::Faulted`].
///
/// Methods on this type must not be called from inside a frame job.
pub struct DeferredRenderer<T: VisualTree + Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
    ticks: Arc<dyn TickSource>,
    subscription: Mutex<Option<TickToken>>,
}

impl<T: VisualTree + Send + Sync + 'static> fmt::Debug for DeferredRenderer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.shared.control.lock();
        f.debug_struct("DeferredRenderer")
            .field("phase", &control.phase)
            .field("frame_index", &control.frame_index)
            .field("pending", &control.pending.len())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl<T: VisualTree + Send + Sync + 'static> DeferredRenderer<T> {
    /// Creates a stopped renderer.
    ///
    /// The host mutates `tree` through its write lock; frame jobs take the
    /// read lock while building.
    #[must_use]
    pub fn new(
        tree: Arc<RwLock<T>>,
        ticks: Arc<dyn TickSource>,
        dispatcher: Arc<dyn Dispatcher>,
        factory: Box<dyn LayerFactory>,
        target: Box<dyn RenderTarget>,
        config: RendererConfig,
    ) -> Self {
        let frame = FrameState {
            builder: Box::new(SceneBuilder::new()),
            factory,
            target,
            surfaces: HashMap::new(),
            sink: None,
            epoch: Instant::now(),
        };
        Self {
            shared: Arc::new(Shared {
                tree,
                dispatcher,
                config,
                control: Mutex::new(Control::new()),
                frame: Mutex::new(frame),
                scene: RwLock::new(None),
            }),
            ticks,
            subscription: Mutex::new(None),
        }
    }

    /// Replaces the scene builder.
    #[must_use]
    pub fn with_scene_builder(self, builder: impl SceneUpdate<T> + Send + 'static) -> Self {
        self.shared.frame.lock().builder = Box::new(builder);
        self
    }

    /// Installs or removes the trace sink receiving frame-loop events.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink + Send>>) {
        self.shared.frame.lock().sink = sink;
    }

    /// Returns the shared visual tree.
    #[must_use]
    pub fn tree(&self) -> &Arc<RwLock<T>> {
        &self.shared.tree
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> RendererConfig {
        self.shared.config
    }

    /// Subscribes to ticks. The next tick performs a full build.
    ///
    /// Does nothing unless the renderer is stopped.
    pub fn start(&self) {
        let mut subscription = self.subscription.lock();
        {
            let mut control = self.shared.control.lock();
            if control.phase != RenderPhase::Stopped {
                return;
            }
            control.phase = RenderPhase::Idle;
            control.full_build = true;
            control.deferred = false;
        }
        let weak = Arc::downgrade(&self.shared);
        *subscription = Some(self.ticks.subscribe(Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_tick();
            }
        })));
    }

    /// Unsubscribes from ticks, waits for an in-flight frame, and releases
    /// every layer surface.
    ///
    /// The last published scene stays readable through
    /// [`scene`](Self::scene). A frame job still queued in the dispatcher
    /// does nothing when it runs.
    pub fn stop(&self) {
        if let Some(token) = self.subscription.lock().take() {
            self.ticks.unsubscribe(token);
        }
        let mut frame = self.shared.frame.lock();
        {
            let mut control = self.shared.control.lock();
            control.phase = RenderPhase::Stopped;
            control.deferred = false;
        }
        frame.dispose_all();
    }

    /// Queues `visual` for an incremental update on the next frame.
    ///
    /// Repeated calls before the next tick coalesce into one update.
    pub fn add_dirty(&self, visual: VisualId) {
        let mut control = self.shared.control.lock();
        if control.pending_set.insert(visual) {
            control.pending.push(visual);
        }
    }

    /// Makes the next frame rebuild the whole scene.
    pub fn invalidate_all(&self) {
        self.shared.control.lock().full_build = true;
    }

    /// Returns the most recently published scene.
    #[must_use]
    pub fn scene(&self) -> Option<Arc<Scene>> {
        self.shared.scene.read().clone()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> RenderPhase {
        self.shared.control.lock().phase
    }

    /// Returns what the last successful frame did.
    #[must_use]
    pub fn last_outcome(&self) -> Option<FrameOutcome> {
        self.shared.control.lock().last_outcome
    }

    /// Takes the error that faulted the renderer, if any.
    pub fn take_error(&self) -> Option<RenderError> {
        self.shared.control.lock().error.take()
    }

    /// Clears a fault and schedules a full build on the next tick.
    ///
    /// A faulted renderer goes back to [`RenderPhase::Idle`]; other phases
    /// are left alone.
    pub fn reset(&self) {
        let mut control = self.shared.control.lock();
        control.error = None;
        control.full_build = true;
        control.deferred = false;
        if control.phase == RenderPhase::Faulted {
            control.phase = RenderPhase::Idle;
        }
    }

    /// Returns the number of layer surfaces currently held.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.shared.frame.lock().surfaces.len()
    }
}

impl<T: VisualTree + Send + Sync + 'static> Drop for DeferredRenderer<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
