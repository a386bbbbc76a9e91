// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene construction and the layer-boundary policy.
//!
//! [`SceneBuilder`] turns a [`VisualTree`] into a [`Scene`], either in full
//! ([`update_all`](SceneUpdate::update_all)) or for the subtree below one
//! changed visual ([`update`](SceneUpdate::update)).
//!
//! # Layer boundaries
//!
//! A visual starts its own layer when its subtree cannot be painted directly
//! onto its parent's surface, as decided by [`requires_isolation`]. Only the
//! outermost such visual of a nested chain gets a layer: everything below it
//! paints into that layer, with nested opacity applied per draw. Hidden and
//! fully transparent subtrees get nodes but never layers.
//!
//! The [`LayerSet`] is kept in tree pre-order, so an ancestor's layer is
//! always composited before the layers nested below it, and sibling layers
//! follow z-order. Whenever an incremental update changes which visuals own
//! layers, the set is rebuilt in that order and surviving layers keep their
//! pending damage.
//!
//! # Damage
//!
//! An incremental update dirties the old screen bounds of every rebuilt node
//! on the layer it used to paint into, and the new screen bounds on the layer
//! it paints into now. Descendants whose render state did not change add no
//! damage; the changed visual itself always does.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::{Affine, Point, Rect};
use log::debug;

use crate::error::SceneError;
use crate::layer::LayerSet;
use crate::scene::{Scene, VisualNode};
use crate::visual::{VisualId, VisualProps, VisualTree, is_attached};

/// Returns whether a visual with these properties must be composited from its
/// own layer.
///
/// True for partial opacity (strictly between 0 and 1) and for visuals the
/// host flags as [`isolate`](crate::visual::VisualFlags::isolate).
#[must_use]
pub fn requires_isolation(props: &VisualProps) -> bool {
    props.flags.isolate || (props.opacity > 0.0 && props.opacity < 1.0)
}

/// The two entry points that turn a visual tree into a scene.
///
/// Both run to completion synchronously on the tree's owning context.
pub trait SceneUpdate<T: VisualTree + ?Sized> {
    /// Rebuilds `scene` from scratch and marks every layer fully dirty.
    ///
    /// # Errors
    ///
    /// Returns a [`SceneError`] if a layer cannot be created for a visual the
    /// traversal reached.
    fn update_all(&mut self, tree: &T, scene: &mut Scene) -> Result<(), SceneError>;

    /// Rebuilds the part of `scene` rooted at `visual` and records the damage.
    ///
    /// `visual` may be newly inserted, moved, or no longer attached.
    ///
    /// # Errors
    ///
    /// Returns a [`SceneError`] if the layer set cannot be rebuilt or a node
    /// refers to a layer that does not exist.
    fn update(&mut self, tree: &T, scene: &mut Scene, visual: VisualId) -> Result<(), SceneError>;
}

/// The default [`SceneUpdate`] implementation.
///
/// Holds scratch buffers reused across calls.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    built: Vec<VisualId>,
    removed: HashMap<VisualId, Arc<VisualNode>>,
}

/// State inherited from the parent during traversal.
#[derive(Clone, Copy, Debug)]
struct Inherited {
    parent: Option<VisualId>,
    transform: Affine,
    clip: Option<Rect>,
    layer_root: VisualId,
    isolated: bool,
    visible: bool,
    layer_opacity: f32,
}

impl Inherited {
    fn root(root: VisualId) -> Self {
        Self {
            parent: None,
            transform: Affine::IDENTITY,
            clip: None,
            layer_root: root,
            isolated: false,
            visible: true,
            layer_opacity: 1.0,
        }
    }

    fn below(node: &VisualNode, render_root: VisualId) -> Self {
        Self {
            parent: Some(node.visual),
            transform: node.transform,
            clip: node.clip,
            layer_root: node.layer_root,
            isolated: node.layer_root != render_root,
            visible: node.visible,
            layer_opacity: node.layer_opacity,
        }
    }
}

impl SceneBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `visual` and its subtree under `ctx`, in pre-order.
    ///
    /// Nodes already present for any visual reached are moved into
    /// `self.removed` first, so a visual moved in from elsewhere is not left
    /// behind in its old parent's child list.
    fn build<T: VisualTree + ?Sized>(
        &mut self,
        tree: &T,
        scene: &mut Scene,
        visual: VisualId,
        ctx: Inherited,
    ) {
        let mut stack = vec![(visual, ctx)];
        while let Some((visual, ctx)) = stack.pop() {
            let old_parent = scene.take_subtree(visual, &mut self.removed);
            // A parent rebuilt in this pass already lists its children.
            if old_parent != ctx.parent {
                if let Some(parent) = old_parent.and_then(|p| scene.node_mut(p)) {
                    parent.children.retain(|&c| c != visual);
                }
            }

            let props = tree.props(visual);
            let transform = ctx.transform * Affine::translate(props.bounds.origin().to_vec2());
            let mut clip = ctx.clip;
            if props.flags.clip_to_bounds {
                let local = Rect::from_origin_size(Point::ZERO, props.bounds.size());
                clip = Some(intersect(clip, transform.transform_rect_bbox(local)));
            }
            if let Some(own) = props.clip {
                clip = Some(intersect(clip, transform.transform_rect_bbox(own)));
            }

            let visible = ctx.visible && !props.flags.hidden && props.opacity > 0.0;
            let is_root = tree.is_render_root(visual);
            let owns_layer = is_root || (visible && !ctx.isolated && requires_isolation(&props));
            let layer_root = if owns_layer { visual } else { ctx.layer_root };
            let layer_opacity = if owns_layer {
                1.0
            } else {
                ctx.layer_opacity * props.opacity
            };

            let mut draw_ops = Vec::new();
            tree.draw(visual, &mut draw_ops);
            let children = tree.children(visual);

            self.built.push(visual);
            let child_ctx = Inherited {
                parent: Some(visual),
                transform,
                clip,
                layer_root,
                isolated: ctx.isolated || (owns_layer && !is_root),
                visible,
                layer_opacity,
            };
            stack.extend(children.iter().rev().map(|&child| (child, child_ctx)));

            scene.insert_node(VisualNode {
                visual,
                parent: ctx.parent,
                bounds: props.bounds,
                transform,
                clip,
                opacity: props.opacity,
                layer_opacity,
                visible,
                draw_ops,
                children,
                layer_root,
            });
        }
    }

    /// Rebuilds the layer set in pre-order after an incremental update.
    ///
    /// Owners rebuilt by this update get a fresh layer (their depth may have
    /// changed) that keeps any pending damage. Every other layer is carried
    /// over untouched: its owner was not visited, and a detach still queued
    /// for a later update may have left it unreachable in the tree.
    fn relayer<T: VisualTree + ?Sized>(
        &self,
        tree: &T,
        scene: &mut Scene,
        current: &[VisualId],
    ) -> Result<(), SceneError> {
        let rebuilt: HashSet<VisualId> = self.built.iter().copied().collect();
        let mut layers = LayerSet::new(tree)?;
        for &layer_root in current {
            let old = scene.layers().get(layer_root);
            if layer_root != layers.render_root() {
                match old {
                    Some(old) if !rebuilt.contains(&layer_root) => {
                        layers.carry(old)?;
                        continue;
                    }
                    _ => {
                        layers.add(tree, layer_root)?;
                    }
                }
            }
            if let (Some(old), Some(new)) = (old, layers.get_mut(layer_root)) {
                new.dirty_mut().union_with(old.dirty());
            }
        }
        scene.set_layers(layers);
        Ok(())
    }

    /// Finds the visual to build so that `visual` ends up with a node, and the
    /// context to build it in.
    ///
    /// Normally that is `visual` itself under its parent's node. If the parent
    /// has no node yet (it was inserted in the same batch), the nearest
    /// ancestor whose parent does have one is built instead.
    fn locate<T: VisualTree + ?Sized>(
        tree: &T,
        scene: &Scene,
        visual: VisualId,
    ) -> Result<(VisualId, Inherited), SceneError> {
        let mut target = visual;
        loop {
            if tree.is_render_root(target) {
                return Ok((target, Inherited::root(target)));
            }
            let parent = tree.parent(target).ok_or(SceneError::Unrooted(visual))?;
            if let Some(node) = scene.get_node(parent) {
                return Ok((target, Inherited::below(node, scene.root())));
            }
            target = parent;
        }
    }

    fn reset_scratch(&mut self) {
        self.built.clear();
        self.removed.clear();
    }
}

impl<T: VisualTree + ?Sized> SceneUpdate<T> for SceneBuilder {
    fn update_all(&mut self, tree: &T, scene: &mut Scene) -> Result<(), SceneError> {
        self.reset_scratch();
        let root = tree.render_root();
        scene.clear_nodes();
        scene.set_size(tree.client_size());
        self.build(tree, scene, root, Inherited::root(root));

        let roots = layer_roots(scene);
        let mut layers = LayerSet::new(tree)?;
        for &layer_root in &roots {
            if layer_root != root {
                layers.add(tree, layer_root)?;
            }
        }
        let full = scene.size().to_rect();
        for &layer_root in &roots {
            if let Some(layer) = layers.get_mut(layer_root) {
                layer.dirty_mut().add(full);
            }
        }
        debug!(
            "full scene build: {} nodes, {} layers",
            scene.len(),
            layers.len()
        );
        scene.set_layers(layers);
        self.reset_scratch();
        Ok(())
    }

    fn update(&mut self, tree: &T, scene: &mut Scene, visual: VisualId) -> Result<(), SceneError> {
        if scene.root_node().is_none() {
            return self.update_all(tree, scene);
        }
        self.reset_scratch();
        scene.set_size(tree.client_size());
        let previous: Vec<VisualId> = scene.layers().roots().collect();

        // Old subtree out, detached from its old parent.
        if let Some(old_parent) = scene.take_subtree(visual, &mut self.removed) {
            if let Some(parent) = scene.node_mut(old_parent) {
                parent.children.retain(|&c| c != visual);
            }
        }

        // New subtree in, under whichever parent the tree reports now.
        if is_attached(tree, visual) {
            let (target, ctx) = Self::locate(tree, scene, visual)?;
            self.build(tree, scene, target, ctx);
            if let Some(parent) = ctx.parent {
                let children: Vec<VisualId> = tree
                    .children(parent)
                    .into_iter()
                    .filter(|&c| scene.contains_node(c))
                    .collect();
                if let Some(node) = scene.node_mut(parent) {
                    node.children = children;
                }
            }
        }

        // Old damage goes to the layers the old nodes painted into.
        for (&id, old) in &self.removed {
            let unchanged = id != visual
                && scene
                    .get_node(id)
                    .is_some_and(|node| node.same_render_state(old));
            if unchanged {
                continue;
            }
            if let Some(rect) = old.damage() {
                if let Some(layer) = scene.layers_mut().get_mut(old.layer_root) {
                    layer.dirty_mut().add(rect);
                }
            }
        }

        let current = layer_roots(scene);
        let moved_owner = self
            .built
            .iter()
            .any(|&id| id != scene.root() && current.contains(&id));
        if current != previous || moved_owner {
            self.relayer(tree, scene, &current)?;
            for layer_root in current.iter().filter(|r| !previous.contains(r)) {
                debug!("promoted {layer_root:?} to its own layer");
            }
            for layer_root in previous.iter().filter(|r| !current.contains(r)) {
                debug!("demoted {layer_root:?} into its parent layer");
            }
        }

        // New damage goes to the layers the new nodes paint into.
        for &id in &self.built {
            let Some(node) = scene.get_node(id) else {
                continue;
            };
            let unchanged = id != visual
                && self
                    .removed
                    .get(&id)
                    .is_some_and(|old| node.same_render_state(old));
            if unchanged {
                continue;
            }
            let Some(rect) = node.damage() else {
                continue;
            };
            let layer_root = node.layer_root;
            scene
                .layers_mut()
                .get_mut(layer_root)
                .ok_or(SceneError::LayerNotFound {
                    visual: id,
                    layer_root,
                })?
                .dirty_mut()
                .add(rect);
        }

        self.reset_scratch();
        Ok(())
    }
}

/// Returns the visuals owning a layer, in pre-order.
fn layer_roots(scene: &Scene) -> Vec<VisualId> {
    scene
        .nodes()
        .filter(|node| node.owns_layer())
        .map(VisualNode::visual)
        .collect()
}

fn intersect(clip: Option<Rect>, rect: Rect) -> Rect {
    match clip {
        Some(clip) => clip.intersect(rect),
        None => rect,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Size;

    use super::*;
    use crate::draw::{Color, DrawOp};
    use crate::store::VisualStore;
    use crate::visual::VisualFlags;

    fn fill(w: f64, h: f64, color: Color) -> Vec<DrawOp> {
        vec![DrawOp::FillRect {
            rect: Rect::new(0.0, 0.0, w, h),
            color,
        }]
    }

    fn full_build(store: &VisualStore) -> Scene {
        let mut scene = Scene::new(store).unwrap();
        SceneBuilder::new().update_all(store, &mut scene).unwrap();
        scene
    }

    /// Forks `scene` as the renderer does after painting a frame.
    fn next_frame(scene: &Scene) -> Scene {
        let mut next = scene.fork();
        next.layers_mut().clear_dirty();
        next
    }

    /// Runs one incremental update per visual the store reports as changed.
    fn apply_changes(store: &mut VisualStore, scene: &Scene) -> Scene {
        let mut next = next_frame(scene);
        let mut builder = SceneBuilder::new();
        for v in store.take_changes() {
            builder.update(&*store, &mut next, v).unwrap();
        }
        next
    }

    fn roots(scene: &Scene) -> Vec<VisualId> {
        scene.layers().roots().collect()
    }

    /// Root 100x100 holding an opaque 100x100 box holding a 100x100 box.
    fn boxes(inner_opacity: f32) -> (VisualStore, VisualId, VisualId) {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let outer = store.create_visual();
        let inner = store.create_visual();
        store.add_child(root, outer);
        store.add_child(outer, inner);
        store.set_bounds(outer, Rect::new(0.0, 0.0, 100.0, 100.0));
        store.set_bounds(inner, Rect::new(0.0, 0.0, 100.0, 100.0));
        store.set_content(inner, fill(100.0, 100.0, Color::RED));
        store.set_opacity(inner, inner_opacity);
        let _ = store.take_changes();
        (store, outer, inner)
    }

    /// Root holding `panel > layered` and a sibling `aside`, each 40x40.
    fn panel_and_aside(
        layered_opacity: f32,
        aside_opacity: f32,
    ) -> (VisualStore, VisualId, VisualId, VisualId) {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let panel = store.create_visual();
        let layered = store.create_visual();
        let aside = store.create_visual();
        store.add_child(root, panel);
        store.add_child(panel, layered);
        store.add_child(root, aside);
        store.set_bounds(panel, Rect::new(0.0, 0.0, 40.0, 40.0));
        store.set_bounds(layered, Rect::new(0.0, 0.0, 40.0, 40.0));
        store.set_bounds(aside, Rect::new(50.0, 50.0, 90.0, 90.0));
        store.set_content(layered, fill(40.0, 40.0, Color::RED));
        store.set_content(aside, fill(40.0, 40.0, Color::BLUE));
        store.set_opacity(layered, layered_opacity);
        store.set_opacity(aside, aside_opacity);
        let _ = store.take_changes();
        (store, panel, layered, aside)
    }

    #[test]
    fn requires_isolation_for_partial_opacity_and_flag() {
        let mut props = VisualProps::default();
        assert!(!requires_isolation(&props), "opaque visuals share a layer");
        props.opacity = 0.5;
        assert!(requires_isolation(&props), "partial opacity isolates");
        props.opacity = 0.0;
        assert!(!requires_isolation(&props), "fully transparent paints nothing");
        props.flags.isolate = true;
        assert!(requires_isolation(&props), "the isolate flag always isolates");
    }

    #[test]
    fn full_build_marks_root_layer_dirty() {
        let (store, outer, inner) = boxes(1.0);
        let scene = full_build(&store);
        assert_eq!(scene.len(), 3, "one node per visual");
        assert_eq!(roots(&scene), vec![store.root()], "single layer");
        let root_layer = scene.layers().get(store.root()).unwrap();
        assert!(
            root_layer
                .dirty()
                .contains_rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
            "whole client area dirty"
        );
        assert_eq!(
            scene.find_node(outer).unwrap().layer_root(),
            store.root(),
            "outer paints on the root layer"
        );
        assert_eq!(
            scene.find_node(inner).unwrap().layer_root(),
            store.root(),
            "inner paints on the root layer"
        );
    }

    #[test]
    fn opacity_flip_promotes_and_demotes() {
        let (mut store, _, inner) = boxes(0.5);
        let root = store.root();
        let mut builder = SceneBuilder::new();
        let scene = full_build(&store);
        assert_eq!(roots(&scene), vec![root, inner], "inner starts isolated");

        store.set_opacity(inner, 1.0);
        let mut demoted = next_frame(&scene);
        builder.update(&store, &mut demoted, inner).unwrap();
        assert_eq!(roots(&demoted), vec![root], "inner demoted");
        assert_eq!(
            demoted.find_node(inner).unwrap().layer_root(),
            root,
            "inner paints on the root layer"
        );
        assert!(
            demoted
                .layers()
                .get(root)
                .unwrap()
                .dirty()
                .contains_rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
            "the demoted content must be repainted on the root layer"
        );

        store.set_opacity(inner, 0.5);
        let mut promoted = next_frame(&demoted);
        builder.update(&store, &mut promoted, inner).unwrap();
        assert_eq!(roots(&promoted), vec![root, inner], "inner promoted again");
        assert_eq!(
            promoted.find_node(inner).unwrap().layer_root(),
            inner,
            "inner owns its layer"
        );
    }

    #[test]
    fn transparent_control_gets_layer_then_merges_back() {
        let mut store = VisualStore::new(Size::new(100.0, 120.0));
        let root = store.root();
        let decorator = store.create_visual();
        let border = store.create_visual();
        let canvas = store.create_visual();
        store.add_child(root, decorator);
        store.add_child(decorator, border);
        store.add_child(border, canvas);
        store.set_bounds(decorator, Rect::new(10.0, 10.0, 90.0, 110.0));
        store.set_bounds(border, Rect::new(11.0, 11.0, 69.0, 89.0));
        store.set_bounds(canvas, Rect::new(12.0, 12.0, 46.0, 66.0));
        store.set_content(border, fill(58.0, 78.0, Color::RED));
        store.set_opacity(border, 0.5);

        let mut builder = SceneBuilder::new();
        let scene = full_build(&store);
        assert_eq!(scene.find_node(root).unwrap().layer_root(), root, "root");
        assert_eq!(
            scene.find_node(border).unwrap().layer_root(),
            border,
            "border owns a layer"
        );
        assert_eq!(
            scene.find_node(canvas).unwrap().layer_root(),
            border,
            "canvas paints into the border layer"
        );
        assert_eq!(roots(&scene), vec![root, border], "two layers");

        store.set_opacity(border, 1.0);
        let mut next = next_frame(&scene);
        builder.update(&store, &mut next, border).unwrap();

        assert_eq!(
            next.find_node(border).unwrap().layer_root(),
            root,
            "border merged back"
        );
        assert_eq!(
            next.find_node(canvas).unwrap().layer_root(),
            root,
            "canvas follows its parent"
        );
        assert_eq!(roots(&next), vec![root], "one layer left");
        let dirty: Vec<_> = next.layers().get(root).unwrap().dirty().iter().collect();
        assert_eq!(
            dirty,
            vec![Rect::new(21.0, 21.0, 79.0, 99.0)],
            "border area dirty on the root layer"
        );
    }

    #[test]
    fn only_outermost_isolated_visual_gets_a_layer() {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let a = store.create_visual();
        let b = store.create_visual();
        let c = store.create_visual();
        store.add_child(root, a);
        store.add_child(a, b);
        store.add_child(root, c);
        for v in [a, b, c] {
            store.set_bounds(v, Rect::new(0.0, 0.0, 50.0, 50.0));
        }
        store.set_opacity(a, 0.5);
        store.set_opacity(b, 0.5);
        store.set_flags(
            c,
            VisualFlags {
                isolate: true,
                ..VisualFlags::default()
            },
        );

        let scene = full_build(&store);
        assert_eq!(roots(&scene), vec![root, a, c], "b nests inside a");
        let b_node = scene.find_node(b).unwrap();
        assert_eq!(b_node.layer_root(), a, "b paints into a's layer");
        assert_eq!(b_node.layer_opacity(), 0.5, "b's own opacity applied per draw");
        assert_eq!(
            scene.find_node(a).unwrap().layer_opacity(),
            1.0,
            "owner opacity is applied at composite"
        );
    }

    #[test]
    fn hidden_and_transparent_subtrees_get_no_layer() {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let hidden = store.create_visual();
        let inside = store.create_visual();
        let clear = store.create_visual();
        store.add_child(root, hidden);
        store.add_child(hidden, inside);
        store.add_child(root, clear);
        store.set_flags(
            hidden,
            VisualFlags {
                hidden: true,
                ..VisualFlags::default()
            },
        );
        store.set_opacity(inside, 0.5);
        store.set_opacity(clear, 0.0);

        let scene = full_build(&store);
        assert_eq!(roots(&scene), vec![root], "no extra layers");
        assert!(
            !scene.find_node(inside).unwrap().is_visible(),
            "hidden ancestor hides the subtree"
        );
        assert!(
            !scene.find_node(clear).unwrap().is_visible(),
            "zero opacity is invisible"
        );
    }

    #[test]
    fn promotion_keeps_layers_in_pre_order() {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let x = store.create_visual();
        let y = store.create_visual();
        let z = store.create_visual();
        store.add_child(root, x);
        store.add_child(x, y);
        store.add_child(root, z);
        for v in [x, y, z] {
            store.set_bounds(v, Rect::new(0.0, 0.0, 40.0, 40.0));
        }
        store.set_opacity(y, 0.5);
        store.set_opacity(z, 0.5);
        let scene = full_build(&store);
        assert_eq!(roots(&scene), vec![root, y, z], "y and z isolated");

        store.set_opacity(x, 0.5);
        let mut next = next_frame(&scene);
        SceneBuilder::new().update(&store, &mut next, x).unwrap();
        assert_eq!(
            roots(&next),
            vec![root, x, z],
            "x replaces its nested layer and still paints before z"
        );
    }

    #[test]
    fn update_is_idempotent() {
        let (mut store, outer, _) = boxes(1.0);
        let mut builder = SceneBuilder::new();
        let scene = full_build(&store);
        store.set_bounds(outer, Rect::new(5.0, 5.0, 60.0, 60.0));

        let mut next = next_frame(&scene);
        builder.update(&store, &mut next, outer).unwrap();
        let once = next.layers().get(store.root()).unwrap().dirty().clone();
        builder.update(&store, &mut next, outer).unwrap();
        let twice = next.layers().get(store.root()).unwrap().dirty().clone();
        assert_eq!(once, twice, "a repeated update adds no new damage");
    }

    #[test]
    fn moved_visual_dirties_old_and_new_bounds() {
        let mut store = VisualStore::new(Size::new(200.0, 200.0));
        let root = store.root();
        let v = store.create_visual();
        store.add_child(root, v);
        store.set_bounds(v, Rect::new(0.0, 0.0, 20.0, 20.0));
        let scene = full_build(&store);

        store.set_bounds(v, Rect::new(100.0, 100.0, 130.0, 130.0));
        let mut next = next_frame(&scene);
        SceneBuilder::new().update(&store, &mut next, v).unwrap();
        let dirty = next.layers().get(root).unwrap().dirty();
        assert!(
            dirty.contains_rect(Rect::new(0.0, 0.0, 20.0, 20.0)),
            "old bounds dirty"
        );
        assert!(
            dirty.contains_rect(Rect::new(100.0, 100.0, 130.0, 130.0)),
            "new bounds dirty"
        );
    }

    #[test]
    fn unchanged_descendants_add_no_damage() {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let a = store.create_visual();
        let b = store.create_visual();
        store.add_child(root, a);
        store.add_child(a, b);
        store.set_bounds(a, Rect::new(0.0, 0.0, 50.0, 50.0));
        store.set_bounds(b, Rect::new(60.0, 60.0, 80.0, 80.0));
        let scene = full_build(&store);

        store.set_content(a, fill(50.0, 50.0, Color::BLUE));
        let mut next = next_frame(&scene);
        SceneBuilder::new().update(&store, &mut next, a).unwrap();
        let dirty = next.layers().get(root).unwrap().dirty();
        assert!(
            dirty.contains_rect(Rect::new(0.0, 0.0, 50.0, 50.0)),
            "changed visual dirty"
        );
        assert!(
            !dirty.intersects(Rect::new(60.0, 60.0, 80.0, 80.0)),
            "unchanged child adds nothing"
        );
    }

    #[test]
    fn incremental_update_matches_full_build() {
        let (mut store, outer, inner) = boxes(0.5);
        let scene = full_build(&store);
        store.set_bounds(outer, Rect::new(10.0, 10.0, 90.0, 90.0));
        store.set_clip(inner, Some(Rect::new(0.0, 0.0, 30.0, 30.0)));

        let next = apply_changes(&mut store, &scene);
        assert!(
            next.structurally_eq(&full_build(&store)),
            "incremental result equals a full build"
        );
    }

    #[test]
    fn batch_detaching_a_layer_owner_while_promoting_another() {
        let (mut store, panel, layered, aside) = panel_and_aside(0.5, 1.0);
        let root = store.root();
        let scene = full_build(&store);
        assert_eq!(roots(&scene), vec![root, layered], "layered isolated");

        store.set_opacity(aside, 0.5);
        store.remove_from_parent(layered);
        let changes = store.take_changes();
        assert_eq!(
            changes,
            vec![aside, layered],
            "the promotion is applied before the detach"
        );

        let mut next = next_frame(&scene);
        let mut builder = SceneBuilder::new();
        builder.update(&store, &mut next, aside).unwrap();
        assert_eq!(
            roots(&next),
            vec![root, layered, aside],
            "detached owner kept until its own update"
        );
        assert_eq!(
            next.layers().get(layered).unwrap().distance_from_root(),
            2,
            "untouched layer carried over"
        );
        builder.update(&store, &mut next, layered).unwrap();

        assert_eq!(roots(&next), vec![root, aside], "detached layer gone");
        assert!(
            next.find_node(panel).unwrap().children().is_empty(),
            "panel no longer lists the detached visual"
        );
        assert!(
            next.structurally_eq(&full_build(&store)),
            "batch result equals a full build"
        );
    }

    #[test]
    fn batch_destroying_a_layer_owner_while_demoting_another() {
        let (mut store, _, layered, aside) = panel_and_aside(0.5, 0.5);
        let root = store.root();
        let scene = full_build(&store);
        assert_eq!(roots(&scene), vec![root, layered, aside], "two isolated");

        store.set_opacity(aside, 1.0);
        store.destroy_visual(layered);
        let next = apply_changes(&mut store, &scene);

        assert_eq!(roots(&next), vec![root], "both layers gone");
        assert!(next.find_node(layered).is_err(), "destroyed node removed");
        let dirty = next.layers().get(root).unwrap().dirty();
        assert!(
            dirty.contains_rect(Rect::new(50.0, 50.0, 90.0, 90.0)),
            "demoted content repainted on the root layer"
        );
        assert!(
            next.structurally_eq(&full_build(&store)),
            "batch result equals a full build"
        );
    }

    #[test]
    fn reparented_layer_owner_gets_its_new_depth() {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let layered = store.create_visual();
        store.add_child(root, layered);
        store.set_bounds(layered, Rect::new(0.0, 0.0, 40.0, 40.0));
        store.set_opacity(layered, 0.5);
        let scene = full_build(&store);
        assert_eq!(
            scene.layers().get(layered).unwrap().distance_from_root(),
            1,
            "direct child of the root"
        );

        let wrapper = store.create_visual();
        store.set_bounds(wrapper, Rect::new(10.0, 10.0, 60.0, 60.0));
        store.add_child(root, wrapper);
        store.reparent(layered, wrapper);
        let next = apply_changes(&mut store, &scene);

        assert_eq!(roots(&next), vec![root, layered], "same owners");
        assert_eq!(
            next.layers().get(layered).unwrap().distance_from_root(),
            2,
            "depth follows the move"
        );
        assert!(
            next.structurally_eq(&full_build(&store)),
            "batch result equals a full build"
        );
    }

    #[test]
    fn inserted_visual_is_built_in_place() {
        let (mut store, outer, inner) = boxes(1.0);
        let scene = full_build(&store);
        let added = store.create_visual();
        store.set_bounds(added, Rect::new(70.0, 70.0, 90.0, 90.0));
        store.insert_before(added, inner);

        let mut next = next_frame(&scene);
        SceneBuilder::new().update(&store, &mut next, added).unwrap();
        assert_eq!(
            next.find_node(outer).unwrap().children(),
            &[added, inner],
            "inserted before its sibling"
        );
        assert!(
            next.layers()
                .get(store.root())
                .unwrap()
                .dirty()
                .contains_rect(Rect::new(70.0, 70.0, 90.0, 90.0)),
            "new bounds dirty"
        );
        assert!(
            next.structurally_eq(&full_build(&store)),
            "equals a full build"
        );
    }

    #[test]
    fn visual_inserted_under_new_parent_builds_the_parent() {
        let (mut store, outer, inner) = boxes(1.0);
        let scene = full_build(&store);
        let wrapper = store.create_visual();
        store.set_bounds(wrapper, Rect::new(0.0, 0.0, 100.0, 100.0));
        store.add_child(store.root(), wrapper);
        store.reparent(inner, wrapper);

        let mut next = next_frame(&scene);
        SceneBuilder::new().update(&store, &mut next, inner).unwrap();
        assert_eq!(
            next.find_node(inner).unwrap().parent(),
            Some(wrapper),
            "built under the new parent"
        );
        assert!(
            next.find_node(outer).unwrap().children().is_empty(),
            "old parent no longer lists it"
        );
        assert!(
            next.structurally_eq(&full_build(&store)),
            "equals a full build"
        );
    }

    #[test]
    fn removed_visual_drops_its_nodes() {
        let (mut store, outer, inner) = boxes(0.5);
        let scene = full_build(&store);
        store.remove_from_parent(outer);

        let mut next = next_frame(&scene);
        SceneBuilder::new().update(&store, &mut next, outer).unwrap();
        assert!(next.find_node(outer).is_err(), "outer removed");
        assert!(next.find_node(inner).is_err(), "descendants removed");
        assert_eq!(roots(&next), vec![store.root()], "owned layer removed");
        assert!(
            next.find_node(store.root()).unwrap().children().is_empty(),
            "root no longer lists it"
        );
        assert!(
            next.layers()
                .get(store.root())
                .unwrap()
                .dirty()
                .contains_rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
            "old area dirty"
        );
    }

    #[test]
    fn update_on_empty_scene_builds_everything() {
        let (store, _, inner) = boxes(1.0);
        let mut scene = Scene::new(&store).unwrap();
        SceneBuilder::new().update(&store, &mut scene, inner).unwrap();
        assert!(
            scene.structurally_eq(&full_build(&store)),
            "falls back to a full build"
        );
    }

    #[test]
    fn deep_tree_builds_without_recursion() {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let mut parent = store.root();
        for _ in 0..100_000 {
            let child = store.create_visual();
            store.add_child(parent, child);
            parent = child;
        }
        let scene = full_build(&store);
        assert_eq!(scene.len(), 100_001, "one node per level");
        assert_eq!(scene.nodes().count(), 100_001, "all reachable in pre-order");
    }

    #[test]
    fn nested_transform_and_clip_resolve_to_screen() {
        let mut store = VisualStore::new(Size::new(100.0, 100.0));
        let root = store.root();
        let a = store.create_visual();
        let b = store.create_visual();
        store.add_child(root, a);
        store.add_child(a, b);
        store.set_bounds(a, Rect::new(10.0, 10.0, 40.0, 40.0));
        store.set_flags(
            a,
            VisualFlags {
                clip_to_bounds: true,
                ..VisualFlags::default()
            },
        );
        store.set_bounds(b, Rect::new(20.0, 20.0, 60.0, 60.0));

        let scene = full_build(&store);
        let node = scene.find_node(b).unwrap();
        assert_eq!(
            node.clip(),
            Some(Rect::new(10.0, 10.0, 40.0, 40.0)),
            "clip in screen space"
        );
        assert_eq!(
            node.screen_bounds(),
            Rect::new(30.0, 30.0, 40.0, 40.0),
            "bounds translated and clipped"
        );
    }
}
