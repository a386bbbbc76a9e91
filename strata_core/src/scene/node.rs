// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-visual scene nodes.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};

use crate::draw::DrawOp;
use crate::visual::VisualId;

/// The renderable snapshot of one visual.
///
/// Nodes are produced by the scene builder and never mutated once a scene is
/// published. Geometry is resolved at build time: [`transform`](Self::transform)
/// maps the visual's local coordinates to screen coordinates, which are also
/// the coordinates of every layer surface.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
    pub(crate) visual: VisualId,
    pub(crate) parent: Option<VisualId>,
    pub(crate) bounds: Rect,
    pub(crate) transform: Affine,
    pub(crate) clip: Option<Rect>,
    pub(crate) opacity: f32,
    pub(crate) layer_opacity: f32,
    pub(crate) visible: bool,
    pub(crate) draw_ops: Vec<DrawOp>,
    pub(crate) children: Vec<VisualId>,
    pub(crate) layer_root: VisualId,
}

impl VisualNode {
    /// Returns the visual this node was built from.
    #[inline]
    #[must_use]
    pub fn visual(&self) -> VisualId {
        self.visual
    }

    /// Returns the parent visual, or `None` for the render root.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<VisualId> {
        self.parent
    }

    /// Returns the bounds in the parent's coordinates.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns the local-to-screen transform.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Returns the accumulated clip in screen coordinates, if any ancestor or
    /// the visual itself clips.
    #[inline]
    #[must_use]
    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    /// Returns the visual's own opacity.
    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Returns the opacity to apply when painting this node onto its layer.
    ///
    /// This is the product of the node's and its ancestors' opacities, up to
    /// but excluding the layer root. The layer root's own opacity is applied
    /// when the layer is composited.
    #[inline]
    #[must_use]
    pub fn layer_opacity(&self) -> f32 {
        self.layer_opacity
    }

    /// Returns whether the node is painted at all.
    ///
    /// `false` if the visual or an ancestor is hidden or fully transparent.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the recorded draw operations in local coordinates.
    #[inline]
    #[must_use]
    pub fn draw_ops(&self) -> &[DrawOp] {
        &self.draw_ops
    }

    /// Returns the child visuals in paint order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[VisualId] {
        &self.children
    }

    /// Returns the visual owning the layer this node paints into.
    #[inline]
    #[must_use]
    pub fn layer_root(&self) -> VisualId {
        self.layer_root
    }

    /// Returns whether this node owns its own layer.
    #[inline]
    #[must_use]
    pub fn owns_layer(&self) -> bool {
        self.layer_root == self.visual
    }

    /// Returns the node's bounds in screen coordinates, clipped.
    #[must_use]
    pub fn screen_bounds(&self) -> Rect {
        let local = Rect::from_origin_size(Point::ZERO, self.bounds.size());
        let rect = self.transform.transform_rect_bbox(local);
        match self.clip {
            Some(clip) => rect.intersect(clip),
            None => rect,
        }
    }

    /// Returns the area this node covers on its layer, or `None` if painting
    /// it changes nothing.
    #[must_use]
    pub fn damage(&self) -> Option<Rect> {
        if !self.visible {
            return None;
        }
        let rect = self.screen_bounds();
        (!rect.is_zero_area()).then_some(rect)
    }

    /// Compares everything that affects painting, ignoring the child list.
    pub(crate) fn same_render_state(&self, other: &Self) -> bool {
        self.visual == other.visual
            && self.parent == other.parent
            && self.bounds == other.bounds
            && self.transform == other.transform
            && self.clip == other.clip
            && self.opacity == other.opacity
            && self.layer_opacity == other.layer_opacity
            && self.visible == other.visible
            && self.layer_root == other.layer_root
            && self.draw_ops == other.draw_ops
    }
}
