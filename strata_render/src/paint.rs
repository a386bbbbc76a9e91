// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replaying scene nodes onto layer surfaces.

use kurbo::{Affine, Rect};
use strata_core::draw::DrawOp;
use strata_core::scene::{Scene, VisualNode};
use strata_core::visual::VisualId;

use crate::surface::LayerSurface;

/// Repaints `areas` of the layer owned by `layer_root`.
///
/// Each area is cleared and then every visible node of the layer that
/// overlaps it is redrawn, in paint order, clipped to the area. Returns the
/// number of node draws issued.
pub(crate) fn paint_layer(
    scene: &Scene,
    layer_root: VisualId,
    areas: impl Iterator<Item = Rect>,
    surface: &mut dyn LayerSurface,
) -> usize {
    let nodes: Vec<&VisualNode> = scene
        .nodes()
        .filter(|node| node.layer_root() == layer_root && node.is_visible())
        .collect();

    let mut draws = 0;
    for area in areas {
        surface.set_transform(Affine::IDENTITY);
        surface.push_clip(area);
        surface.clear(area);
        for node in nodes.iter().filter(|node| overlaps(node.screen_bounds(), area)) {
            paint_node(node, surface);
            draws += 1;
        }
        surface.set_transform(Affine::IDENTITY);
        surface.pop_clip();
    }
    draws
}

fn paint_node(node: &VisualNode, surface: &mut dyn LayerSurface) {
    if let Some(clip) = node.clip() {
        surface.set_transform(Affine::IDENTITY);
        surface.push_clip(clip);
    }
    surface.set_transform(node.transform());

    let alpha = node.layer_opacity();
    let mut depth = 0_usize;
    for op in node.draw_ops() {
        match op {
            DrawOp::FillRect { rect, color } => {
                surface.fill_rect(*rect, color.multiply_alpha(alpha));
            }
            DrawOp::DrawImage { image, dest } => surface.draw_image(*image, *dest, alpha),
            DrawOp::DrawText {
                origin,
                text,
                size,
                color,
            } => surface.draw_text(*origin, text, *size, color.multiply_alpha(alpha)),
            DrawOp::PushClip(rect) => {
                surface.push_clip(*rect);
                depth += 1;
            }
            // Unmatched pops would escape the node's own clip.
            DrawOp::PopClip if depth > 0 => {
                surface.pop_clip();
                depth -= 1;
            }
            DrawOp::PopClip => {}
        }
    }
    for _ in 0..depth {
        surface.pop_clip();
    }

    if node.clip().is_some() {
        surface.pop_clip();
    }
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}
