// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual identity and the tree-provider contract.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size};

use crate::draw::DrawOp;

/// A handle to a visual in the hosted tree.
///
/// Contains both a slot index and a generation counter so that providers
/// recycling slots still hand out distinct identities. Equality and hashing are
/// stable for as long as the provider keeps the visual alive.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl VisualId {
    /// Creates a handle from a provider's slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            idx: index,
            generation,
        }
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisualId({}@gen{})", self.idx, self.generation)
    }
}

/// Per-visual boolean flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisualFlags {
    /// Whether the visual (and its subtree) is hidden.
    pub hidden: bool,
    /// Whether the visual clips itself and its descendants to its bounds.
    pub clip_to_bounds: bool,
    /// Whether the subtree needs isolated compositing regardless of opacity
    /// (clip groups, filter effects applied by the host).
    pub isolate: bool,
}

/// Render-relevant properties of one visual, as reported by the provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualProps {
    /// Bounds in the parent's coordinate space.
    pub bounds: Rect,
    /// Local opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Additional clip in the visual's local coordinate space.
    pub clip: Option<Rect>,
    /// Visibility and compositing flags.
    pub flags: VisualFlags,
}

impl Default for VisualProps {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            opacity: 1.0,
            clip: None,
            flags: VisualFlags::default(),
        }
    }
}

/// Read access to the hosted visual tree.
///
/// The scene builder only ever reads through this trait, and only from the
/// tree's owning context. Identity must stay stable for a scene's lifetime.
pub trait VisualTree {
    /// Returns the designated render root.
    fn render_root(&self) -> VisualId;

    /// Returns whether `visual` refers to a live visual.
    fn contains(&self, visual: VisualId) -> bool;

    /// Returns the parent of `visual`, or `None` for detached visuals and the
    /// render root.
    fn parent(&self, visual: VisualId) -> Option<VisualId>;

    /// Returns the children of `visual` in paint (back-to-front) order.
    fn children(&self, visual: VisualId) -> Vec<VisualId>;

    /// Returns the render properties of `visual`.
    fn props(&self, visual: VisualId) -> VisualProps;

    /// Appends the draw operations of `visual`, in local coordinates, to `ops`.
    fn draw(&self, visual: VisualId, ops: &mut Vec<DrawOp>);

    /// Returns whether `visual` carries the render-root marker.
    fn is_render_root(&self, visual: VisualId) -> bool {
        visual == self.render_root()
    }

    /// Returns the size of the render root, which is also the size of every
    /// layer surface.
    fn client_size(&self) -> Size {
        self.props(self.render_root()).bounds.size()
    }
}

/// Returns whether `visual` is live and reachable from the render root through
/// parent links.
pub fn is_attached<T: VisualTree + ?Sized>(tree: &T, visual: VisualId) -> bool {
    if !tree.contains(visual) {
        return false;
    }
    let mut current = visual;
    loop {
        if tree.is_render_root(current) {
            return true;
        }
        match tree.parent(current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}
