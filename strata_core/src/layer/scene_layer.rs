// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single compositing layer.

use crate::error::SceneError;
use crate::region::DirtyRegion;
use crate::visual::{VisualId, VisualTree};

/// One compositing surface bound to a subtree-root visual.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLayer {
    layer_root: VisualId,
    dirty: DirtyRegion,
    distance_from_root: u32,
}

impl SceneLayer {
    /// Creates a layer owned by `layer_root`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Unrooted`] if walking parent links from
    /// `layer_root` never reaches the render root.
    pub fn new<T: VisualTree + ?Sized>(tree: &T, layer_root: VisualId) -> Result<Self, SceneError> {
        Ok(Self {
            layer_root,
            dirty: DirtyRegion::new(),
            distance_from_root: distance_from_root(tree, layer_root)?,
        })
    }

    /// Returns a copy of this layer with an empty dirty region.
    #[must_use]
    pub(crate) fn fork(&self) -> Self {
        Self {
            layer_root: self.layer_root,
            dirty: DirtyRegion::new(),
            distance_from_root: self.distance_from_root,
        }
    }

    /// Returns the visual that owns this layer.
    #[inline]
    #[must_use]
    pub fn layer_root(&self) -> VisualId {
        self.layer_root
    }

    /// Returns the number of parent hops from the owner to the render root.
    #[inline]
    #[must_use]
    pub fn distance_from_root(&self) -> u32 {
        self.distance_from_root
    }

    /// Returns the area that must be repainted.
    #[inline]
    #[must_use]
    pub fn dirty(&self) -> &DirtyRegion {
        &self.dirty
    }

    /// Returns the dirty region for modification.
    #[inline]
    pub fn dirty_mut(&mut self) -> &mut DirtyRegion {
        &mut self.dirty
    }
}

fn distance_from_root<T: VisualTree + ?Sized>(
    tree: &T,
    visual: VisualId,
) -> Result<u32, SceneError> {
    let mut current = visual;
    let mut distance = 0;
    while !tree.is_render_root(current) {
        current = tree.parent(current).ok_or(SceneError::Unrooted(visual))?;
        distance += 1;
    }
    Ok(distance)
}
