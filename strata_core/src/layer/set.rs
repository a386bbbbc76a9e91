// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered, indexed collection of layers.

use alloc::vec::Vec;
use core::slice;

use hashbrown::HashMap;

use super::scene_layer::SceneLayer;
use crate::error::SceneError;
use crate::visual::{VisualId, VisualTree};

/// The layers of one scene, in paint order.
///
/// The render root always owns the first entry, created at construction.
/// [`add`](Self::add) is the only way to create a layer; there is no removal
/// primitive. The scene builder drops layers by building a new set without
/// them.
#[derive(Debug)]
pub struct LayerSet {
    render_root: VisualId,
    layers: Vec<SceneLayer>,
    index: HashMap<VisualId, usize>,
}

impl LayerSet {
    /// Creates a set containing only the render root's layer.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Unrooted`] if the tree's render root does not
    /// carry the render-root marker.
    pub fn new<T: VisualTree + ?Sized>(tree: &T) -> Result<Self, SceneError> {
        let render_root = tree.render_root();
        let mut set = Self {
            render_root,
            layers: Vec::new(),
            index: HashMap::new(),
        };
        set.add(tree, render_root)?;
        Ok(set)
    }

    /// Appends a new layer owned by `layer_root`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateLayer`] if `layer_root` already owns a
    /// layer, or [`SceneError::Unrooted`] if it is not attached to the render
    /// root.
    pub fn add<T: VisualTree + ?Sized>(
        &mut self,
        tree: &T,
        layer_root: VisualId,
    ) -> Result<&mut SceneLayer, SceneError> {
        if self.index.contains_key(&layer_root) {
            return Err(SceneError::DuplicateLayer(layer_root));
        }
        let layer = SceneLayer::new(tree, layer_root)?;
        let pos = self.layers.len();
        self.index.insert(layer_root, pos);
        self.layers.push(layer);
        Ok(&mut self.layers[pos])
    }

    /// Appends a copy of a layer from another set, dirty region and distance
    /// included, without consulting the tree.
    pub(crate) fn carry(&mut self, layer: &SceneLayer) -> Result<(), SceneError> {
        let layer_root = layer.layer_root();
        if self.index.contains_key(&layer_root) {
            return Err(SceneError::DuplicateLayer(layer_root));
        }
        self.index.insert(layer_root, self.layers.len());
        self.layers.push(layer.clone());
        Ok(())
    }

    /// Returns a copy of this set for the next frame.
    ///
    /// Order and owners are preserved. Every layer except the render root's
    /// starts with an empty dirty region; the render root's pending damage is
    /// carried over because its surface outlives any layer boundary change.
    #[must_use]
    pub fn fork(&self) -> Self {
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                if layer.layer_root() == self.render_root {
                    layer.clone()
                } else {
                    layer.fork()
                }
            })
            .collect();
        Self {
            render_root: self.render_root,
            layers,
            index: self.index.clone(),
        }
    }

    /// Returns the render root that owns the first layer.
    #[inline]
    #[must_use]
    pub fn render_root(&self) -> VisualId {
        self.render_root
    }

    /// Returns `true` if any layer has pending damage.
    #[must_use]
    pub fn has_dirty(&self) -> bool {
        self.layers.iter().any(|layer| !layer.dirty().is_empty())
    }

    /// Returns the number of layers (at least one).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always `false`: the render root's layer exists from construction.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns whether `visual` owns a layer.
    #[must_use]
    pub fn contains(&self, visual: VisualId) -> bool {
        self.index.contains_key(&visual)
    }

    /// Returns the layer owned by `visual`.
    #[must_use]
    pub fn get(&self, visual: VisualId) -> Option<&SceneLayer> {
        self.index.get(&visual).map(|&pos| &self.layers[pos])
    }

    /// Returns the layer owned by `visual` for modification.
    pub fn get_mut(&mut self, visual: VisualId) -> Option<&mut SceneLayer> {
        self.index.get(&visual).map(|&pos| &mut self.layers[pos])
    }

    /// Returns the layer at paint position `pos`.
    #[must_use]
    pub fn layer_at(&self, pos: usize) -> Option<&SceneLayer> {
        self.layers.get(pos)
    }

    /// Returns the paint position of the layer owned by `visual`.
    #[must_use]
    pub fn position(&self, visual: VisualId) -> Option<usize> {
        self.index.get(&visual).copied()
    }

    /// Returns an iterator over the layers in paint order.
    pub fn iter(&self) -> Layers<'_> {
        Layers {
            inner: self.layers.iter(),
        }
    }

    /// Returns an iterator over the owners of all layers in paint order.
    pub fn roots(&self) -> impl Iterator<Item = VisualId> + '_ {
        self.layers.iter().map(SceneLayer::layer_root)
    }

    /// Empties every layer's dirty region.
    pub fn clear_dirty(&mut self) {
        for layer in &mut self.layers {
            layer.dirty_mut().clear();
        }
    }
}

impl<'a> IntoIterator for &'a LayerSet {
    type Item = &'a SceneLayer;
    type IntoIter = Layers<'a>;

    fn into_iter(self) -> Layers<'a> {
        self.iter()
    }
}

/// An iterator over the layers of a [`LayerSet`] in paint order.
///
/// Created by [`LayerSet::iter`].
#[derive(Debug, Clone)]
pub struct Layers<'a> {
    inner: slice::Iter<'a, SceneLayer>,
}

impl<'a> Iterator for Layers<'a> {
    type Item = &'a SceneLayer;

    fn next(&mut self) -> Option<&'a SceneLayer> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Layers<'_> {}
