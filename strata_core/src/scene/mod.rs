// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame snapshots.
//!
//! A [`Scene`] is one frame's complete, paintable view of the visual tree: a
//! [`VisualNode`] per attached visual plus the [`LayerSet`] those nodes paint
//! into. Nodes refer to their parent, children, and layer by [`VisualId`], so
//! a scene contains no reference cycles.
//!
//! Scenes are copy-on-write. [`Scene::fork`] shares every node behind an
//! [`Arc`]; the scene builder copies a node only when it rebuilds it, so a
//! reader holding the previously published scene never observes a partial
//! update.

mod node;

use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Size;

pub use node::VisualNode;

use crate::error::SceneError;
use crate::layer::LayerSet;
use crate::visual::{VisualId, VisualTree};

/// One frame's snapshot of the visual tree.
#[derive(Debug)]
pub struct Scene {
    root: VisualId,
    size: Size,
    nodes: HashMap<VisualId, Arc<VisualNode>>,
    layers: LayerSet,
}

impl Scene {
    /// Creates an empty scene for `tree`, holding only the render root's
    /// layer.
    ///
    /// The scene has no nodes until the builder's `update_all` runs.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Unrooted`] if the tree's render root does not
    /// carry the render-root marker.
    pub fn new<T: VisualTree + ?Sized>(tree: &T) -> Result<Self, SceneError> {
        Ok(Self {
            root: tree.render_root(),
            size: tree.client_size(),
            nodes: HashMap::new(),
            layers: LayerSet::new(tree)?,
        })
    }

    /// Returns the render root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> VisualId {
        self.root
    }

    /// Returns the render root's node, or `None` before the first build.
    #[must_use]
    pub fn root_node(&self) -> Option<&VisualNode> {
        self.get_node(self.root)
    }

    /// Returns the client size this scene was built for, which is also the
    /// size of every layer surface.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Looks up the node for `visual`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NodeNotFound`] if `visual` has no node in this
    /// scene.
    pub fn find_node(&self, visual: VisualId) -> Result<&VisualNode, SceneError> {
        self.get_node(visual)
            .ok_or(SceneError::NodeNotFound(visual))
    }

    /// Returns the node for `visual`, if any.
    #[must_use]
    pub fn get_node(&self, visual: VisualId) -> Option<&VisualNode> {
        self.nodes.get(&visual).map(|node| &**node)
    }

    /// Returns whether `visual` has a node.
    #[must_use]
    pub fn contains_node(&self, visual: VisualId) -> bool {
        self.nodes.contains_key(&visual)
    }

    /// Returns the layers in paint order.
    #[inline]
    #[must_use]
    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    /// Returns the layers for modification.
    ///
    /// The renderer uses this to clear dirty regions after painting.
    #[inline]
    pub fn layers_mut(&mut self) -> &mut LayerSet {
        &mut self.layers
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` before the first build.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all nodes in paint (pre-)order.
    pub fn nodes(&self) -> Nodes<'_> {
        let mut stack = Vec::new();
        if self.nodes.contains_key(&self.root) {
            stack.push(self.root);
        }
        Nodes { scene: self, stack }
    }

    /// Returns a copy-on-write copy of this scene for the next frame.
    ///
    /// Nodes are shared with `self` until rebuilt. Layer order and owners are
    /// kept; see [`LayerSet::fork`] for how dirty regions carry over.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            root: self.root,
            size: self.size,
            nodes: self.nodes.clone(),
            layers: self.layers.fork(),
        }
    }

    /// Returns whether both scenes describe the same frame, ignoring dirty
    /// regions.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.size == other.size
            && self.nodes.len() == other.nodes.len()
            && self.nodes.iter().all(|(visual, node)| {
                other
                    .nodes
                    .get(visual)
                    .is_some_and(|theirs| **node == **theirs)
            })
            && self
                .layers
                .iter()
                .map(|l| (l.layer_root(), l.distance_from_root()))
                .eq(other
                    .layers
                    .iter()
                    .map(|l| (l.layer_root(), l.distance_from_root())))
    }

    // -- Builder access --

    pub(crate) fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub(crate) fn set_layers(&mut self, layers: LayerSet) {
        self.layers = layers;
    }

    pub(crate) fn clear_nodes(&mut self) {
        self.nodes.clear();
    }

    /// Returns the node for `visual`, copying it first if it is shared with
    /// another scene.
    pub(crate) fn node_mut(&mut self, visual: VisualId) -> Option<&mut VisualNode> {
        self.nodes.get_mut(&visual).map(Arc::make_mut)
    }

    pub(crate) fn insert_node(&mut self, node: VisualNode) {
        self.nodes.insert(node.visual, Arc::new(node));
    }

    /// Removes the node for `visual` and every node below it, moving them into
    /// `removed`. Returns the removed node's parent.
    pub(crate) fn take_subtree(
        &mut self,
        visual: VisualId,
        removed: &mut HashMap<VisualId, Arc<VisualNode>>,
    ) -> Option<VisualId> {
        let node = self.nodes.remove(&visual)?;
        let parent = node.parent;
        let mut stack: Vec<VisualId> = node.children.clone();
        removed.insert(visual, node);
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend_from_slice(&node.children);
                removed.insert(next, node);
            }
        }
        parent
    }
}

/// An iterator over the nodes of a [`Scene`] in paint (pre-)order.
///
/// Created by [`Scene::nodes`].
#[derive(Debug)]
pub struct Nodes<'a> {
    scene: &'a Scene,
    stack: Vec<VisualId>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a VisualNode;

    fn next(&mut self) -> Option<&'a VisualNode> {
        while let Some(visual) = self.stack.pop() {
            let Some(node) = self.scene.get_node(visual) else {
                continue;
            };
            self.stack.extend(node.children.iter().rev().copied());
            return Some(node);
        }
        None
    }
}
