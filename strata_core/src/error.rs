// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-graph contract violations.
//!
//! Every variant means the scene graph's invariants are already broken: the
//! caller should surface the error and stop rendering the affected scene, not
//! retry.

use crate::visual::VisualId;

/// Errors raised while building or querying a [`Scene`](crate::scene::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The visual has no node in this scene.
    #[error("no scene node for {0:?}")]
    NodeNotFound(VisualId),
    /// A layer was requested for a visual that is not attached to the render
    /// root.
    #[error("attempted to create a scene layer for unrooted visual {0:?}")]
    Unrooted(VisualId),
    /// A second layer was requested for a visual that already owns one.
    #[error("visual {0:?} already owns a scene layer")]
    DuplicateLayer(VisualId),
    /// A node names a layer root that has no entry in the layer set.
    #[error("visual {visual:?} refers to missing layer root {layer_root:?}")]
    LayerNotFound {
        /// Node whose back-reference is dangling.
        visual: VisualId,
        /// Layer root the node refers to.
        layer_root: VisualId,
    },
}
