// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing layers.
//!
//! A *layer* is an offscreen surface backing one isolated subtree. Each
//! [`SceneLayer`] has:
//!
//! - An owner: the visual whose subtree the layer isolates. The render root
//!   always owns the first layer.
//! - A [`DirtyRegion`](crate::region::DirtyRegion): the area of the surface
//!   that must be repainted before the next composite.
//! - A distance from the render root, counted in parent hops.
//!
//! Layers are collected in a [`LayerSet`], whose order is the paint order:
//! layers are created while walking the tree top-down, so an ancestor's layer
//! always precedes the layers nested below it.

mod scene_layer;
mod set;

pub use scene_layer::SceneLayer;
pub use set::{LayerSet, Layers};
