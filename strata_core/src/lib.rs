// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph, layer set, and dirty-region tracking for deferred
//! retained-mode rendering.
//!
//! `strata_core` turns a hosted visual tree into paintable per-frame
//! snapshots. It is `no_std` compatible (with `alloc`); the threaded frame
//! loop lives in `strata_render`.
//!
//! # Architecture
//!
//! ```text
//!   VisualTree (host) ──► SceneBuilder::update_all / update ──► Scene
//!                                                               │
//!                          ┌────────────────────────────────────┘
//!                          ▼
//!   LayerSet (paint order) ──► SceneLayer ──► DirtyRegion ──► renderer
//! ```
//!
//! **[`visual`]**: Visual identity and the [`VisualTree`](visual::VisualTree)
//! provider contract the builder reads from.
//!
//! **[`store`]**: [`VisualStore`](store::VisualStore), a struct-of-arrays
//! reference tree with generational handles and per-channel change tracking.
//!
//! **[`region`]**: [`DirtyRegion`](region::DirtyRegion), the union of
//! rectangles that must be repainted on one layer surface.
//!
//! **[`layer`]**: [`SceneLayer`](layer::SceneLayer) and the ordered
//! [`LayerSet`](layer::LayerSet).
//!
//! **[`scene`]**: [`Scene`](scene::Scene) snapshots made of
//! [`VisualNode`](scene::VisualNode)s, with copy-on-write forking.
//!
//! **[`builder`]**: [`SceneBuilder`](builder::SceneBuilder): full and
//! incremental scene construction, and the layer promotion policy.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-layer
//!   damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod builder;
pub mod dirty;
pub mod draw;
pub mod error;
pub mod layer;
pub mod region;
pub mod scene;
pub mod store;
pub mod trace;
pub mod visual;
