// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred frame loop for `strata_core` scenes.
//!
//! `strata_render` drives a [`SceneBuilder`](strata_core::builder::SceneBuilder)
//! from frame ticks, keeps one offscreen surface per scene layer, repaints
//! only dirty regions, and composites the layers onto a render target.
//!
//! # Architecture
//!
//! ```text
//!   TickSource ──► DeferredRenderer ──► Dispatcher (owning context)
//!                                            │
//!          ┌─────────────────────────────────┘
//!          ▼
//!   SceneUpdate ──► Scene ──► LayerFactory / LayerSurface ──► RenderTarget
//! ```
//!
//! **[`renderer`]**: [`DeferredRenderer`], its [`RenderPhase`] state
//! machine, and [`FrameOutcome`].
//!
//! **[`tick`]**: [`TickSource`] and the on-demand [`ManualTickSource`].
//!
//! **[`dispatch`]**: [`Dispatcher`] with [`ImmediateDispatcher`] and the
//! priority-ordered [`TaskQueue`].
//!
//! **[`surface`]**: The backend seam: [`LayerFactory`], [`LayerSurface`],
//! [`RenderTarget`].
//!
//! **[`config`]**: [`RendererConfig`] and [`TickPolicy`].
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Emits frame-loop events to the sink set
//!   with [`DeferredRenderer::set_trace_sink`].
//! - `trace-rich` (disabled by default, implies `trace`): Also emits the
//!   rectangles repainted on each layer.

pub mod config;
pub mod dispatch;
pub mod error;
mod paint;
pub mod renderer;
pub mod surface;
pub mod tick;

#[cfg(test)]
mod test_util;

pub use config::{RendererConfig, TickPolicy};
pub use dispatch::{DispatchPriority, Dispatcher, ImmediateDispatcher, Job, TaskQueue};
pub use error::RenderError;
pub use renderer::{DeferredRenderer, FrameOutcome, RenderPhase};
pub use surface::{
    CompositeLayer, LayerFactory, LayerSurface, PixelSize, RenderTarget, SurfaceError,
};
pub use tick::{ManualTickSource, TickCallback, TickSource, TickToken};
