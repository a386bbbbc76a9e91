// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference visual tree.
//!
//! [`VisualStore`] is a struct-of-arrays tree with generational
//! [`VisualId`](crate::visual::VisualId) handles. It implements
//! [`VisualTree`](crate::visual::VisualTree), so hosts without a widget tree
//! of their own can drive the renderer from it directly, and tests build
//! scenes from it.
//!
//! Every mutation is recorded per [channel](crate::dirty);
//! [`take_changes`](VisualStore::take_changes) returns the visuals touched
//! since the previous call.

mod traverse;
mod tree;

pub use traverse::Children;
pub use tree::VisualStore;

/// Sentinel for "no slot" in the topology arrays.
pub(crate) const INVALID: u32 = u32::MAX;
