// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change-tracking channel constants for [`VisualStore`].
//!
//! The store records every mutation in an [`understory_dirty`] tracker, one
//! channel per category of change. No channel propagates to descendants: the
//! scene builder rebuilds the whole subtree below a changed visual anyway, so
//! only the visual that was actually mutated needs to be reported.
//!
//! - [`GEOMETRY`] covers bounds and flags (hidden, clip-to-bounds, isolate).
//! - [`OPACITY`] may flip the layer-boundary decision.
//! - [`CLIP`] and [`CONTENT`] only change what is painted.
//! - [`TOPOLOGY`] is marked on the *child* of every attach or detach, since
//!   that is the subtree whose screen placement changed.
//!
//! [`VisualStore::take_changes`](crate::store::VisualStore::take_changes)
//! drains all channels and returns the visuals the host hands to the
//! renderer.
//!
//! [`VisualStore`]: crate::store::VisualStore

use understory_dirty::Channel;

/// Bounds or flags changed.
pub const GEOMETRY: Channel = Channel::new(0);

/// Opacity changed.
pub const OPACITY: Channel = Channel::new(1);

/// Explicit clip changed.
pub const CLIP: Channel = Channel::new(2);

/// Recorded draw operations changed.
pub const CONTENT: Channel = Channel::new(3);

/// Visual attached, detached, or moved.
pub const TOPOLOGY: Channel = Channel::new(4);

/// All channels, in drain order.
pub const ALL: [Channel; 5] = [GEOMETRY, OPACITY, CLIP, CONTENT, TOPOLOGY];
