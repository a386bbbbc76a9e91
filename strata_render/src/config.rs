// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer configuration.

use crate::dispatch::DispatchPriority;

/// What to do with a tick that arrives while a frame is still in flight.
///
/// Builds never overlap under either policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TickPolicy {
    /// Discard the tick. Dirty visuals stay queued for the next one.
    #[default]
    Drop,
    /// Remember the tick and schedule another frame as soon as the current
    /// one finishes, if anything is pending.
    Defer,
}

/// Configuration for the [`DeferredRenderer`](crate::DeferredRenderer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RendererConfig {
    /// Priority hint frame jobs are posted with.
    pub priority: DispatchPriority,
    /// Handling of ticks that arrive while a frame is in flight.
    pub tick_policy: TickPolicy,
}

impl RendererConfig {
    /// Frame jobs at render priority; overlapping ticks are dropped.
    pub const DEFAULT: Self = Self {
        priority: DispatchPriority::Render,
        tick_policy: TickPolicy::Drop,
    };

    /// Returns this configuration with a different dispatch priority.
    #[must_use]
    pub const fn with_priority(self, priority: DispatchPriority) -> Self {
        Self { priority, ..self }
    }

    /// Returns this configuration with a different tick policy.
    #[must_use]
    pub const fn with_tick_policy(self, tick_policy: TickPolicy) -> Self {
        Self {
            tick_policy,
            ..self
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
