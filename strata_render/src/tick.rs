// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame tick sources.
//!
//! A tick is a payload-less "a frame may be produced now" notification. The
//! renderer subscribes on [`start`](crate::DeferredRenderer::start) and
//! unsubscribes on [`stop`](crate::DeferredRenderer::stop). Callbacks may be
//! invoked from any thread.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// A tick callback.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Identifies one subscription to a [`TickSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickToken(pub u64);

/// Something that produces frame ticks.
pub trait TickSource: Send + Sync {
    /// Registers `callback` to be invoked on every tick.
    fn subscribe(&self, callback: TickCallback) -> TickToken;

    /// Removes a subscription. Unknown tokens are ignored.
    fn unsubscribe(&self, token: TickToken);
}

#[derive(Default)]
struct Subscribers {
    entries: Vec<(TickToken, TickCallback)>,
    next_id: u64,
}

/// A [`TickSource`] that fires when [`tick`](Self::tick) is called.
///
/// Thread-safe: ticks may be fired from any thread, including while another
/// thread subscribes or unsubscribes.
#[derive(Default)]
pub struct ManualTickSource {
    subscribers: Mutex<Subscribers>,
}

impl fmt::Debug for ManualTickSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTickSource")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ManualTickSource {
    /// Creates a tick source with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes every subscribed callback once.
    ///
    /// Callbacks run outside the subscriber lock, so they may subscribe or
    /// unsubscribe.
    pub fn tick(&self) {
        let callbacks: Vec<TickCallback> = self
            .subscribers
            .lock()
            .entries
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Returns the number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().entries.len()
    }
}

impl TickSource for ManualTickSource {
    fn subscribe(&self, callback: TickCallback) -> TickToken {
        let mut subs = self.subscribers.lock();
        let token = TickToken(subs.next_id);
        subs.next_id += 1;
        subs.entries.push((token, callback));
        token
    }

    fn unsubscribe(&self, token: TickToken) {
        self.subscribers
            .lock()
            .entries
            .retain(|(existing, _)| *existing != token);
    }
}
