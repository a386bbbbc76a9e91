// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Marshaling frame work onto the tree's owning context.
//!
//! Ticks may arrive on any thread, but scenes must only be built where the
//! visual tree lives. The renderer never builds on the tick callback; it posts
//! a job through a [`Dispatcher`] and the owning context runs it.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use parking_lot::Mutex;

/// Priority hint attached to a posted job.
///
/// Higher priorities run first; jobs of equal priority run in posting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DispatchPriority {
    /// Idle-time work.
    Background,
    /// Ordinary application work.
    Normal,
    /// Frame production.
    Render,
}

/// A unit of work posted to a [`Dispatcher`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on the context that owns the visual tree.
pub trait Dispatcher: Send + Sync {
    /// Schedules `job` to run on the owning context.
    ///
    /// Implementations may run the job before returning, so callers must not
    /// hold locks the job needs.
    fn post(&self, priority: DispatchPriority, job: Job);
}

/// A [`Dispatcher`] that runs every job inline, on the posting thread.
///
/// Useful when ticks are already delivered on the owning context, and in
/// tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateDispatcher;

impl Dispatcher for ImmediateDispatcher {
    fn post(&self, _priority: DispatchPriority, job: Job) {
        job();
    }
}

struct Entry {
    priority: DispatchPriority,
    seq: Reverse<u64>,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.seq).cmp(&(other.priority, other.seq))
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

/// A priority-ordered job queue drained by the owning context.
///
/// [`post`](Dispatcher::post) may be called from any thread. The owning
/// context calls [`run_pending`](Self::run_pending) from its event loop.
#[derive(Default)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the jobs queued at the time of the call, highest priority first.
    ///
    /// Jobs posted while running wait for the next call. The queue lock is
    /// released while each job runs. Returns the number of jobs run.
    pub fn run_pending(&self) -> usize {
        let budget = self.len();
        let mut ran = 0;
        while ran < budget {
            let Some(entry) = self.state.lock().heap.pop() else {
                break;
            };
            (entry.job)();
            ran += 1;
        }
        ran
    }

    /// Returns the number of queued jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Returns `true` if no jobs are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }
}

impl Dispatcher for TaskQueue {
    fn post(&self, priority: DispatchPriority, job: Job) {
        let mut state = self.state.lock();
        let seq = Reverse(state.next_seq);
        state.next_seq += 1;
        state.heap.push(Entry { priority, seq, job });
    }
}
