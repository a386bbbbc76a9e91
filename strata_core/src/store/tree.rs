// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays visual storage with allocation, topology, and property
//! management.

use alloc::vec::Vec;

use hashbrown::HashSet;
use kurbo::{Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::INVALID;
use super::traverse::Children;
use crate::dirty;
use crate::draw::DrawOp;
use crate::visual::{VisualFlags, VisualId, VisualProps, VisualTree};

/// Struct-of-arrays storage for a visual tree.
///
/// The store owns the render root, created by [`new`](Self::new) with bounds
/// covering the client area. Other visuals start detached; attach them with
/// [`add_child`](Self::add_child) or [`insert_before`](Self::insert_before).
/// Destroyed slots are recycled through a free list, and generation counters
/// make stale handles fail validation.
#[derive(Debug)]
pub struct VisualStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties --
    pub(crate) bounds: Vec<Rect>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) clip: Vec<Option<Rect>>,
    pub(crate) flags: Vec<VisualFlags>,
    pub(crate) content: Vec<Vec<DrawOp>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Change tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) pending_removed: Vec<VisualId>,

    root: u32,
}

impl VisualStore {
    /// Creates a store whose render root covers `client_size`.
    #[must_use]
    pub fn new(client_size: Size) -> Self {
        let mut store = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            bounds: Vec::new(),
            opacity: Vec::new(),
            clip: Vec::new(),
            flags: Vec::new(),
            content: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_removed: Vec::new(),
            root: 0,
        };
        let root = store.create_visual();
        store.root = root.idx;
        store.bounds[root.idx as usize] = client_size.to_rect();
        store
    }

    /// Returns the render root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> VisualId {
        self.id_at(self.root)
    }

    /// Resizes the render root, which resizes every layer surface.
    pub fn set_client_size(&mut self, size: Size) {
        self.bounds[self.root as usize] = size.to_rect();
        self.dirty.mark(self.root, dirty::GEOMETRY);
    }

    // -- Allocation API --

    /// Creates a new detached visual and returns its handle.
    ///
    /// The visual starts with zero bounds, full opacity, no clip, default
    /// flags, and no content.
    pub fn create_visual(&mut self) -> VisualId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.bounds[i] = Rect::ZERO;
            self.opacity[i] = 1.0;
            self.clip[i] = None;
            self.flags[i] = VisualFlags::default();
            self.content[i].clear();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.bounds.push(Rect::ZERO);
            self.opacity.push(1.0);
            self.clip.push(None);
            self.flags.push(VisualFlags::default());
            self.content.push(Vec::new());
            self.generation.push(0);
            idx
        };
        self.id_at(idx)
    }

    /// Destroys a visual, freeing its slot for reuse.
    ///
    /// A destroyed visual that was attached is reported by the next
    /// [`take_changes`](Self::take_changes) under its old handle, so the scene
    /// drops its node.
    ///
    /// # Panics
    ///
    /// Panics if the visual has children, if it is the render root, or if the
    /// handle is stale.
    pub fn destroy_visual(&mut self, id: VisualId) {
        self.validate(id);
        let idx = id.idx;
        assert!(idx != self.root, "cannot destroy the render root");
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy visual with children"
        );

        let was_attached = self.parent[idx as usize] != INVALID;
        if was_attached {
            self.unlink_from_parent(idx);
        }

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.content[idx as usize].clear();
        self.free_list.push(idx);
        if was_attached {
            self.pending_removed.push(id);
        }
    }

    /// Returns whether the given handle refers to a live visual.
    #[must_use]
    pub fn is_alive(&self, id: VisualId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last (topmost) child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: VisualId, child: VisualId) {
        self.validate(parent);
        self.validate(child);
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(c != self.root, "the render root cannot be a child");
        self.link_last(parent.idx, c);
        self.dirty.mark(c, dirty::TOPOLOGY);
    }

    /// Inserts `child` directly below `sibling` in paint order.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: VisualId, sibling: VisualId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];
        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.dirty.mark(c, dirty::TOPOLOGY);
    }

    /// Detaches `child` from its parent.
    ///
    /// The detached visual stays alive and keeps its own subtree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the visual has no parent.
    pub fn remove_from_parent(&mut self, child: VisualId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "visual has no parent");
        self.unlink_from_parent(c);
        self.dirty.mark(c, dirty::TOPOLOGY);
    }

    /// Moves `child` to the top of `new_parent`'s children.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `new_parent` is `child` itself
    /// or one of its descendants.
    pub fn reparent(&mut self, child: VisualId, new_parent: VisualId) {
        self.validate(child);
        self.validate(new_parent);
        let c = child.idx;
        let mut cursor = new_parent.idx;
        while cursor != INVALID {
            assert!(cursor != c, "cannot reparent a visual into its own subtree");
            cursor = self.parent[cursor as usize];
        }

        if self.parent[c as usize] != INVALID {
            self.unlink_from_parent(c);
        }
        self.link_last(new_parent.idx, c);
        self.dirty.mark(c, dirty::TOPOLOGY);
    }

    /// Returns the parent of a visual, if any.
    #[must_use]
    pub fn parent(&self, id: VisualId) -> Option<VisualId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a visual, back to
    /// front.
    #[must_use]
    pub fn children(&self, id: VisualId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Property getters --

    /// Returns the bounds of a visual in its parent's coordinates.
    #[must_use]
    pub fn bounds(&self, id: VisualId) -> Rect {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Returns the local opacity of a visual.
    #[must_use]
    pub fn opacity(&self, id: VisualId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the explicit clip of a visual.
    #[must_use]
    pub fn clip(&self, id: VisualId) -> Option<Rect> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns the flags of a visual.
    #[must_use]
    pub fn flags(&self, id: VisualId) -> VisualFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the recorded draw operations of a visual.
    #[must_use]
    pub fn content(&self, id: VisualId) -> &[DrawOp] {
        self.validate(id);
        &self.content[id.idx as usize]
    }

    // -- Mutation API (records changes) --

    /// Sets the bounds of a visual.
    pub fn set_bounds(&mut self, id: VisualId, bounds: Rect) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.dirty.mark(id.idx, dirty::GEOMETRY);
    }

    /// Sets the local opacity of a visual, clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, id: VisualId, opacity: f32) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity.clamp(0.0, 1.0);
        self.dirty.mark(id.idx, dirty::OPACITY);
    }

    /// Sets the explicit clip of a visual.
    pub fn set_clip(&mut self, id: VisualId, clip: Option<Rect>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
        self.dirty.mark(id.idx, dirty::CLIP);
    }

    /// Sets the flags of a visual.
    pub fn set_flags(&mut self, id: VisualId, flags: VisualFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        self.dirty.mark(id.idx, dirty::GEOMETRY);
    }

    /// Replaces the recorded draw operations of a visual.
    pub fn set_content(&mut self, id: VisualId, content: Vec<DrawOp>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Returns every visual changed since the previous call, without
    /// duplicates.
    ///
    /// Live visuals come first, in channel order; visuals destroyed while
    /// attached follow under their old handles.
    pub fn take_changes(&mut self) -> Vec<VisualId> {
        let mut seen = HashSet::new();
        let mut changed = Vec::new();
        for channel in dirty::ALL {
            let drained: Vec<u32> = self.dirty.drain(channel).deterministic().run().collect();
            for idx in drained {
                if idx < self.len && !self.free_list.contains(&idx) && seen.insert(idx) {
                    changed.push(self.id_at(idx));
                }
            }
        }
        changed.append(&mut self.pending_removed);
        changed
    }

    // -- Internal helpers --

    /// Builds a handle for a live slot.
    pub(crate) fn id_at(&self, idx: u32) -> VisualId {
        VisualId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: VisualId) {
        assert!(
            self.is_alive(id),
            "stale VisualId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Appends `c` to the end of `p`'s child list.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list without recording a change.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

impl VisualTree for VisualStore {
    fn render_root(&self) -> VisualId {
        self.root()
    }

    fn contains(&self, visual: VisualId) -> bool {
        self.is_alive(visual)
    }

    fn parent(&self, visual: VisualId) -> Option<VisualId> {
        if !self.is_alive(visual) {
            return None;
        }
        let p = self.parent[visual.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    fn children(&self, visual: VisualId) -> Vec<VisualId> {
        if !self.is_alive(visual) {
            return Vec::new();
        }
        Children::new(self, self.first_child[visual.idx as usize]).collect()
    }

    fn props(&self, visual: VisualId) -> VisualProps {
        if !self.is_alive(visual) {
            return VisualProps::default();
        }
        let i = visual.idx as usize;
        VisualProps {
            bounds: self.bounds[i],
            opacity: self.opacity[i],
            clip: self.clip[i],
            flags: self.flags[i],
        }
    }

    fn draw(&self, visual: VisualId, ops: &mut Vec<DrawOp>) {
        if self.is_alive(visual) {
            ops.extend_from_slice(&self.content[visual.idx as usize]);
        }
    }

    fn client_size(&self) -> Size {
        self.bounds[self.root as usize].size()
    }
}
