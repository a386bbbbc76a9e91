// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Repaint area tracking for one layer surface.

use alloc::vec::Vec;

use kurbo::Rect;

/// The area of one layer surface that must be repainted.
///
/// A `DirtyRegion` is a union of axis-aligned rectangles in layer-local
/// coordinates. Rectangles may overlap and are not merged; the union is the
/// exact repaint area. A rectangle that is fully covered by one already stored
/// is not stored again, so re-adding the same damage is a no-op.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirtyRegion {
    rects: Vec<Rect>,
}

impl DirtyRegion {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Unions `rect` into the region.
    ///
    /// Rectangles with zero area are ignored.
    pub fn add(&mut self, rect: Rect) {
        let rect = rect.abs();
        if rect.is_zero_area() || !rect.is_finite() {
            return;
        }
        if self.rects.iter().any(|r| covers(*r, rect)) {
            return;
        }
        self.rects.push(rect);
    }

    /// Unions every rectangle of `other` into the region.
    pub fn union_with(&mut self, other: &Self) {
        for rect in other.iter() {
            self.add(rect);
        }
    }

    /// Returns `true` if nothing needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns the number of stored rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Returns the stored rectangles.
    ///
    /// The iterator is `Clone`, so the sequence can be restarted.
    pub fn iter(&self) -> impl Iterator<Item = Rect> + Clone + '_ {
        self.rects.iter().copied()
    }

    /// Returns the union of all rectangles, or `None` if the region is empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let mut it = self.rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Returns whether `rect` overlaps any part of the region.
    #[must_use]
    pub fn intersects(&self, rect: Rect) -> bool {
        self.rects.iter().any(|r| overlaps(*r, rect))
    }

    /// Returns whether every point of `rect` lies inside the region's
    /// rectangles, considering each rectangle on its own.
    #[must_use]
    pub fn contains_rect(&self, rect: Rect) -> bool {
        self.rects.iter().any(|r| covers(*r, rect))
    }

    /// Empties the region once the owning layer has been repainted.
    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

/// Returns whether `outer` fully covers `inner`.
fn covers(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Returns whether two rectangles share a non-empty area.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}
