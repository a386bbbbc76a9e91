// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sibling-list iteration.

use super::INVALID;
use super::tree::VisualStore;
use crate::visual::VisualId;

/// An iterator over the direct children of a visual, back to front.
///
/// Created by [`VisualStore::children`].
#[derive(Debug, Clone)]
pub struct Children<'a> {
    store: &'a VisualStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a VisualStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}
