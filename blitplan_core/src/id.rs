// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output and surface handles, and the generational slot store behind them.

use alloc::vec::Vec;
use core::fmt;

/// Identifies a display output.
///
/// The compositor assigns output IDs; this crate passes them through without
/// interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputId(pub u32);

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// A handle to per-surface renderer state in a [`SlotStore`].
///
/// Carries a slot index and a generation counter so a handle kept past the
/// surface's destruction is detected once the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl SurfaceId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({}@gen{})", self.idx, self.generation)
    }
}

/// Slot storage addressed by [`SurfaceId`].
///
/// Destroyed slots go on a free list and are reused; their generation is
/// bumped on destruction so stale handles stop resolving.
#[derive(Clone, Debug)]
pub struct SlotStore<T> {
    slots: Vec<Option<T>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl<T> Default for SlotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Stores `value` and returns its handle.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "more than u32::MAX live surfaces is not a supported configuration"
    )]
    pub fn insert(&mut self, value: T) -> SurfaceId {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(value);
            SurfaceId {
                idx,
                generation: self.generation[idx as usize],
            }
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some(value));
            self.generation.push(0);
            SurfaceId { idx, generation: 0 }
        }
    }

    /// Removes and returns the value behind `id`, `None` if `id` is stale.
    pub fn remove(&mut self, id: SurfaceId) -> Option<T> {
        if !self.is_alive(id) {
            return None;
        }
        let value = self.slots[id.idx as usize].take();
        self.generation[id.idx as usize] = self.generation[id.idx as usize].wrapping_add(1);
        self.free_list.push(id.idx);
        value
    }

    /// Returns `true` if `id` refers to a live slot.
    #[must_use]
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        let i = id.idx as usize;
        i < self.slots.len() && self.generation[i] == id.generation && self.slots[i].is_some()
    }

    /// Borrows the value behind `id`.
    #[must_use]
    pub fn get(&self, id: SurfaceId) -> Option<&T> {
        if self.is_alive(id) {
            self.slots[id.idx as usize].as_ref()
        } else {
            None
        }
    }

    /// Mutably borrows the value behind `id`.
    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut T> {
        if self.is_alive(id) {
            self.slots[id.idx as usize].as_mut()
        } else {
            None
        }
    }

    /// Number of live slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Returns `true` if no slot is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates live handles and values in slot order.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "slot count never exceeds u32::MAX, see `insert`"
    )]
    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref().map(|v| {
                (
                    SurfaceId {
                        idx: i as u32,
                        generation: self.generation[i],
                    },
                    v,
                )
            })
        })
    }
}
