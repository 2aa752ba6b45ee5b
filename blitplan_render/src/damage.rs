// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output damage history for buffer-age repaint.

use blitplan_core::region::Region;

/// Number of framebuffers in flight, and so of remembered damage regions.
pub const BUFFER_DAMAGE_COUNT: usize = 3;

/// Ring of the last [`BUFFER_DAMAGE_COUNT`] frames' damage.
///
/// With N framebuffers cycling, the buffer being painted last held the frame
/// from N−1 repaints ago, so everything damaged since then must be redrawn.
#[derive(Clone, Debug, Default)]
pub struct DamageHistory {
    ring: [Region; BUFFER_DAMAGE_COUNT],
    current: usize,
}

impl DamageHistory {
    /// An empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `frame_damage` as the newest entry and returns the damage to
    /// repaint: the union of this frame's damage with the previous
    /// `BUFFER_DAMAGE_COUNT - 1` frames'.
    pub fn accumulate(&mut self, frame_damage: &Region) -> Region {
        self.current = (self.current + 1) % BUFFER_DAMAGE_COUNT;
        self.ring[self.current] = frame_damage.clone();
        let mut total = Region::new();
        for r in &self.ring {
            total.union(r);
        }
        total
    }

    /// Marks every remembered frame as fully damaged by `full`, used after a
    /// resize when old buffer contents no longer line up.
    pub fn reset(&mut self, full: &Region) {
        for r in &mut self.ring {
            *r = full.clone();
        }
    }

    /// Forgets all history.
    pub fn clear(&mut self) {
        for r in &mut self.ring {
            r.clear();
        }
        self.current = 0;
    }
}
