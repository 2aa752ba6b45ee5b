// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sets of disjoint rectangles.
//!
//! [`Region`] backs damage, occlusion, scissor, and opaque/blend sub-regions.
//! The representation is a flat list of pairwise-disjoint, non-empty
//! [`Rect`]s; no banding or coalescing is attempted, since a repaint only
//! ever touches a handful of rectangles.

use alloc::vec::Vec;

use crate::geom::Rect;

/// A set of pairwise-disjoint, non-empty rectangles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// The empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// A region covering a single rectangle (empty if `r` is empty).
    #[must_use]
    pub fn from_rect(r: Rect) -> Self {
        let mut region = Self::new();
        if !r.is_empty() {
            region.rects.push(r);
        }
        region
    }

    /// Builds a region from possibly-overlapping rectangles.
    #[must_use]
    pub fn from_rects(rects: &[Rect]) -> Self {
        let mut region = Self::new();
        for r in rects {
            region.union_rect(*r);
        }
        region
    }

    /// The disjoint rectangles making up this region.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns `true` if the region covers no pixels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Total covered area in pixels.
    #[must_use]
    pub fn area(&self) -> i64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Bounding box of the region, [`Rect::ZERO`] when empty.
    #[must_use]
    pub fn extents(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::ZERO, |acc, r| acc.union(r))
    }

    /// Returns `true` if the pixel at `(x, y)` is covered.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects
            .iter()
            .any(|r| x >= r.left && x < r.right && y >= r.top && y < r.bottom)
    }

    /// Removes every rectangle.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Adds a rectangle to the region.
    pub fn union_rect(&mut self, r: Rect) {
        if r.is_empty() {
            return;
        }
        let mut pieces = Vec::from([r]);
        for existing in &self.rects {
            if pieces.is_empty() {
                return;
            }
            pieces = pieces
                .into_iter()
                .flat_map(|p| subtract_rect(p, *existing))
                .collect();
        }
        self.rects.extend(pieces);
    }

    /// Adds every rectangle of `other` to the region.
    pub fn union(&mut self, other: &Self) {
        for r in &other.rects {
            self.union_rect(*r);
        }
    }

    /// Restricts the region to `clip`.
    #[must_use]
    pub fn intersect_rect(&self, clip: Rect) -> Self {
        Self {
            rects: self
                .rects
                .iter()
                .map(|r| r.intersect(&clip))
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// Returns the pixels covered by both regions.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut rects = Vec::new();
        for a in &self.rects {
            for b in &other.rects {
                let r = a.intersect(b);
                if !r.is_empty() {
                    rects.push(r);
                }
            }
        }
        Self { rects }
    }

    /// Returns the pixels of `self` not covered by `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        let mut rects = self.rects.clone();
        for b in &other.rects {
            rects = rects
                .into_iter()
                .flat_map(|a| subtract_rect(a, *b))
                .collect();
        }
        Self { rects }
    }

    /// Shifts every rectangle by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }
}

impl From<Rect> for Region {
    fn from(r: Rect) -> Self {
        Self::from_rect(r)
    }
}

/// Splits `a − b` into at most four disjoint pieces: full-width bands above
/// and below `b`, then the left and right remainders of the middle band.
fn subtract_rect(a: Rect, b: Rect) -> impl Iterator<Item = Rect> {
    let mut out = [None; 4];
    if !a.intersects(&b) {
        out[0] = Some(a);
    } else {
        let mid_top = a.top.max(b.top);
        let mid_bottom = a.bottom.min(b.bottom);
        let pieces = [
            Rect::new(a.left, a.top, a.right, mid_top),
            Rect::new(a.left, mid_bottom, a.right, a.bottom),
            Rect::new(a.left, mid_top, a.left.max(b.left), mid_bottom),
            Rect::new(a.right.min(b.right), mid_top, a.right, mid_bottom),
        ];
        for (slot, piece) in out.iter_mut().zip(pieces) {
            if !piece.is_empty() {
                *slot = Some(piece);
            }
        }
    }
    out.into_iter().flatten()
}
