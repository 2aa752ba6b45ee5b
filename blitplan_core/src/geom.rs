// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangles, sizes, and the bounded clip polygon.
//!
//! The accelerator only understands integer, axis-aligned, half-open
//! rectangles. Clipping itself runs in floating point on [`kurbo::Point`]s
//! and is reduced back to a [`Rect`] with [`Polygon8::clip_rect`].

use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

/// An integer rectangle, half-open on `right` and `bottom`.
///
/// A rectangle with `left >= right` or `top >= bottom` is empty. Empty
/// rectangles never reach the accelerator.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub left: i32,
    /// Top edge (inclusive).
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from its four edges.
    #[inline]
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle from an origin and a size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Horizontal extent. Negative for inverted rectangles.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent. Negative for inverted rectangles.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Area in pixels, zero for empty or inverted rectangles.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width() as i64 * self.height() as i64
        }
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Returns `true` if both rectangles share at least one pixel.
    #[inline]
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Returns the overlap of two rectangles, or [`Rect::ZERO`] if they do
    /// not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let r = Self::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() { Self::ZERO } else { r }
    }

    /// Returns the smallest rectangle containing both. Empty inputs are
    /// ignored.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    #[inline]
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Shifts the rectangle by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// The four corners in clockwise order starting at the top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        let (l, t, r, b) = (
            f64::from(self.left),
            f64::from(self.top),
            f64::from(self.right),
            f64::from(self.bottom),
        );
        [
            Point::new(l, t),
            Point::new(r, t),
            Point::new(r, b),
            Point::new(l, b),
        ]
    }

    /// Converts to a floating-point rectangle.
    #[inline]
    #[must_use]
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.left),
            f64::from(self.top),
            f64::from(self.right),
            f64::from(self.bottom),
        )
    }

    /// Returns the smallest integer rectangle covering `r`.
    #[must_use]
    pub fn from_kurbo_outer(r: kurbo::Rect) -> Self {
        Self::new(
            saturate(r.x0.floor()),
            saturate(r.y0.floor()),
            saturate(r.x1.ceil()),
            saturate(r.y1.ceil()),
        )
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Width and height of a framebuffer or buffer in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Size {
    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns the size with width and height exchanged.
    #[inline]
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// The rectangle `[0, 0, width, height]`.
    #[inline]
    #[must_use]
    pub const fn to_rect(self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "value is clamped into the i32 range first"
)]
fn saturate(v: f64) -> i32 {
    v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Converts a coordinate to 24.8 fixed point and back to an integer.
///
/// Rounds to the nearest 1/256 and then truncates toward zero, matching the
/// compositor's fixed-point coordinate convention.
#[must_use]
pub fn fixed_to_int(d: f64) -> i32 {
    let fixed = saturate((d * 256.0).round());
    fixed / 256
}

/// Maximum vertex count of a clipped quadrilateral.
///
/// Each of the four clip edges adds at most one vertex to a convex polygon.
pub const MAX_VERTICES: usize = 8;

/// A convex polygon of at most [`MAX_VERTICES`] points, clockwise winding.
///
/// Stored inline so clipping never allocates.
#[derive(Clone, Copy, PartialEq)]
pub struct Polygon8 {
    pts: [Point; MAX_VERTICES],
    len: usize,
}

impl Polygon8 {
    /// An empty polygon.
    pub const EMPTY: Self = Self {
        pts: [Point::ORIGIN; MAX_VERTICES],
        len: 0,
    };

    /// Creates a polygon from a quadrilateral.
    #[must_use]
    pub fn from_quad(quad: [Point; 4]) -> Self {
        let mut p = Self::EMPTY;
        for v in quad {
            p.push(v);
        }
        p
    }

    /// Appends a vertex. Vertices beyond [`MAX_VERTICES`] are dropped; a
    /// convex quadrilateral clipped by a rectangle never produces them.
    pub fn push(&mut self, p: Point) {
        debug_assert!(self.len < MAX_VERTICES, "clip polygon overflow");
        if self.len < MAX_VERTICES {
            self.pts[self.len] = p;
            self.len += 1;
        }
    }

    /// Removes every vertex.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Keeps the first `n` vertices.
    pub(crate) fn truncate(&mut self, n: usize) {
        self.len = self.len.min(n);
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no vertices.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fewer than three vertices: no intersection.
    #[inline]
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.len < 3
    }

    /// The vertices in winding order.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.pts[..self.len]
    }

    /// Floating-point bounding box, `None` when empty.
    #[must_use]
    pub fn bounding_box(&self) -> Option<kurbo::Rect> {
        let (first, rest) = self.vertices().split_first()?;
        let mut bb = kurbo::Rect::from_points(*first, *first);
        for p in rest {
            bb = bb.union_pt(*p);
        }
        Some(bb)
    }

    /// Reduces the polygon to the integer rectangle the accelerator clips
    /// to, or `None` for a degenerate polygon.
    ///
    /// This over-includes the area between the polygon and its bounding box.
    #[must_use]
    pub fn clip_rect(&self) -> Option<Rect> {
        if self.is_degenerate() {
            return None;
        }
        let bb = self.bounding_box()?;
        Some(Rect::new(
            fixed_to_int(bb.x0),
            fixed_to_int(bb.y0),
            fixed_to_int(bb.x1),
            fixed_to_int(bb.y1),
        ))
    }

    /// Signed area (shoelace). Positive for clockwise winding in a y-down
    /// coordinate system.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        let v = self.vertices();
        let mut sum = 0.0;
        for (i, a) in v.iter().enumerate() {
            let b = v[(i + 1) % v.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        sum * 0.5
    }
}

impl Default for Polygon8 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Polygon8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.vertices()).finish()
    }
}
