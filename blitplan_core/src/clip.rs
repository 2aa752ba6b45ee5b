// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clipping a transformed surface rectangle against a global clip rectangle.
//!
//! A surface-local rectangle is carried into global space by the view's
//! [`Affine`], which turns it into an arbitrary quadrilateral. The result of
//! [`clip_surface_rect`] is the convex polygon where that quadrilateral meets
//! the clip rectangle:
//!
//! - If the transform keeps edges axis-aligned, the quadrilateral is itself a
//!   rectangle and each vertex is clamped into the clip rectangle
//!   ([`clip_simple`]).
//! - Otherwise the quadrilateral is cut by the clip rectangle's left, right,
//!   top and bottom half-planes in turn, Sutherland–Hodgman style
//!   ([`clip_transformed`]).
//!
//! Either way the result has zero vertices or three to eight vertices with
//! non-zero area.

use kurbo::{Affine, Point};

use crate::geom::{Polygon8, Rect};

/// A clip rectangle in floating point.
#[derive(Clone, Copy, Debug)]
struct ClipBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl ClipBox {
    fn new(r: Rect) -> Self {
        Self {
            x1: f64::from(r.left),
            y1: f64::from(r.top),
            x2: f64::from(r.right),
            y2: f64::from(r.bottom),
        }
    }
}

/// Relative difference with a small absolute floor; exactly zero when the
/// two values are close enough to be treated as the same coordinate.
fn float_difference(a: f64, b: f64) -> f64 {
    const MAX_DIFF: f64 = 4.0 * f64::MIN_POSITIVE;
    const MAX_REL_DIFF: f64 = 4.0e-5;

    let diff = a - b;
    let adiff = diff.abs();
    if adiff <= MAX_DIFF {
        return 0.0;
    }
    let largest = a.abs().max(b.abs());
    if adiff <= largest * MAX_REL_DIFF {
        return 0.0;
    }
    diff
}

/// Point where the segment `p1 → p2` crosses the vertical line `x = x_arg`.
fn intersect_vertical(p1: Point, p2: Point, x_arg: f64) -> Point {
    let a = float_difference(p2.x, p1.x);
    if a == 0.0 {
        // Segment runs along the clip edge; its end point is as good as any.
        return p2;
    }
    let b = x_arg - p2.x;
    Point::new(x_arg, p2.y + (p2.y - p1.y) * b / a)
}

/// Point where the segment `p1 → p2` crosses the horizontal line `y = y_arg`.
fn intersect_horizontal(p1: Point, p2: Point, y_arg: f64) -> Point {
    let a = float_difference(p2.y, p1.y);
    if a == 0.0 {
        return p2;
    }
    let b = y_arg - p2.y;
    Point::new(p2.x + (p2.x - p1.x) * b / a, y_arg)
}

#[derive(Clone, Copy)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    fn inside(self, clip: &ClipBox, p: Point) -> bool {
        match self {
            Self::Left => p.x >= clip.x1,
            Self::Right => p.x < clip.x2,
            Self::Top => p.y >= clip.y1,
            Self::Bottom => p.y < clip.y2,
        }
    }

    fn crossing(self, clip: &ClipBox, prev: Point, cur: Point) -> Point {
        match self {
            Self::Left => intersect_vertical(prev, cur, clip.x1),
            Self::Right => intersect_vertical(prev, cur, clip.x2),
            Self::Top => intersect_horizontal(prev, cur, clip.y1),
            Self::Bottom => intersect_horizontal(prev, cur, clip.y2),
        }
    }
}

/// One Sutherland–Hodgman pass against a single half-plane.
fn clip_against(src: &Polygon8, clip: &ClipBox, edge: Edge) -> Polygon8 {
    let mut dst = Polygon8::EMPTY;
    let v = src.vertices();
    let Some(&last) = v.last() else {
        return dst;
    };
    let mut prev = last;
    let mut prev_in = edge.inside(clip, prev);
    for &cur in v {
        let cur_in = edge.inside(clip, cur);
        match (prev_in, cur_in) {
            (true, true) => dst.push(cur),
            (true, false) => dst.push(edge.crossing(clip, prev, cur)),
            (false, true) => {
                dst.push(edge.crossing(clip, prev, cur));
                dst.push(cur);
            }
            (false, false) => {}
        }
        prev = cur;
        prev_in = cur_in;
    }
    dst
}

fn same_point(a: Point, b: Point) -> bool {
    float_difference(a.x, b.x) == 0.0 && float_difference(a.y, b.y) == 0.0
}

/// Clamps every vertex into the clip rectangle.
///
/// Only valid for a quadrilateral whose edges are parallel to the axes;
/// the clamped quadrilateral is then exactly the intersection.
#[must_use]
pub fn clip_simple(quad: &Polygon8, clip: Rect) -> Polygon8 {
    let c = ClipBox::new(clip);
    let mut out = Polygon8::EMPTY;
    for p in quad.vertices() {
        out.push(Point::new(p.x.clamp(c.x1, c.x2), p.y.clamp(c.y1, c.y2)));
    }
    out
}

/// General convex clip: cuts `poly` by the left, right, top, and bottom
/// half-planes of `clip`, then removes repeated vertices.
///
/// Returns an empty polygon when fewer than three vertices survive.
#[must_use]
pub fn clip_transformed(poly: &Polygon8, clip: Rect) -> Polygon8 {
    let c = ClipBox::new(clip);
    let mut p = *poly;
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        p = clip_against(&p, &c, edge);
    }

    let mut out = Polygon8::EMPTY;
    for &v in p.vertices() {
        match out.vertices().last() {
            Some(&prev) if same_point(prev, v) => {}
            _ => out.push(v),
        }
    }
    let n = out.len();
    if n > 1 && same_point(out.vertices()[0], out.vertices()[n - 1]) {
        out.truncate(n - 1);
    }
    if out.is_degenerate() {
        out.clear();
    }
    out
}

/// Returns `true` if `t` maps axis-aligned rectangles to axis-aligned
/// rectangles (pure scale and translation, or a quarter turn of them).
#[must_use]
pub fn is_axis_aligned(t: Affine) -> bool {
    let [a, b, c, d, _, _] = t.as_coeffs();
    (b == 0.0 && c == 0.0) || (a == 0.0 && d == 0.0)
}

/// Intersects `surface`, carried to global space by `to_global`, with the
/// global rectangle `clip`.
///
/// The returned polygon has clockwise winding for orientation-preserving
/// transforms and is empty when the two do not overlap.
#[must_use]
pub fn clip_surface_rect(surface: Rect, to_global: Affine, clip: Rect) -> Polygon8 {
    if surface.is_empty() || clip.is_empty() {
        return Polygon8::EMPTY;
    }
    let quad = Polygon8::from_quad(surface.corners().map(|p| to_global * p));
    let Some(bb) = quad.bounding_box() else {
        return Polygon8::EMPTY;
    };
    let c = ClipBox::new(clip);
    if bb.x0 >= c.x2 || bb.x1 <= c.x1 || bb.y0 >= c.y2 || bb.y1 <= c.y1 {
        return Polygon8::EMPTY;
    }
    if is_axis_aligned(to_global) {
        let mut out = clip_simple(&quad, clip);
        if out.signed_area() == 0.0 {
            out.clear();
        }
        out
    } else {
        clip_transformed(&quad, clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_rect(a: kurbo::Rect, b: kurbo::Rect) -> bool {
        const EPS: f64 = 1e-6;
        (a.x0 - b.x0).abs() < EPS
            && (a.y0 - b.y0).abs() < EPS
            && (a.x1 - b.x1).abs() < EPS
            && (a.y1 - b.y1).abs() < EPS
    }

    fn quad(surface: Rect, t: Affine) -> Polygon8 {
        Polygon8::from_quad(surface.corners().map(|p| t * p))
    }

    #[test]
    fn translated_surface_is_clamped() {
        let p = clip_surface_rect(
            Rect::new(0, 0, 100, 100),
            Affine::translate((50.0, 20.0)),
            Rect::new(0, 0, 120, 80),
        );
        assert_eq!(p.len(), 4);
        assert_eq!(p.clip_rect(), Some(Rect::new(50, 20, 120, 80)));
    }

    #[test]
    fn fully_outside_yields_no_vertices() {
        // min_x lands exactly on clip.right.
        let p = clip_surface_rect(
            Rect::new(0, 0, 10, 10),
            Affine::translate((100.0, 0.0)),
            Rect::new(0, 0, 100, 100),
        );
        assert!(p.is_empty());
        assert_eq!(p.clip_rect(), None);

        let rotated = Affine::translate((500.0, 500.0)) * Affine::rotate(0.3);
        let p = clip_surface_rect(Rect::new(0, 0, 10, 10), rotated, Rect::new(0, 0, 100, 100));
        assert!(p.is_empty());
    }

    #[test]
    fn empty_inputs_yield_no_vertices() {
        let clip = Rect::new(0, 0, 10, 10);
        assert!(clip_surface_rect(Rect::ZERO, Affine::IDENTITY, clip).is_empty());
        assert!(clip_surface_rect(clip, Affine::IDENTITY, Rect::new(3, 3, 3, 9)).is_empty());
    }

    #[test]
    fn collapsing_scale_yields_no_vertices() {
        let clip = Rect::new(0, 0, 10, 10);
        let point = Affine::translate((5.0, 5.0)) * Affine::scale(0.0);
        assert!(clip_surface_rect(clip, point, clip).is_empty());

        let line = Affine::translate((0.0, 5.0)) * Affine::scale_non_uniform(1.0, 0.0);
        assert!(clip_surface_rect(clip, line, clip).is_empty());

        let line = Affine::translate((5.0, 0.0)) * Affine::scale_non_uniform(0.0, 1.0);
        assert!(clip_surface_rect(clip, line, clip).is_empty());
    }

    #[test]
    fn axis_aligned_detection() {
        assert!(is_axis_aligned(Affine::IDENTITY));
        assert!(is_axis_aligned(Affine::scale_non_uniform(2.0, 0.5)));
        assert!(is_axis_aligned(Affine::new([0.0, 1.0, -1.0, 0.0, 10.0, 0.0])));
        assert!(!is_axis_aligned(Affine::rotate(0.1)));
        assert!(!is_axis_aligned(Affine::skew(0.2, 0.0)));
    }

    #[test]
    fn fast_and_general_paths_agree_when_axis_aligned() {
        let transforms = [
            Affine::IDENTITY,
            Affine::translate((-30.0, 15.0)),
            Affine::scale_non_uniform(1.5, 0.75),
            Affine::translate((12.5, -7.25)) * Affine::scale(2.0),
            Affine::scale_non_uniform(0.5, 3.0) * Affine::translate((40.0, 40.0)),
        ];
        let surfaces = [
            Rect::new(0, 0, 64, 48),
            Rect::new(10, 20, 30, 90),
            Rect::new(-16, -16, 16, 16),
        ];
        let clips = [
            Rect::new(0, 0, 100, 100),
            Rect::new(20, 30, 50, 60),
            Rect::new(-50, -50, 10, 200),
            Rect::new(60, 0, 61, 1000),
        ];
        for t in transforms {
            for s in surfaces {
                for c in clips {
                    let q = quad(s, t);
                    let bb = q.bounding_box().unwrap_or(kurbo::Rect::ZERO);
                    let cf = c.to_kurbo();
                    if bb.x0 >= cf.x1 || bb.x1 <= cf.x0 || bb.y0 >= cf.y1 || bb.y1 <= cf.y0 {
                        continue;
                    }
                    let fast = clip_simple(&q, c).bounding_box();
                    let general = clip_transformed(&q, c).bounding_box();
                    match (fast, general) {
                        (Some(f), Some(g)) => {
                            assert!(approx_rect(f, g), "{t:?} {s:?} {c:?}: {f:?} vs {g:?}");
                        }
                        other => panic!("{t:?} {s:?} {c:?}: {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn rotated_surface_produces_octagon() {
        // A square rotated 45° about the clip centre, large enough that every
        // clip edge cuts off one corner.
        let clip = Rect::new(0, 0, 100, 100);
        let t = Affine::translate((50.0, 50.0))
            * Affine::rotate(core::f64::consts::FRAC_PI_4)
            * Affine::translate((-60.0, -60.0));
        let p = clip_surface_rect(Rect::new(0, 0, 120, 120), t, clip);
        assert_eq!(p.len(), 8);
        assert!(p.signed_area().abs() > 0.0);
        for v in p.vertices() {
            assert!((0.0..=100.0).contains(&v.x), "{v:?}");
            assert!((0.0..=100.0).contains(&v.y), "{v:?}");
        }
        assert_eq!(p.clip_rect(), Some(clip));
    }

    #[test]
    fn rotated_partial_overlap() {
        let clip = Rect::new(0, 0, 50, 50);
        let t = Affine::translate((40.0, 40.0)) * Affine::rotate(0.5);
        let p = clip_surface_rect(Rect::new(0, 0, 30, 30), t, clip);
        assert!(p.len() >= 3 && p.len() <= 8, "{p:?}");
        assert!(p.signed_area().abs() > 0.0);
        let r = p.clip_rect().unwrap();
        assert!(clip.contains(&r), "{r:?}");
    }

    #[test]
    fn clipping_is_idempotent() {
        let clip = Rect::new(10, 10, 90, 70);
        let cases = [
            (Rect::new(0, 0, 60, 60), Affine::translate((30.0, 5.0)) * Affine::rotate(0.4)),
            (Rect::new(0, 0, 200, 20), Affine::translate((0.0, 40.0)) * Affine::rotate(-0.2)),
            (Rect::new(0, 0, 40, 40), Affine::translate((20.0, 20.0))),
        ];
        for (surface, t) in cases {
            let once = clip_surface_rect(surface, t, clip);
            assert!(!once.is_empty());
            let twice = clip_transformed(&once, clip);
            assert_eq!(once.len(), twice.len(), "{once:?} vs {twice:?}");
            // The vertex cycle may start elsewhere; compare as sets.
            for v in once.vertices() {
                assert!(
                    twice
                        .vertices()
                        .iter()
                        .any(|w| (v.x - w.x).abs() < 1e-9 && (v.y - w.y).abs() < 1e-9),
                    "{v:?} missing from {twice:?}"
                );
            }
            let (a, b) = (once.bounding_box(), twice.bounding_box());
            assert!(approx_rect(a.unwrap(), b.unwrap()));
        }
    }

    #[test]
    fn overlapping_bounds_without_intersection() {
        // A diamond whose bounding box pokes into the clip corner while the
        // diamond itself stays clear of it.
        let clip = Rect::new(0, 0, 10, 10);
        let t = Affine::translate((16.0, 9.0)) * Affine::rotate(core::f64::consts::FRAC_PI_4);
        let q = quad(Rect::new(0, 0, 10, 10), t);
        let bb = q.bounding_box().unwrap();
        assert!(bb.x0 < 10.0 && bb.y0 < 10.0);
        assert!(clip_surface_rect(Rect::new(0, 0, 10, 10), t, clip).is_empty());
    }

    #[test]
    fn float_difference_tolerance() {
        assert_eq!(float_difference(1.0, 1.0), 0.0);
        assert_eq!(float_difference(1000.0, 1000.01), 0.0);
        assert!(float_difference(1.0, 1.1) < 0.0);
        assert_eq!(float_difference(0.0, 0.0), 0.0);
    }
}
