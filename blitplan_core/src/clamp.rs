// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scale-preserving clamping of a blit to the framebuffer bounds.
//!
//! A destination rectangle that hangs off the framebuffer has to be cut back
//! to `[0, 0, width, height]`, and the source rectangle has to lose the
//! matching strip so the scale factor of the blit does not change. Which
//! source edge corresponds to which destination edge depends on the rotation
//! the accelerator applies (`Deg90` turns the source clockwise):
//!
//! | destination edge | `Deg0`  | `Deg90` | `Deg180` | `Deg270` |
//! |------------------|---------|---------|----------|----------|
//! | left             | left    | bottom  | right    | top      |
//! | right            | right   | top     | left     | bottom   |
//! | top              | top     | left    | bottom   | right    |
//! | bottom           | bottom  | right   | top      | left     |
//!
//! Trim amounts are rounded down so a clamped blit never samples outside the
//! original source rectangle.

use crate::geom::{Rect, Size};
use crate::transform::HardwareRotation;

/// A source/destination pair that fits inside the framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClampedBlit {
    /// Source rectangle, in buffer pixels.
    pub source: Rect,
    /// Destination rectangle, inside `[0, 0, bounds.width, bounds.height]`.
    pub dest: Rect,
}

#[derive(Clone, Copy)]
enum SourceEdge {
    Left,
    Top,
    Right,
    Bottom,
}

/// `floor(overflow * src_extent / dst_extent)` without going through floats.
fn trim_amount(overflow: i32, src_extent: i32, dst_extent: i32) -> i32 {
    let t = (i64::from(overflow) * i64::from(src_extent)).div_euclid(i64::from(dst_extent));
    i32::try_from(t).unwrap_or(i32::MAX)
}

fn shrink(source: &mut Rect, edge: SourceEdge, amount: i32) {
    match edge {
        SourceEdge::Left => source.left = source.left.saturating_add(amount),
        SourceEdge::Top => source.top = source.top.saturating_add(amount),
        SourceEdge::Right => source.right = source.right.saturating_sub(amount),
        SourceEdge::Bottom => source.bottom = source.bottom.saturating_sub(amount),
    }
}

/// Source edges matched to destination left, right, top, bottom.
const fn edge_map(rotation: HardwareRotation) -> [SourceEdge; 4] {
    use SourceEdge::{Bottom, Left, Right, Top};
    match rotation {
        HardwareRotation::Deg0 => [Left, Right, Top, Bottom],
        HardwareRotation::Deg90 => [Bottom, Top, Left, Right],
        HardwareRotation::Deg180 => [Right, Left, Bottom, Top],
        HardwareRotation::Deg270 => [Top, Bottom, Right, Left],
    }
}

/// Clamps `dest` into `bounds`, trimming `source` in lock-step.
///
/// Returns `None` when the blit has to be abandoned: either rectangle is
/// empty on entry, a trim collapses the source on either axis, or nothing
/// of the destination remains inside the bounds.
#[must_use]
pub fn clamp_to_bounds(
    rotation: HardwareRotation,
    source: Rect,
    dest: Rect,
    bounds: Size,
) -> Option<ClampedBlit> {
    if source.is_empty() || dest.is_empty() {
        return None;
    }

    // Source extents matched to destination width and height.
    let (src_along_w, src_along_h) = if rotation.swaps_axes() {
        (source.height(), source.width())
    } else {
        (source.width(), source.height())
    };
    let (dst_w, dst_h) = (dest.width(), dest.height());
    let [on_left, on_right, on_top, on_bottom] = edge_map(rotation);

    let mut source = source;
    let mut dest = dest;

    if dest.left < 0 {
        shrink(&mut source, on_left, trim_amount(-dest.left, src_along_w, dst_w));
        dest.left = 0;
        if source.is_empty() {
            return None;
        }
    }
    if dest.right > bounds.width {
        let overflow = dest.right - bounds.width;
        shrink(&mut source, on_right, trim_amount(overflow, src_along_w, dst_w));
        dest.right = bounds.width;
        if source.is_empty() {
            return None;
        }
    }
    if dest.top < 0 {
        shrink(&mut source, on_top, trim_amount(-dest.top, src_along_h, dst_h));
        dest.top = 0;
        if source.is_empty() {
            return None;
        }
    }
    if dest.bottom > bounds.height {
        let overflow = dest.bottom - bounds.height;
        shrink(&mut source, on_bottom, trim_amount(overflow, src_along_h, dst_h));
        dest.bottom = bounds.height;
        if source.is_empty() {
            return None;
        }
    }

    if dest.is_empty() {
        return None;
    }
    Some(ClampedBlit { source, dest })
}
