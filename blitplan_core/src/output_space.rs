// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping rectangles from the unrotated framebuffer layout into the
//! physical output's coordinate space.

use crate::geom::{Rect, Size};
use crate::transform::Transform;

/// Maps `rect` from the framebuffer's logical (unrotated) layout into the
/// physical output space described by `transform`.
///
/// `size` is the size of the physical framebuffer. Width and height are
/// exchanged for 90° and 270°, so the inverse mapping of a 90° or 270°
/// rectangle takes [`Size::swapped`].
///
/// Flipped transforms map as the identity; mirrored outputs are not
/// supported by the accelerator path.
#[must_use]
pub fn map_rect_to_output(rect: Rect, transform: Transform, size: Size) -> Rect {
    let w = rect.width();
    let h = rect.height();
    match transform {
        Transform::_90 => {
            let left = rect.top;
            let bottom = size.height - rect.left;
            Rect::new(left, bottom - w, left + h, bottom)
        }
        Transform::_180 => {
            let left = size.width - rect.right;
            let bottom = size.height - rect.top;
            Rect::new(left, bottom - h, left + w, bottom)
        }
        Transform::_270 => {
            let right = size.width - rect.top;
            let top = rect.left;
            Rect::new(right - h, top, right, top + w)
        }
        Transform::Normal
        | Transform::Flipped
        | Transform::Flipped90
        | Transform::Flipped180
        | Transform::Flipped270 => rect,
    }
}
