// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accelerator commands produced by a repaint.

use blitplan_core::geom::Rect;
use blitplan_core::transform::HardwareRotation;

/// Global alpha of a fully opaque blit.
pub const OPAQUE_ALPHA: u8 = 255;

/// Converts a view's `0.0..=1.0` alpha to the accelerator's 8-bit global
/// alpha.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to 0..=255 before the cast"
)]
pub fn global_alpha(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * f32::from(OPAQUE_ALPHA)).round() as u8
}

/// One rotated, clipped copy between two hardware surfaces.
///
/// `dest` and `clip` are in framebuffer pixels and lie inside the
/// framebuffer. `source` is in buffer pixels. Blending, when enabled, is
/// premultiplied source-over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlitRequest {
    /// Source rectangle.
    pub source: Rect,
    /// Destination rectangle, the blit's scale reference.
    pub dest: Rect,
    /// Rotation applied to the whole blit.
    pub rotation: HardwareRotation,
    /// Only pixels inside this rectangle are written.
    pub clip: Rect,
    /// Premultiplied source-over blending.
    pub blend: bool,
    /// Global alpha, 0–255.
    pub global_alpha: u8,
}

/// A solid-colour fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearRequest {
    /// Filled rectangle in framebuffer pixels.
    pub clip: Rect,
    /// Colour packed by [`pack_color`](crate::format::pack_color).
    pub color: u32,
}
