// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What the compositor tells the renderer about each visible view.

use blitplan_core::geom::{Rect, Size};
use blitplan_core::id::SurfaceId;
use blitplan_core::region::Region;
use blitplan_core::transform::Transform;
use kurbo::Affine;

/// How a surface's buffer maps onto the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferViewport {
    /// Buffer transform set by the client.
    pub transform: Transform,
    /// Buffer scale.
    pub scale: i32,
    /// Cropping rectangle in surface coordinates, if any.
    pub source: Option<Rect>,
}

impl Default for BufferViewport {
    fn default() -> Self {
        Self {
            transform: Transform::Normal,
            scale: 1,
            source: None,
        }
    }
}

/// One view of a surface on an output, in compositor stacking order.
#[derive(Clone, Debug)]
pub struct View {
    /// Surface shown by the view.
    pub surface: SurfaceId,
    /// Surface size in surface coordinates.
    pub size: Size,
    /// Surface-local to global transform.
    pub to_global: Affine,
    /// Bounding box of the transformed surface, in global coordinates.
    pub bounding_box: Rect,
    /// Global region hidden by views above this one.
    pub clip: Region,
    /// Surface-local opaque region.
    pub opaque: Region,
    /// Surface-local scissor, if any.
    pub scissor: Option<Region>,
    /// Global alpha in `0.0..=1.0`.
    pub alpha: f32,
    /// Buffer transform, scale and crop.
    pub viewport: BufferViewport,
    /// Whether the view is assigned to the primary plane.
    pub on_primary_plane: bool,
}

impl View {
    /// A fully opaque, unclipped view at `to_global` with default viewport.
    ///
    /// The bounding box is the outward-rounded bounds of the transformed
    /// surface rectangle.
    #[must_use]
    pub fn new(surface: SurfaceId, size: Size, to_global: Affine) -> Self {
        let bounds = to_global.transform_rect_bbox(size.to_rect().to_kurbo());
        Self {
            surface,
            size,
            to_global,
            bounding_box: Rect::from_kurbo_outer(bounds),
            clip: Region::new(),
            opaque: Region::new(),
            scissor: None,
            alpha: 1.0,
            viewport: BufferViewport::default(),
            on_primary_plane: true,
        }
    }

    /// Splits the surface into its opaque and blended sub-regions, both
    /// restricted to the scissor.
    #[must_use]
    pub fn sub_regions(&self) -> (Region, Region) {
        let full = Region::from_rect(self.size.to_rect());
        let (opaque, area) = match &self.scissor {
            Some(s) => (self.opaque.intersect(s), full.intersect(s)),
            None => (self.opaque.intersect(&full), full),
        };
        let blend = area.subtract(&self.opaque);
        (opaque, blend)
    }
}

/// Source rectangle of a blit, in buffer pixels.
///
/// A viewport crop with positive width and an origin inside the buffer is
/// used, with its size swapped for quarter-turn buffer transforms, scaled
/// by the buffer scale and clamped to the buffer. Anything else samples the
/// whole `buffer` rectangle.
#[must_use]
pub fn source_rect(buffer: Rect, buffer_size: Size, viewport: &BufferViewport) -> Rect {
    let Some(src) = viewport.source else {
        return buffer;
    };
    let size = viewport
        .transform
        .transform_size(Size::new(src.width(), src.height()));
    let inside = src.left >= 0
        && src.top >= 0
        && src.left < buffer_size.width
        && src.top < buffer_size.height;
    if size.width <= 0 || !inside {
        return buffer;
    }
    let scale = viewport.scale.max(1);
    Rect::new(
        src.left.saturating_mul(scale),
        src.top.saturating_mul(scale),
        buffer_size
            .width
            .min(src.left.saturating_add(size.width).saturating_mul(scale)),
        buffer_size
            .height
            .min(src.top.saturating_add(size.height).saturating_mul(scale)),
    )
}
