// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The blit accelerator seam and the surface descriptors it consumes.

use blitplan_core::geom::Rect;

use crate::error::AccelError;
use crate::format::HwFormat;
use crate::plan::{BlitRequest, ClearRequest};

/// Memory layout of a hardware surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tiling {
    /// Row-major.
    #[default]
    Linear,
    /// Vivante 64×64 super tiles.
    SuperTiled,
}

/// Tile-status (fast-clear) side buffer of a vendor surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileStatus {
    /// Physical address of the tile-status buffer.
    pub address: u64,
    /// Fast-clear value, low and high words, when fast clear is enabled.
    pub fast_clear: Option<(u32, u32)>,
}

/// Everything the accelerator needs to read or write a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HwSurface {
    /// Pixel format.
    pub format: HwFormat,
    /// Physical address of each plane; unused planes are zero.
    pub planes: [u64; 3],
    /// Content rectangle in pixels.
    pub rect: Rect,
    /// Row pitch in pixels.
    pub stride: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in rows, possibly padded past `rect`.
    pub height: i32,
    /// Memory layout.
    pub tiling: Tiling,
    /// Present when the surface is compressed with a tile-status buffer.
    pub tile_status: Option<TileStatus>,
}

impl HwSurface {
    /// A descriptor with no pixels, used before the first attach.
    pub const EMPTY: Self = Self {
        format: HwFormat::Bgrx8888,
        planes: [0; 3],
        rect: Rect::ZERO,
        stride: 0,
        width: 0,
        height: 0,
        tiling: Tiling::Linear,
        tile_status: None,
    };

    /// A single-plane linear surface covering `width` × `height`.
    #[must_use]
    pub fn linear(format: HwFormat, address: u64, width: i32, height: i32, stride: i32) -> Self {
        Self {
            format,
            planes: [address, 0, 0],
            rect: Rect::new(0, 0, width, height),
            stride,
            width,
            height,
            tiling: Tiling::Linear,
            tile_status: None,
        }
    }

    /// Whether the surface has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// A block of device memory owned by the accelerator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceBuffer {
    /// Accelerator-assigned handle.
    pub id: u64,
    /// Physical address of the first byte.
    pub address: u64,
    /// Size in bytes.
    pub len: usize,
}

/// A fixed-function 2D blit engine.
///
/// All rectangles handed to [`blit`](Self::blit) and [`clear`](Self::clear)
/// lie inside the destination surface; the caller clamps them beforehand.
/// Operations are queued; [`finish`](Self::finish) or a fence from
/// [`create_fence`](Self::create_fence) marks their completion.
pub trait BlitAccelerator {
    /// Completion fence type handed to buffer-release listeners.
    type Fence: Clone;

    /// Copies `req.source` of `src` onto `req.dest` of `dst`, rotated by
    /// `req.rotation` and restricted to `req.clip`.
    ///
    /// # Errors
    ///
    /// Any accelerator-side failure; the caller logs it and moves on.
    fn blit(&mut self, req: &BlitRequest, src: &HwSurface, dst: &HwSurface)
    -> Result<(), AccelError>;

    /// Fills `req.clip` of `dst` with a packed colour.
    ///
    /// # Errors
    ///
    /// Any accelerator-side failure.
    fn clear(&mut self, req: &ClearRequest, dst: &HwSurface) -> Result<(), AccelError>;

    /// Blocks until every queued operation has completed.
    fn finish(&mut self);

    /// Returns a fence that signals when the queued operations complete, or
    /// `None` if the accelerator cannot export one.
    fn create_fence(&mut self) -> Option<Self::Fence>;

    /// Allocates `len` bytes of physically contiguous device memory.
    ///
    /// # Errors
    ///
    /// [`AccelError::Alloc`] when memory is exhausted.
    fn alloc(&mut self, len: usize) -> Result<DeviceBuffer, AccelError>;

    /// Returns device memory to the accelerator.
    fn free(&mut self, buffer: DeviceBuffer);

    /// CPU view of a device buffer, used to upload shared-memory pixels.
    ///
    /// # Errors
    ///
    /// [`AccelError::Map`] when the buffer is unknown or cannot be mapped.
    fn map_mut(&mut self, buffer: &DeviceBuffer) -> Result<&mut [u8], AccelError>;

    /// Reads `rect` of `src` as `format` into `out`, tightly packed, rows in
    /// bottom-to-top order, and waits for completion.
    ///
    /// # Errors
    ///
    /// [`AccelError::Readback`] on failure.
    fn read_pixels(
        &mut self,
        src: &HwSurface,
        rect: Rect,
        format: HwFormat,
        out: &mut [u8],
    ) -> Result<(), AccelError>;
}
