// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-format tables between client buffers and the accelerator.
//!
//! Client formats are named by DRM fourcc. The accelerator names packed RGB
//! formats by memory byte order, so `DrmFourcc::Argb8888` (a little-endian
//! `u32` of `0xAARRGGBB`) is [`HwFormat::Bgra8888`] on the accelerator side.

use drm_fourcc::{DrmFourcc, DrmModifier};

use crate::error::FormatError;

/// Pixel formats understood by the accelerator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HwFormat {
    /// 16-bit R5G6B5.
    Rgb565,
    /// 16-bit B5G6R5.
    Bgr565,
    /// R, G, B, A bytes.
    Rgba8888,
    /// R, G, B, padding bytes.
    Rgbx8888,
    /// B, G, R, A bytes.
    Bgra8888,
    /// B, G, R, padding bytes.
    Bgrx8888,
    /// A, R, G, B bytes.
    Argb8888,
    /// A, B, G, R bytes.
    Abgr8888,
    /// Padding, R, G, B bytes.
    Xrgb8888,
    /// Padding, B, G, R bytes.
    Xbgr8888,
    /// Packed 4:2:2 Y, U, Y, V.
    Yuyv,
    /// Planar 4:2:0, Y then U then V.
    I420,
    /// Planar 4:2:0, Y then V then U.
    Yv12,
    /// Semi-planar 4:2:0, Y then interleaved UV.
    Nv12,
}

impl HwFormat {
    /// Whether the format carries an alpha channel, which decides if a
    /// blend-pass blit enables blending.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Rgba8888 | Self::Bgra8888 | Self::Argb8888 | Self::Abgr8888
        )
    }
}

/// Rounds `x` up to a multiple of 16.
#[must_use]
pub const fn align16(x: i32) -> i32 {
    (x + 15) & !15
}

/// Rounds `x` up to a multiple of 64.
#[must_use]
pub const fn align64(x: i32) -> i32 {
    (x + 63) & !63
}

pub(crate) fn to_usize(v: i32) -> usize {
    usize::try_from(v).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Shared memory
// ---------------------------------------------------------------------------

/// Device-memory layout of an uploaded shared-memory buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShmLayout {
    /// Accelerator format.
    pub format: HwFormat,
    /// Bytes per pixel of the first plane.
    pub bytes_per_pixel: usize,
    /// Row pitch of the first plane in pixels; the width rounded up to 16.
    pub aligned_width: i32,
    /// Rows of the first plane; rounded up to 16 for YUV formats.
    pub plane_height: i32,
    /// Number of planes.
    pub planes: usize,
    /// Total device-buffer size in bytes.
    pub len: usize,
}

impl ShmLayout {
    /// Byte offsets of each plane from the start of the device buffer.
    #[must_use]
    pub fn plane_offsets(&self) -> [usize; 3] {
        let luma = to_usize(self.aligned_width) * to_usize(self.plane_height);
        match self.planes {
            1 => [0, 0, 0],
            2 => [0, luma, 0],
            _ => [0, luma, luma + luma / 4],
        }
    }
}

/// Shared-memory formats the uploader accepts.
pub const SHM_FORMATS: [DrmFourcc; 6] = [
    DrmFourcc::Xrgb8888,
    DrmFourcc::Argb8888,
    DrmFourcc::Rgb565,
    DrmFourcc::Yuyv,
    DrmFourcc::Yuv420,
    DrmFourcc::Nv12,
];

/// Computes the device layout for a `width` × `height` shared-memory buffer.
///
/// # Errors
///
/// [`FormatError::Shm`] if `fourcc` is not in [`SHM_FORMATS`].
pub fn shm_layout(fourcc: DrmFourcc, width: i32, height: i32) -> Result<ShmLayout, FormatError> {
    let aligned_width = align16(width);
    let aw = to_usize(aligned_width);
    let (format, bytes_per_pixel, plane_height, planes) = match fourcc {
        DrmFourcc::Xrgb8888 => (HwFormat::Bgrx8888, 4, height, 1),
        DrmFourcc::Argb8888 => (HwFormat::Bgra8888, 4, height, 1),
        DrmFourcc::Rgb565 => (HwFormat::Rgb565, 2, height, 1),
        DrmFourcc::Yuyv => (HwFormat::Yuyv, 2, align16(height), 1),
        DrmFourcc::Yuv420 => (HwFormat::I420, 1, align16(height), 3),
        DrmFourcc::Nv12 => (HwFormat::Nv12, 1, align16(height), 2),
        other => return Err(FormatError::Shm(other)),
    };
    let h = to_usize(plane_height);
    let len = if planes == 1 {
        aw * h * bytes_per_pixel
    } else {
        aw * h * 3 / 2
    };
    Ok(ShmLayout {
        format,
        bytes_per_pixel,
        aligned_width,
        plane_height,
        planes,
        len,
    })
}

// ---------------------------------------------------------------------------
// DMA-BUF
// ---------------------------------------------------------------------------

/// Vivante 64×64 super-tiled layout.
pub const VIVANTE_SUPER_TILED: u64 = (0x06 << 56) | 2;
/// Vivante super-tiled layout split across two pixel pipes.
pub const VIVANTE_SPLIT_SUPER_TILED: u64 = (0x06 << 56) | 4;

/// Whether `modifier` is one of the Vivante super-tiled layouts.
#[must_use]
pub fn is_super_tiled(modifier: DrmModifier) -> bool {
    matches!(
        u64::from(modifier),
        VIVANTE_SUPER_TILED | VIVANTE_SPLIT_SUPER_TILED
    )
}

/// DMA-BUF formats that can be imported, as advertised to clients.
pub const DMABUF_FORMATS: [DrmFourcc; 7] = [
    DrmFourcc::Argb8888,
    DrmFourcc::Abgr8888,
    DrmFourcc::Xrgb8888,
    DrmFourcc::Rgb565,
    DrmFourcc::Yuyv,
    DrmFourcc::Nv12,
    DrmFourcc::Yuv420,
];

/// Accelerator format and bytes per pixel of the first plane of a DMA-BUF.
///
/// # Errors
///
/// [`FormatError::Dmabuf`] if `fourcc` is not in [`DMABUF_FORMATS`].
pub fn dmabuf_format(fourcc: DrmFourcc) -> Result<(HwFormat, usize), FormatError> {
    Ok(match fourcc {
        DrmFourcc::Argb8888 => (HwFormat::Bgra8888, 4),
        DrmFourcc::Abgr8888 => (HwFormat::Rgba8888, 4),
        DrmFourcc::Xrgb8888 => (HwFormat::Bgrx8888, 4),
        DrmFourcc::Rgb565 => (HwFormat::Rgb565, 2),
        DrmFourcc::Yuyv => (HwFormat::Yuyv, 2),
        DrmFourcc::Nv12 => (HwFormat::Nv12, 1),
        DrmFourcc::Yuv420 => (HwFormat::I420, 1),
        other => return Err(FormatError::Dmabuf(other)),
    })
}

// ---------------------------------------------------------------------------
// Readback
// ---------------------------------------------------------------------------

/// How framebuffer pixels are read back for a capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadFormat {
    /// Accelerator format of the temporary readback surface.
    pub format: HwFormat,
    /// Bits per pixel of the delivered data.
    pub bits_per_pixel: u32,
}

impl ReadFormat {
    /// Bytes occupied by one tightly packed row of `width` pixels.
    #[must_use]
    pub fn row_bytes(self, width: i32) -> usize {
        to_usize(width) * self.bits_per_pixel as usize / 8
    }
}

/// Looks up the readback mapping for a capture format.
///
/// # Errors
///
/// [`FormatError::Readback`] for formats the accelerator cannot write.
pub fn read_format(fourcc: DrmFourcc) -> Result<ReadFormat, FormatError> {
    let (format, bits_per_pixel) = match fourcc {
        DrmFourcc::Rgb565 => (HwFormat::Rgb565, 16),
        DrmFourcc::Bgr565 => (HwFormat::Bgr565, 16),
        DrmFourcc::Abgr8888 => (HwFormat::Rgba8888, 32),
        DrmFourcc::Xbgr8888 => (HwFormat::Rgbx8888, 32),
        DrmFourcc::Argb8888 => (HwFormat::Bgra8888, 32),
        DrmFourcc::Xrgb8888 => (HwFormat::Bgrx8888, 32),
        DrmFourcc::Bgra8888 => (HwFormat::Argb8888, 32),
        DrmFourcc::Rgba8888 => (HwFormat::Abgr8888, 32),
        DrmFourcc::Bgrx8888 => (HwFormat::Xrgb8888, 32),
        DrmFourcc::Rgbx8888 => (HwFormat::Xbgr8888, 32),
        DrmFourcc::Yvu420 => (HwFormat::Yv12, 12),
        DrmFourcc::Yuyv => (HwFormat::Yuyv, 16),
        other => return Err(FormatError::Readback(other)),
    };
    Ok(ReadFormat {
        format,
        bits_per_pixel,
    })
}

// ---------------------------------------------------------------------------
// Solid colours
// ---------------------------------------------------------------------------

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to 0..=255 before the cast"
)]
fn channel(c: f32) -> u32 {
    (c * 255.0).round().clamp(0.0, 255.0) as u32
}

/// Packs a straight RGBA colour for a clear, in the accelerator's
/// `A B G R` (high to low) register layout.
///
/// # Errors
///
/// [`FormatError::SolidColor`] for anything but ARGB8888 and XRGB8888.
pub fn pack_color(fourcc: DrmFourcc, rgba: [f32; 4]) -> Result<u32, FormatError> {
    match fourcc {
        DrmFourcc::Argb8888 | DrmFourcc::Xrgb8888 => {
            let [r, g, b, a] = rgba.map(channel);
            Ok((a << 24) | (b << 16) | (g << 8) | r)
        }
        other => Err(FormatError::SolidColor(other)),
    }
}
