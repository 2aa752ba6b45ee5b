// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client buffers and the per-surface state built from them.
//!
//! Every buffer kind is reduced to one [`HwSurface`] descriptor at attach
//! time (or, for vendor buffers, at every readiness check), so the repaint
//! path never looks at where the pixels came from.

use std::fmt;
use std::sync::Arc;

use blitplan_core::geom::Rect;
use blitplan_core::region::Region;
use drm_fourcc::{DrmFourcc, DrmModifier};

use crate::accel::{BlitAccelerator, DeviceBuffer, HwSurface, TileStatus, Tiling};
use crate::error::BufferError;
use crate::fence::AcquireFence;
use crate::format::{
    self, HwFormat, ShmLayout, align64, dmabuf_format, is_super_tiled, pack_color, shm_layout,
    to_usize,
};
use crate::plan::BlitRequest;

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

/// A client buffer in shared memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ShmBuffer {
    /// Pixel format.
    pub format: DrmFourcc,
    /// Width in pixels.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
    /// Row pitch of the first plane in bytes.
    pub stride: i32,
    /// Pixel data, planes back to back.
    pub data: Vec<u8>,
}

impl fmt::Debug for ShmBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShmBuffer")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}

/// One plane of a DMA-BUF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmabufPlane {
    /// Physical address of the backing memory.
    pub address: u64,
    /// Byte offset of the plane.
    pub offset: u32,
    /// Row pitch in bytes.
    pub stride: u32,
}

/// A client buffer shared as a DMA-BUF.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DmabufBuffer {
    /// Pixel format.
    pub format: DrmFourcc,
    /// Layout modifier.
    pub modifier: DrmModifier,
    /// Width in pixels.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
    /// Up to three planes.
    pub planes: Vec<DmabufPlane>,
}

/// What a vendor-managed GPU buffer reports about itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VendorBufferInfo {
    /// Accelerator format.
    pub format: HwFormat,
    /// Width in pixels.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
    /// Row pitch in pixels.
    pub aligned_width: i32,
    /// Plane addresses relative to `gpu_base`.
    pub physical: [u64; 3],
    /// Base of the GPU address window.
    pub gpu_base: u64,
    /// Memory layout.
    pub tiling: Tiling,
    /// Tile-status buffer, when compression is enabled.
    pub tile_status: Option<TileStatus>,
}

/// A GPU buffer whose layout is owned by the vendor driver and may change
/// between frames.
pub trait VendorBuffer: fmt::Debug {
    /// Current layout.
    fn query(&self) -> VendorBufferInfo;
}

/// A single-colour buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidColor {
    /// ARGB8888 or XRGB8888.
    pub format: DrmFourcc,
    /// Straight red, green, blue, alpha in `0.0..=1.0`.
    pub rgba: [f32; 4],
}

/// A buffer handed to [`Renderer::attach`](crate::Renderer::attach).
#[derive(Clone, Debug)]
pub enum AttachedBuffer {
    /// Shared memory, uploaded into device memory on damage flush.
    Shm(ShmBuffer),
    /// DMA-BUF, read in place.
    Dmabuf(DmabufBuffer),
    /// Vendor GPU buffer, read in place.
    Opaque(Arc<dyn VendorBuffer>),
    /// Solid colour, drawn with clears.
    Solid(SolidColor),
}

/// Tag of the attached buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// See [`AttachedBuffer::Shm`].
    Shm,
    /// See [`AttachedBuffer::Dmabuf`].
    Dmabuf,
    /// See [`AttachedBuffer::Opaque`].
    Opaque,
    /// See [`AttachedBuffer::Solid`].
    Solid,
}

// ---------------------------------------------------------------------------
// Surface state
// ---------------------------------------------------------------------------

/// Packed clear colour of a solid surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SolidFill {
    pub(crate) color: u32,
    pub(crate) opaque: bool,
}

/// Renderer-side state of one surface.
pub(crate) struct SurfaceState<F> {
    pub(crate) kind: Option<BufferKind>,
    pub(crate) attached: bool,
    pub(crate) hw: HwSurface,
    pub(crate) solid: Option<SolidFill>,
    shm: Option<ShmBuffer>,
    shm_layout: Option<ShmLayout>,
    device: Option<DeviceBuffer>,
    vendor: Option<Arc<dyn VendorBuffer>>,
    texture_damage: Region,
    pub(crate) acquire_fence: Option<Box<dyn AcquireFence>>,
    pub(crate) release_requested: bool,
    pub(crate) release_fence: Option<F>,
    pub(crate) last_blit: Option<BlitRequest>,
}

impl<F> fmt::Debug for SurfaceState<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceState")
            .field("kind", &self.kind)
            .field("attached", &self.attached)
            .field("hw", &self.hw)
            .field("solid", &self.solid)
            .field("device", &self.device)
            .field("texture_damage", &self.texture_damage)
            .field("release_requested", &self.release_requested)
            .field("has_release_fence", &self.release_fence.is_some())
            .finish_non_exhaustive()
    }
}

impl<F> SurfaceState<F> {
    pub(crate) fn new() -> Self {
        Self {
            kind: None,
            attached: false,
            hw: HwSurface::EMPTY,
            solid: None,
            shm: None,
            shm_layout: None,
            device: None,
            vendor: None,
            texture_damage: Region::new(),
            acquire_fence: None,
            release_requested: false,
            release_fence: None,
            last_blit: None,
        }
    }

    /// Returns device memory to the accelerator.
    pub(crate) fn release_device_memory<A: BlitAccelerator>(&mut self, accel: &mut A) {
        if let Some(buffer) = self.device.take() {
            accel.free(buffer);
        }
        self.shm_layout = None;
    }

    /// Attaches `buffer`, or detaches on `None`.
    ///
    /// A format the accelerator cannot read is logged and reported; the
    /// surface is still marked attached and keeps its previous descriptor.
    pub(crate) fn attach<A: BlitAccelerator>(
        &mut self,
        accel: &mut A,
        buffer: Option<AttachedBuffer>,
    ) -> Result<(), BufferError> {
        self.solid = None;
        self.shm = None;
        self.vendor = None;
        self.acquire_fence = None;

        let Some(buffer) = buffer else {
            self.attached = false;
            self.kind = None;
            return Ok(());
        };

        let result = match buffer {
            AttachedBuffer::Shm(b) => self.attach_shm(accel, b),
            AttachedBuffer::Dmabuf(b) => self.attach_dmabuf(&b),
            AttachedBuffer::Opaque(v) => {
                self.vendor = Some(v);
                self.kind = Some(BufferKind::Opaque);
                Ok(())
            }
            AttachedBuffer::Solid(c) => self.attach_solid(c),
        };
        self.attached = true;
        result
    }

    fn attach_shm<A: BlitAccelerator>(
        &mut self,
        accel: &mut A,
        buffer: ShmBuffer,
    ) -> Result<(), BufferError> {
        let layout = shm_layout(buffer.format, buffer.width, buffer.height).inspect_err(|e| {
            tracing::warn!(error = %e, "shm attach: unsupported format");
        })?;

        let device = match self.device {
            Some(d) if d.len >= layout.len => d,
            stale => {
                if let Some(d) = stale {
                    accel.free(d);
                }
                self.device = None;
                let d = accel.alloc(layout.len)?;
                self.device = Some(d);
                d
            }
        };

        let mut planes = [0_u64; 3];
        for (slot, offset) in planes.iter_mut().zip(layout.plane_offsets()).take(layout.planes) {
            *slot = device.address + offset as u64;
        }
        self.hw = HwSurface {
            format: layout.format,
            planes,
            rect: Rect::new(0, 0, buffer.width, buffer.height),
            stride: layout.aligned_width,
            width: buffer.width,
            height: layout.plane_height,
            tiling: Tiling::Linear,
            tile_status: None,
        };
        self.shm_layout = Some(layout);
        self.shm = Some(buffer);
        self.kind = Some(BufferKind::Shm);
        Ok(())
    }

    fn attach_dmabuf(&mut self, buffer: &DmabufBuffer) -> Result<(), BufferError> {
        let (format, bpp) = dmabuf_format(buffer.format).inspect_err(|e| {
            tracing::warn!(error = %e, "dmabuf attach: unsupported format");
        })?;

        let mut planes = [0_u64; 3];
        for (slot, plane) in planes.iter_mut().zip(&buffer.planes) {
            *slot = plane.address + u64::from(plane.offset);
        }
        let (stride, tiling) = if is_super_tiled(buffer.modifier) {
            (align64(buffer.width), Tiling::SuperTiled)
        } else {
            let pitch = buffer.planes.first().map_or(0, |p| p.stride as usize);
            (i32::try_from(pitch / bpp).unwrap_or(i32::MAX), Tiling::Linear)
        };
        self.hw = HwSurface {
            format,
            planes,
            rect: Rect::new(0, 0, buffer.width, buffer.height),
            stride,
            width: buffer.width,
            height: buffer.height,
            tiling,
            tile_status: None,
        };
        self.kind = Some(BufferKind::Dmabuf);
        Ok(())
    }

    fn attach_solid(&mut self, color: SolidColor) -> Result<(), BufferError> {
        let packed = pack_color(color.format, color.rgba)?;
        self.solid = Some(SolidFill {
            color: packed,
            opaque: color.format == DrmFourcc::Xrgb8888 || color.rgba[3] >= 1.0,
        });
        self.kind = Some(BufferKind::Solid);
        Ok(())
    }

    /// Rebuilds the descriptor of a vendor buffer from its current layout.
    pub(crate) fn refresh_vendor_descriptor(&mut self) -> Result<(), BufferError> {
        let Some(vendor) = &self.vendor else {
            return Ok(());
        };
        let info = vendor.query();
        if info.width <= 0 || info.height <= 0 {
            tracing::warn!(
                width = info.width,
                height = info.height,
                "invalid vendor buffer"
            );
            return Err(BufferError::InvalidBuffer {
                width: info.width,
                height: info.height,
            });
        }
        self.hw = HwSurface {
            format: info.format,
            planes: info.physical.map(|p| p + info.gpu_base),
            rect: Rect::new(0, 0, info.width, info.height),
            stride: info.aligned_width,
            width: info.width,
            height: info.height,
            tiling: info.tiling,
            tile_status: info.tile_status,
        };
        Ok(())
    }

    /// Folds `damage` into the pending texture damage and, for a surface
    /// shown on the primary plane, uploads pending shared-memory pixels.
    ///
    /// Off the primary plane the damage keeps accumulating until a flush
    /// where the surface is composited.
    pub(crate) fn flush_damage<A: BlitAccelerator>(
        &mut self,
        accel: &mut A,
        damage: &Region,
        on_primary_plane: bool,
    ) -> Result<(), BufferError> {
        self.texture_damage.union(damage);
        if !on_primary_plane || self.texture_damage.is_empty() {
            return Ok(());
        }
        if let (Some(buffer), Some(layout), Some(device)) =
            (self.shm.take(), self.shm_layout, self.device)
        {
            let dst = accel.map_mut(&device)?;
            upload_shm(dst, &buffer, &layout)?;
        }
        self.texture_damage.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared-memory upload
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct PlaneCopy {
    src_offset: usize,
    src_stride: usize,
    dst_offset: usize,
    dst_stride: usize,
    rows: usize,
}

fn plane_copies(buffer: &ShmBuffer, layout: &ShmLayout) -> Vec<PlaneCopy> {
    let stride = to_usize(buffer.stride);
    let height = to_usize(buffer.height);
    let aw = to_usize(layout.aligned_width);
    let dst_offsets = layout.plane_offsets();

    let mut copies = vec![PlaneCopy {
        src_offset: 0,
        src_stride: stride,
        dst_offset: 0,
        dst_stride: aw * layout.bytes_per_pixel,
        rows: height,
    }];
    let luma = stride * height;
    match layout.format {
        HwFormat::Nv12 => copies.push(PlaneCopy {
            src_offset: luma,
            src_stride: stride,
            dst_offset: dst_offsets[1],
            dst_stride: aw,
            rows: height / 2,
        }),
        HwFormat::I420 => {
            for i in 0..2 {
                copies.push(PlaneCopy {
                    src_offset: luma + i * (luma / 4),
                    src_stride: stride / 2,
                    dst_offset: dst_offsets[1 + i],
                    dst_stride: aw / 2,
                    rows: height / 2,
                });
            }
        }
        _ => {}
    }
    copies
}

fn copy_plane(dst: &mut [u8], src: &[u8], p: &PlaneCopy) -> Result<(), BufferError> {
    let dst_len = dst.len();
    if p.src_stride == p.dst_stride {
        let len = p.src_stride * p.rows;
        let s = src
            .get(p.src_offset..p.src_offset + len)
            .ok_or(BufferError::ShortData {
                have: src.len(),
                need: p.src_offset + len,
            })?;
        let d = dst
            .get_mut(p.dst_offset..p.dst_offset + len)
            .ok_or(BufferError::ShortData {
                have: dst_len,
                need: p.dst_offset + len,
            })?;
        d.copy_from_slice(s);
        return Ok(());
    }

    let n = p.src_stride.min(p.dst_stride);
    for row in 0..p.rows {
        let so = p.src_offset + row * p.src_stride;
        let do_ = p.dst_offset + row * p.dst_stride;
        let s = src.get(so..so + n).ok_or(BufferError::ShortData {
            have: src.len(),
            need: so + n,
        })?;
        let d = dst.get_mut(do_..do_ + n).ok_or(BufferError::ShortData {
            have: dst_len,
            need: do_ + n,
        })?;
        d.copy_from_slice(s);
    }
    Ok(())
}

/// Copies every plane of `buffer` into the device mapping `dst`.
///
/// Planes whose source and device pitches agree go over in one copy, the
/// rest row by row; chroma planes have half the rows.
pub(crate) fn upload_shm(
    dst: &mut [u8],
    buffer: &ShmBuffer,
    layout: &ShmLayout,
) -> Result<(), BufferError> {
    for p in plane_copies(buffer, layout) {
        copy_plane(dst, &buffer.data, &p)?;
    }
    Ok(())
}

/// Whether `fourcc` can be attached as shared memory.
#[must_use]
pub fn is_shm_format_supported(fourcc: DrmFourcc) -> bool {
    format::SHM_FORMATS.contains(&fourcc)
}
