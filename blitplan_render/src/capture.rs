// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Framebuffer capture (screenshot and screen-recording) tasks.

use blitplan_core::geom::{Rect, Size};
use drm_fourcc::DrmFourcc;

use crate::accel::{BlitAccelerator, HwSurface};
use crate::error::{CaptureError, CaptureFailure};
use crate::format::{read_format, to_usize};

/// What a capture task wants read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureSource {
    /// The compositing area.
    Framebuffer,
    /// The whole framebuffer, borders included.
    FullFramebuffer,
}

/// Storage behind a capture target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureBufferKind {
    /// CPU-visible shared memory.
    Shm,
    /// DMA-BUF.
    Dmabuf,
}

/// Row order of a capture target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferOrigin {
    /// First row is the top of the image.
    TopLeft,
    /// First row is the bottom of the image.
    BottomLeft,
}

/// The client buffer a capture is written into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureBuffer {
    /// Storage type.
    pub kind: CaptureBufferKind,
    /// Row order.
    pub origin: BufferOrigin,
    /// Width in pixels.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
    /// Row pitch in bytes.
    pub stride: i32,
    /// Pixel format.
    pub format: DrmFourcc,
    /// Pixel data (empty for non-SHM buffers).
    pub data: Vec<u8>,
}

/// A pending capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureTask {
    /// Caller-assigned identifier.
    pub id: u64,
    /// Target buffer.
    pub buffer: CaptureBuffer,
}

/// Source of capture tasks for one output.
pub trait CaptureQueue {
    /// Takes the next task for `source` whose buffer is `size` in `format`.
    fn pull(&mut self, source: CaptureSource, size: Size, format: DrmFourcc)
    -> Option<CaptureTask>;

    /// Hands a finished task back with its outcome.
    fn retire(&mut self, task: CaptureTask, result: Result<(), CaptureError>);
}

/// A queue with no tasks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCaptures;

impl CaptureQueue for NoCaptures {
    fn pull(&mut self, _: CaptureSource, _: Size, _: DrmFourcc) -> Option<CaptureTask> {
        None
    }

    fn retire(&mut self, _: CaptureTask, _: Result<(), CaptureError>) {}
}

/// Framebuffer rectangle read for `source`, in the accelerator's
/// bottom-left-origin coordinates.
#[must_use]
pub fn readback_rect(source: CaptureSource, fb_size: Size, area: Rect) -> Rect {
    match source {
        CaptureSource::Framebuffer => Rect::from_origin_size(
            area.left,
            fb_size.height - area.top - area.height(),
            area.width(),
            area.height(),
        ),
        CaptureSource::FullFramebuffer => fb_size.to_rect(),
    }
}

/// Reads `rect` of `framebuffer` into `buffer`, top row first.
pub(crate) fn read_into<A: BlitAccelerator>(
    accel: &mut A,
    framebuffer: &HwSurface,
    rect: Rect,
    buffer: &mut CaptureBuffer,
) -> Result<(), CaptureError> {
    if buffer.kind != CaptureBufferKind::Shm || buffer.origin != BufferOrigin::TopLeft {
        return Err(CaptureError::UnsupportedBuffer);
    }
    if buffer.width != rect.width() || buffer.height != rect.height() {
        return Err(CaptureError::UnsupportedBuffer);
    }
    if buffer.stride % 4 != 0 {
        return Err(CaptureError::Failed(CaptureFailure::Stride(buffer.stride)));
    }
    let fmt = read_format(buffer.format)
        .map_err(|e| CaptureError::Failed(CaptureFailure::Format(e)))?;

    let row = fmt.row_bytes(rect.width());
    let rows = to_usize(rect.height());
    let stride = to_usize(buffer.stride);
    let need = if rows == 0 {
        0
    } else {
        stride * (rows - 1) + row
    };
    if row > stride || buffer.data.len() < need {
        return Err(CaptureError::Failed(CaptureFailure::ShortBuffer {
            have: buffer.data.len(),
            need,
        }));
    }

    let mut scratch = vec![0_u8; row * rows];
    accel
        .read_pixels(framebuffer, rect, fmt.format, &mut scratch)
        .map_err(|e| CaptureError::Failed(CaptureFailure::Accel(e)))?;

    for (i, src) in scratch.chunks_exact(row.max(1)).take(rows).enumerate() {
        let start = (rows - 1 - i) * stride;
        buffer.data[start..start + row].copy_from_slice(src);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HwFormat;
    use crate::test_util::MockAccel;

    fn fb() -> HwSurface {
        HwSurface::linear(HwFormat::Bgra8888, 0x4000, 4, 3, 4)
    }

    fn target(width: i32, height: i32, stride: i32) -> CaptureBuffer {
        CaptureBuffer {
            kind: CaptureBufferKind::Shm,
            origin: BufferOrigin::TopLeft,
            width,
            height,
            stride,
            format: DrmFourcc::Argb8888,
            data: vec![0; to_usize(stride * height)],
        }
    }

    #[test]
    fn framebuffer_rect_is_bottom_left_origin() {
        let r = readback_rect(
            CaptureSource::Framebuffer,
            Size::new(100, 80),
            Rect::from_origin_size(10, 5, 50, 40),
        );
        assert_eq!(r, Rect::from_origin_size(10, 35, 50, 40));
        let r = readback_rect(
            CaptureSource::FullFramebuffer,
            Size::new(100, 80),
            Rect::from_origin_size(10, 5, 50, 40),
        );
        assert_eq!(r, Rect::new(0, 0, 100, 80));
    }

    #[test]
    fn rows_are_flipped() {
        let mut accel = MockAccel::default();
        // Row i of the readback is filled with byte i.
        accel.readback_fill = true;
        let mut buf = target(4, 3, 16);
        read_into(&mut accel, &fb(), Rect::new(0, 0, 4, 3), &mut buf).unwrap();
        assert!(buf.data[0..16].iter().all(|b| *b == 2));
        assert!(buf.data[16..32].iter().all(|b| *b == 1));
        assert!(buf.data[32..48].iter().all(|b| *b == 0));
    }

    #[test]
    fn padded_stride_leaves_padding() {
        let mut accel = MockAccel::default();
        accel.readback_fill = true;
        let mut buf = target(4, 2, 20);
        buf.data.fill(0xEE);
        read_into(&mut accel, &fb(), Rect::new(0, 0, 4, 2), &mut buf).unwrap();
        assert!(buf.data[0..16].iter().all(|b| *b == 1));
        assert!(buf.data[16..20].iter().all(|b| *b == 0xEE));
        assert!(buf.data[20..36].iter().all(|b| *b == 0));
    }

    #[test]
    fn unsupported_buffers() {
        let mut accel = MockAccel::default();
        let mut buf = target(4, 3, 16);
        buf.kind = CaptureBufferKind::Dmabuf;
        assert_eq!(
            read_into(&mut accel, &fb(), Rect::new(0, 0, 4, 3), &mut buf),
            Err(CaptureError::UnsupportedBuffer)
        );
        let mut buf = target(4, 3, 16);
        buf.origin = BufferOrigin::BottomLeft;
        assert_eq!(
            read_into(&mut accel, &fb(), Rect::new(0, 0, 4, 3), &mut buf),
            Err(CaptureError::UnsupportedBuffer)
        );
    }

    #[test]
    fn failures() {
        let mut accel = MockAccel::default();
        let mut buf = target(4, 3, 18);
        assert_eq!(
            read_into(&mut accel, &fb(), Rect::new(0, 0, 4, 3), &mut buf),
            Err(CaptureError::Failed(CaptureFailure::Stride(18)))
        );

        let mut buf = target(4, 3, 16);
        buf.format = DrmFourcc::Nv12;
        let err = read_into(&mut accel, &fb(), Rect::new(0, 0, 4, 3), &mut buf).unwrap_err();
        assert_eq!(err.to_string(), "capture failed");

        let mut buf = target(4, 3, 16);
        accel.fail_readback = true;
        assert!(matches!(
            read_into(&mut accel, &fb(), Rect::new(0, 0, 4, 3), &mut buf),
            Err(CaptureError::Failed(CaptureFailure::Accel(_)))
        ));
    }
}
