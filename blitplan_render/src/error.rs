// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use blitplan_core::geom::{Rect, Size};
use blitplan_core::id::SurfaceId;
use drm_fourcc::DrmFourcc;
use thiserror::Error;

/// The accelerator rejected an operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccelError {
    /// A blit failed.
    #[error("blit failed: {0}")]
    Blit(String),
    /// A clear failed.
    #[error("clear failed: {0}")]
    Clear(String),
    /// Device memory could not be allocated.
    #[error("cannot allocate {len} bytes of device memory")]
    Alloc {
        /// Requested size in bytes.
        len: usize,
    },
    /// A device buffer could not be mapped for CPU access.
    #[error("cannot map device buffer {0}")]
    Map(u64),
    /// Pixel readback failed.
    #[error("readback of {rect:?} failed: {reason}")]
    Readback {
        /// Requested rectangle.
        rect: Rect,
        /// Accelerator-specific reason.
        reason: String,
    },
}

/// A pixel format the accelerator path has no mapping for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Not a supported shared-memory format.
    #[error("unknown shm buffer format {0:?}")]
    Shm(DrmFourcc),
    /// Not a supported DMA-BUF format.
    #[error("unknown dmabuf buffer format {0:?}")]
    Dmabuf(DrmFourcc),
    /// No readback mapping.
    #[error("format {0:?} not supported for readback")]
    Readback(DrmFourcc),
    /// Solid colours can only be packed for 32-bit RGB formats.
    #[error("cannot pack a solid colour as {0:?}")]
    SolidColor(DrmFourcc),
}

/// Waiting on an acquire fence failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FenceError {
    /// The timeout elapsed before the fence signalled.
    #[error("timed out waiting for fence")]
    Timeout,
    /// The fence is in an error state.
    #[error("fence wait failed: {0}")]
    Failed(String),
}

/// A buffer could not be attached, uploaded or made ready.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The handle does not refer to a live surface.
    #[error("stale surface handle {0:?}")]
    StaleSurface(SurfaceId),
    /// Vendor buffer reported a non-positive size.
    #[error("invalid vendor buffer of size {width}x{height}")]
    InvalidBuffer {
        /// Reported width.
        width: i32,
        /// Reported height.
        height: i32,
    },
    /// Client pixel data is shorter than its declared layout.
    #[error("shm data holds {have} bytes, layout needs {need}")]
    ShortData {
        /// Bytes available.
        have: usize,
        /// Bytes required.
        need: usize,
    },
    /// Unsupported pixel format.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Device memory failure.
    #[error(transparent)]
    Accel(#[from] AccelError),
    /// The producer never signalled.
    #[error(transparent)]
    Fence(#[from] FenceError),
}

/// Output configuration or repaint failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The compositing area does not fit in the framebuffer.
    #[error("compositing area {area:?} does not fit framebuffer {fb_size:?}")]
    InvalidArea {
        /// Framebuffer size.
        fb_size: Size,
        /// Requested compositing area.
        area: Rect,
    },
    /// Repaint requested before a framebuffer was set.
    #[error("output has no framebuffer")]
    NoFramebuffer,
}

/// Why a capture task could not be serviced.
///
/// The `Display` text is the short diagnostic handed back to the client.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The target buffer's type, origin, or shape is not supported.
    #[error("unsupported buffer")]
    UnsupportedBuffer,
    /// Reading the framebuffer back failed.
    #[error("capture failed")]
    Failed(#[source] CaptureFailure),
}

/// Detail behind [`CaptureError::Failed`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CaptureFailure {
    /// Row stride is not a multiple of four bytes.
    #[error("stride {0} is not a multiple of 4")]
    Stride(i32),
    /// The target buffer is smaller than the captured rectangle.
    #[error("target holds {have} bytes, capture needs {need}")]
    ShortBuffer {
        /// Bytes available.
        have: usize,
        /// Bytes required.
        need: usize,
    },
    /// The read format has no accelerator mapping.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The accelerator readback failed.
    #[error(transparent)]
    Accel(#[from] AccelError),
}
