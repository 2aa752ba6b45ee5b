// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accelerator call recording.
//!
//! [`RecordingAccel`] forwards every call to an inner accelerator and keeps
//! an ordered log of [`RecordedOp`]s, including the calls that failed.
//! [`NullAccel`] is an inner accelerator with no hardware behind it: it
//! accepts every operation, backs allocations with heap memory, and hands
//! out numbered fences when asked to.

use std::collections::BTreeMap;

use blitplan_core::geom::Rect;
use blitplan_render::{
    AccelError, BlitAccelerator, BlitRequest, ClearRequest, DeviceBuffer, HwFormat, HwSurface,
};

// ---------------------------------------------------------------------------
// Recorded operations
// ---------------------------------------------------------------------------

/// One accelerator call as seen by [`RecordingAccel`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedOp {
    /// A blit.
    Blit {
        /// The request.
        request: BlitRequest,
        /// Source descriptor.
        source: HwSurface,
        /// Destination descriptor.
        target: HwSurface,
        /// Whether the inner accelerator accepted it.
        ok: bool,
    },
    /// A solid-colour clear.
    Clear {
        /// The request.
        request: ClearRequest,
        /// Destination descriptor.
        target: HwSurface,
        /// Whether the inner accelerator accepted it.
        ok: bool,
    },
    /// A synchronous finish.
    Finish,
    /// A fence query; `issued` is false when the device had none to give.
    Fence {
        /// Whether a fence came back.
        issued: bool,
    },
    /// A framebuffer readback.
    Readback {
        /// Rectangle read, bottom-left origin.
        rect: Rect,
        /// Format it was read as.
        format: HwFormat,
        /// Whether the readback succeeded.
        ok: bool,
    },
    /// A device allocation.
    Alloc {
        /// Requested size in bytes.
        len: usize,
    },
    /// A device free.
    Free {
        /// Handle of the freed buffer.
        id: u64,
    },
}

impl RecordedOp {
    /// Short lowercase name of the operation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blit { .. } => "blit",
            Self::Clear { .. } => "clear",
            Self::Finish => "finish",
            Self::Fence { .. } => "fence",
            Self::Readback { .. } => "readback",
            Self::Alloc { .. } => "alloc",
            Self::Free { .. } => "free",
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingAccel
// ---------------------------------------------------------------------------

/// A [`BlitAccelerator`] that logs every call before forwarding it.
#[derive(Debug, Default)]
pub struct RecordingAccel<A = NullAccel> {
    inner: A,
    ops: Vec<RecordedOp>,
}

impl<A: BlitAccelerator> RecordingAccel<A> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            ops: Vec::new(),
        }
    }

    /// Operations recorded so far, oldest first.
    #[must_use]
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Takes the recorded operations, leaving the log empty.
    pub fn take_ops(&mut self) -> Vec<RecordedOp> {
        std::mem::take(&mut self.ops)
    }

    /// Blit requests that the inner accelerator accepted.
    pub fn blits(&self) -> impl Iterator<Item = &BlitRequest> {
        self.ops.iter().filter_map(|op| match op {
            RecordedOp::Blit {
                request, ok: true, ..
            } => Some(request),
            _ => None,
        })
    }

    /// Clear requests that the inner accelerator accepted.
    pub fn clears(&self) -> impl Iterator<Item = &ClearRequest> {
        self.ops.iter().filter_map(|op| match op {
            RecordedOp::Clear {
                request, ok: true, ..
            } => Some(request),
            _ => None,
        })
    }

    /// The wrapped accelerator.
    #[must_use]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// The wrapped accelerator, mutably.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }
}

impl<A: BlitAccelerator> BlitAccelerator for RecordingAccel<A> {
    type Fence = A::Fence;

    fn blit(
        &mut self,
        req: &BlitRequest,
        src: &HwSurface,
        dst: &HwSurface,
    ) -> Result<(), AccelError> {
        let result = self.inner.blit(req, src, dst);
        self.ops.push(RecordedOp::Blit {
            request: *req,
            source: *src,
            target: *dst,
            ok: result.is_ok(),
        });
        result
    }

    fn clear(&mut self, req: &ClearRequest, dst: &HwSurface) -> Result<(), AccelError> {
        let result = self.inner.clear(req, dst);
        self.ops.push(RecordedOp::Clear {
            request: *req,
            target: *dst,
            ok: result.is_ok(),
        });
        result
    }

    fn finish(&mut self) {
        self.inner.finish();
        self.ops.push(RecordedOp::Finish);
    }

    fn create_fence(&mut self) -> Option<Self::Fence> {
        let fence = self.inner.create_fence();
        self.ops.push(RecordedOp::Fence {
            issued: fence.is_some(),
        });
        fence
    }

    fn alloc(&mut self, len: usize) -> Result<DeviceBuffer, AccelError> {
        self.ops.push(RecordedOp::Alloc { len });
        self.inner.alloc(len)
    }

    fn free(&mut self, buffer: DeviceBuffer) {
        self.ops.push(RecordedOp::Free { id: buffer.id });
        self.inner.free(buffer);
    }

    fn map_mut(&mut self, buffer: &DeviceBuffer) -> Result<&mut [u8], AccelError> {
        self.inner.map_mut(buffer)
    }

    fn read_pixels(
        &mut self,
        src: &HwSurface,
        rect: Rect,
        format: HwFormat,
        out: &mut [u8],
    ) -> Result<(), AccelError> {
        let result = self.inner.read_pixels(src, rect, format, out);
        self.ops.push(RecordedOp::Readback {
            rect,
            format,
            ok: result.is_ok(),
        });
        result
    }
}

// ---------------------------------------------------------------------------
// NullAccel
// ---------------------------------------------------------------------------

/// Base of the fake physical addresses handed out by [`NullAccel`].
const NULL_BASE_ADDRESS: u64 = 0x1000_0000;

/// An accelerator with no device behind it.
///
/// Allocations live on the heap; readbacks produce zeroes.
#[derive(Debug, Default)]
pub struct NullAccel {
    fencing: bool,
    next_fence: u64,
    next_id: u64,
    next_address: u64,
    memory: BTreeMap<u64, Vec<u8>>,
}

impl NullAccel {
    /// A device that never exports fences, so every repaint finishes
    /// synchronously.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that exports a numbered fence for every repaint.
    #[must_use]
    pub fn fenced() -> Self {
        Self {
            fencing: true,
            ..Self::default()
        }
    }

    /// Bytes currently allocated.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.memory.values().map(Vec::len).sum()
    }

    /// Contents of the device buffer with handle `id`.
    #[must_use]
    pub fn memory(&self, id: u64) -> Option<&[u8]> {
        self.memory.get(&id).map(Vec::as_slice)
    }
}

impl BlitAccelerator for NullAccel {
    type Fence = u64;

    fn blit(&mut self, _: &BlitRequest, _: &HwSurface, _: &HwSurface) -> Result<(), AccelError> {
        Ok(())
    }

    fn clear(&mut self, _: &ClearRequest, _: &HwSurface) -> Result<(), AccelError> {
        Ok(())
    }

    fn finish(&mut self) {}

    fn create_fence(&mut self) -> Option<u64> {
        self.fencing.then(|| {
            self.next_fence += 1;
            self.next_fence
        })
    }

    fn alloc(&mut self, len: usize) -> Result<DeviceBuffer, AccelError> {
        self.next_id += 1;
        let address = NULL_BASE_ADDRESS + self.next_address;
        self.next_address += u64::try_from(len.next_multiple_of(4096)).unwrap_or(u64::MAX);
        self.memory.insert(self.next_id, vec![0; len]);
        Ok(DeviceBuffer {
            id: self.next_id,
            address,
            len,
        })
    }

    fn free(&mut self, buffer: DeviceBuffer) {
        self.memory.remove(&buffer.id);
    }

    fn map_mut(&mut self, buffer: &DeviceBuffer) -> Result<&mut [u8], AccelError> {
        self.memory
            .get_mut(&buffer.id)
            .map(Vec::as_mut_slice)
            .ok_or(AccelError::Map(buffer.id))
    }

    fn read_pixels(
        &mut self,
        _: &HwSurface,
        _: Rect,
        _: HwFormat,
        out: &mut [u8],
    ) -> Result<(), AccelError> {
        out.fill(0);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
