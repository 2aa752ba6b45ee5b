// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory accelerator for unit tests.

use std::collections::BTreeMap;

use blitplan_core::geom::Rect;

use crate::accel::{BlitAccelerator, DeviceBuffer, HwSurface};
use crate::error::AccelError;
use crate::format::HwFormat;
use crate::plan::{BlitRequest, ClearRequest};

#[derive(Debug, Default)]
pub(crate) struct MockAccel {
    pub(crate) blits: Vec<(BlitRequest, HwSurface)>,
    pub(crate) clears: Vec<ClearRequest>,
    pub(crate) finishes: u32,
    pub(crate) fence: Option<u32>,
    pub(crate) fail_blits: bool,
    pub(crate) fail_readback: bool,
    pub(crate) readback_fill: bool,
    pub(crate) readbacks: Vec<(Rect, HwFormat)>,
    pub(crate) allocs: Vec<usize>,
    pub(crate) frees: Vec<DeviceBuffer>,
    pub(crate) memory: BTreeMap<u64, Vec<u8>>,
    next_id: u64,
}

fn inside(r: Rect, surface: &HwSurface) -> bool {
    r.left >= 0 && r.top >= 0 && r.right <= surface.width && r.bottom <= surface.height
}

impl BlitAccelerator for MockAccel {
    type Fence = u32;

    fn blit(
        &mut self,
        req: &BlitRequest,
        src: &HwSurface,
        dst: &HwSurface,
    ) -> Result<(), AccelError> {
        assert!(inside(req.dest, dst), "dest {:?} outside framebuffer", req.dest);
        assert!(inside(req.clip, dst), "clip {:?} outside framebuffer", req.clip);
        assert!(!req.source.is_empty(), "empty source {:?}", req.source);
        if self.fail_blits {
            return Err(AccelError::Blit("injected".into()));
        }
        self.blits.push((*req, *src));
        Ok(())
    }

    fn clear(&mut self, req: &ClearRequest, dst: &HwSurface) -> Result<(), AccelError> {
        assert!(inside(req.clip, dst), "clip {:?} outside framebuffer", req.clip);
        self.clears.push(*req);
        Ok(())
    }

    fn finish(&mut self) {
        self.finishes += 1;
    }

    fn create_fence(&mut self) -> Option<u32> {
        self.fence
    }

    fn alloc(&mut self, len: usize) -> Result<DeviceBuffer, AccelError> {
        self.next_id += 1;
        let id = self.next_id;
        self.allocs.push(len);
        self.memory.insert(id, vec![0; len]);
        Ok(DeviceBuffer {
            id,
            address: 0x1000_0000 * id,
            len,
        })
    }

    fn free(&mut self, buffer: DeviceBuffer) {
        self.memory.remove(&buffer.id);
        self.frees.push(buffer);
    }

    fn map_mut(&mut self, buffer: &DeviceBuffer) -> Result<&mut [u8], AccelError> {
        self.memory
            .get_mut(&buffer.id)
            .map(Vec::as_mut_slice)
            .ok_or(AccelError::Map(buffer.id))
    }

    fn read_pixels(
        &mut self,
        _src: &HwSurface,
        rect: Rect,
        format: HwFormat,
        out: &mut [u8],
    ) -> Result<(), AccelError> {
        if self.fail_readback {
            return Err(AccelError::Readback {
                rect,
                reason: "injected".into(),
            });
        }
        self.readbacks.push((rect, format));
        if self.readback_fill {
            let rows = usize::try_from(rect.height()).unwrap_or(1).max(1);
            let row = out.len() / rows;
            for (i, chunk) in out.chunks_mut(row.max(1)).enumerate() {
                chunk.fill(u8::try_from(i).unwrap_or(u8::MAX));
            }
        }
        Ok(())
    }
}
