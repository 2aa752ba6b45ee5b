// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Repaint orchestration for fixed-function 2D blit accelerators.
//!
//! This crate sits between a compositor and a [`BlitAccelerator`]. Per output
//! repaint it:
//!
//! 1. folds the frame's damage into a [`DamageHistory`] ring sized for the
//!    framebuffers in flight;
//! 2. walks the primary-plane [`View`]s bottom-up, splitting each into an
//!    opaque and a blended pass and issuing one clear or one rotated,
//!    clamped blit per (damage rectangle × surface rectangle) pair, using
//!    the geometry in [`blitplan_core`];
//! 3. services [`CaptureQueue`] tasks by reading the framebuffer back;
//! 4. fences or finishes the accelerator queue and hands release fences to
//!    the surfaces that asked for them.
//!
//! Client buffers enter through [`Renderer::attach`] as an
//! [`AttachedBuffer`], and are reduced to a single [`HwSurface`] descriptor
//! whatever their origin.
//!
//! Failures inside a repaint are logged with [`tracing`] and reported through
//! [`Tracer`](blitplan_core::trace::Tracer) events; they never abort the frame.
//!
//! # Crate features
//!
//! - `trace`: enables repaint trace events.
//! - `trace-rich` (implies `trace`): adds per-blit, per-clear and damage
//!   events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod accel;
mod capture;
mod config;
mod damage;
mod error;
mod fence;
mod format;
mod output;
mod plan;
mod renderer;
mod surface;
mod view;

#[cfg(test)]
mod test_util;

pub use accel::{BlitAccelerator, DeviceBuffer, HwSurface, TileStatus, Tiling};
pub use capture::{
    BufferOrigin, CaptureBuffer, CaptureBufferKind, CaptureQueue, CaptureSource, CaptureTask,
    NoCaptures, readback_rect,
};
pub use config::{DEFAULT_FENCE_TIMEOUT, RendererConfig};
pub use damage::{BUFFER_DAMAGE_COUNT, DamageHistory};
pub use error::{
    AccelError, BufferError, CaptureError, CaptureFailure, FenceError, FormatError, OutputError,
};
pub use fence::{AcquireFence, wait_for_fence};
pub use format::{
    DMABUF_FORMATS, HwFormat, ReadFormat, SHM_FORMATS, ShmLayout, VIVANTE_SPLIT_SUPER_TILED,
    VIVANTE_SUPER_TILED, align16, align64, dmabuf_format, is_super_tiled, pack_color,
    read_format, shm_layout,
};
pub use output::{OutputOptions, OutputState};
pub use plan::{BlitRequest, ClearRequest, OPAQUE_ALPHA, global_alpha};
pub use renderer::Renderer;
pub use surface::{
    AttachedBuffer, BufferKind, DmabufBuffer, DmabufPlane, ShmBuffer, SolidColor, VendorBuffer,
    VendorBufferInfo, is_shm_format_supported,
};
pub use view::{BufferViewport, View, source_rect};
