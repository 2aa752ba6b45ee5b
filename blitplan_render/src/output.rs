// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output renderer state.

use blitplan_core::geom::{Rect, Size};
use blitplan_core::id::OutputId;
use blitplan_core::region::Region;
use blitplan_core::transform::Transform;

use crate::accel::HwSurface;
use crate::damage::DamageHistory;
use crate::error::OutputError;

/// Geometry of a new output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputOptions {
    /// Framebuffer size in physical pixels.
    pub fb_size: Size,
    /// Part of the framebuffer that is composited, in framebuffer pixels.
    pub area: Rect,
    /// Panel transform.
    pub transform: Transform,
    /// Global x coordinate of the output's left edge.
    pub x_offset: i32,
}

/// Renderer state of one output: geometry, framebuffer, damage history and
/// the last completion fence.
///
/// Dropping it discards the damage history.
#[derive(Debug)]
pub struct OutputState<F> {
    id: OutputId,
    fb_size: Size,
    area: Rect,
    pub(crate) transform: Transform,
    pub(crate) x_offset: i32,
    pub(crate) framebuffer: Option<HwSurface>,
    pub(crate) damage: DamageHistory,
    pub(crate) frame_index: u64,
    pub(crate) fence: Option<F>,
}

fn check_area(fb_size: Size, area: Rect) -> Result<(), OutputError> {
    let fits = area.left >= 0
        && area.top >= 0
        && area.width() >= 0
        && area.height() >= 0
        && area.right <= fb_size.width
        && area.bottom <= fb_size.height;
    if fits {
        Ok(())
    } else {
        Err(OutputError::InvalidArea { fb_size, area })
    }
}

impl<F> OutputState<F> {
    /// Validates `options` and creates the state with an empty damage ring.
    ///
    /// # Errors
    ///
    /// [`OutputError::InvalidArea`] if the area does not fit the framebuffer.
    pub fn new(id: OutputId, options: OutputOptions) -> Result<Self, OutputError> {
        check_area(options.fb_size, options.area)?;
        Ok(Self {
            id,
            fb_size: options.fb_size,
            area: options.area,
            transform: options.transform,
            x_offset: options.x_offset,
            framebuffer: None,
            damage: DamageHistory::new(),
            frame_index: 0,
            fence: None,
        })
    }

    /// Changes the framebuffer size and compositing area.
    ///
    /// Remembered damage no longer matches the new buffers, so the whole
    /// area is treated as damaged for the next ring's worth of frames.
    ///
    /// # Errors
    ///
    /// [`OutputError::InvalidArea`]; the state is unchanged.
    pub fn resize(&mut self, fb_size: Size, area: Rect) -> Result<(), OutputError> {
        check_area(fb_size, area)?;
        self.fb_size = fb_size;
        self.area = area;
        self.damage.reset(&Region::from_rect(fb_size.to_rect()));
        Ok(())
    }

    /// Sets the framebuffer the next repaint draws into.
    pub fn set_framebuffer(&mut self, framebuffer: HwSurface) {
        self.framebuffer = Some(framebuffer);
    }

    /// Moves the output in global space.
    pub fn set_x_offset(&mut self, x_offset: i32) {
        self.x_offset = x_offset;
    }

    /// Output identifier.
    #[must_use]
    pub fn id(&self) -> OutputId {
        self.id
    }

    /// Framebuffer size.
    #[must_use]
    pub fn fb_size(&self) -> Size {
        self.fb_size
    }

    /// Compositing area.
    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Panel transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Number of repaints so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Completion fence of the last repaint, if the accelerator gave one.
    #[must_use]
    pub fn fence(&self) -> Option<&F> {
        self.fence.as_ref()
    }
}
