// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The renderer: surface lifecycle, buffer attach and output repaint.

use std::fmt;

use blitplan_core::clamp::{ClampedBlit, clamp_to_bounds};
use blitplan_core::clip::clip_surface_rect;
use blitplan_core::geom::{Rect, Size};
use blitplan_core::id::{OutputId, SlotStore, SurfaceId};
use blitplan_core::output_space::map_rect_to_output;
use blitplan_core::region::Region;
use blitplan_core::rotation::compose_rotation;
use blitplan_core::trace::{
    AbandonReason, PairAbandonedEvent, PassKind, PhaseEvent, RepaintBeginEvent, RepaintPhase,
    RepaintSummary, SkipReason, Tracer, ViewSkippedEvent,
};
#[cfg(feature = "trace-rich")]
use blitplan_core::trace::{BlitEvent, ClearEvent};
use drm_fourcc::DrmFourcc;

use crate::accel::{BlitAccelerator, HwSurface};
use crate::capture::{CaptureQueue, CaptureSource, read_into, readback_rect};
use crate::config::RendererConfig;
use crate::error::{BufferError, OutputError};
use crate::fence::{AcquireFence, wait_for_fence};
use crate::format::DMABUF_FORMATS;
use crate::output::{OutputOptions, OutputState};
use crate::plan::{BlitRequest, ClearRequest, global_alpha};
use crate::surface::{AttachedBuffer, BufferKind, SurfaceState};
use crate::view::{View, source_rect};

/// Drives a [`BlitAccelerator`] to composite views into output framebuffers.
pub struct Renderer<A: BlitAccelerator> {
    accel: A,
    config: RendererConfig,
    surfaces: SlotStore<SurfaceState<A::Fence>>,
}

impl<A: BlitAccelerator + fmt::Debug> fmt::Debug for Renderer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("accel", &self.accel)
            .field("config", &self.config)
            .field("surfaces", &self.surfaces.len())
            .finish()
    }
}

/// What the current view draws with.
#[derive(Clone, Copy)]
enum Paint {
    Blit { source: Rect, hw: HwSurface },
    Clear { color: u32 },
}

/// Per-pass inputs shared by every rectangle pair.
struct Pass<'a> {
    view: &'a View,
    kind: PassKind,
    blend: bool,
    paint: Paint,
}

impl<A: BlitAccelerator> Renderer<A> {
    /// Creates a renderer around `accel`.
    pub fn new(accel: A, config: RendererConfig) -> Self {
        Self {
            accel,
            config,
            surfaces: SlotStore::new(),
        }
    }

    /// The accelerator.
    pub fn accel(&self) -> &A {
        &self.accel
    }

    /// The accelerator, mutably.
    pub fn accel_mut(&mut self) -> &mut A {
        &mut self.accel
    }

    /// Consumes the renderer, returning the accelerator.
    pub fn into_accel(self) -> A {
        self.accel
    }

    /// Active configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// DMA-BUF formats clients may import.
    pub fn dmabuf_formats(&self) -> &'static [DrmFourcc] {
        &DMABUF_FORMATS
    }

    // -- surfaces ----------------------------------------------------------

    /// Creates state for a new surface.
    pub fn create_surface(&mut self) -> SurfaceId {
        self.surfaces.insert(SurfaceState::new())
    }

    /// Destroys a surface, freeing its device memory. Returns `false` for a
    /// stale handle.
    pub fn destroy_surface(&mut self, id: SurfaceId) -> bool {
        match self.surfaces.remove(id) {
            Some(mut state) => {
                state.release_device_memory(&mut self.accel);
                true
            }
            None => false,
        }
    }

    /// Number of live surfaces.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut SurfaceState<A::Fence>, BufferError> {
        self.surfaces
            .get_mut(id)
            .ok_or(BufferError::StaleSurface(id))
    }

    /// Attaches a buffer to a surface, or detaches with `None`.
    ///
    /// Any acquire fence of the previous buffer is dropped.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleSurface`], an unsupported format (logged; the
    /// surface keeps its previous descriptor), or a device allocation
    /// failure.
    pub fn attach(
        &mut self,
        id: SurfaceId,
        buffer: Option<AttachedBuffer>,
    ) -> Result<(), BufferError> {
        let accel = &mut self.accel;
        let state = self
            .surfaces
            .get_mut(id)
            .ok_or(BufferError::StaleSurface(id))?;
        state.attach(accel, buffer)
    }

    /// Sets the fence that must signal before the attached buffer is read.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleSurface`].
    pub fn set_acquire_fence(
        &mut self,
        id: SurfaceId,
        fence: Box<dyn AcquireFence>,
    ) -> Result<(), BufferError> {
        self.surface_mut(id)?.acquire_fence = Some(fence);
        Ok(())
    }

    /// Asks for the completion fence of the next repaint that shows the
    /// surface, retrievable with [`take_release_fence`](Self::take_release_fence).
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleSurface`].
    pub fn request_release(&mut self, id: SurfaceId) -> Result<(), BufferError> {
        self.surface_mut(id)?.release_requested = true;
        Ok(())
    }

    /// Takes the release fence delivered by the last repaint, if any.
    pub fn take_release_fence(&mut self, id: SurfaceId) -> Option<A::Fence> {
        self.surfaces.get_mut(id)?.release_fence.take()
    }

    /// Folds new surface damage in and uploads shared-memory pixels when
    /// the surface is on the primary plane.
    ///
    /// # Errors
    ///
    /// [`BufferError::StaleSurface`], a device mapping failure, or client
    /// data shorter than its layout.
    pub fn flush_damage(
        &mut self,
        id: SurfaceId,
        damage: &Region,
        on_primary_plane: bool,
    ) -> Result<(), BufferError> {
        let accel = &mut self.accel;
        let state = self
            .surfaces
            .get_mut(id)
            .ok_or(BufferError::StaleSurface(id))?;
        state.flush_damage(accel, damage, on_primary_plane)
    }

    /// Descriptor the surface is currently blitted from.
    pub fn surface_descriptor(&self, id: SurfaceId) -> Option<HwSurface> {
        self.surfaces.get(id).map(|s| s.hw)
    }

    /// Kind of buffer attached to the surface.
    pub fn buffer_kind(&self, id: SurfaceId) -> Option<BufferKind> {
        self.surfaces.get(id).and_then(|s| s.kind)
    }

    /// Last blit issued from the surface.
    pub fn last_blit(&self, id: SurfaceId) -> Option<BlitRequest> {
        self.surfaces.get(id).and_then(|s| s.last_blit)
    }

    // -- outputs -----------------------------------------------------------

    /// Creates the state of a new output.
    ///
    /// # Errors
    ///
    /// [`OutputError::InvalidArea`] if the compositing area does not fit.
    pub fn create_output(
        &self,
        id: OutputId,
        options: OutputOptions,
    ) -> Result<OutputState<A::Fence>, OutputError> {
        OutputState::new(id, options)
    }

    /// Changes an output's framebuffer size and compositing area.
    ///
    /// # Errors
    ///
    /// [`OutputError::InvalidArea`]; the output is unchanged.
    pub fn resize_output(
        &self,
        output: &mut OutputState<A::Fence>,
        fb_size: Size,
        area: Rect,
    ) -> Result<(), OutputError> {
        output.resize(fb_size, area)
    }

    // -- repaint -----------------------------------------------------------

    /// Repaints `output`.
    ///
    /// `views` are in compositor stacking order, topmost first; they are
    /// drawn bottom-up so upper views overwrite lower ones. `damage` is this
    /// frame's global damage; it is folded into the output's damage history
    /// before drawing.
    ///
    /// # Errors
    ///
    /// [`OutputError::NoFramebuffer`] if no framebuffer was set. Everything
    /// else is logged, traced and skipped.
    pub fn repaint_output(
        &mut self,
        output: &mut OutputState<A::Fence>,
        views: &[View],
        damage: &Region,
        captures: &mut dyn CaptureQueue,
        tracer: &mut Tracer<'_>,
    ) -> Result<RepaintSummary, OutputError> {
        let fb = output.framebuffer.ok_or(OutputError::NoFramebuffer)?;
        output.frame_index += 1;
        let mut frame = Frame {
            index: output.frame_index,
            output: output.id(),
            summary: RepaintSummary::new(output.frame_index, output.id()),
            tracer,
        };
        frame.tracer.repaint_begin(&RepaintBeginEvent {
            frame_index: frame.index,
            output: frame.output,
            damage_rects: u32::try_from(damage.rects().len()).unwrap_or(u32::MAX),
        });

        frame.phase_begin(RepaintPhase::Damage);
        let total_damage = output.damage.accumulate(damage);
        #[cfg(feature = "trace-rich")]
        frame.tracer.damage(frame.index, total_damage.rects());
        frame.phase_end(RepaintPhase::Damage);

        frame.phase_begin(RepaintPhase::Views);
        for view in views.iter().rev().filter(|v| v.on_primary_plane) {
            self.draw_view(output, &fb, view, &total_damage, &mut frame);
        }
        frame.phase_end(RepaintPhase::Views);

        frame.phase_begin(RepaintPhase::Capture);
        for source in [CaptureSource::Framebuffer, CaptureSource::FullFramebuffer] {
            self.run_captures(output, &fb, source, captures, &mut frame.summary);
        }
        frame.phase_end(RepaintPhase::Capture);

        frame.phase_begin(RepaintPhase::Finish);
        let fence = self.accel.create_fence();
        for view in views.iter().filter(|v| v.on_primary_plane) {
            if let Some(state) = self.surfaces.get_mut(view.surface)
                && state.release_requested
            {
                state.release_requested = false;
                state.release_fence.clone_from(&fence);
            }
        }
        frame.summary.fenced = fence.is_some();
        if fence.is_none() {
            self.accel.finish();
        }
        output.fence = fence;
        frame.phase_end(RepaintPhase::Finish);

        let summary = frame.summary;
        tracing::debug!(
            frame = summary.frame_index,
            output = ?summary.output,
            drawn = summary.views_drawn,
            skipped = summary.views_skipped,
            blits = summary.blits,
            clears = summary.clears,
            abandoned = summary.abandoned,
            "repaint done"
        );
        frame.tracer.repaint_summary(&summary);
        Ok(summary)
    }

    fn run_captures(
        &mut self,
        output: &OutputState<A::Fence>,
        fb: &HwSurface,
        source: CaptureSource,
        captures: &mut dyn CaptureQueue,
        summary: &mut RepaintSummary,
    ) {
        let rect = readback_rect(source, output.fb_size(), output.area());
        let size = Size::new(rect.width(), rect.height());
        while let Some(mut task) = captures.pull(source, size, self.config.read_format) {
            let result = read_into(&mut self.accel, fb, rect, &mut task.buffer);
            match &result {
                Ok(()) => summary.captures_done += 1,
                Err(e) => {
                    tracing::warn!(task = task.id, ?source, error = %e, "capture task failed");
                    summary.captures_failed += 1;
                }
            }
            captures.retire(task, result);
        }
    }

    /// Refreshes a vendor descriptor and waits for the acquire fence.
    fn ensure_ready(&mut self, id: SurfaceId) -> Result<(), BufferError> {
        let timeout = self.config.fence_timeout;
        let state = self.surface_mut(id)?;
        state.refresh_vendor_descriptor()?;
        if let Some(fence) = state.acquire_fence.take() {
            wait_for_fence(fence.as_ref(), timeout).inspect_err(|e| {
                tracing::warn!(surface = ?id, error = %e, "acquire fence wait failed");
            })?;
        }
        Ok(())
    }

    fn draw_view(
        &mut self,
        output: &OutputState<A::Fence>,
        fb: &HwSurface,
        view: &View,
        damage: &Region,
        frame: &mut Frame<'_, '_>,
    ) {
        let repaint = damage
            .intersect_rect(view.bounding_box)
            .subtract(&view.clip);
        if repaint.is_empty() {
            frame.skip(view.surface, SkipReason::NoDamage);
            return;
        }
        // Fading views are left out until they settle; a translucent
        // opaque pass shows seams.
        if view.alpha < 1.0 {
            frame.skip(view.surface, SkipReason::FractionalAlpha);
            return;
        }
        if !self.surfaces.get(view.surface).is_some_and(|s| s.attached) {
            frame.skip(view.surface, SkipReason::Detached);
            return;
        }
        if self.ensure_ready(view.surface).is_err() {
            frame.skip(view.surface, SkipReason::NotReady);
            return;
        }
        let Some(state) = self.surfaces.get(view.surface) else {
            return;
        };

        let paint = match state.solid {
            Some(fill) if !fill.opaque => {
                frame.skip(view.surface, SkipReason::TranslucentSolid);
                return;
            }
            Some(fill) => Paint::Clear { color: fill.color },
            None if state.hw.is_empty() => {
                frame.skip(view.surface, SkipReason::EmptyBuffer);
                return;
            }
            None => Paint::Blit {
                source: source_rect(
                    state.hw.rect,
                    Size::new(state.hw.width, state.hw.height),
                    &view.viewport,
                ),
                hw: state.hw,
            },
        };
        let format_blends = state.hw.format.has_alpha();
        frame.summary.views_drawn += 1;

        let (opaque, blend) = view.sub_regions();
        if !opaque.is_empty() {
            let pass = Pass {
                view,
                kind: PassKind::Opaque,
                blend: false,
                paint,
            };
            self.repaint_region(output, fb, &pass, &repaint, &opaque, frame);
        }
        if !blend.is_empty() {
            let pass = Pass {
                view,
                kind: PassKind::Blend,
                blend: format_blends,
                paint,
            };
            self.repaint_region(output, fb, &pass, &repaint, &blend, frame);
        }
    }

    /// Issues one clear or blit per (damage rectangle × surface rectangle)
    /// pair of a pass.
    fn repaint_region(
        &mut self,
        output: &OutputState<A::Fence>,
        fb: &HwSurface,
        pass: &Pass<'_>,
        repaint: &Region,
        surface_region: &Region,
        frame: &mut Frame<'_, '_>,
    ) {
        let view = pass.view;
        let fb_size = Size::new(fb.width, fb.height);
        let fb_rect = fb_size.to_rect();
        let rotation = compose_rotation(view.viewport.transform, output.transform);

        let draw = match pass.paint {
            Paint::Clear { color } => Draw::Clear { color },
            Paint::Blit { source, hw } => {
                let dest = to_output(output, view.bounding_box, fb_size);
                match clamp_to_bounds(rotation, source, dest, fb_size) {
                    Some(clamped) => Draw::Blit { clamped, hw },
                    None => {
                        frame.abandon(view.surface, pass.kind, AbandonReason::ClampCollapsed);
                        return;
                    }
                }
            }
        };

        for damage_rect in repaint.rects() {
            for surface_rect in surface_region.rects() {
                let poly = clip_surface_rect(*surface_rect, view.to_global, *damage_rect);
                let Some(clip) = poly.clip_rect() else {
                    frame.abandon(view.surface, pass.kind, AbandonReason::NoIntersection);
                    continue;
                };
                let clip = to_output(output, clip, fb_size).intersect(&fb_rect);
                if clip.is_empty() {
                    frame.abandon(view.surface, pass.kind, AbandonReason::EmptyClip);
                    continue;
                }

                let issued = match &draw {
                    Draw::Clear { color } => {
                        let req = ClearRequest {
                            clip,
                            color: *color,
                        };
                        self.issue_clear(fb, view.surface, &req, frame)
                    }
                    Draw::Blit { clamped, hw } => {
                        let req = BlitRequest {
                            source: clamped.source,
                            dest: clamped.dest,
                            rotation,
                            clip,
                            blend: pass.blend,
                            global_alpha: global_alpha(view.alpha),
                        };
                        self.issue_blit(fb, hw, view.surface, pass.kind, &req, frame)
                    }
                };
                if !issued {
                    frame.abandon(view.surface, pass.kind, AbandonReason::AcceleratorFailed);
                }
            }
        }
    }

    fn issue_clear(
        &mut self,
        fb: &HwSurface,
        surface: SurfaceId,
        req: &ClearRequest,
        frame: &mut Frame<'_, '_>,
    ) -> bool {
        match self.accel.clear(req, fb) {
            Ok(()) => {
                frame.cleared(surface, req);
                true
            }
            Err(e) => {
                tracing::warn!(
                    ?surface,
                    clip = ?req.clip,
                    color = format_args!("{:#010x}", req.color),
                    dst_format = ?fb.format,
                    error = %e,
                    "accelerator clear failed"
                );
                false
            }
        }
    }

    fn issue_blit(
        &mut self,
        fb: &HwSurface,
        src: &HwSurface,
        surface: SurfaceId,
        pass: PassKind,
        req: &BlitRequest,
        frame: &mut Frame<'_, '_>,
    ) -> bool {
        match self.accel.blit(req, src, fb) {
            Ok(()) => {
                if let Some(s) = self.surfaces.get_mut(surface) {
                    s.last_blit = Some(*req);
                }
                frame.blitted(surface, pass, req);
                true
            }
            Err(e) => {
                tracing::warn!(
                    ?surface,
                    source = ?req.source,
                    dest = ?req.dest,
                    clip = ?req.clip,
                    rotation = req.rotation.degrees(),
                    blend = req.blend,
                    src_format = ?src.format,
                    src_tiling = ?src.tiling,
                    src_stride = src.stride,
                    dst_format = ?fb.format,
                    dst_stride = fb.stride,
                    error = %e,
                    "accelerator blit failed"
                );
                false
            }
        }
    }
}

/// Moves a global rectangle into the output's physical framebuffer space.
fn to_output<F>(output: &OutputState<F>, r: Rect, fb_size: Size) -> Rect {
    let local = if output.x_offset != 0 {
        r.translate(-output.x_offset, 0)
    } else {
        r
    };
    map_rect_to_output(local, output.transform, fb_size)
}

/// A pass's paint with the blit already clamped to the framebuffer.
enum Draw {
    Blit { clamped: ClampedBlit, hw: HwSurface },
    Clear { color: u32 },
}

/// Counters and trace plumbing of one repaint.
struct Frame<'r, 't> {
    index: u64,
    output: OutputId,
    summary: RepaintSummary,
    tracer: &'r mut Tracer<'t>,
}

impl Frame<'_, '_> {
    fn phase_begin(&mut self, phase: RepaintPhase) {
        self.tracer.phase_begin(&PhaseEvent {
            frame_index: self.index,
            output: self.output,
            phase,
        });
    }

    fn phase_end(&mut self, phase: RepaintPhase) {
        self.tracer.phase_end(&PhaseEvent {
            frame_index: self.index,
            output: self.output,
            phase,
        });
    }

    fn skip(&mut self, surface: SurfaceId, reason: SkipReason) {
        self.summary.views_skipped += 1;
        tracing::debug!(frame = self.index, ?surface, ?reason, "view skipped");
        self.tracer.view_skipped(&ViewSkippedEvent {
            frame_index: self.index,
            output: self.output,
            surface,
            reason,
        });
    }

    fn abandon(&mut self, surface: SurfaceId, pass: PassKind, reason: AbandonReason) {
        self.summary.abandoned += 1;
        tracing::debug!(frame = self.index, ?surface, ?pass, ?reason, "pair abandoned");
        self.tracer.pair_abandoned(&PairAbandonedEvent {
            frame_index: self.index,
            output: self.output,
            surface,
            pass,
            reason,
        });
    }

    fn blitted(&mut self, surface: SurfaceId, pass: PassKind, req: &BlitRequest) {
        self.summary.blits += 1;
        #[cfg(feature = "trace-rich")]
        self.tracer.blit(&BlitEvent {
            frame_index: self.index,
            output: self.output,
            surface,
            pass,
            source: req.source,
            dest: req.dest,
            clip: req.clip,
            rotation: req.rotation,
            blend: req.blend,
            global_alpha: req.global_alpha,
        });
        #[cfg(not(feature = "trace-rich"))]
        let _ = (surface, pass, req);
    }

    fn cleared(&mut self, surface: SurfaceId, req: &ClearRequest) {
        self.summary.clears += 1;
        #[cfg(feature = "trace-rich")]
        self.tracer.clear(&ClearEvent {
            frame_index: self.index,
            output: self.output,
            surface,
            clip: req.clip,
            color: req.color,
        });
        #[cfg(not(feature = "trace-rich"))]
        let _ = (surface, req);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use blitplan_core::transform::{HardwareRotation, Transform};
    use drm_fourcc::DrmModifier;
    use kurbo::Affine;

    use super::*;
    use crate::capture::{BufferOrigin, CaptureBuffer, CaptureBufferKind, CaptureTask, NoCaptures};
    use crate::error::{CaptureError, FenceError};
    use crate::format::HwFormat;
    use crate::surface::{DmabufBuffer, DmabufPlane, SolidColor};
    use crate::test_util::MockAccel;

    fn renderer() -> Renderer<MockAccel> {
        Renderer::new(MockAccel::default(), RendererConfig::new())
    }

    fn output_with(
        r: &Renderer<MockAccel>,
        fb: Size,
        transform: Transform,
        x_offset: i32,
    ) -> OutputState<u32> {
        let mut o = r
            .create_output(
                OutputId(0),
                OutputOptions {
                    fb_size: fb,
                    area: fb.to_rect(),
                    transform,
                    x_offset,
                },
            )
            .unwrap();
        o.set_framebuffer(HwSurface::linear(
            HwFormat::Bgrx8888,
            0xF000_0000,
            fb.width,
            fb.height,
            fb.width,
        ));
        o
    }

    fn output(r: &Renderer<MockAccel>) -> OutputState<u32> {
        output_with(r, Size::new(800, 600), Transform::Normal, 0)
    }

    fn dmabuf(
        r: &mut Renderer<MockAccel>,
        format: DrmFourcc,
        size: Size,
        address: u64,
    ) -> SurfaceId {
        let id = r.create_surface();
        r.attach(
            id,
            Some(AttachedBuffer::Dmabuf(DmabufBuffer {
                format,
                modifier: DrmModifier::Linear,
                width: size.width,
                height: size.height,
                planes: vec![DmabufPlane {
                    address,
                    offset: 0,
                    stride: u32::try_from(size.width * 4).unwrap(),
                }],
            })),
        )
        .unwrap();
        id
    }

    fn full_damage() -> Region {
        Region::from_rect(Rect::new(0, 0, 800, 600))
    }

    fn repaint(
        r: &mut Renderer<MockAccel>,
        out: &mut OutputState<u32>,
        views: &[View],
        damage: &Region,
    ) -> RepaintSummary {
        r.repaint_output(out, views, damage, &mut NoCaptures, &mut Tracer::none())
            .unwrap()
    }

    fn requests(r: &Renderer<MockAccel>) -> Vec<BlitRequest> {
        r.accel().blits.iter().map(|(req, _)| *req).collect()
    }

    #[test]
    fn translated_view_blits_once() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::translate((10.0, 20.0)));

        let summary = repaint(&mut r, &mut out, &[view], &full_damage());
        assert_eq!(summary.blits, 1);
        assert_eq!(summary.views_drawn, 1);
        assert_eq!(
            requests(&r),
            [BlitRequest {
                source: Rect::new(0, 0, 100, 50),
                dest: Rect::new(10, 20, 110, 70),
                rotation: HardwareRotation::Deg0,
                clip: Rect::new(10, 20, 110, 70),
                blend: true,
                global_alpha: 255,
            }]
        );
        assert_eq!(r.last_blit(id), requests(&r).first().copied());
    }

    #[test]
    fn opaque_and_blend_passes() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let mut view = View::new(id, Size::new(100, 50), Affine::translate((10.0, 20.0)));
        view.opaque = Region::from_rect(Rect::new(0, 0, 50, 50));

        repaint(&mut r, &mut out, &[view], &full_damage());
        let blits = requests(&r);
        assert_eq!(blits.len(), 2);
        assert_eq!(blits[0].clip, Rect::new(10, 20, 60, 70));
        assert!(!blits[0].blend, "opaque pass never blends");
        assert_eq!(blits[1].clip, Rect::new(60, 20, 110, 70));
        assert!(blits[1].blend);
        // Both passes share the view's full source and destination.
        assert_eq!(blits[0].dest, blits[1].dest);
        assert_eq!(blits[0].source, blits[1].source);
    }

    #[test]
    fn formats_without_alpha_never_blend() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Xrgb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::IDENTITY);
        repaint(&mut r, &mut out, &[view], &full_damage());
        assert!(!requests(&r)[0].blend);
    }

    #[test]
    fn fractional_alpha_view_is_skipped_as_a_special_case() {
        // Fading views are deliberately left out rather than blended with a
        // global alpha.
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let mut view = View::new(id, Size::new(100, 50), Affine::IDENTITY);
        view.alpha = 0.5;
        let summary = repaint(&mut r, &mut out, &[view], &full_damage());
        assert_eq!(summary.views_skipped, 1);
        assert_eq!(summary.blits, 0);
    }

    #[test]
    fn occluded_or_undamaged_views_are_skipped() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let mut view = View::new(id, Size::new(100, 50), Affine::IDENTITY);
        view.clip = Region::from_rect(Rect::new(0, 0, 100, 50));
        let summary = repaint(&mut r, &mut out, &[view.clone()], &full_damage());
        assert_eq!((summary.views_skipped, summary.blits), (1, 0));

        view.clip = Region::new();
        let damage = Region::from_rect(Rect::new(500, 500, 600, 600));
        let mut out = output(&r);
        let summary = repaint(&mut r, &mut out, &[view], &damage);
        assert_eq!((summary.views_skipped, summary.blits), (1, 0));
    }

    #[test]
    fn views_draw_bottom_up_and_primary_plane_only() {
        let mut r = renderer();
        let mut out = output(&r);
        let top = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x2000);
        let bottom = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let overlay = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x3000);
        let mut on_overlay = View::new(overlay, Size::new(100, 50), Affine::IDENTITY);
        on_overlay.on_primary_plane = false;
        let views = [
            on_overlay,
            View::new(top, Size::new(100, 50), Affine::IDENTITY),
            View::new(bottom, Size::new(100, 50), Affine::IDENTITY),
        ];
        repaint(&mut r, &mut out, &views, &full_damage());
        let planes: Vec<u64> = r.accel().blits.iter().map(|(_, s)| s.planes[0]).collect();
        assert_eq!(planes, [0x1000, 0x2000]);
    }

    #[test]
    fn off_left_edge_is_clamped() {
        let mut r = renderer();
        let mut out = output_with(&r, Size::new(200, 100), Transform::Normal, 0);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::translate((-10.0, 0.0)));
        let damage = Region::from_rect(Rect::new(0, 0, 200, 100));
        repaint(&mut r, &mut out, &[view], &damage);
        let req = requests(&r)[0];
        assert_eq!(req.dest, Rect::new(0, 0, 90, 50));
        assert_eq!(req.source, Rect::new(10, 0, 100, 50));
        assert_eq!(req.clip, Rect::new(0, 0, 90, 50));
    }

    #[test]
    fn rotated_output_maps_and_rotates() {
        let mut r = renderer();
        let mut out = output_with(&r, Size::new(600, 800), Transform::_90, 0);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::translate((10.0, 20.0)));
        repaint(&mut r, &mut out, &[view], &full_damage());
        let req = requests(&r)[0];
        assert_eq!(req.rotation, HardwareRotation::Deg90);
        assert_eq!(req.dest, Rect::new(20, 690, 70, 790));
        assert_eq!(req.clip, Rect::new(20, 690, 70, 790));
        assert_eq!(req.source, Rect::new(0, 0, 100, 50));
    }

    #[test]
    fn x_offset_moves_into_output_space() {
        let mut r = renderer();
        let mut out = output_with(&r, Size::new(800, 600), Transform::Normal, 800);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::translate((810.0, 20.0)));
        let damage = Region::from_rect(Rect::new(800, 0, 1600, 600));
        repaint(&mut r, &mut out, &[view], &damage);
        let req = requests(&r)[0];
        assert_eq!(req.dest, Rect::new(10, 20, 110, 70));
        assert_eq!(req.clip, Rect::new(10, 20, 110, 70));
    }

    #[test]
    fn view_outside_framebuffer_abandons_pass() {
        let mut r = renderer();
        let mut out = output_with(&r, Size::new(200, 100), Transform::Normal, 0);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::translate((300.0, 0.0)));
        let damage = Region::from_rect(Rect::new(300, 0, 400, 50));
        let summary = repaint(&mut r, &mut out, &[view], &damage);
        assert_eq!(summary.blits, 0);
        assert_eq!(summary.abandoned, 1);
    }

    #[test]
    fn solid_surfaces_clear() {
        let mut r = renderer();
        let mut out = output(&r);
        let opaque = r.create_surface();
        r.attach(
            opaque,
            Some(AttachedBuffer::Solid(SolidColor {
                format: DrmFourcc::Argb8888,
                rgba: [1.0, 0.0, 0.0, 1.0],
            })),
        )
        .unwrap();
        let translucent = r.create_surface();
        r.attach(
            translucent,
            Some(AttachedBuffer::Solid(SolidColor {
                format: DrmFourcc::Argb8888,
                rgba: [1.0, 0.0, 0.0, 0.5],
            })),
        )
        .unwrap();
        let views = [
            View::new(translucent, Size::new(10, 10), Affine::translate((200.0, 0.0))),
            View::new(opaque, Size::new(100, 50), Affine::translate((10.0, 20.0))),
        ];
        let summary = repaint(&mut r, &mut out, &views, &full_damage());
        assert_eq!(summary.clears, 1);
        assert_eq!(summary.views_skipped, 1);
        assert_eq!(
            r.accel().clears,
            [ClearRequest {
                clip: Rect::new(10, 20, 110, 70),
                color: 0xFF00_00FF,
            }]
        );
    }

    #[test]
    fn detached_and_empty_surfaces_are_skipped() {
        let mut r = renderer();
        let mut out = output(&r);
        let detached = r.create_surface();
        let empty = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(0, 0), 0x1000);
        let views = [
            View::new(detached, Size::new(10, 10), Affine::IDENTITY),
            View::new(empty, Size::new(10, 10), Affine::IDENTITY),
        ];
        let summary = repaint(&mut r, &mut out, &views, &full_damage());
        assert_eq!(summary.views_skipped, 2);
        assert_eq!(summary.blits, 0);
    }

    #[test]
    fn accelerator_failure_abandons_only_the_pair() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::IDENTITY);
        r.accel_mut().fail_blits = true;
        let damage = Region::from_rects(&[Rect::new(0, 0, 10, 10), Rect::new(50, 0, 60, 10)]);
        let summary = repaint(&mut r, &mut out, &[view], &damage);
        assert_eq!(summary.abandoned, 2);
        assert_eq!(summary.blits, 0);
        assert_eq!(summary.views_drawn, 1);
    }

    #[test]
    fn earlier_damage_is_repainted() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Xrgb8888, Size::new(800, 600), 0x1000);
        let view = View::new(id, Size::new(800, 600), Affine::IDENTITY);
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(50, 0, 60, 10);
        repaint(&mut r, &mut out, &[view.clone()], &Region::from_rect(a));
        r.accel_mut().blits.clear();
        repaint(&mut r, &mut out, &[view], &Region::from_rect(b));
        let mut clips: Vec<Rect> = requests(&r).iter().map(|q| q.clip).collect();
        clips.sort_by_key(|c| (c.left, c.top));
        assert_eq!(clips, [a, b]);
    }

    #[test]
    fn release_fence_or_finish() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::IDENTITY);

        r.accel_mut().fence = Some(7);
        r.request_release(id).unwrap();
        let summary = repaint(&mut r, &mut out, &[view.clone()], &full_damage());
        assert!(summary.fenced);
        assert_eq!(r.accel().finishes, 0);
        assert_eq!(out.fence(), Some(&7));
        assert_eq!(r.take_release_fence(id), Some(7));
        assert_eq!(r.take_release_fence(id), None);

        r.accel_mut().fence = None;
        r.request_release(id).unwrap();
        let summary = repaint(&mut r, &mut out, &[view], &full_damage());
        assert!(!summary.fenced);
        assert_eq!(r.accel().finishes, 1);
        assert_eq!(r.take_release_fence(id), None);
        assert_eq!(out.fence(), None);
    }

    #[derive(Debug)]
    struct TestFence {
        results: RefCell<Vec<Result<(), FenceError>>>,
        waits: Rc<Cell<u32>>,
    }

    impl AcquireFence for TestFence {
        fn wait(&self, _: Option<std::time::Duration>) -> Result<(), FenceError> {
            self.waits.set(self.waits.get() + 1);
            self.results.borrow_mut().remove(0)
        }
    }

    #[test]
    fn acquire_fence_gates_drawing() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let view = View::new(id, Size::new(100, 50), Affine::IDENTITY);

        let waits = Rc::new(Cell::new(0));
        r.set_acquire_fence(
            id,
            Box::new(TestFence {
                results: RefCell::new(vec![Err(FenceError::Timeout), Ok(())]),
                waits: Rc::clone(&waits),
            }),
        )
        .unwrap();
        let summary = repaint(&mut r, &mut out, &[view.clone()], &full_damage());
        assert_eq!(waits.get(), 2);
        assert_eq!(summary.blits, 1);

        r.set_acquire_fence(
            id,
            Box::new(TestFence {
                results: RefCell::new(vec![Err(FenceError::Failed("reset".into()))]),
                waits: Rc::clone(&waits),
            }),
        )
        .unwrap();
        let summary = repaint(&mut r, &mut out, &[view.clone()], &full_damage());
        assert_eq!(summary.views_skipped, 1);
        assert_eq!(summary.blits, 0);

        // The broken fence was consumed; the next frame draws again.
        let summary = repaint(&mut r, &mut out, &[view], &full_damage());
        assert_eq!(summary.blits, 1);
        assert_eq!(waits.get(), 3);
    }

    #[derive(Default)]
    struct Captures {
        pending: Vec<(CaptureSource, CaptureTask)>,
        pulls: Vec<(CaptureSource, Size, DrmFourcc)>,
        retired: Vec<(u64, Result<(), CaptureError>)>,
    }

    impl CaptureQueue for Captures {
        fn pull(
            &mut self,
            source: CaptureSource,
            size: Size,
            format: DrmFourcc,
        ) -> Option<CaptureTask> {
            self.pulls.push((source, size, format));
            let i = self.pending.iter().position(|(s, _)| *s == source)?;
            Some(self.pending.remove(i).1)
        }

        fn retire(&mut self, task: CaptureTask, result: Result<(), CaptureError>) {
            self.retired.push((task.id, result));
        }
    }

    fn capture_task(id: u64, kind: CaptureBufferKind, width: i32, height: i32) -> CaptureTask {
        CaptureTask {
            id,
            buffer: CaptureBuffer {
                kind,
                origin: BufferOrigin::TopLeft,
                width,
                height,
                stride: width * 4,
                format: DrmFourcc::Argb8888,
                data: vec![0; usize::try_from(width * height * 4).unwrap()],
            },
        }
    }

    #[test]
    fn capture_tasks_are_retired() {
        let mut r = renderer();
        let mut out = r
            .create_output(
                OutputId(3),
                OutputOptions {
                    fb_size: Size::new(8, 6),
                    area: Rect::new(2, 1, 6, 5),
                    transform: Transform::Normal,
                    x_offset: 0,
                },
            )
            .unwrap();
        out.set_framebuffer(HwSurface::linear(HwFormat::Bgrx8888, 0xF000, 8, 6, 8));

        let mut captures = Captures::default();
        captures.pending.push((
            CaptureSource::Framebuffer,
            capture_task(1, CaptureBufferKind::Shm, 4, 4),
        ));
        captures.pending.push((
            CaptureSource::FullFramebuffer,
            capture_task(2, CaptureBufferKind::Dmabuf, 8, 6),
        ));

        let summary = r
            .repaint_output(&mut out, &[], &Region::new(), &mut captures, &mut Tracer::none())
            .unwrap();
        assert_eq!((summary.captures_done, summary.captures_failed), (1, 1));
        assert_eq!(
            captures.retired,
            [(1, Ok(())), (2, Err(CaptureError::UnsupportedBuffer))]
        );
        assert_eq!(
            captures.pulls[0],
            (CaptureSource::Framebuffer, Size::new(4, 4), DrmFourcc::Argb8888)
        );
        assert_eq!(
            r.accel().readbacks,
            [(Rect::from_origin_size(2, 1, 4, 4), HwFormat::Bgra8888)]
        );
    }

    #[test]
    fn missing_framebuffer_is_an_error() {
        let mut r = renderer();
        let mut out = r
            .create_output(
                OutputId(0),
                OutputOptions {
                    fb_size: Size::new(8, 8),
                    area: Rect::new(0, 0, 8, 8),
                    transform: Transform::Normal,
                    x_offset: 0,
                },
            )
            .unwrap();
        assert_eq!(
            r.repaint_output(&mut out, &[], &Region::new(), &mut NoCaptures, &mut Tracer::none()),
            Err(OutputError::NoFramebuffer)
        );
        assert_eq!(out.frame_index(), 0);
    }

    #[test]
    fn surface_lifecycle() {
        let mut r = renderer();
        let id = r.create_surface();
        r.attach(
            id,
            Some(AttachedBuffer::Shm(crate::surface::ShmBuffer {
                format: DrmFourcc::Xrgb8888,
                width: 16,
                height: 16,
                stride: 64,
                data: vec![0; 1024],
            })),
        )
        .unwrap();
        assert_eq!(r.buffer_kind(id), Some(BufferKind::Shm));
        assert!(r.destroy_surface(id));
        assert_eq!(r.accel().frees.len(), 1);
        assert!(!r.destroy_surface(id));
        assert_eq!(r.attach(id, None), Err(BufferError::StaleSurface(id)));
        assert_eq!(r.surface_count(), 0);
    }

    #[test]
    fn shm_surface_draws_after_flush() {
        let mut r = renderer();
        let mut out = output(&r);
        let id = r.create_surface();
        r.attach(
            id,
            Some(AttachedBuffer::Shm(crate::surface::ShmBuffer {
                format: DrmFourcc::Argb8888,
                width: 10,
                height: 10,
                stride: 40,
                data: vec![0xAB; 400],
            })),
        )
        .unwrap();
        r.flush_damage(id, &Region::from_rect(Rect::new(0, 0, 10, 10)), true)
            .unwrap();
        let view = View::new(id, Size::new(10, 10), Affine::IDENTITY);
        repaint(&mut r, &mut out, &[view], &full_damage());
        let (req, src) = r.accel().blits[0];
        assert_eq!(src.stride, 16);
        assert_eq!(src.format, HwFormat::Bgra8888);
        assert_eq!(req.source, Rect::new(0, 0, 10, 10));
        let mem = r.accel().memory.values().next().unwrap();
        assert_eq!(mem[..40], [0xAB; 40]);
        assert_eq!(mem[40..64], [0; 24]);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn trace_events_follow_repaint() {
        use blitplan_core::trace::TraceSink;

        #[derive(Default)]
        struct Log(Vec<String>);

        impl TraceSink for Log {
            fn on_repaint_begin(&mut self, e: &RepaintBeginEvent) {
                self.0.push(format!("begin {}", e.frame_index));
            }
            fn on_phase_begin(&mut self, e: &PhaseEvent) {
                self.0.push(format!("{:?}", e.phase));
            }
            fn on_view_skipped(&mut self, e: &ViewSkippedEvent) {
                self.0.push(format!("skip {:?}", e.reason));
            }
            fn on_repaint_summary(&mut self, s: &RepaintSummary) {
                self.0.push(format!("summary {}", s.blits));
            }
        }

        let mut r = renderer();
        let mut out = output(&r);
        let id = dmabuf(&mut r, DrmFourcc::Argb8888, Size::new(100, 50), 0x1000);
        let mut faded = View::new(id, Size::new(100, 50), Affine::IDENTITY);
        faded.alpha = 0.25;
        let views = [faded, View::new(id, Size::new(100, 50), Affine::IDENTITY)];

        let mut log = Log::default();
        let mut tracer = Tracer::new(&mut log);
        r.repaint_output(&mut out, &views, &full_damage(), &mut NoCaptures, &mut tracer)
            .unwrap();
        assert_eq!(
            log.0,
            [
                "begin 1",
                "Damage",
                "Views",
                "skip FractionalAlpha",
                "Capture",
                "Finish",
                "summary 1"
            ]
        );
    }
}
