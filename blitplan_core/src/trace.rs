// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace events for the repaint path.
//!
//! [`TraceSink`] has one method per event, all defaulting to no-ops, so a
//! sink only overrides what it cares about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. With the `trace`
//! feature **off**, every `Tracer` method compiles to nothing. With it
//! **on**, each call costs one `Option` branch before dispatch.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies.
//! - `trace-rich` (implies `trace`): adds per-blit [`BlitEvent`],
//!   per-clear [`ClearEvent`], and per-repaint damage rectangles.

use crate::id::{OutputId, SurfaceId};
#[cfg(feature = "trace-rich")]
use crate::{geom::Rect, transform::HardwareRotation};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Stage of a single output repaint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepaintPhase {
    /// Folding the frame's damage into the output's damage history.
    Damage,
    /// Drawing every view on the primary plane.
    Views,
    /// Servicing pending capture tasks.
    Capture,
    /// Fencing or finishing the accelerator queue.
    Finish,
}

/// Which sub-region of a view a blit belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// The surface's opaque region, drawn without blending.
    Opaque,
    /// Everything else, blended when the format has alpha.
    Blend,
}

/// Why a whole view was left out of a repaint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The view's global alpha is below one.
    FractionalAlpha,
    /// No buffer is attached to the surface.
    Detached,
    /// The attached buffer has no pixels.
    EmptyBuffer,
    /// The view does not intersect the damage.
    NoDamage,
    /// A solid colour with alpha below one; the clear path cannot blend.
    TranslucentSolid,
    /// The buffer could not be made ready (fence failure or invalid buffer).
    NotReady,
}

/// Why one (damage rectangle × surface rectangle) pair, or a whole pass,
/// produced no accelerator call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbandonReason {
    /// The clipped polygon had no vertices.
    NoIntersection,
    /// The clip rectangle was empty after output mapping.
    EmptyClip,
    /// Clamping to the framebuffer collapsed the source or destination.
    ClampCollapsed,
    /// The accelerator rejected the call.
    AcceleratorFailed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an output repaint starts.
#[derive(Clone, Copy, Debug)]
pub struct RepaintBeginEvent {
    /// Monotonic repaint counter of the output.
    pub frame_index: u64,
    /// Output being repainted.
    pub output: OutputId,
    /// Number of rectangles in this frame's (not yet accumulated) damage.
    pub damage_rects: u32,
}

/// Marks the start or end of a [`RepaintPhase`].
#[derive(Clone, Copy, Debug)]
pub struct PhaseEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Output being repainted.
    pub output: OutputId,
    /// Which phase.
    pub phase: RepaintPhase,
}

/// Emitted when a view is skipped entirely.
#[derive(Clone, Copy, Debug)]
pub struct ViewSkippedEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Output being repainted.
    pub output: OutputId,
    /// Surface shown by the view.
    pub surface: SurfaceId,
    /// Why.
    pub reason: SkipReason,
}

/// Emitted when a pass or a single rectangle pair is dropped.
#[derive(Clone, Copy, Debug)]
pub struct PairAbandonedEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Output being repainted.
    pub output: OutputId,
    /// Surface shown by the view.
    pub surface: SurfaceId,
    /// Pass the pair belonged to.
    pub pass: PassKind,
    /// Why.
    pub reason: AbandonReason,
}

/// A blit as issued to the accelerator.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct BlitEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Output being repainted.
    pub output: OutputId,
    /// Source surface.
    pub surface: SurfaceId,
    /// Pass the blit belongs to.
    pub pass: PassKind,
    /// Source rectangle in buffer pixels.
    pub source: Rect,
    /// Destination rectangle in framebuffer pixels.
    pub dest: Rect,
    /// Clip rectangle in framebuffer pixels.
    pub clip: Rect,
    /// Rotation applied by the accelerator.
    pub rotation: HardwareRotation,
    /// Whether blending was enabled.
    pub blend: bool,
    /// Global alpha, 0–255.
    pub global_alpha: u8,
}

/// A solid-colour clear as issued to the accelerator.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct ClearEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Output being repainted.
    pub output: OutputId,
    /// Solid-colour surface.
    pub surface: SurfaceId,
    /// Cleared rectangle in framebuffer pixels.
    pub clip: Rect,
    /// Packed colour.
    pub color: u32,
}

/// Per-repaint counters, emitted once at the end of a repaint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepaintSummary {
    /// Repaint counter.
    pub frame_index: u64,
    /// Output that was repainted.
    pub output: OutputId,
    /// Views that reached at least one pass.
    pub views_drawn: u32,
    /// Views skipped as a whole.
    pub views_skipped: u32,
    /// Blits issued.
    pub blits: u32,
    /// Clears issued.
    pub clears: u32,
    /// Pairs or passes abandoned.
    pub abandoned: u32,
    /// Capture tasks retired successfully.
    pub captures_done: u32,
    /// Capture tasks retired as failed.
    pub captures_failed: u32,
    /// Whether a completion fence replaced a synchronous finish.
    pub fenced: bool,
}

impl RepaintSummary {
    /// A zeroed summary for one repaint.
    #[must_use]
    pub fn new(frame_index: u64, output: OutputId) -> Self {
        Self {
            frame_index,
            output,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the repaint path.
///
/// All methods default to no-ops.
pub trait TraceSink {
    /// Called when an output repaint starts.
    fn on_repaint_begin(&mut self, e: &RepaintBeginEvent) {
        _ = e;
    }

    /// Called when a repaint phase starts.
    fn on_phase_begin(&mut self, e: &PhaseEvent) {
        _ = e;
    }

    /// Called when a repaint phase ends.
    fn on_phase_end(&mut self, e: &PhaseEvent) {
        _ = e;
    }

    /// Called when a view is skipped.
    fn on_view_skipped(&mut self, e: &ViewSkippedEvent) {
        _ = e;
    }

    /// Called when a pass or pair is abandoned.
    fn on_pair_abandoned(&mut self, e: &PairAbandonedEvent) {
        _ = e;
    }

    /// Called with the per-repaint counters.
    fn on_repaint_summary(&mut self, s: &RepaintSummary) {
        _ = s;
    }

    /// Called for every blit (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_blit(&mut self, e: &BlitEvent) {
        _ = e;
    }

    /// Called for every clear (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_clear(&mut self, e: &ClearEvent) {
        _ = e;
    }

    /// Called with the accumulated damage (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage(&mut self, frame_index: u64, rects: &[Rect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:expr) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RepaintBeginEvent`].
    #[inline]
    pub fn repaint_begin(&mut self, e: &RepaintBeginEvent) {
        dispatch!(self, on_repaint_begin, e);
    }

    /// Emits a phase start.
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseEvent) {
        dispatch!(self, on_phase_begin, e);
    }

    /// Emits a phase end.
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEvent) {
        dispatch!(self, on_phase_end, e);
    }

    /// Emits a [`ViewSkippedEvent`].
    #[inline]
    pub fn view_skipped(&mut self, e: &ViewSkippedEvent) {
        dispatch!(self, on_view_skipped, e);
    }

    /// Emits a [`PairAbandonedEvent`].
    #[inline]
    pub fn pair_abandoned(&mut self, e: &PairAbandonedEvent) {
        dispatch!(self, on_pair_abandoned, e);
    }

    /// Emits a [`RepaintSummary`].
    #[inline]
    pub fn repaint_summary(&mut self, s: &RepaintSummary) {
        dispatch!(self, on_repaint_summary, s);
    }

    /// Emits a [`BlitEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn blit(&mut self, e: &BlitEvent) {
        if let Some(s) = &mut self.sink {
            s.on_blit(e);
        }
    }

    /// Emits a [`ClearEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn clear(&mut self, e: &ClearEvent) {
        if let Some(s) = &mut self.sink {
            s.on_clear(e);
        }
    }

    /// Emits accumulated damage (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage(&mut self, frame_index: u64, rects: &[Rect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(phase: RepaintPhase) -> PhaseEvent {
        PhaseEvent {
            frame_index: 9,
            output: OutputId(1),
            phase,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_repaint_begin(&RepaintBeginEvent {
            frame_index: 0,
            output: OutputId(0),
            damage_rects: 2,
        });
        sink.on_phase_begin(&phase(RepaintPhase::Views));
        sink.on_repaint_summary(&RepaintSummary::new(0, OutputId(0)));
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_begin(&phase(RepaintPhase::Damage));
        tracer.phase_end(&phase(RepaintPhase::Damage));
    }

    #[test]
    fn summary_starts_zeroed() {
        let s = RepaintSummary::new(5, OutputId(2));
        assert_eq!(s.frame_index, 5);
        assert_eq!(s.output, OutputId(2));
        assert_eq!(s.blits + s.clears + s.abandoned, 0);
        assert!(!s.fenced);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            phases: Vec<RepaintPhase>,
        }
        impl TraceSink for RecordingSink {
            fn on_phase_begin(&mut self, e: &PhaseEvent) {
                self.phases.push(e.phase);
            }
        }

        let mut sink = RecordingSink { phases: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.phase_begin(&phase(RepaintPhase::Views));
        tracer.phase_begin(&phase(RepaintPhase::Capture));
        drop(tracer);
        assert_eq!(sink.phases, [RepaintPhase::Views, RepaintPhase::Capture]);
    }
}
