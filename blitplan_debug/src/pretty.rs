// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use blitplan_core::geom::Rect;
use blitplan_core::trace::{
    BlitEvent, ClearEvent, PairAbandonedEvent, PhaseEvent, RepaintBeginEvent, RepaintPhase,
    RepaintSummary, TraceSink, ViewSkippedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    rich: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("rich", &self.rich)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer, rich: true }
    }

    /// Drops per-blit, per-clear and damage lines, keeping the frame
    /// outline.
    #[must_use]
    pub fn outline_only(mut self) -> Self {
        self.rich = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: RepaintPhase) -> &'static str {
    match phase {
        RepaintPhase::Damage => "damage",
        RepaintPhase::Views => "views",
        RepaintPhase::Capture => "capture",
        RepaintPhase::Finish => "finish",
    }
}

struct R(Rect);

impl std::fmt::Display for R {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = self.0;
        write!(
            f,
            "{}x{}+{}+{}",
            r.width(),
            r.height(),
            r.left,
            r.top
        )
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_repaint_begin(&mut self, e: &RepaintBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[repaint] frame={} output={} damage={}",
            e.frame_index, e.output.0, e.damage_rects,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            phase_name(e.phase),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {}",
            e.frame_index,
            phase_name(e.phase),
        );
    }

    fn on_view_skipped(&mut self, e: &ViewSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] frame={} surface={:?} reason={:?}",
            e.frame_index, e.surface, e.reason,
        );
    }

    fn on_pair_abandoned(&mut self, e: &PairAbandonedEvent) {
        let _ = writeln!(
            self.writer,
            "[abandon] frame={} surface={:?} pass={:?} reason={:?}",
            e.frame_index, e.surface, e.pass, e.reason,
        );
    }

    fn on_repaint_summary(&mut self, s: &RepaintSummary) {
        let finish = if s.fenced { "fence" } else { "sync" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} output={} drawn={} skipped={} blits={} clears={} \
             abandoned={} captures={}/{} finish={finish}",
            s.frame_index,
            s.output.0,
            s.views_drawn,
            s.views_skipped,
            s.blits,
            s.clears,
            s.abandoned,
            s.captures_done,
            s.captures_done + s.captures_failed,
        );
    }

    fn on_blit(&mut self, e: &BlitEvent) {
        if !self.rich {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[blit] frame={} surface={:?} {:?} src={} dst={} clip={} rot={} blend={}",
            e.frame_index,
            e.surface,
            e.pass,
            R(e.source),
            R(e.dest),
            R(e.clip),
            e.rotation.degrees(),
            e.blend,
        );
    }

    fn on_clear(&mut self, e: &ClearEvent) {
        if !self.rich {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[clear] frame={} surface={:?} clip={} color={:#010x}",
            e.frame_index,
            e.surface,
            R(e.clip),
            e.color,
        );
    }

    fn on_damage(&mut self, frame_index: u64, rects: &[Rect]) {
        if !self.rich {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={}",
            rects.len(),
        );
    }
}
