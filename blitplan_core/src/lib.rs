// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform-aware clipping and rectangle derivation for 2D blit accelerators.
//!
//! A fixed-function blit engine copies and clears axis-aligned integer
//! rectangles, optionally rotating a whole blit by a multiple of 90°. A
//! compositor, on the other hand, thinks in transformed surface quads clipped
//! by damage. `blitplan_core` is the geometry that bridges the two. It is
//! `no_std` compatible (with `alloc`).
//!
//! # Pipeline
//!
//! For every (damage rectangle × surface rectangle) pair:
//!
//! ```text
//!   surface rect ──► clip::clip_surface_rect ──► Polygon8 ──► clip_rect()
//!                                                                │
//!   view transform ─┐                                            ▼
//!                   ├─► rotation::compose_rotation    output_space::map_rect_to_output
//!   output transform┘            │                               │
//!                                ▼                               ▼
//!                          HardwareRotation ──► clamp::clamp_to_bounds ──► blit
//! ```
//!
//! **[`geom`]**: integer [`Rect`](geom::Rect), [`Size`](geom::Size), and the
//! inline [`Polygon8`](geom::Polygon8).
//!
//! **[`region`]**: disjoint-rectangle [`Region`](region::Region) for damage,
//! occlusion and opaque/blend splits.
//!
//! **[`transform`]**: the eight buffer/output [`Transform`](transform::Transform)s
//! and the accelerator's [`HardwareRotation`](transform::HardwareRotation).
//!
//! **[`clip`]**: fast axis-aligned and general Sutherland–Hodgman clipping of
//! a transformed rectangle.
//!
//! **[`rotation`]**: compile-time table combining view and output rotation.
//!
//! **[`output_space`]**: remapping framebuffer rectangles into a rotated
//! output.
//!
//! **[`clamp`]**: fitting a blit into the framebuffer without changing its
//! scale.
//!
//! **[`id`]**: output and generational surface handles.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and the zero-overhead
//! [`Tracer`](trace::Tracer) for repaint instrumentation.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies.
//! - `trace-rich` (disabled by default, implies `trace`): Adds per-blit,
//!   per-clear and damage events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod clamp;
pub mod clip;
pub mod geom;
pub mod id;
pub mod output_space;
pub mod region;
pub mod rotation;
pub mod trace;
pub mod transform;
