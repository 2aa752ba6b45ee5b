// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for blitplan diagnostics.
//!
//! - [`recorder::RecordingAccel`] wraps any
//!   [`BlitAccelerator`](blitplan_render::BlitAccelerator) and logs every
//!   operation the renderer issues; [`recorder::NullAccel`] is a
//!   memory-backed device that accepts everything.
//! - [`pretty::PrettyPrintSink`] writes one line per trace event.
//! - [`json::export`] writes recorded operations as a JSON array.

pub mod json;
pub mod pretty;
pub mod recorder;
