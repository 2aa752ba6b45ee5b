// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of recorded accelerator operations.
//!
//! [`export`] writes the log of a
//! [`RecordingAccel`](crate::recorder::RecordingAccel) as a pretty-printed
//! JSON array, one object per call, in issue order. Rectangles are
//! `[left, top, right, bottom]` arrays; colours and addresses are hex
//! strings.

use std::io::{self, Write};

use blitplan_core::geom::Rect;
use blitplan_render::HwSurface;
use serde_json::{Value, json};

use crate::recorder::RecordedOp;

/// Exports `ops` as a JSON array.
pub fn export(ops: &[RecordedOp], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = ops.iter().map(op_to_json).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

/// Converts one recorded operation to its JSON object.
#[must_use]
pub fn op_to_json(op: &RecordedOp) -> Value {
    match op {
        RecordedOp::Blit {
            request,
            source,
            target,
            ok,
        } => json!({
            "op": op.name(),
            "ok": ok,
            "source": rect(request.source),
            "dest": rect(request.dest),
            "clip": rect(request.clip),
            "rotation": request.rotation.degrees(),
            "blend": request.blend,
            "global_alpha": request.global_alpha,
            "src": surface(source),
            "dst": surface(target),
        }),
        RecordedOp::Clear {
            request,
            target,
            ok,
        } => json!({
            "op": op.name(),
            "ok": ok,
            "clip": rect(request.clip),
            "color": format!("{:#010x}", request.color),
            "dst": surface(target),
        }),
        RecordedOp::Finish => json!({ "op": op.name() }),
        RecordedOp::Fence { issued } => json!({
            "op": op.name(),
            "issued": issued,
        }),
        RecordedOp::Readback { rect: r, format, ok } => json!({
            "op": op.name(),
            "ok": ok,
            "rect": rect(*r),
            "format": format!("{format:?}"),
        }),
        RecordedOp::Alloc { len } => json!({
            "op": op.name(),
            "len": len,
        }),
        RecordedOp::Free { id } => json!({
            "op": op.name(),
            "id": id,
        }),
    }
}

fn rect(r: Rect) -> Value {
    json!([r.left, r.top, r.right, r.bottom])
}

fn surface(s: &HwSurface) -> Value {
    json!({
        "format": format!("{:?}", s.format),
        "address": format!("{:#x}", s.planes[0]),
        "size": [s.width, s.height],
        "stride": s.stride,
        "tiling": format!("{:?}", s.tiling),
    })
}
