// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition of a buffer rotation and an output rotation into one
//! accelerator rotation code.
//!
//! The accelerator describes angles as one-hot 8-bit codes: `0x10` is 0°,
//! higher bits are clockwise steps, lower bits counter-clockwise steps.
//! Rotating the buffer shifts the code left by the buffer's quarter turns and
//! the output rotation shifts it back right. The 16 possible outcomes are
//! evaluated once, at compile time, into [`ROTATION_TABLE`].

use crate::transform::{HardwareRotation, Transform};

const ANGLE_0: u8 = 0x10;
const ANGLE_POSITIVE_90: u8 = 0x20;
const ANGLE_POSITIVE_180: u8 = 0x40;
const ANGLE_POSITIVE_270: u8 = 0x80;
const ANGLE_NEGATIVE_90: u8 = 0x08;
const ANGLE_NEGATIVE_180: u8 = 0x04;
const ANGLE_NEGATIVE_270: u8 = 0x02;

/// Decodes a one-hot angle code. Unknown codes fall back to no rotation.
const fn decode_angle(code: u8) -> HardwareRotation {
    match code {
        ANGLE_POSITIVE_270 | ANGLE_NEGATIVE_90 => HardwareRotation::Deg90,
        ANGLE_POSITIVE_90 | ANGLE_NEGATIVE_270 => HardwareRotation::Deg270,
        ANGLE_POSITIVE_180 | ANGLE_NEGATIVE_180 => HardwareRotation::Deg180,
        _ => HardwareRotation::Deg0,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "the angle code is an 8-bit register value"
)]
const fn build_table() -> [[HardwareRotation; 4]; 4] {
    let mut table = [[HardwareRotation::Deg0; 4]; 4];
    let mut view = 0;
    while view < 4 {
        let mut output = 0;
        while output < 4 {
            let code = ((ANGLE_0 as u32) << view) as u8 >> output;
            table[view][output] = decode_angle(code);
            output += 1;
        }
        view += 1;
    }
    table
}

/// `ROTATION_TABLE[view_turns][output_turns]` is the accelerator rotation
/// for a buffer rotated by `view_turns` shown on an output rotated by
/// `output_turns`.
pub const ROTATION_TABLE: [[HardwareRotation; 4]; 4] = build_table();

/// Combines a buffer transform and an output transform into the single
/// rotation the accelerator applies.
///
/// Flips are not representable by the accelerator's rotation path; a flipped
/// transform contributes only its rotation.
#[inline]
#[must_use]
pub const fn compose_rotation(view: Transform, output: Transform) -> HardwareRotation {
    ROTATION_TABLE[view.quarter_turns() as usize][output.quarter_turns() as usize]
}
