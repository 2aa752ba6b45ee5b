// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer and output transforms, and the accelerator's rotation codes.
//!
//! [`Transform`] is the eight-valued orientation used both for a surface's
//! buffer (how client content maps into the surface) and for an output (how
//! the physical panel maps into the framebuffer). [`HardwareRotation`] is the
//! only orientation the blit accelerator can apply to a whole blit.

use crate::geom::Size;

/// One of the eight 90°-multiple orientations, optionally flipped.
///
/// Discriminants follow the wire numbering: the low two bits are the number
/// of counter-clockwise quarter turns, bit 2 is the horizontal flip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Transform {
    /// No transform.
    #[default]
    Normal = 0,
    /// Rotated 90° counter-clockwise.
    _90 = 1,
    /// Rotated 180°.
    _180 = 2,
    /// Rotated 270° counter-clockwise.
    _270 = 3,
    /// Flipped horizontally.
    Flipped = 4,
    /// Flipped, then rotated 90°.
    Flipped90 = 5,
    /// Flipped, then rotated 180°.
    Flipped180 = 6,
    /// Flipped, then rotated 270°.
    Flipped270 = 7,
}

impl Transform {
    /// All eight transforms in wire order.
    pub const ALL: [Self; 8] = [
        Self::Normal,
        Self::_90,
        Self::_180,
        Self::_270,
        Self::Flipped,
        Self::Flipped90,
        Self::Flipped180,
        Self::Flipped270,
    ];

    /// Decodes a wire value, `None` if out of range.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Normal,
            1 => Self::_90,
            2 => Self::_180,
            3 => Self::_270,
            4 => Self::Flipped,
            5 => Self::Flipped90,
            6 => Self::Flipped180,
            7 => Self::Flipped270,
            _ => return None,
        })
    }

    /// The wire value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Number of counter-clockwise quarter turns, ignoring the flip.
    #[inline]
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        (self as u8) & 0b11
    }

    /// Whether the transform includes a flip.
    #[inline]
    #[must_use]
    pub const fn is_flipped(self) -> bool {
        (self as u8) & 0b100 != 0
    }

    /// Whether width and height trade places under this transform.
    #[inline]
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        self.quarter_turns() % 2 == 1
    }

    /// Converts a buffer size into the size it occupies after the transform.
    #[inline]
    #[must_use]
    pub const fn transform_size(self, size: Size) -> Size {
        if self.swaps_axes() {
            size.swapped()
        } else {
            size
        }
    }
}

/// The rotation code applied by the accelerator to a whole blit.
///
/// Angles are clockwise turns of the source as it lands in the destination.
/// [`compose_rotation`] folds the counter-clockwise buffer and output
/// transforms into this convention.
///
/// [`compose_rotation`]: crate::rotation::compose_rotation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HardwareRotation {
    /// No rotation.
    #[default]
    Deg0,
    /// 90° clockwise.
    Deg90,
    /// 180°.
    Deg180,
    /// 270° clockwise.
    Deg270,
}

impl HardwareRotation {
    /// All four rotations.
    pub const ALL: [Self; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Quarter turns in the accelerator's direction.
    #[inline]
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// Rotation for `turns` quarter turns, taken modulo four.
    #[inline]
    #[must_use]
    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// Applies `self`, then `next`.
    #[inline]
    #[must_use]
    pub const fn then(self, next: Self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + next.quarter_turns())
    }

    /// The rotation that undoes `self`.
    #[inline]
    #[must_use]
    pub const fn inverse(self) -> Self {
        Self::from_quarter_turns(4 - self.quarter_turns())
    }

    /// Whether source width maps onto destination height.
    #[inline]
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Angle in degrees, for diagnostics.
    #[inline]
    #[must_use]
    pub const fn degrees(self) -> u32 {
        self.quarter_turns() as u32 * 90
    }
}
