// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block identity and the six axis-aligned face directions

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A placed block: numeric id plus metadata byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub id: u32,
    pub data: u8,
}

impl Block {
    /// The empty block. Anything outside the grid reads as air.
    pub const AIR: Block = Block { id: 0, data: 0 };

    #[inline]
    pub const fn new(id: u32, data: u8) -> Self {
        Self { id, data }
    }

    #[inline]
    pub const fn is_air(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.data)
    }
}

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index (x = 0, y = 1, z = 2)
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two in-plane axes `(u, v)` of the plane perpendicular to this axis,
    /// chosen so that `u x v` points along the positive axis.
    #[inline]
    pub const fn plane_axes(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

/// One of the six face normals of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    /// +X
    East,
    /// -X
    West,
    /// +Y
    Top,
    /// -Y
    Bottom,
    /// +Z
    South,
    /// -Z
    North,
}

impl Side {
    /// All sides in processing order
    pub const ALL: [Side; 6] = [
        Side::East,
        Side::West,
        Side::Top,
        Side::Bottom,
        Side::South,
        Side::North,
    ];

    /// Stable index in `0..6`, matching the order of [`Side::ALL`]
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::East => 0,
            Side::West => 1,
            Side::Top => 2,
            Side::Bottom => 3,
            Side::South => 4,
            Side::North => 5,
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<Side> {
        match index {
            0 => Some(Side::East),
            1 => Some(Side::West),
            2 => Some(Side::Top),
            3 => Some(Side::Bottom),
            4 => Some(Side::South),
            5 => Some(Side::North),
            _ => None,
        }
    }

    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Side::East | Side::West => Axis::X,
            Side::Top | Side::Bottom => Axis::Y,
            Side::South | Side::North => Axis::Z,
        }
    }

    /// True when the normal points along the positive axis
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(self, Side::East | Side::Top | Side::South)
    }

    #[inline]
    pub const fn opposite(self) -> Side {
        match self {
            Side::East => Side::West,
            Side::West => Side::East,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::South => Side::North,
            Side::North => Side::South,
        }
    }

    /// Integer unit normal
    #[inline]
    pub const fn normal(self) -> [i32; 3] {
        match self {
            Side::East => [1, 0, 0],
            Side::West => [-1, 0, 0],
            Side::Top => [0, 1, 0],
            Side::Bottom => [0, -1, 0],
            Side::South => [0, 0, 1],
            Side::North => [0, 0, -1],
        }
    }

    /// Whether this is a horizontal face (top or bottom)
    #[inline]
    pub const fn is_vertical_axis(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Side::East => "east",
            Side::West => "west",
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::South => "south",
            Side::North => "north",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "east" | "+x" => Ok(Side::East),
            "west" | "-x" => Ok(Side::West),
            "top" | "up" | "+y" => Ok(Side::Top),
            "bottom" | "down" | "-y" => Ok(Side::Bottom),
            "south" | "+z" => Ok(Side::South),
            "north" | "-z" => Ok(Side::North),
            _ => Err(Error::UnknownSide(s.to_string())),
        }
    }
}
