// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dense voxel storage
//!
//! Blocks are stored in schematic order: `index = (y * length + z) * width + x`.
//! Reads outside the grid return [`Block::AIR`], so neighbour lookups at the
//! border never need special casing.

use crate::block::{Block, Side};
use crate::error::{Error, Result};

/// Grid extent along x (width), y (height) and z (length)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
    pub length: usize,
}

impl Dimensions {
    /// Create validated dimensions. Every extent must be positive and the
    /// volume must fit in memory indices.
    pub fn new(width: usize, height: usize, length: usize) -> Result<Self> {
        let invalid = || Error::InvalidDimensions {
            width,
            height,
            length,
        };
        if width == 0 || height == 0 || length == 0 {
            return Err(invalid());
        }
        width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(length))
            .filter(|v| *v <= i32::MAX as usize)
            .ok_or_else(invalid)?;
        Ok(Self {
            width,
            height,
            length,
        })
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.width * self.height * self.length
    }

    /// Extent along an axis index (0 = x, 1 = y, 2 = z)
    #[inline]
    pub fn extent(&self, axis: usize) -> usize {
        match axis {
            0 => self.width,
            1 => self.height,
            _ => self.length,
        }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && (z as usize) < self.length
    }

    /// True if the position lies on the outermost layer of the grid
    #[inline]
    pub fn is_on_shell(&self, x: i32, y: i32, z: i32) -> bool {
        x == 0
            || y == 0
            || z == 0
            || x as usize == self.width - 1
            || y as usize == self.height - 1
            || z as usize == self.length - 1
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if !self.contains(x, y, z) {
            return None;
        }
        Some((y as usize * self.length + z as usize) * self.width + x as usize)
    }
}

/// Read access to a loaded voxel region
///
/// Implementations must return [`Block::AIR`] for any position outside
/// [`VoxelSource::dimensions`].
pub trait VoxelSource {
    /// Region extent, queried once at the start of an export
    fn dimensions(&self) -> Dimensions;

    /// Block at a position; out-of-range positions are air
    fn block(&self, x: i32, y: i32, z: i32) -> Block;

    /// Block adjacent to `(x, y, z)` across `side`
    #[inline]
    fn neighbor(&self, x: i32, y: i32, z: i32, side: Side) -> Block {
        let [dx, dy, dz] = side.normal();
        self.block(x + dx, y + dy, z + dz)
    }

    /// The 6-neighbourhood of a position, indexed by [`Side::index`]
    fn neighborhood(&self, x: i32, y: i32, z: i32) -> [Block; 6] {
        let mut out = [Block::AIR; 6];
        for side in Side::ALL {
            out[side.index()] = self.neighbor(x, y, z, side);
        }
        out
    }
}

/// Dense in-memory voxel grid
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    dims: Dimensions,
    blocks: Vec<Block>,
}

impl VoxelGrid {
    /// Create an all-air grid
    pub fn new(width: usize, height: usize, length: usize) -> Result<Self> {
        let dims = Dimensions::new(width, height, length)?;
        Ok(Self {
            dims,
            blocks: vec![Block::AIR; dims.volume()],
        })
    }

    /// Wrap an existing block array laid out in schematic order
    pub fn from_blocks(dims: Dimensions, blocks: Vec<Block>) -> Result<Self> {
        let dims = Dimensions::new(dims.width, dims.height, dims.length)?;
        if blocks.len() != dims.volume() {
            return Err(Error::BlockCountMismatch {
                expected: dims.volume(),
                actual: blocks.len(),
            });
        }
        Ok(Self { dims, blocks })
    }

    /// Build a grid from the parallel id/metadata arrays of a schematic
    pub fn from_ids_and_data(dims: Dimensions, ids: &[u32], data: &[u8]) -> Result<Self> {
        if ids.len() != data.len() {
            return Err(Error::BlockCountMismatch {
                expected: ids.len(),
                actual: data.len(),
            });
        }
        let blocks = ids
            .iter()
            .zip(data)
            .map(|(&id, &data)| Block::new(id, data))
            .collect();
        Self::from_blocks(dims, blocks)
    }

    /// Set a block; returns false when the position is outside the grid
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) -> bool {
        match self.dims.index(x, y, z) {
            Some(i) => {
                self.blocks[i] = block;
                true
            }
            None => false,
        }
    }

    /// Fill an inclusive box with one block, clamped to the grid
    pub fn fill(&mut self, from: [i32; 3], to: [i32; 3], block: Block) {
        for y in from[1].min(to[1])..=from[1].max(to[1]) {
            for z in from[2].min(to[2])..=from[2].max(to[2]) {
                for x in from[0].min(to[0])..=from[0].max(to[0]) {
                    self.set_block(x, y, z, block);
                }
            }
        }
    }

    /// Number of non-air blocks
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_air()).count()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl VoxelSource for VoxelGrid {
    #[inline]
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    fn block(&self, x: i32, y: i32, z: i32) -> Block {
        match self.dims.index(x, y, z) {
            Some(i) => self.blocks[i],
            None => Block::AIR,
        }
    }
}
