// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Greedy rectangle merge of one layer of visible faces
//!
//! Cells holding the same block are merged into rectangles. Starting from the
//! first unprocessed cell in row-major order, a rectangle grows one column to
//! the right and one row down per round, each direction stopping for good the
//! first time the enlarged rectangle would include a cell that is empty,
//! holds another block, or is already covered.
//!
//! This is a first-fit heuristic: the cover is exact (every visible cell is
//! covered once) but not necessarily minimal.

use schem_mesh_core::Block;

/// A 2D slice of visible faces; `None` means no face at that cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSlab {
    width: usize,
    height: usize,
    cells: Vec<Option<Block>>,
}

impl LayerSlab {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at column `u`, row `v`; out of range reads as empty
    #[inline]
    pub fn get(&self, u: usize, v: usize) -> Option<Block> {
        if u < self.width && v < self.height {
            self.cells[v * self.width + u]
        } else {
            None
        }
    }

    /// Returns false when the cell is out of range
    #[inline]
    pub fn set(&mut self, u: usize, v: usize, block: Option<Block>) -> bool {
        if u < self.width && v < self.height {
            self.cells[v * self.width + u] = block;
            true
        } else {
            false
        }
    }

    /// Empty every cell, keeping the allocation
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Number of cells holding a face
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// Inclusive cell rectangle covered by one block type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: [usize; 2],
    pub to: [usize; 2],
    pub block: Block,
}

impl BlockRange {
    #[inline]
    pub fn width(&self) -> usize {
        self.to[0] - self.from[0] + 1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.to[1] - self.from[1] + 1
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width() * self.height()
    }

    #[inline]
    pub fn contains(&self, u: usize, v: usize) -> bool {
        (self.from[0]..=self.to[0]).contains(&u) && (self.from[1]..=self.to[1]).contains(&v)
    }
}

/// Cover the occupied cells of a slab with rectangles.
///
/// With `optimize` off every occupied cell becomes its own 1x1 range.
pub fn squareangulate(slab: &LayerSlab, optimize: bool) -> Vec<BlockRange> {
    let mut ranges = Vec::new();
    if !optimize {
        for v in 0..slab.height {
            for u in 0..slab.width {
                if let Some(block) = slab.get(u, v) {
                    ranges.push(BlockRange {
                        from: [u, v],
                        to: [u, v],
                        block,
                    });
                }
            }
        }
        return ranges;
    }

    let mut done = vec![false; slab.cells.len()];
    for v in 0..slab.height {
        for u in 0..slab.width {
            let index = v * slab.width + u;
            let Some(block) = slab.cells[index] else {
                continue;
            };
            if done[index] {
                continue;
            }

            let range = grow(slab, &done, u, v, block);
            for rv in range.from[1]..=range.to[1] {
                for ru in range.from[0]..=range.to[0] {
                    done[rv * slab.width + ru] = true;
                }
            }
            ranges.push(range);
        }
    }
    ranges
}

fn grow(slab: &LayerSlab, done: &[bool], u0: usize, v0: usize, block: Block) -> BlockRange {
    let usable = |u: usize, v: usize| {
        u < slab.width && v < slab.height && !done[v * slab.width + u] && slab.get(u, v) == Some(block)
    };

    let (mut w, mut h) = (1, 1);
    let (mut right, mut down) = (true, true);
    while right || down {
        if right {
            if (v0..v0 + h).all(|v| usable(u0 + w, v)) {
                w += 1;
            } else {
                right = false;
            }
        }
        if down {
            if (u0..u0 + w).all(|u| usable(u, v0 + h)) {
                h += 1;
            } else {
                down = false;
            }
        }
    }

    BlockRange {
        from: [u0, v0],
        to: [u0 + w - 1, v0 + h - 1],
        block,
    }
}
