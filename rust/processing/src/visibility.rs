// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face visibility rules
//!
//! A face is hidden when the neighbour across it covers the whole shared
//! face with an opaque side. Two transparent blocks of the same type also
//! hide each other, so glass walls do not export their inner panes.

use schem_mesh_core::{Block, BlockCatalog, Dimensions, ExportConfig, Side, VoxelSource};

/// Offsets closer than this to 0 or 1 lie on the block boundary
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Visibility queries against one voxel source
pub struct Visibility<'a, S: VoxelSource + ?Sized, C: BlockCatalog + ?Sized> {
    source: &'a S,
    catalog: &'a C,
    dims: Dimensions,
    exclude_edge_faces: bool,
    interior_only: bool,
}

impl<'a, S: VoxelSource + ?Sized, C: BlockCatalog + ?Sized> Visibility<'a, S, C> {
    pub fn new(source: &'a S, catalog: &'a C, config: &ExportConfig) -> Self {
        Self {
            source,
            catalog,
            dims: source.dimensions(),
            exclude_edge_faces: config.exclude_edge_faces,
            interior_only: config.interior_only,
        }
    }

    /// Whether the block at the position takes part in the export at all
    #[inline]
    pub fn block_included(&self, x: i32, y: i32, z: i32) -> bool {
        !(self.interior_only && self.dims.is_on_shell(x, y, z))
    }

    /// Whether `neighbor` hides the face of `block` it touches across `side`
    pub fn occludes(&self, block: Block, neighbor: Block, side: Side) -> bool {
        if neighbor.is_air() || !self.catalog.is_full_cube(neighbor, side.opposite()) {
            return false;
        }
        !self.catalog.is_transparent(neighbor) || neighbor == block
    }

    /// Whether the unit face of the block at the position on `side` is exported
    pub fn face_visible(&self, x: i32, y: i32, z: i32, side: Side) -> bool {
        let [dx, dy, dz] = side.normal();
        let (nx, ny, nz) = (x + dx, y + dy, z + dz);
        if !self.dims.contains(nx, ny, nz) {
            return !self.exclude_edge_faces;
        }
        let block = self.source.block(x, y, z);
        !self.occludes(block, self.source.block(nx, ny, nz), side)
    }

    /// Block occupying the cell of a full-cube layer slab, if its face on
    /// `side` is exported there. Custom models are left to the projector.
    pub fn full_face(&self, x: i32, y: i32, z: i32, side: Side) -> Option<Block> {
        let block = self.source.block(x, y, z);
        if block.is_air()
            || self.catalog.is_custom_model(block)
            || !self.catalog.is_full_cube(block, side)
            || !self.block_included(x, y, z)
            || !self.face_visible(x, y, z, side)
        {
            return None;
        }
        Some(block)
    }

    /// Bucket predicate for the custom-model projector: only planes lying on
    /// the block boundary can be covered by a neighbour.
    pub fn custom_plane_hidden(&self, x: i32, y: i32, z: i32, side: Side, offset: f64) -> bool {
        let boundary = if side.is_positive() { 1.0 } else { 0.0 };
        if (offset - boundary).abs() > BOUNDARY_TOLERANCE {
            return false;
        }
        !self.face_visible(x, y, z, side)
    }
}
