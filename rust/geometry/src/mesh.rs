// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures
//!
//! Triangles are grouped into [`DataSet`]s, one per material key. Every
//! three consecutive vertices of a data set form one triangle.

use nalgebra::{Point2, Point3, Vector3};
use rustc_hash::FxHashMap;
use schem_mesh_core::{Block, Side};
use std::fmt;

/// Translation subtracted from every vertex
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateShift {
    /// X offset (subtracted from all X coordinates)
    pub x: f64,
    /// Y offset (subtracted from all Y coordinates)
    pub y: f64,
    /// Z offset (subtracted from all Z coordinates)
    pub z: f64,
}

impl CoordinateShift {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn from_point(point: Point3<f64>) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z: point.z,
        }
    }

    /// Shift moving the center of `min..max` to the origin
    #[inline]
    pub fn centering(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self::from_point(min + (max - min) * 0.5)
    }

    /// Check if shift is zero (no shifting needed)
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    #[inline]
    pub fn apply(&self, p: Point3<f64>) -> Point3<f64> {
        Point3::new(p.x - self.x, p.y - self.y, p.z - self.z)
    }
}

/// Which faces of a block share a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialSide {
    /// Every side uses the same texture
    All,
    Side(Side),
}

/// Grouping key of a data set: block identity plus side (or "all sides")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyStruct {
    pub block: Block,
    pub side: MaterialSide,
}

impl KeyStruct {
    /// Key for one face; collapses to [`MaterialSide::All`] for single-texture blocks
    #[inline]
    pub fn new(block: Block, side: Side, single_texture: bool) -> Self {
        let side = if single_texture {
            MaterialSide::All
        } else {
            MaterialSide::Side(side)
        };
        Self { block, side }
    }

    /// Material name built from a display name, e.g. `log_top`
    pub fn material_name(&self, name: &str) -> String {
        match self.side {
            MaterialSide::All => name.to_string(),
            MaterialSide::Side(side) => format!("{name}_{side}"),
        }
    }
}

impl fmt::Display for KeyStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            MaterialSide::All => write!(f, "{}_{}", self.block.id, self.block.data),
            MaterialSide::Side(side) => {
                write!(f, "{}_{}_{}", self.block.id, self.block.data, side)
            }
        }
    }
}

/// Triangles sharing one material
#[derive(Debug, Clone)]
pub struct DataSet {
    key: KeyStruct,
    texture: String,
    /// Vertex positions (x, y, z)
    positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz); empty when normals are disabled
    normals: Vec<f32>,
    /// Texture coordinates (u, v); empty when UVs are disabled
    uvs: Vec<f32>,
    with_normals: bool,
    with_uvs: bool,
}

impl DataSet {
    pub fn new(key: KeyStruct, texture: impl Into<String>, with_normals: bool, with_uvs: bool) -> Self {
        Self {
            key,
            texture: texture.into(),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            with_normals,
            with_uvs,
        }
    }

    #[inline]
    pub fn key(&self) -> &KeyStruct {
        &self.key
    }

    #[inline]
    pub fn texture(&self) -> &str {
        &self.texture
    }

    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    #[inline]
    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, uv: Point2<f64>, normal: &Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        if self.with_normals {
            self.normals.push(normal.x as f32);
            self.normals.push(normal.y as f32);
            self.normals.push(normal.z as f32);
        }
        if self.with_uvs {
            self.uvs.push(uv.x as f32);
            self.uvs.push(uv.y as f32);
        }
    }

    pub fn add_triangle(&mut self, corners: [Point3<f64>; 3], uvs: [Point2<f64>; 3], normal: &Vector3<f64>) {
        for (p, uv) in corners.into_iter().zip(uvs) {
            self.add_vertex(p, uv, normal);
        }
    }

    /// Split a quad into two triangles. Corners are counter-clockwise seen
    /// along the positive axis; `flip` reverses the winding.
    pub fn add_quad(
        &mut self,
        corners: [Point3<f64>; 4],
        uvs: [Point2<f64>; 4],
        normal: &Vector3<f64>,
        flip: bool,
    ) {
        let order: [[usize; 3]; 2] = if flip {
            [[0, 2, 1], [0, 3, 2]]
        } else {
            [[0, 1, 2], [0, 2, 3]]
        };
        for [a, b, c] in order {
            self.add_triangle([corners[a], corners[b], corners[c]], [uvs[a], uvs[b], uvs[c]], normal);
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of vertex `i`
    #[inline]
    pub fn position(&self, i: usize) -> Point3<f64> {
        let c = &self.positions[i * 3..i * 3 + 3];
        Point3::new(c[0] as f64, c[1] as f64, c[2] as f64)
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.is_empty() {
            return None;
        }
        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });
        Some((min, max))
    }

    /// Apply coordinate shift to existing positions in-place, subtracting in f64
    pub fn apply_shift(&mut self, shift: &CoordinateShift) {
        if shift.is_zero() {
            return;
        }
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] = (chunk[0] as f64 - shift.x) as f32;
            chunk[1] = (chunk[1] as f64 - shift.y) as f32;
            chunk[2] = (chunk[2] as f64 - shift.z) as f32;
        }
    }
}

/// All data sets of one export, in creation order
#[derive(Debug, Clone, Default)]
pub struct MeshDataSet {
    sets: Vec<DataSet>,
    lookup: FxHashMap<KeyStruct, usize>,
    with_normals: bool,
    with_uvs: bool,
}

impl MeshDataSet {
    pub fn new(with_normals: bool, with_uvs: bool) -> Self {
        Self {
            sets: Vec::new(),
            lookup: FxHashMap::default(),
            with_normals,
            with_uvs,
        }
    }

    /// Data set for `key`, created on first use with the texture from `texture`
    pub fn entry(&mut self, key: KeyStruct, texture: impl FnOnce() -> String) -> &mut DataSet {
        let index = match self.lookup.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.sets.len();
                self.sets
                    .push(DataSet::new(key, texture(), self.with_normals, self.with_uvs));
                self.lookup.insert(key, index);
                index
            }
        };
        &mut self.sets[index]
    }

    pub fn get(&self, key: &KeyStruct) -> Option<&DataSet> {
        self.lookup.get(key).map(|&i| &self.sets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataSet> {
        self.sets.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.sets.iter().map(DataSet::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.sets.iter().map(DataSet::vertex_count).sum()
    }

    /// Bounding box of every vertex in every data set
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        self.sets
            .iter()
            .filter_map(DataSet::bounds)
            .reduce(|(amin, amax), (bmin, bmax)| (amin.inf(&bmin), amax.sup(&bmax)))
    }

    /// Move the bounding box center to the origin, returning the shift applied
    pub fn center(&mut self) -> CoordinateShift {
        let Some((min, max)) = self.bounds() else {
            return CoordinateShift::default();
        };
        let shift = CoordinateShift::centering(min, max);
        for set in &mut self.sets {
            set.apply_shift(&shift);
        }
        shift
    }

    /// Distinct texture names in first-use order
    pub fn texture_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for set in &self.sets {
            if !names.contains(&set.texture()) {
                names.push(set.texture());
            }
        }
        names
    }

    pub fn into_sets(self) -> Vec<DataSet> {
        self.sets
    }
}

impl<'a> IntoIterator for &'a MeshDataSet {
    type Item = &'a DataSet;
    type IntoIter = std::slice::Iter<'a, DataSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}
