// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle arena records
//!
//! Slot `i` of `neighbors`, `constrained` and `delaunay` refers to the edge
//! opposite `points[i]`. Points are stored counter-clockwise.

use super::point::PointId;

/// Index into the triangle arena
pub type TriangleId = usize;

#[derive(Debug, Clone)]
pub struct DelaunayTriangle {
    pub points: [PointId; 3],
    pub neighbors: [Option<TriangleId>; 3],
    pub constrained: [bool; 3],
    /// Edges already known to be Delaunay during one legalization pass
    pub delaunay: [bool; 3],
    pub interior: bool,
}

impl DelaunayTriangle {
    pub fn new(a: PointId, b: PointId, c: PointId) -> Self {
        Self {
            points: [a, b, c],
            neighbors: [None; 3],
            constrained: [false; 3],
            delaunay: [false; 3],
            interior: false,
        }
    }

    #[inline]
    pub fn index(&self, p: PointId) -> Option<usize> {
        self.points.iter().position(|&x| x == p)
    }

    #[inline]
    pub fn contains(&self, p: PointId) -> bool {
        self.points.contains(&p)
    }

    #[inline]
    pub fn contains_edge(&self, p: PointId, q: PointId) -> bool {
        self.contains(p) && self.contains(q)
    }

    /// Slot of the edge `p-q`
    #[inline]
    pub fn edge_index(&self, p: PointId, q: PointId) -> Option<usize> {
        let a = self.index(p)?;
        let b = self.index(q)?;
        (a != b).then(|| 3 - a - b)
    }

    #[inline]
    pub fn point_cw(&self, p: PointId) -> Option<PointId> {
        self.index(p).map(|i| self.points[(i + 2) % 3])
    }

    #[inline]
    pub fn point_ccw(&self, p: PointId) -> Option<PointId> {
        self.index(p).map(|i| self.points[(i + 1) % 3])
    }

    #[inline]
    pub fn neighbor_cw(&self, p: PointId) -> Option<TriangleId> {
        self.index(p).and_then(|i| self.neighbors[(i + 1) % 3])
    }

    #[inline]
    pub fn neighbor_ccw(&self, p: PointId) -> Option<TriangleId> {
        self.index(p).and_then(|i| self.neighbors[(i + 2) % 3])
    }

    #[inline]
    pub fn neighbor_across(&self, p: PointId) -> Option<TriangleId> {
        self.index(p).and_then(|i| self.neighbors[i])
    }

    #[inline]
    pub fn constrained_cw(&self, p: PointId) -> bool {
        self.index(p).map_or(false, |i| self.constrained[(i + 1) % 3])
    }

    #[inline]
    pub fn constrained_ccw(&self, p: PointId) -> bool {
        self.index(p).map_or(false, |i| self.constrained[(i + 2) % 3])
    }

    #[inline]
    pub fn set_constrained_cw(&mut self, p: PointId, value: bool) {
        if let Some(i) = self.index(p) {
            self.constrained[(i + 1) % 3] = value;
        }
    }

    #[inline]
    pub fn set_constrained_ccw(&mut self, p: PointId, value: bool) {
        if let Some(i) = self.index(p) {
            self.constrained[(i + 2) % 3] = value;
        }
    }

    #[inline]
    pub fn delaunay_cw(&self, p: PointId) -> bool {
        self.index(p).map_or(false, |i| self.delaunay[(i + 1) % 3])
    }

    #[inline]
    pub fn delaunay_ccw(&self, p: PointId) -> bool {
        self.index(p).map_or(false, |i| self.delaunay[(i + 2) % 3])
    }

    #[inline]
    pub fn set_delaunay_cw(&mut self, p: PointId, value: bool) {
        if let Some(i) = self.index(p) {
            self.delaunay[(i + 1) % 3] = value;
        }
    }

    #[inline]
    pub fn set_delaunay_ccw(&mut self, p: PointId, value: bool) {
        if let Some(i) = self.index(p) {
            self.delaunay[(i + 2) % 3] = value;
        }
    }

    pub fn mark_constrained_edge(&mut self, p: PointId, q: PointId) {
        if let Some(i) = self.edge_index(p, q) {
            self.constrained[i] = true;
        }
    }

    /// Rotate the points so that `opoint` is replaced by `npoint` while the
    /// triangle stays counter-clockwise
    pub fn rotate(&mut self, opoint: PointId, npoint: PointId) {
        let [a, b, c] = self.points;
        if opoint == a {
            self.points = [c, a, npoint];
        } else if opoint == b {
            self.points = [npoint, a, b];
        } else if opoint == c {
            self.points = [c, npoint, b];
        }
    }

    pub fn clear_neighbors(&mut self) {
        self.neighbors = [None; 3];
    }

    pub fn clear_delaunay(&mut self) {
        self.delaunay = [false; 3];
    }
}
