// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sweep points and constraint edges

use nalgebra::Point2;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

/// Index into the point arena
pub type PointId = usize;

/// Decimal digits kept when computing vertex codes
pub const VERTEX_CODE_PRECISION: i32 = 3;

/// Coordinates rounded to [`VERTEX_CODE_PRECISION`] digits.
///
/// Two points with the same key are the same triangulation vertex.
#[inline]
pub fn quantize(x: f64, y: f64) -> (i64, i64) {
    let scale = 10f64.powi(VERTEX_CODE_PRECISION);
    ((x * scale).round() as i64, (y * scale).round() as i64)
}

/// 32-bit hash of the rounded coordinates
#[inline]
pub fn vertex_code(x: f64, y: f64) -> u32 {
    let mut hasher = FxHasher::default();
    quantize(x, y).hash(&mut hasher);
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}

/// Point taking part in a sweep
#[derive(Debug, Clone)]
pub struct TriangulationPoint {
    pub x: f64,
    pub y: f64,
    code: u32,
    key: (i64, i64),
    /// Constraint edges whose upper endpoint is this point
    pub(crate) edges: SmallVec<[usize; 2]>,
}

impl TriangulationPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            code: vertex_code(x, y),
            key: quantize(x, y),
            edges: SmallVec::new(),
        }
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.code
    }

    #[inline]
    pub fn key(&self) -> (i64, i64) {
        self.key
    }

    #[inline]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Sweep order: increasing y, then increasing x
    #[inline]
    pub(crate) fn sweep_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.total_cmp(&other.y).then(self.x.total_cmp(&other.x))
    }
}

impl PartialEq for TriangulationPoint {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TriangulationPoint {}

impl Hash for TriangulationPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

/// Edge that must appear in the output; `q` is the upper endpoint in sweep order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintEdge {
    pub p: PointId,
    pub q: PointId,
}

impl ConstraintEdge {
    /// Order two endpoints so that `q` comes later in the sweep
    pub(crate) fn ordered(points: &[TriangulationPoint], a: PointId, b: PointId) -> Self {
        if points[a].sweep_cmp(&points[b]).is_gt() {
            Self { p: b, q: a }
        } else {
            Self { p: a, q: b }
        }
    }

    /// Hash of both endpoint codes
    pub fn code(&self, points: &[TriangulationPoint]) -> u64 {
        let mut hasher = FxHasher::default();
        points[self.p].code().hash(&mut hasher);
        points[self.q].code().hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_code_rounding() {
        assert_eq!(vertex_code(1.0, 2.0), vertex_code(1.0004, 1.9996));
        assert_eq!(quantize(1.0004, 2.0), quantize(1.0, 2.0));
        assert_ne!(quantize(1.0, 2.0), quantize(1.002, 2.0));
        assert_eq!(TriangulationPoint::new(0.1, 0.2), TriangulationPoint::new(0.1001, 0.2));
    }

    #[test]
    fn test_edge_ordering() {
        let points = vec![
            TriangulationPoint::new(0.0, 1.0),
            TriangulationPoint::new(5.0, 0.0),
            TriangulationPoint::new(3.0, 1.0),
        ];
        let e = ConstraintEdge::ordered(&points, 0, 1);
        assert_eq!((e.p, e.q), (1, 0));
        let h = ConstraintEdge::ordered(&points, 2, 0);
        assert_eq!((h.p, h.q), (0, 2));
    }
}
