// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constrained Delaunay triangulation
//!
//! A sweep-line triangulator working on index arenas: points, triangles and
//! advancing-front nodes refer to each other by position, so neighbour links
//! never own anything. Three input kinds share the sweep and differ only in
//! how constraints are added and which triangles are kept.

mod context;
mod front;
mod point;
mod sets;
mod sweep;
mod triangle;

pub use context::SweepContext;
pub use point::{quantize, vertex_code, ConstraintEdge, PointId, TriangulationPoint, VERTEX_CODE_PRECISION};
pub use sets::{convex_hull, BoundaryPolygon, ConstrainedPointSet, PointCloud};
pub use triangle::{DelaunayTriangle, TriangleId};

use crate::error::Result;
use crate::polygon::Polygon;
use crate::primitives::cross;
use nalgebra::Point2;

/// A triangulation input kind
pub trait Triangulate {
    /// Register points and constraint edges with the sweep context
    fn prepare(&self, ctx: &mut SweepContext) -> Result<()>;

    /// Pick the output triangles once the sweep is done
    fn collect(&self, ctx: &mut SweepContext) -> Result<Triangulation>;

    /// Run the whole pipeline on a fresh context
    fn triangulate(&self) -> Result<Triangulation> {
        let mut ctx = SweepContext::new();
        self.prepare(&mut ctx)?;
        ctx.sweep()?;
        self.collect(&mut ctx)
    }
}

/// Closed set of triangulation inputs
#[derive(Debug, Clone)]
pub enum Triangulatable {
    Polygon(BoundaryPolygon),
    PointCloud(PointCloud),
    ConstrainedPointSet(ConstrainedPointSet),
}

impl Triangulate for Triangulatable {
    fn prepare(&self, ctx: &mut SweepContext) -> Result<()> {
        match self {
            Triangulatable::Polygon(p) => p.prepare(ctx),
            Triangulatable::PointCloud(p) => p.prepare(ctx),
            Triangulatable::ConstrainedPointSet(p) => p.prepare(ctx),
        }
    }

    fn collect(&self, ctx: &mut SweepContext) -> Result<Triangulation> {
        match self {
            Triangulatable::Polygon(p) => p.collect(ctx),
            Triangulatable::PointCloud(p) => p.collect(ctx),
            Triangulatable::ConstrainedPointSet(p) => p.collect(ctx),
        }
    }
}

/// Triangles over a deduplicated point list
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    pub points: Vec<Point2<f64>>,
    /// Counter-clockwise index triples into `points`
    pub triangles: Vec<[usize; 3]>,
    /// Per triangle, whether the edge opposite each corner is a constraint
    pub constrained: Vec<[bool; 3]>,
}

impl Triangulation {
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner positions of triangle `i`
    pub fn triangle(&self, i: usize) -> [Point2<f64>; 3] {
        let [a, b, c] = self.triangles[i];
        [self.points[a], self.points[b], self.points[c]]
    }

    /// Total area of all triangles
    pub fn area(&self) -> f64 {
        (0..self.triangles.len())
            .map(|i| {
                let [a, b, c] = self.triangle(i);
                cross(&a, &b, &c).abs() * 0.5
            })
            .sum()
    }

    /// Unique undirected edges as sorted index pairs
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .triangles
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Triangles containing edge `(a, b)`, with the edge's constrained flag in each
    pub fn edge_flags(&self, a: usize, b: usize) -> Vec<bool> {
        self.triangles
            .iter()
            .zip(&self.constrained)
            .filter_map(|(tri, flags)| {
                let ia = tri.iter().position(|&p| p == a)?;
                let ib = tri.iter().position(|&p| p == b)?;
                Some(flags[3 - ia - ib])
            })
            .collect()
    }

    /// Index of the point at `p`, matched by vertex code
    pub fn find_point(&self, p: &Point2<f64>) -> Option<usize> {
        let key = quantize(p.x, p.y);
        self.points.iter().position(|q| quantize(q.x, q.y) == key)
    }
}

/// Triangulate the region inside a polygon's outer ring and outside its holes
pub fn triangulate_polygon(polygon: &Polygon) -> Result<Triangulation> {
    BoundaryPolygon::new(polygon)?.triangulate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::TAU;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
        ]
    }

    fn star(rng: &mut ChaCha8Rng, n: usize) -> Vec<Point2<f64>> {
        (0..n)
            .map(|i| {
                let angle = TAU * i as f64 / n as f64;
                let radius = rng.gen_range(1.0..3.0);
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect()
    }

    fn assert_constraints_kept(tri: &Triangulation, ring: &[Point2<f64>]) {
        for i in 0..ring.len() {
            let a = tri.find_point(&ring[i]).unwrap();
            let b = tri.find_point(&ring[(i + 1) % ring.len()]).unwrap();
            let flags = tri.edge_flags(a, b);
            assert!(!flags.is_empty(), "edge {a}-{b} missing");
            assert!(flags.iter().all(|&c| c), "edge {a}-{b} not constrained");
        }
    }

    #[test]
    fn test_triangulate_square() {
        let tri = triangulate_polygon(&Polygon::new(square(0.0, 0.0, 4.0))).unwrap();
        assert_eq!(tri.len(), 2);
        assert_relative_eq!(tri.area(), 16.0, epsilon = 1e-9);
        assert_eq!(tri.edges().len(), 5);
    }

    #[test]
    fn test_triangulate_clockwise_input() {
        let mut ring = square(0.0, 0.0, 4.0);
        ring.reverse();
        let tri = triangulate_polygon(&Polygon::new(ring)).unwrap();
        assert_eq!(tri.len(), 2);
        assert_relative_eq!(tri.area(), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn test_triangulate_concave() {
        // L shape
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let tri = triangulate_polygon(&Polygon::new(ring.clone())).unwrap();
        assert_eq!(tri.len(), 4);
        assert_relative_eq!(tri.area(), 3.0, epsilon = 1e-9);
        assert_constraints_kept(&tri, &ring);
    }

    #[test]
    fn test_triangulate_random_stars_conserve_area() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..25 {
            let n = rng.gen_range(5..30);
            let ring = star(&mut rng, n);
            let polygon = Polygon::new(ring.clone());
            let tri = triangulate_polygon(&polygon).unwrap();
            assert_eq!(tri.len(), n - 2);
            assert_relative_eq!(tri.area(), polygon.area(), epsilon = 1e-9);
            assert_constraints_kept(&tri, &ring);
        }
    }

    #[test]
    fn test_triangulate_with_hole() {
        let mut polygon = Polygon::new(square(0.0, 0.0, 10.0));
        polygon.add_hole(Polygon::new(square(4.0, 4.0, 2.0)));
        let tri = triangulate_polygon(&polygon).unwrap();
        assert_relative_eq!(tri.area(), 96.0, epsilon = 1e-9);
        // 8 vertices, 2 boundary loops: n + 2h - 2 triangles
        assert_eq!(tri.len(), 8);
        assert_constraints_kept(&tri, &square(4.0, 4.0, 2.0));
        assert_constraints_kept(&tri, &square(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_triangulate_with_two_holes() {
        let mut polygon = Polygon::new(square(0.0, 0.0, 10.0));
        polygon.add_hole(Polygon::new(square(1.0, 1.0, 2.0)));
        polygon.add_hole(Polygon::new(square(6.0, 5.0, 3.0)));
        let tri = triangulate_polygon(&polygon).unwrap();
        assert_relative_eq!(tri.area(), 100.0 - 4.0 - 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_points_are_merged() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0002, 0.0001),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        let mut ctx = SweepContext::new();
        ctx.add_ring(&ring).unwrap();
        assert_eq!(ctx.point_count(), 4);
        assert_eq!(ctx.edges().len(), 4);
    }

    #[test]
    fn test_point_cloud_covers_hull() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut points = square(0.0, 0.0, 10.0);
        for _ in 0..40 {
            points.push(Point2::new(rng.gen_range(0.5..9.5), rng.gen_range(0.5..9.5)));
        }
        let tri = PointCloud::new(points.clone()).triangulate().unwrap();
        assert_relative_eq!(tri.area(), 100.0, epsilon = 1e-6);
        // Euler: 2n - h - 2 triangles for n points with h on the hull
        assert_eq!(tri.len(), 2 * tri.points.len() - 4 - 2);
    }

    #[test]
    fn test_constrained_point_set_keeps_edges() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 6.0),
            Point2::new(0.0, 6.0),
            Point2::new(1.0, 3.0),
            Point2::new(5.0, 3.2),
            Point2::new(3.0, 1.0),
            Point2::new(3.1, 5.0),
        ];
        let set = ConstrainedPointSet::new(points.clone(), vec![[4, 5]]);
        let tri = Triangulatable::ConstrainedPointSet(set).triangulate().unwrap();
        assert_relative_eq!(tri.area(), 36.0, epsilon = 1e-9);

        let a = tri.find_point(&points[4]).unwrap();
        let b = tri.find_point(&points[5]).unwrap();
        let flags = tri.edge_flags(a, b);
        assert_eq!(flags, vec![true, true]);
    }

    #[test]
    fn test_crossing_constraints_are_rejected() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 6.0),
            Point2::new(0.0, 6.0),
            Point2::new(1.0, 3.0),
            Point2::new(5.0, 3.2),
            Point2::new(3.0, 1.0),
            Point2::new(3.1, 5.0),
        ];
        let set = ConstrainedPointSet::new(points, vec![[4, 5], [6, 7]]);
        let err = Triangulatable::ConstrainedPointSet(set).triangulate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintConflict, "{err}");
        assert!(matches!(err, Error::IntersectingConstraints { .. }));
    }

    #[test]
    fn test_hole_sharing_outline_vertex() {
        let mut polygon = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 3.0),
            Point2::new(0.0, 3.0),
        ]);
        // Touches the outline at (2, 2)
        polygon.add_hole(Polygon::new(square(1.0, 1.0, 1.0)));
        let tri = triangulate_polygon(&polygon).unwrap();
        assert_relative_eq!(tri.area(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_input_is_degenerate() {
        let points = (0..5).map(|i| Point2::new(i as f64, 2.0 * i as f64)).collect();
        let err = PointCloud::new(points).triangulate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);

        let err = triangulate_polygon(&Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::NotEnoughVertices(_)));
    }
}
