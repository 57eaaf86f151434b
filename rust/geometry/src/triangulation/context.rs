// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sweep state shared by every triangulation input kind

use super::front::{AdvancingFront, NodeId};
use super::point::{ConstraintEdge, PointId, TriangulationPoint};
use super::triangle::{DelaunayTriangle, TriangleId};
use super::Triangulation;
use crate::error::{Error, Result};
use nalgebra::Point2;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Basin {
    pub left: NodeId,
    pub bottom: NodeId,
    pub right: NodeId,
    pub width: f64,
    pub left_highest: bool,
}

/// Constraint currently being inserted. `q` moves when the edge is split at a
/// collinear point.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct EdgeEvent {
    pub p: PointId,
    pub q: PointId,
    pub right: bool,
}

/// Points, constraints and the triangle arena for one triangulation run
#[derive(Debug, Default)]
pub struct SweepContext {
    pub(super) points: Vec<TriangulationPoint>,
    pub(super) edges: Vec<ConstraintEdge>,
    lookup: FxHashMap<(i64, i64), PointId>,
    edge_codes: FxHashSet<(PointId, PointId)>,
    pub(super) triangles: Vec<DelaunayTriangle>,
    pub(super) front: AdvancingFront,
    pub(super) basin: Basin,
    pub(super) edge_event: EdgeEvent,
    /// Points added by callers; the two bounding points follow them
    pub(super) real_points: usize,
    pub(super) head_point: PointId,
    pub(super) tail_point: PointId,
}

impl SweepContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point, returning the id of an existing point with the same
    /// vertex code if there is one
    pub fn add_point(&mut self, p: &Point2<f64>) -> PointId {
        let point = TriangulationPoint::new(p.x, p.y);
        if let Some(&id) = self.lookup.get(&point.key()) {
            return id;
        }
        let id = self.points.len();
        self.lookup.insert(point.key(), id);
        self.points.push(point);
        id
    }

    /// Add a constraint between two points. Degenerate and repeated edges
    /// are ignored; returns whether the edge was added.
    pub fn add_edge(&mut self, a: PointId, b: PointId) -> bool {
        if a == b || a >= self.points.len() || b >= self.points.len() {
            return false;
        }
        let edge = ConstraintEdge::ordered(&self.points, a, b);
        if !self.edge_codes.insert((edge.p, edge.q)) {
            return false;
        }
        let id = self.edges.len();
        self.edges.push(edge);
        self.points[edge.q].edges.push(id);
        true
    }

    /// Add a closed ring of points with a constraint along every side
    pub fn add_ring(&mut self, ring: &[Point2<f64>]) -> Result<()> {
        let ids: Vec<PointId> = ring.iter().map(|p| self.add_point(p)).collect();
        let mut distinct = ids.clone();
        distinct.dedup();
        if distinct.len() > 1 && distinct.first() == distinct.last() {
            distinct.pop();
        }
        if distinct.len() < 3 {
            return Err(Error::NotEnoughVertices(distinct.len()));
        }
        for i in 0..distinct.len() {
            self.add_edge(distinct[i], distinct[(i + 1) % distinct.len()]);
        }
        Ok(())
    }

    #[inline]
    pub fn points(&self) -> &[TriangulationPoint] {
        &self.points
    }

    #[inline]
    pub fn edges(&self) -> &[ConstraintEdge] {
        &self.edges
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub(super) fn pt(&self, id: PointId) -> Point2<f64> {
        let p = &self.points[id];
        Point2::new(p.x, p.y)
    }

    #[inline]
    fn is_bounding(&self, id: PointId) -> bool {
        id >= self.real_points
    }

    fn touches_bounding(&self, t: TriangleId) -> bool {
        self.triangles[t].points.iter().any(|&p| self.is_bounding(p))
    }

    /// Mark the triangles enclosed by the constraint boundary, flooding from
    /// a triangle known to be inside it.
    ///
    /// The seed is found next to the leftmost node of the final front. If
    /// that walk fails, or the flood leaks out of the boundary, the region is
    /// instead classified by counting constraint crossings from the outside.
    pub(crate) fn mark_polygon_interior(&mut self) {
        if let Some(seed) = self.find_interior_seed() {
            self.flood_interior(seed);
            let leaked = (0..self.triangles.len())
                .any(|t| self.triangles[t].interior && self.touches_bounding(t));
            if !leaked {
                return;
            }
            for t in &mut self.triangles {
                t.interior = false;
            }
        }
        self.mark_by_crossing_parity();
    }

    /// Mark every triangle that cannot reach the bounding points without
    /// crossing a constraint
    pub(crate) fn mark_hull_interior(&mut self) {
        let mut exterior = vec![false; self.triangles.len()];
        let mut stack: Vec<TriangleId> = (0..self.triangles.len())
            .filter(|&t| self.touches_bounding(t))
            .collect();
        while let Some(t) = stack.pop() {
            if exterior[t] {
                continue;
            }
            exterior[t] = true;
            let tri = &self.triangles[t];
            for i in 0..3 {
                if let (false, Some(n)) = (tri.constrained[i], tri.neighbors[i]) {
                    if !exterior[n] {
                        stack.push(n);
                    }
                }
            }
        }
        for (t, tri) in self.triangles.iter_mut().enumerate() {
            tri.interior = !exterior[t];
        }
    }

    fn find_interior_seed(&self) -> Option<TriangleId> {
        if self.front.is_empty() {
            return None;
        }
        let node = self.front.node(self.front.head()).next?;
        let p = self.front.node(node).point;
        let mut t = self.front.node(node).triangle?;
        for _ in 0..self.triangles.len() {
            if self.triangles[t].constrained_cw(p) {
                return Some(t);
            }
            t = self.triangles[t].neighbor_ccw(p)?;
        }
        None
    }

    fn flood_interior(&mut self, seed: TriangleId) {
        let mut stack = vec![seed];
        while let Some(t) = stack.pop() {
            if self.triangles[t].interior {
                continue;
            }
            self.triangles[t].interior = true;
            for i in 0..3 {
                if !self.triangles[t].constrained[i] {
                    if let Some(n) = self.triangles[t].neighbors[i] {
                        stack.push(n);
                    }
                }
            }
        }
    }

    /// Interior means an odd number of constraints crossed from the outside
    fn mark_by_crossing_parity(&mut self) {
        let mut depth = vec![usize::MAX; self.triangles.len()];
        let mut queue: VecDeque<(TriangleId, usize)> = (0..self.triangles.len())
            .filter(|&t| self.touches_bounding(t))
            .map(|t| (t, 0))
            .collect();
        while let Some((t, d)) = queue.pop_front() {
            if depth[t] <= d {
                continue;
            }
            depth[t] = d;
            let tri = &self.triangles[t];
            for i in 0..3 {
                if let Some(n) = tri.neighbors[i] {
                    if tri.constrained[i] {
                        queue.push_back((n, d + 1));
                    } else {
                        queue.push_front((n, d));
                    }
                }
            }
        }
        for (t, tri) in self.triangles.iter_mut().enumerate() {
            tri.interior = depth[t] != usize::MAX && depth[t] % 2 == 1;
        }
    }

    /// Gather the marked triangles
    pub(crate) fn collect_interior(&self) -> Result<Triangulation> {
        let mut triangles = Vec::new();
        let mut constrained = Vec::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            if !tri.interior {
                continue;
            }
            if self.touches_bounding(t) {
                return Err(Error::Internal(
                    "interior triangle references a bounding point".to_string(),
                ));
            }
            triangles.push(tri.points);
            constrained.push(tri.constrained);
        }
        Ok(Triangulation {
            points: (0..self.real_points).map(|p| self.pt(p)).collect(),
            triangles,
            constrained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_point_dedupes_by_code() {
        let mut ctx = SweepContext::new();
        let a = ctx.add_point(&Point2::new(1.0, 1.0));
        let b = ctx.add_point(&Point2::new(1.0002, 0.9999));
        let c = ctx.add_point(&Point2::new(2.0, 1.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ctx.point_count(), 2);
    }

    #[test]
    fn test_add_edge_rejects_duplicates() {
        let mut ctx = SweepContext::new();
        let a = ctx.add_point(&Point2::new(0.0, 0.0));
        let b = ctx.add_point(&Point2::new(1.0, 1.0));
        assert!(ctx.add_edge(a, b));
        assert!(!ctx.add_edge(b, a));
        assert!(!ctx.add_edge(a, a));
        assert_eq!(ctx.edges().len(), 1);
        assert_eq!(ctx.points()[b].edges.as_slice(), &[0]);
    }

    #[test]
    fn test_add_ring_closes() {
        let mut ctx = SweepContext::new();
        ctx.add_ring(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(ctx.point_count(), 3);
        assert_eq!(ctx.edges().len(), 3);

        let mut bad = SweepContext::new();
        assert_eq!(
            bad.add_ring(&[Point2::new(0.0, 0.0), Point2::new(0.0, 0.0)]),
            Err(Error::NotEnoughVertices(1))
        );
    }
}
