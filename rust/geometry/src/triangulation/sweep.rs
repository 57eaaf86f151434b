// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sweep-line constrained Delaunay triangulation
//!
//! Points are swept bottom to top. Each point is attached to the advancing
//! front, after which the front is filled so it stays roughly monotone and
//! every new triangle is legalized by edge flips. Constraint edges are
//! inserted when their upper endpoint is reached, by filling the front under
//! the edge and flipping the triangles it crosses.

use super::context::{Basin, EdgeEvent, SweepContext};
use super::front::{AdvancingFront, NodeId};
use super::point::{PointId, TriangulationPoint};
use super::triangle::{DelaunayTriangle, TriangleId};
use crate::error::{Error, Result};
use crate::primitives::{in_scan_area, orient2d, smart_incircle, Orientation, EPSILON};
use nalgebra::Point2;
use std::f64::consts::{FRAC_PI_2, PI};

/// Margin of the two bounding points, as a fraction of the input extent
const ALPHA: f64 = 0.3;

fn not_in_triangle(during: &str) -> Error {
    Error::Internal(format!("point not in triangle during {during}"))
}

fn front_end(during: &str) -> Error {
    Error::Internal(format!("walked off the advancing front during {during}"))
}

impl SweepContext {
    /// Triangulate all points and constraints added so far
    pub(crate) fn sweep(&mut self) -> Result<()> {
        if self.points.len() < 3 {
            return Err(Error::NotEnoughVertices(self.points.len()));
        }
        self.init_bounds()?;

        let mut order: Vec<PointId> = (0..self.real_points).collect();
        order.sort_by(|&a, &b| self.points[a].sweep_cmp(&self.points[b]));

        self.create_front(order[0]);
        for &point in &order[1..] {
            let node = self.point_event(point)?;
            let edges = self.points[point].edges.clone();
            for edge in edges {
                self.edge_event(edge, node)?;
            }
        }
        tracing::trace!(
            points = self.real_points,
            edges = self.edges.len(),
            triangles = self.triangles.len(),
            "sweep finished"
        );
        Ok(())
    }

    fn init_bounds(&mut self) -> Result<()> {
        self.real_points = self.points.len();
        let (mut xmin, mut xmax) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut ymin, mut ymax) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            xmin = xmin.min(p.x);
            xmax = xmax.max(p.x);
            ymin = ymin.min(p.y);
            ymax = ymax.max(p.y);
        }
        let (width, height) = (xmax - xmin, ymax - ymin);
        if width <= EPSILON || height <= EPSILON {
            return Err(Error::AreaTooSmall(width * height));
        }

        let dx = ALPHA * width;
        let dy = ALPHA * height;
        self.head_point = self.push_bounding_point(xmax + dx, ymin - dy);
        self.tail_point = self.push_bounding_point(xmin - dx, ymin - dy);
        Ok(())
    }

    fn push_bounding_point(&mut self, x: f64, y: f64) -> PointId {
        let id = self.points.len();
        self.points.push(TriangulationPoint::new(x, y));
        id
    }

    fn create_front(&mut self, first: PointId) {
        let t = self.push_triangle(first, self.tail_point, self.head_point);
        self.front = AdvancingFront::new(
            (self.tail_point, self.points[self.tail_point].x),
            (first, self.points[first].x),
            (self.head_point, self.points[self.head_point].x),
            t,
        );
    }

    #[inline]
    fn push_triangle(&mut self, a: PointId, b: PointId, c: PointId) -> TriangleId {
        self.triangles.push(DelaunayTriangle::new(a, b, c));
        self.triangles.len() - 1
    }

    #[inline]
    fn np(&self, node: NodeId) -> Point2<f64> {
        self.pt(self.front.node(node).point)
    }

    #[inline]
    fn next_node(&self, node: NodeId, during: &str) -> Result<NodeId> {
        self.front.node(node).next.ok_or_else(|| front_end(during))
    }

    #[inline]
    fn prev_node(&self, node: NodeId, during: &str) -> Result<NodeId> {
        self.front.node(node).prev.ok_or_else(|| front_end(during))
    }

    #[inline]
    fn cw(&self, t: TriangleId, p: PointId, during: &str) -> Result<PointId> {
        self.triangles[t].point_cw(p).ok_or_else(|| not_in_triangle(during))
    }

    #[inline]
    fn ccw(&self, t: TriangleId, p: PointId, during: &str) -> Result<PointId> {
        self.triangles[t].point_ccw(p).ok_or_else(|| not_in_triangle(during))
    }

    #[inline]
    fn orient(&self, a: PointId, b: PointId, c: PointId) -> Orientation {
        orient2d(&self.pt(a), &self.pt(b), &self.pt(c))
    }

    /// Upper bound on walk iterations before the topology is declared corrupt
    #[inline]
    fn step_limit(&self) -> usize {
        4 * (self.triangles.len() + self.points.len()) + 64
    }

    fn point_event(&mut self, point: PointId) -> Result<NodeId> {
        let x = self.points[point].x;
        let node = self
            .front
            .locate_node(x)
            .ok_or_else(|| Error::Internal("no front node below point".to_string()))?;
        let new_node = self.new_front_triangle(point, node)?;

        // Point landed on the node's x; the front would get a zero-width gap
        if x <= self.front.node(node).value + EPSILON {
            self.fill(node)?;
        }
        self.fill_advancing_front(new_node)?;
        Ok(new_node)
    }

    fn new_front_triangle(&mut self, point: PointId, node: NodeId) -> Result<NodeId> {
        let next = self.next_node(node, "point event")?;
        let t = self.push_triangle(
            point,
            self.front.node(node).point,
            self.front.node(next).point,
        );
        let below = self
            .front
            .node(node)
            .triangle
            .ok_or(Error::MissingNeighbor("point event"))?;
        self.mark_neighbor(t, below);

        let new_node = self.front.insert_after(node, point, self.points[point].x);
        if !self.legalize(t)? {
            self.map_triangle_to_nodes(t);
        }
        Ok(new_node)
    }

    /// Close the gap at `node` with a triangle over its two neighbours
    fn fill(&mut self, node: NodeId) -> Result<()> {
        let prev = self.prev_node(node, "fill")?;
        let next = self.next_node(node, "fill")?;
        let t = self.push_triangle(
            self.front.node(prev).point,
            self.front.node(node).point,
            self.front.node(next).point,
        );

        let prev_tri = self
            .front
            .node(prev)
            .triangle
            .ok_or(Error::MissingNeighbor("fill"))?;
        self.mark_neighbor(t, prev_tri);
        let node_tri = self
            .front
            .node(node)
            .triangle
            .ok_or(Error::MissingNeighbor("fill"))?;
        self.mark_neighbor(t, node_tri);

        self.front.remove(node);
        if !self.legalize(t)? {
            self.map_triangle_to_nodes(t);
        }
        Ok(())
    }

    fn fill_advancing_front(&mut self, n: NodeId) -> Result<()> {
        let mut node = self.front.node(n).next;
        while let Some(id) = node {
            if self.front.node(id).next.is_none() || self.large_hole_dont_fill(id) {
                break;
            }
            self.fill(id)?;
            node = self.front.node(id).next;
        }

        let mut node = self.front.node(n).prev;
        while let Some(id) = node {
            if self.front.node(id).prev.is_none() || self.large_hole_dont_fill(id) {
                break;
            }
            self.fill(id)?;
            node = self.front.node(id).prev;
        }

        if let Some(next) = self.front.node(n).next {
            if self.front.node(next).next.is_some() && self.basin_angle(n) < 3.0 * PI / 4.0 {
                self.fill_basin(n)?;
            }
        }
        Ok(())
    }

    fn large_hole_dont_fill(&self, node: NodeId) -> bool {
        let n = self.front.node(node);
        let (Some(next), Some(prev)) = (n.next, n.prev) else {
            return false;
        };
        let origin = self.np(node);
        if !angle_exceeds_90(&origin, &self.np(next), &self.np(prev)) {
            return false;
        }

        if let Some(next2) = self.front.node(next).next {
            if !angle_exceeds_plus_90_or_negative(&origin, &self.np(next2), &self.np(prev)) {
                return false;
            }
        }
        if let Some(prev2) = self.front.node(prev).prev {
            if !angle_exceeds_plus_90_or_negative(&origin, &self.np(next), &self.np(prev2)) {
                return false;
            }
        }
        true
    }

    fn basin_angle(&self, node: NodeId) -> f64 {
        let Some(next2) = self
            .front
            .node(node)
            .next
            .and_then(|next| self.front.node(next).next)
        else {
            return PI;
        };
        let (a, b) = (self.np(node), self.np(next2));
        (a.y - b.y).atan2(a.x - b.x)
    }

    fn fill_basin(&mut self, node: NodeId) -> Result<()> {
        let next = self.next_node(node, "fill basin")?;
        let next2 = self.next_node(next, "fill basin")?;
        let left = if orient2d(&self.np(node), &self.np(next), &self.np(next2))
            == Orientation::CounterClockwise
        {
            next2
        } else {
            next
        };

        let mut bottom = left;
        while let Some(n) = self.front.node(bottom).next {
            if self.np(bottom).y >= self.np(n).y {
                bottom = n;
            } else {
                break;
            }
        }
        if bottom == left {
            return Ok(());
        }

        let mut right = bottom;
        while let Some(n) = self.front.node(right).next {
            if self.np(right).y < self.np(n).y {
                right = n;
            } else {
                break;
            }
        }
        if right == bottom {
            return Ok(());
        }

        self.basin = Basin {
            left,
            bottom,
            right,
            width: self.np(right).x - self.np(left).x,
            left_highest: self.np(left).y > self.np(right).y,
        };
        self.fill_basin_from(bottom)
    }

    fn fill_basin_from(&mut self, node: NodeId) -> Result<()> {
        let mut node = node;
        let limit = self.step_limit();
        for _ in 0..limit {
            if self.is_shallow(node) {
                return Ok(());
            }
            self.fill(node)?;

            let prev = self.prev_node(node, "fill basin")?;
            let next = self.next_node(node, "fill basin")?;
            let Basin { left, right, .. } = self.basin;
            if prev == left && next == right {
                return Ok(());
            } else if prev == left {
                let next2 = self.next_node(next, "fill basin")?;
                if orient2d(&self.np(node), &self.np(next), &self.np(next2))
                    == Orientation::Clockwise
                {
                    return Ok(());
                }
                node = next;
            } else if next == right {
                let prev2 = self.prev_node(prev, "fill basin")?;
                if orient2d(&self.np(node), &self.np(prev), &self.np(prev2))
                    == Orientation::CounterClockwise
                {
                    return Ok(());
                }
                node = prev;
            } else if self.np(prev).y < self.np(next).y {
                node = prev;
            } else {
                node = next;
            }
        }
        Err(Error::Internal("basin fill did not terminate".to_string()))
    }

    fn is_shallow(&self, node: NodeId) -> bool {
        let basin = self.basin;
        let height = if basin.left_highest {
            self.np(basin.left).y - self.np(node).y
        } else {
            self.np(basin.right).y - self.np(node).y
        };
        basin.width > height
    }

    /// Flip edges of `t` that fail the in-circle test. Returns whether a
    /// flip happened, in which case the front mapping is already updated.
    fn legalize(&mut self, t: TriangleId) -> Result<bool> {
        for i in 0..3 {
            if self.triangles[t].delaunay[i] {
                continue;
            }
            let Some(ot) = self.triangles[t].neighbors[i] else {
                continue;
            };
            let p = self.triangles[t].points[i];
            let op = self.opposite_point(ot, t, p)?;
            let oi = self.triangles[ot]
                .index(op)
                .ok_or_else(|| not_in_triangle("legalize"))?;

            // Constrained and settled edges are not flipped
            if self.triangles[ot].constrained[oi] || self.triangles[ot].delaunay[oi] {
                self.triangles[t].constrained[i] = self.triangles[ot].constrained[oi];
                continue;
            }

            let inside = smart_incircle(
                &self.pt(p),
                &self.pt(self.ccw(t, p, "legalize")?),
                &self.pt(self.cw(t, p, "legalize")?),
                &self.pt(op),
            );
            if inside {
                self.triangles[t].delaunay[i] = true;
                self.triangles[ot].delaunay[oi] = true;

                self.rotate_triangle_pair(t, p, ot, op)?;

                if !self.legalize(t)? {
                    self.map_triangle_to_nodes(t);
                }
                if !self.legalize(ot)? {
                    self.map_triangle_to_nodes(ot);
                }

                self.triangles[t].delaunay[i] = false;
                self.triangles[ot].delaunay[oi] = false;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Point of `ot` across the edge of `t` opposite `p`
    fn opposite_point(&self, ot: TriangleId, t: TriangleId, p: PointId) -> Result<PointId> {
        let cw = self.cw(t, p, "opposite point")?;
        self.cw(ot, cw, "opposite point")
    }

    /// Flip the edge shared by `t` and `ot`
    fn rotate_triangle_pair(
        &mut self,
        t: TriangleId,
        p: PointId,
        ot: TriangleId,
        op: PointId,
    ) -> Result<()> {
        let (tri, otri) = (&self.triangles[t], &self.triangles[ot]);
        if !tri.contains(p) || !otri.contains(op) {
            return Err(not_in_triangle("rotate"));
        }
        let n1 = tri.neighbor_ccw(p);
        let n2 = tri.neighbor_cw(p);
        let n3 = otri.neighbor_ccw(op);
        let n4 = otri.neighbor_cw(op);

        let ce1 = tri.constrained_ccw(p);
        let ce2 = tri.constrained_cw(p);
        let ce3 = otri.constrained_ccw(op);
        let ce4 = otri.constrained_cw(op);

        let de1 = tri.delaunay_ccw(p);
        let de2 = tri.delaunay_cw(p);
        let de3 = otri.delaunay_ccw(op);
        let de4 = otri.delaunay_cw(op);

        self.triangles[t].rotate(p, op);
        self.triangles[ot].rotate(op, p);

        self.triangles[ot].set_delaunay_ccw(p, de1);
        self.triangles[t].set_delaunay_cw(p, de2);
        self.triangles[t].set_delaunay_ccw(op, de3);
        self.triangles[ot].set_delaunay_cw(op, de4);

        self.triangles[ot].set_constrained_ccw(p, ce1);
        self.triangles[t].set_constrained_cw(p, ce2);
        self.triangles[t].set_constrained_ccw(op, ce3);
        self.triangles[ot].set_constrained_cw(op, ce4);

        self.triangles[t].clear_neighbors();
        self.triangles[ot].clear_neighbors();
        if let Some(n1) = n1 {
            self.mark_neighbor(ot, n1);
        }
        if let Some(n2) = n2 {
            self.mark_neighbor(t, n2);
        }
        if let Some(n3) = n3 {
            self.mark_neighbor(t, n3);
        }
        if let Some(n4) = n4 {
            self.mark_neighbor(ot, n4);
        }
        self.mark_neighbor(t, ot);
        Ok(())
    }

    /// Link two triangles sharing an edge
    fn mark_neighbor(&mut self, t1: TriangleId, t2: TriangleId) {
        let points = self.triangles[t1].points;
        for i in 0..3 {
            let (p, q) = (points[(i + 1) % 3], points[(i + 2) % 3]);
            if let Some(j) = self.triangles[t2].edge_index(p, q) {
                self.triangles[t1].neighbors[i] = Some(t2);
                self.triangles[t2].neighbors[j] = Some(t1);
                return;
            }
        }
    }

    /// Point front nodes at `t` for each of its edges without a neighbour
    fn map_triangle_to_nodes(&mut self, t: TriangleId) {
        for i in 0..3 {
            if self.triangles[t].neighbors[i].is_some() {
                continue;
            }
            let cw = self.triangles[t].points[(i + 2) % 3];
            if let Some(node) = self.front.locate_point(cw, self.points[cw].x) {
                self.front.node_mut(node).triangle = Some(t);
            }
        }
    }

    fn edge_event(&mut self, edge: usize, node: NodeId) -> Result<()> {
        let edge = self.edges[edge];
        self.edge_event = EdgeEvent {
            p: edge.p,
            q: edge.q,
            right: self.points[edge.p].x > self.points[edge.q].x,
        };

        let t = self
            .front
            .node(node)
            .triangle
            .ok_or(Error::MissingNeighbor("edge event"))?;
        if self.is_edge_side_of_triangle(t, edge.p, edge.q) {
            return Ok(());
        }

        self.fill_edge_event(edge.p, edge.q, node)?;

        let t = self
            .front
            .node(node)
            .triangle
            .ok_or(Error::MissingNeighbor("edge event"))?;
        self.walk_edge_event(edge.p, edge.q, Some(t), edge.q)
    }

    fn walk_edge_event(
        &mut self,
        ep: PointId,
        eq: PointId,
        triangle: Option<TriangleId>,
        point: PointId,
    ) -> Result<()> {
        let (mut eq, mut triangle, mut point) = (eq, triangle, point);
        let limit = self.step_limit();
        for _ in 0..limit {
            let t = triangle.ok_or(Error::MissingNeighbor("edge event"))?;
            if self.is_edge_side_of_triangle(t, ep, eq) {
                return Ok(());
            }

            let p1 = self.ccw(t, point, "edge event")?;
            let o1 = self.orient(eq, p1, ep);
            if o1 == Orientation::Collinear {
                // Constraint passes through p1; split it there
                if !self.triangles[t].contains_edge(eq, p1) {
                    return Err(self.on_constrained_edge(p1));
                }
                self.triangles[t].mark_constrained_edge(eq, p1);
                self.edge_event.q = p1;
                triangle = self.triangles[t].neighbor_across(point);
                eq = p1;
                point = p1;
                continue;
            }

            let p2 = self.cw(t, point, "edge event")?;
            let o2 = self.orient(eq, p2, ep);
            if o2 == Orientation::Collinear {
                if !self.triangles[t].contains_edge(eq, p2) {
                    return Err(self.on_constrained_edge(p2));
                }
                self.triangles[t].mark_constrained_edge(eq, p2);
                self.edge_event.q = p2;
                triangle = self.triangles[t].neighbor_across(point);
                eq = p2;
                point = p2;
                continue;
            }

            if o1 == o2 {
                // Both on the same side: rotate around `point`
                triangle = if o1 == Orientation::Clockwise {
                    self.triangles[t].neighbor_ccw(point)
                } else {
                    self.triangles[t].neighbor_cw(point)
                };
                continue;
            }

            return self.flip_edge_event(ep, eq, t, point);
        }
        Err(Error::Internal("edge event did not terminate".to_string()))
    }

    fn on_constrained_edge(&self, p: PointId) -> Error {
        Error::PointOnConstrainedEdge {
            x: self.points[p].x,
            y: self.points[p].y,
        }
    }

    fn is_edge_side_of_triangle(&mut self, t: TriangleId, ep: PointId, eq: PointId) -> bool {
        let Some(i) = self.triangles[t].edge_index(ep, eq) else {
            return false;
        };
        self.triangles[t].constrained[i] = true;
        if let Some(n) = self.triangles[t].neighbors[i] {
            self.triangles[n].mark_constrained_edge(ep, eq);
        }
        true
    }

    fn fill_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        if self.edge_event.right {
            self.fill_right_above_edge_event(ep, eq, node)
        } else {
            self.fill_left_above_edge_event(ep, eq, node)
        }
    }

    fn fill_right_above_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let mut node = node;
        let limit = self.step_limit();
        for _ in 0..limit {
            let next = self.next_node(node, "edge fill")?;
            if self.np(next).x >= self.points[ep].x {
                return Ok(());
            }
            if orient2d(&self.pt(eq), &self.np(next), &self.pt(ep)) == Orientation::CounterClockwise {
                self.fill_right_below_edge_event(ep, eq, node)?;
            } else {
                node = next;
            }
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn fill_right_below_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let limit = self.step_limit();
        for _ in 0..limit {
            if self.np(node).x >= self.points[ep].x {
                return Ok(());
            }
            let next = self.next_node(node, "edge fill")?;
            let next2 = self.next_node(next, "edge fill")?;
            if orient2d(&self.np(node), &self.np(next), &self.np(next2))
                == Orientation::CounterClockwise
            {
                return self.fill_right_concave_edge_event(ep, eq, node);
            }
            self.fill_right_convex_edge_event(ep, eq, node)?;
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn fill_right_concave_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let limit = self.step_limit();
        for _ in 0..limit {
            let next = self.next_node(node, "edge fill")?;
            self.fill(next)?;
            let next = self.next_node(node, "edge fill")?;
            if self.front.node(next).point == ep {
                return Ok(());
            }
            if orient2d(&self.pt(eq), &self.np(next), &self.pt(ep)) != Orientation::CounterClockwise {
                return Ok(());
            }
            let next2 = self.next_node(next, "edge fill")?;
            if orient2d(&self.np(node), &self.np(next), &self.np(next2))
                != Orientation::CounterClockwise
            {
                return Ok(());
            }
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn fill_right_convex_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let mut node = node;
        let limit = self.step_limit();
        for _ in 0..limit {
            let n1 = self.next_node(node, "edge fill")?;
            let n2 = self.next_node(n1, "edge fill")?;
            let n3 = self.next_node(n2, "edge fill")?;
            if orient2d(&self.np(n1), &self.np(n2), &self.np(n3)) == Orientation::CounterClockwise {
                return self.fill_right_concave_edge_event(ep, eq, n1);
            }
            if orient2d(&self.pt(eq), &self.np(n2), &self.pt(ep)) != Orientation::CounterClockwise {
                return Ok(());
            }
            node = n1;
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn fill_left_above_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let mut node = node;
        let limit = self.step_limit();
        for _ in 0..limit {
            let prev = self.prev_node(node, "edge fill")?;
            if self.np(prev).x <= self.points[ep].x {
                return Ok(());
            }
            if orient2d(&self.pt(eq), &self.np(prev), &self.pt(ep)) == Orientation::Clockwise {
                self.fill_left_below_edge_event(ep, eq, node)?;
            } else {
                node = prev;
            }
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn fill_left_below_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let limit = self.step_limit();
        for _ in 0..limit {
            if self.np(node).x <= self.points[ep].x {
                return Ok(());
            }
            let prev = self.prev_node(node, "edge fill")?;
            let prev2 = self.prev_node(prev, "edge fill")?;
            if orient2d(&self.np(node), &self.np(prev), &self.np(prev2)) == Orientation::Clockwise {
                return self.fill_left_concave_edge_event(ep, eq, node);
            }
            self.fill_left_convex_edge_event(ep, eq, node)?;
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn fill_left_concave_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let limit = self.step_limit();
        for _ in 0..limit {
            let prev = self.prev_node(node, "edge fill")?;
            self.fill(prev)?;
            let prev = self.prev_node(node, "edge fill")?;
            if self.front.node(prev).point == ep {
                return Ok(());
            }
            if orient2d(&self.pt(eq), &self.np(prev), &self.pt(ep)) != Orientation::Clockwise {
                return Ok(());
            }
            let prev2 = self.prev_node(prev, "edge fill")?;
            if orient2d(&self.np(node), &self.np(prev), &self.np(prev2)) != Orientation::Clockwise {
                return Ok(());
            }
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn fill_left_convex_edge_event(&mut self, ep: PointId, eq: PointId, node: NodeId) -> Result<()> {
        let mut node = node;
        let limit = self.step_limit();
        for _ in 0..limit {
            let p1 = self.prev_node(node, "edge fill")?;
            let p2 = self.prev_node(p1, "edge fill")?;
            let p3 = self.prev_node(p2, "edge fill")?;
            if orient2d(&self.np(p1), &self.np(p2), &self.np(p3)) == Orientation::Clockwise {
                return self.fill_left_concave_edge_event(ep, eq, p1);
            }
            if orient2d(&self.pt(eq), &self.np(p2), &self.pt(ep)) != Orientation::Clockwise {
                return Ok(());
            }
            node = p1;
        }
        Err(Error::Internal("edge fill did not terminate".to_string()))
    }

    fn flip_edge_event(&mut self, ep: PointId, eq: PointId, t: TriangleId, p: PointId) -> Result<()> {
        let mut t = t;
        let limit = self.step_limit();
        for _ in 0..limit {
            let ot = self.triangles[t]
                .neighbor_across(p)
                .ok_or(Error::MissingNeighbor("flip edge event"))?;
            // The edge being flipped away is itself a constraint
            if self.triangles[t].index(p).map_or(false, |i| self.triangles[t].constrained[i]) {
                return Err(Error::IntersectingConstraints {
                    x: self.points[p].x,
                    y: self.points[p].y,
                });
            }
            let op = self.opposite_point(ot, t, p)?;

            let in_scan = in_scan_area(
                &self.pt(p),
                &self.pt(self.ccw(t, p, "flip edge event")?),
                &self.pt(self.cw(t, p, "flip edge event")?),
                &self.pt(op),
            );
            if !in_scan {
                let new_p = self.next_flip_point(ep, eq, ot, op)?;
                self.flip_scan_edge_event(ep, eq, t, ot, new_p)?;
                return self.walk_edge_event(ep, eq, Some(t), p);
            }

            self.rotate_triangle_pair(t, p, ot, op)?;
            self.map_triangle_to_nodes(t);
            self.map_triangle_to_nodes(ot);

            if p == eq && op == ep {
                if eq == self.edge_event.q && ep == self.edge_event.p {
                    self.triangles[t].mark_constrained_edge(ep, eq);
                    self.triangles[ot].mark_constrained_edge(ep, eq);
                    self.legalize(t)?;
                    self.legalize(ot)?;
                }
                return Ok(());
            }

            let o = self.orient(eq, op, ep);
            t = self.next_flip_triangle(o, t, ot, p, op)?;
        }
        Err(Error::Internal("edge flip did not terminate".to_string()))
    }

    /// After a flip, legalize the triangle no longer crossed by the
    /// constraint and return the one that still is
    fn next_flip_triangle(
        &mut self,
        o: Orientation,
        t: TriangleId,
        ot: TriangleId,
        p: PointId,
        op: PointId,
    ) -> Result<TriangleId> {
        let (done, keep) = if o == Orientation::CounterClockwise {
            (ot, t)
        } else {
            (t, ot)
        };
        let i = self.triangles[done]
            .edge_index(p, op)
            .ok_or_else(|| not_in_triangle("next flip triangle"))?;
        self.triangles[done].delaunay[i] = true;
        self.legalize(done)?;
        self.triangles[done].clear_delaunay();
        Ok(keep)
    }

    fn next_flip_point(&self, ep: PointId, eq: PointId, ot: TriangleId, op: PointId) -> Result<PointId> {
        match self.orient(eq, op, ep) {
            Orientation::Clockwise => self.ccw(ot, op, "next flip point"),
            Orientation::CounterClockwise => self.cw(ot, op, "next flip point"),
            Orientation::Collinear => Err(self.on_constrained_edge(op)),
        }
    }

    /// Scan for the next point that can be flipped onto the constraint when
    /// the current pair is not convex
    fn flip_scan_edge_event(
        &mut self,
        ep: PointId,
        eq: PointId,
        flip_triangle: TriangleId,
        t: TriangleId,
        p: PointId,
    ) -> Result<()> {
        let (mut t, mut p) = (t, p);
        let limit = self.step_limit();
        for _ in 0..limit {
            let ot = self.triangles[t]
                .neighbor_across(p)
                .ok_or(Error::MissingNeighbor("flip scan edge event"))?;
            let op = self.opposite_point(ot, t, p)?;

            let p1 = self.ccw(flip_triangle, eq, "flip scan edge event")?;
            let p2 = self.cw(flip_triangle, eq, "flip scan edge event")?;
            if in_scan_area(&self.pt(eq), &self.pt(p1), &self.pt(p2), &self.pt(op)) {
                return self.flip_edge_event(eq, op, ot, op);
            }

            p = self.next_flip_point(ep, eq, ot, op)?;
            t = ot;
        }
        Err(Error::Internal("flip scan did not terminate".to_string()))
    }
}

/// Angle at `origin` between `pa` and `pb` exceeds a right angle
fn angle_exceeds_90(origin: &Point2<f64>, pa: &Point2<f64>, pb: &Point2<f64>) -> bool {
    let angle = angle(origin, pa, pb);
    angle > FRAC_PI_2 || angle < -FRAC_PI_2
}

fn angle_exceeds_plus_90_or_negative(origin: &Point2<f64>, pa: &Point2<f64>, pb: &Point2<f64>) -> bool {
    let angle = angle(origin, pa, pb);
    angle > FRAC_PI_2 || angle < 0.0
}

fn angle(origin: &Point2<f64>, pa: &Point2<f64>, pb: &Point2<f64>) -> f64 {
    let (px, py) = (origin.x, origin.y);
    let (ax, ay) = (pa.x - px, pa.y - py);
    let (bx, by) = (pb.x - px, pb.y - py);
    let x = ax * by - ay * bx;
    let y = ax * bx + ay * by;
    x.atan2(y)
}
