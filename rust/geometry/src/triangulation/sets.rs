// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangulation inputs

use super::context::SweepContext;
use super::point::{quantize, PointId};
use super::{Triangulate, Triangulation};
use crate::error::{Error, Result};
use crate::polygon::{ring_signed_area, Polygon};
use crate::primitives::{cross, EPSILON};
use nalgebra::Point2;
use rustc_hash::FxHashSet;

/// Closed boundary with optional holes; only the enclosed region is emitted
#[derive(Debug, Clone)]
pub struct BoundaryPolygon {
    outer: Vec<Point2<f64>>,
    holes: Vec<Vec<Point2<f64>>>,
}

impl BoundaryPolygon {
    /// Validates the polygon and its holes
    pub fn new(polygon: &Polygon) -> Result<Self> {
        polygon.validate()?;
        Ok(Self {
            outer: polygon.points().to_vec(),
            holes: polygon
                .holes()
                .iter()
                .map(|hole| hole.points().to_vec())
                .collect(),
        })
    }

    pub fn outer(&self) -> &[Point2<f64>] {
        &self.outer
    }

    pub fn holes(&self) -> &[Vec<Point2<f64>>] {
        &self.holes
    }
}

impl Triangulate for BoundaryPolygon {
    fn prepare(&self, ctx: &mut SweepContext) -> Result<()> {
        ctx.add_ring(&self.outer)?;
        for hole in &self.holes {
            ctx.add_ring(hole)?;
        }
        Ok(())
    }

    fn collect(&self, ctx: &mut SweepContext) -> Result<Triangulation> {
        ctx.mark_polygon_interior();
        ctx.collect_interior()
    }
}

/// Unconstrained points; the convex hull is triangulated
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    points: Vec<Point2<f64>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }
}

impl Triangulate for PointCloud {
    fn prepare(&self, ctx: &mut SweepContext) -> Result<()> {
        for p in &self.points {
            ctx.add_point(p);
        }
        add_hull_constraints(ctx, &self.points)
    }

    fn collect(&self, ctx: &mut SweepContext) -> Result<Triangulation> {
        ctx.mark_hull_interior();
        ctx.collect_interior()
    }
}

/// Points plus explicit constraint edges given as index pairs into `points`
#[derive(Debug, Clone, Default)]
pub struct ConstrainedPointSet {
    points: Vec<Point2<f64>>,
    edges: Vec<[usize; 2]>,
}

impl ConstrainedPointSet {
    pub fn new(points: Vec<Point2<f64>>, edges: Vec<[usize; 2]>) -> Self {
        Self { points, edges }
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }
}

impl Triangulate for ConstrainedPointSet {
    fn prepare(&self, ctx: &mut SweepContext) -> Result<()> {
        let ids: Vec<PointId> = self.points.iter().map(|p| ctx.add_point(p)).collect();
        for &[a, b] in &self.edges {
            let (Some(&a), Some(&b)) = (ids.get(a), ids.get(b)) else {
                return Err(Error::InvalidPolygon(format!(
                    "constraint edge ({a}, {b}) references a missing point"
                )));
            };
            ctx.add_edge(a, b);
        }
        add_hull_constraints(ctx, &self.points)
    }

    fn collect(&self, ctx: &mut SweepContext) -> Result<Triangulation> {
        ctx.mark_hull_interior();
        ctx.collect_interior()
    }
}

fn add_hull_constraints(ctx: &mut SweepContext, points: &[Point2<f64>]) -> Result<()> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return Err(Error::NotEnoughVertices(hull.len()));
    }
    let area = ring_signed_area(&hull);
    if area.abs() <= EPSILON {
        return Err(Error::AreaTooSmall(area.abs()));
    }
    let ids: Vec<PointId> = hull.iter().map(|p| ctx.add_point(p)).collect();
    for i in 0..ids.len() {
        ctx.add_edge(ids[i], ids[(i + 1) % ids.len()]);
    }
    Ok(())
}

/// Counter-clockwise convex hull (monotone chain). Points on hull edges are
/// kept so every input point on the boundary becomes a hull vertex.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut seen = FxHashSet::default();
    let mut sorted: Vec<Point2<f64>> = points
        .iter()
        .filter(|p| seen.insert(quantize(p.x, p.y)))
        .copied()
        .collect();
    if sorted.len() < 3 {
        return sorted;
    }
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) < -EPSILON {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) < -EPSILON {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
