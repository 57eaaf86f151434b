// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations on Simple Polygons
//!
//! Union, intersection and subtraction of polygons by boundary tracing:
//!
//! 1. Both outer rings are normalized to counter-clockwise order.
//! 2. Every crossing or touching point is spliced into both rings, and
//!    vertices sharing a position are grouped.
//! 3. Each edge is classified by sampling just left and right of its midpoint:
//!    an edge belongs to the result boundary when the result contains the left
//!    sample but not the right one. The second ring is walked backwards for
//!    subtraction so its edges are traced with the result on their left.
//! 4. Loops are traced from unvisited result edges. At a shared vertex the
//!    trace switches to another node of the group when its own continuation
//!    leaves the result boundary and the other one stays on it. A loop closes
//!    when it returns to the position it started from.
//!
//! A trace that runs longer than the combined vertex count of both rings
//! reports [`Error::InfiniteLoop`]. Counter-clockwise loops become outer
//! boundaries; clockwise loops become holes of the outer that contains them.
//! When no edge qualifies, the boundaries never cross: the inputs are
//! classified as a [`Containment`] (vertex location plus a seeded interior
//! sample point) and the result is read off that classification.
//!
//! Inputs with holes are supported through [`Clipper`], which composes the
//! simple-ring operation with hole subtraction.

use crate::error::{Error, Result};
use crate::polygon::{shared_epsilon, Location, Polygon, Winding};
use crate::primitives::{
    distance_to_segment, intersect, points_equal, project_parameter, IntersectMode, Rect2D,
    EPSILON,
};
use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Boolean operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    /// First operand minus second
    Subtraction,
}

impl BooleanOp {
    /// Whether a point with the given memberships belongs to the result
    #[inline]
    fn keeps(self, in_a: bool, in_b: bool) -> bool {
        match self {
            BooleanOp::Union => in_a || in_b,
            BooleanOp::Intersection => in_a && in_b,
            BooleanOp::Subtraction => in_a && !in_b,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    point: Point2<f64>,
    /// Index into the coincidence groups shared by both rings
    group: usize,
}

#[derive(Debug)]
struct Ring {
    nodes: Vec<Node>,
    forward: bool,
}

impl Ring {
    #[inline]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn next(&self, i: usize) -> usize {
        let n = self.nodes.len();
        if self.forward {
            (i + 1) % n
        } else {
            (i + n - 1) % n
        }
    }

    #[inline]
    fn edge(&self, i: usize) -> (Point2<f64>, Point2<f64>) {
        (self.nodes[i].point, self.nodes[self.next(i)].point)
    }
}

/// Spliced rings plus, for every distinct position, the `(ring, index)`
/// nodes sitting there
#[derive(Debug)]
struct Spliced {
    rings: [Ring; 2],
    groups: Vec<Vec<(usize, usize)>>,
}

/// How two polygons whose boundaries do not cross relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Neither polygon lies inside the other
    Disjoint,
    /// The first polygon lies inside the second
    FirstInSecond,
    /// The second polygon lies inside the first
    SecondInFirst,
}

/// Polygon boolean engine.
///
/// Owns the random generator used for interior sample points so repeated
/// runs with the same seed produce identical output.
#[derive(Debug, Clone)]
pub struct Clipper {
    rng: ChaCha8Rng,
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clipper {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn union(&mut self, a: &Polygon, b: &Polygon) -> Result<Vec<Polygon>> {
        self.apply(a, b, BooleanOp::Union)
    }

    pub fn intersection(&mut self, a: &Polygon, b: &Polygon) -> Result<Vec<Polygon>> {
        self.apply(a, b, BooleanOp::Intersection)
    }

    /// `a` minus `b`
    pub fn subtract(&mut self, a: &Polygon, b: &Polygon) -> Result<Vec<Polygon>> {
        self.apply(a, b, BooleanOp::Subtraction)
    }

    /// Apply a boolean operation to two polygons that may carry holes
    ///
    /// # Returns
    /// Disjoint polygons in the default winding, holes attached to their
    /// enclosing outer boundary. An empty list means an empty result.
    pub fn apply(&mut self, a: &Polygon, b: &Polygon, op: BooleanOp) -> Result<Vec<Polygon>> {
        let pieces = self.trace(a, b, op)?;
        match op {
            BooleanOp::Union => {
                if !a.has_holes() && !b.has_holes() {
                    return Ok(pieces);
                }
                let mut cutters = Vec::new();
                for hole in a.holes() {
                    cutters.extend(self.subtract(&hole.clone().normalized(), b)?);
                }
                for hole in b.holes() {
                    cutters.extend(self.subtract(&hole.clone().normalized(), a)?);
                }
                self.subtract_all(pieces, &cutters)
            }
            BooleanOp::Intersection => {
                let cutters: Vec<Polygon> = a
                    .holes()
                    .iter()
                    .chain(b.holes())
                    .map(|h| h.clone().normalized())
                    .collect();
                self.subtract_all(pieces, &cutters)
            }
            BooleanOp::Subtraction => {
                let cutters: Vec<Polygon> =
                    a.holes().iter().map(|h| h.clone().normalized()).collect();
                let mut out = self.subtract_all(pieces, &cutters)?;
                // Holes of the subtrahend are regions of `a` that survive
                for island in b.holes() {
                    out.extend(self.intersection(a, &island.clone().normalized())?);
                }
                Ok(out)
            }
        }
    }

    /// Merge a set of polygons into disjoint regions
    pub fn union_all(&mut self, polygons: &[Polygon]) -> Result<Vec<Polygon>> {
        let mut acc: Vec<Polygon> = Vec::new();
        for poly in polygons {
            if is_degenerate(poly) {
                continue;
            }
            let mut current = poly.clone().normalized();
            loop {
                let mut merged = false;
                let mut i = 0;
                while i < acc.len() {
                    let eps = shared_epsilon(&acc[i], &current);
                    if acc[i].bounds().overlaps(current.bounds(), eps) {
                        let mut result = self.union(&acc[i], &current)?;
                        if result.len() == 1 {
                            if let Some(single) = result.pop() {
                                acc.swap_remove(i);
                                current = single;
                                merged = true;
                                continue;
                            }
                        }
                    }
                    i += 1;
                }
                if !merged {
                    break;
                }
            }
            acc.push(current);
        }
        Ok(acc)
    }

    /// Subtract every cutter from every subject
    pub fn subtract_all(
        &mut self,
        subjects: Vec<Polygon>,
        cutters: &[Polygon],
    ) -> Result<Vec<Polygon>> {
        let mut pieces = subjects;
        for cutter in cutters {
            if is_degenerate(cutter) {
                continue;
            }
            let mut next = Vec::with_capacity(pieces.len());
            for piece in pieces {
                let eps = shared_epsilon(&piece, cutter);
                if piece.bounds().overlaps(cutter.bounds(), eps) {
                    next.extend(self.cut(piece, cutter)?);
                } else {
                    next.push(piece);
                }
            }
            pieces = next;
        }
        Ok(pieces)
    }

    /// Remove `cutter` from a piece whose holes are pairwise disjoint
    fn cut(&mut self, piece: Polygon, cutter: &Polygon) -> Result<Vec<Polygon>> {
        let original = piece.clone();
        let mut piece = piece;
        let mut holes: Vec<Polygon> = piece
            .take_holes()
            .into_iter()
            .map(Polygon::normalized)
            .collect();
        let mut knife = cutter.without_holes().normalized();
        let mut islands: Vec<Polygon> = cutter
            .holes()
            .iter()
            .map(|h| h.clone().normalized())
            .collect();

        // Holes touching or overlapping the knife become part of it
        loop {
            let mut merged_any = false;
            let mut i = 0;
            while i < holes.len() {
                let eps = shared_epsilon(&holes[i], &knife);
                if holes[i].bounds().overlaps(knife.bounds(), eps) {
                    let mut merged = self.trace(&knife, &holes[i], BooleanOp::Union)?;
                    if merged.len() == 1 {
                        if let Some(mut joined) = merged.pop() {
                            islands.extend(joined.take_holes().into_iter().map(Polygon::normalized));
                            holes.swap_remove(i);
                            knife = joined;
                            merged_any = true;
                            continue;
                        }
                    }
                }
                i += 1;
            }
            if !merged_any {
                break;
            }
        }

        let mut out = self.trace(&piece, &knife, BooleanOp::Subtraction)?;
        for hole in holes {
            if let Some(host) = out.iter_mut().find(|o| o.contains_polygon(&hole)) {
                host.add_hole(hole);
            }
        }
        for island in islands {
            out.extend(self.apply(&original, &island, BooleanOp::Intersection)?);
        }
        Ok(out)
    }

    /// Boolean operation on the outer rings only
    fn trace(&mut self, a: &Polygon, b: &Polygon, op: BooleanOp) -> Result<Vec<Polygon>> {
        let a = a.without_holes().normalized();
        let b = b.without_holes().normalized();

        match (is_degenerate(&a), is_degenerate(&b)) {
            (true, true) => return Ok(Vec::new()),
            (true, false) => {
                return Ok(match op {
                    BooleanOp::Union => vec![b],
                    _ => Vec::new(),
                })
            }
            (false, true) => {
                return Ok(match op {
                    BooleanOp::Intersection => Vec::new(),
                    _ => vec![a],
                })
            }
            (false, false) => {}
        }

        let eps = shared_epsilon(&a, &b);
        if !a.bounds().overlaps(b.bounds(), eps) {
            return Ok(match op {
                BooleanOp::Union => vec![a, b],
                BooleanOp::Intersection => Vec::new(),
                BooleanOp::Subtraction => vec![a],
            });
        }

        let mut spliced = splice(&a, &b, eps);
        spliced.rings[1].forward = op != BooleanOp::Subtraction;
        let rings = &spliced.rings;

        let reach = eps * 2.0;
        let valid: [Vec<bool>; 2] = [
            (0..rings[0].len())
                .map(|i| edge_in_result(&rings[0], i, &a, &b, op, reach))
                .collect(),
            (0..rings[1].len())
                .map(|i| edge_in_result(&rings[1], i, &a, &b, op, reach))
                .collect(),
        ];
        let mut visited = [vec![false; rings[0].len()], vec![false; rings[1].len()]];
        let limit = rings[0].len() + rings[1].len();

        let mut loops = Vec::new();
        for r in 0..2 {
            for i in 0..rings[r].len() {
                if valid[r][i] && !visited[r][i] {
                    loops.push(trace_loop(&spliced, &valid, &mut visited, (r, i), limit)?);
                }
            }
        }

        if loops.is_empty() {
            let containment = self.containment(&a, &b);
            tracing::debug!(?op, ?containment, "no crossing boundary, resolving by containment");
            return Ok(resolve_containment(a, b, op, containment));
        }
        Ok(assemble(loops, eps))
    }

    /// Classify two polygons whose outer boundaries do not cross.
    ///
    /// A polygon counts as inside the other when none of its vertices lies
    /// outside it and a sampled interior point lies inside as well.
    pub fn containment(&mut self, a: &Polygon, b: &Polygon) -> Containment {
        if self.is_within(a, b) {
            Containment::FirstInSecond
        } else if self.is_within(b, a) {
            Containment::SecondInFirst
        } else {
            Containment::Disjoint
        }
    }

    fn is_within(&mut self, inner: &Polygon, outer: &Polygon) -> bool {
        if inner
            .points()
            .iter()
            .any(|p| outer.locate(p) == Location::Outside)
        {
            return false;
        }
        inner
            .sample_interior_point(&mut self.rng)
            .map_or(false, |p| outer.locate(&p) != Location::Outside)
    }
}

/// Result of `op` for inputs related by `containment`
fn resolve_containment(
    a: Polygon,
    b: Polygon,
    op: BooleanOp,
    containment: Containment,
) -> Vec<Polygon> {
    use Containment::*;
    match (op, containment) {
        (BooleanOp::Union, FirstInSecond) => vec![b],
        (BooleanOp::Union, SecondInFirst) => vec![a],
        (BooleanOp::Union, Disjoint) => vec![a, b],
        (BooleanOp::Intersection, FirstInSecond) => vec![a],
        (BooleanOp::Intersection, SecondInFirst) => vec![b],
        (BooleanOp::Intersection, Disjoint) => Vec::new(),
        (BooleanOp::Subtraction, FirstInSecond) => Vec::new(),
        (BooleanOp::Subtraction, SecondInFirst) => {
            let mut a = a;
            a.add_hole(b);
            vec![a]
        }
        (BooleanOp::Subtraction, Disjoint) => vec![a],
    }
}

/// Crossing and touching points between the outer rings of two polygons
pub fn find_intersections(a: &Polygon, b: &Polygon) -> Vec<Point2<f64>> {
    let eps = shared_epsilon(a, b);
    let spliced = splice(a, b, eps);
    spliced
        .groups
        .iter()
        .filter(|g| g.iter().any(|&(r, _)| r == 0) && g.iter().any(|&(r, _)| r == 1))
        .map(|g| {
            let (r, i) = g[0];
            spliced.rings[r].nodes[i].point
        })
        .collect()
}

fn is_degenerate(poly: &Polygon) -> bool {
    poly.len() < 3 || poly.winding() == Winding::Unknown
}

/// Insert every contact point between the two rings into both of them and
/// link coincident vertices
fn splice(a: &Polygon, b: &Polygon, eps: f64) -> Spliced {
    let pa = a.points();
    let pb = b.points();
    let mut cuts_a: Vec<Vec<(f64, Point2<f64>)>> = vec![Vec::new(); pa.len()];
    let mut cuts_b: Vec<Vec<(f64, Point2<f64>)>> = vec![Vec::new(); pb.len()];

    for i in 0..pa.len() {
        let a1 = &pa[i];
        let a2 = &pa[(i + 1) % pa.len()];
        let box_a = Rect2D::from_points([a1, a2]);
        for j in 0..pb.len() {
            let b1 = &pb[j];
            let b2 = &pb[(j + 1) % pb.len()];
            if !box_a.overlaps(&Rect2D::from_points([b1, b2]), eps) {
                continue;
            }
            if let Ok(Some(hit)) = intersect(a1, a2, b1, b2, IntersectMode::Segments, false, eps) {
                cuts_a[i].push((hit.t, hit.point));
                cuts_b[j].push((hit.u, hit.point));
            }
            for p in [b1, b2] {
                if distance_to_segment(p, a1, a2) <= eps {
                    cuts_a[i].push((project_parameter(p, a1, a2), *p));
                }
            }
            for p in [a1, a2] {
                if distance_to_segment(p, b1, b2) <= eps {
                    cuts_b[j].push((project_parameter(p, b1, b2), *p));
                }
            }
        }
    }

    let mut rings = [
        Ring {
            nodes: subdivide(pa, cuts_a, eps),
            forward: true,
        },
        Ring {
            nodes: subdivide(pb, cuts_b, eps),
            forward: true,
        },
    ];

    let mut groups: Vec<Vec<(usize, usize)>> = Vec::new();
    let positions: Vec<(usize, usize, Point2<f64>)> = rings
        .iter()
        .enumerate()
        .flat_map(|(r, ring)| ring.nodes.iter().enumerate().map(move |(i, n)| (r, i, n.point)))
        .collect();
    let mut anchors: Vec<Point2<f64>> = Vec::new();
    for (r, i, point) in positions {
        let group = match anchors.iter().position(|q| points_equal(q, &point, eps)) {
            Some(g) => g,
            None => {
                anchors.push(point);
                groups.push(Vec::new());
                anchors.len() - 1
            }
        };
        groups[group].push((r, i));
        rings[r].nodes[i].group = group;
    }

    Spliced { rings, groups }
}

fn subdivide(points: &[Point2<f64>], mut cuts: Vec<Vec<(f64, Point2<f64>)>>, eps: f64) -> Vec<Node> {
    let n = points.len();
    let mut nodes: Vec<Node> = Vec::with_capacity(n * 2);
    for i in 0..n {
        let start = points[i];
        let end = points[(i + 1) % n];
        nodes.push(Node {
            point: start,
            group: 0,
        });
        let edge_cuts = &mut cuts[i];
        edge_cuts.sort_by(|x, y| x.0.total_cmp(&y.0));
        for &(t, p) in edge_cuts.iter() {
            if !(0.0..=1.0).contains(&t) || points_equal(&p, &end, eps) {
                continue;
            }
            let duplicate = nodes
                .last()
                .map_or(false, |last| points_equal(&last.point, &p, eps));
            if !duplicate {
                nodes.push(Node { point: p, group: 0 });
            }
        }
    }
    nodes
}

/// An edge lies on the result boundary when the result contains the point
/// just left of it and not the point just right of it
fn edge_in_result(
    ring: &Ring,
    i: usize,
    a: &Polygon,
    b: &Polygon,
    op: BooleanOp,
    reach: f64,
) -> bool {
    let (p, q) = ring.edge(i);
    let d: Vector2<f64> = q - p;
    let len = d.norm();
    if len <= EPSILON {
        return false;
    }
    let offset = Vector2::new(-d.y, d.x) * (reach / len);
    let mid = p + d * 0.5;
    let left = mid + offset;
    let right = mid - offset;
    op.keeps(a.ring_contains(&left), b.ring_contains(&left))
        && !op.keeps(a.ring_contains(&right), b.ring_contains(&right))
}

fn trace_loop(
    spliced: &Spliced,
    valid: &[Vec<bool>; 2],
    visited: &mut [Vec<bool>; 2],
    start: (usize, usize),
    limit: usize,
) -> Result<Vec<Point2<f64>>> {
    let rings = &spliced.rings;
    let start_group = rings[start.0].nodes[start.1].group;
    let (mut r, mut i) = start;
    let mut out = vec![rings[r].nodes[i].point];
    let mut steps = 0usize;

    loop {
        let next = rings[r].next(i);
        visited[r][i] = true;

        // Coincident edges elsewhere are the same boundary piece
        let next_group = rings[r].nodes[next].group;
        for &(r2, j) in &spliced.groups[rings[r].nodes[i].group] {
            if (r2, j) != (r, i) && rings[r2].nodes[rings[r2].next(j)].group == next_group {
                visited[r2][j] = true;
            }
        }

        i = next;
        let group = rings[r].nodes[i].group;
        if group == start_group {
            break;
        }

        steps += 1;
        if steps > limit {
            return Err(Error::InfiniteLoop { steps });
        }
        out.push(rings[r].nodes[i].point);

        if !(valid[r][i] && !visited[r][i]) {
            let swap = spliced.groups[group]
                .iter()
                .copied()
                .find(|&(r2, j)| (r2, j) != (r, i) && valid[r2][j] && !visited[r2][j]);
            if let Some((r2, j)) = swap {
                r = r2;
                i = j;
            }
        }
    }
    Ok(out)
}

/// Turn traced loops into polygons: counter-clockwise loops are outers,
/// clockwise loops are holes of the smallest outer containing them
fn assemble(loops: Vec<Vec<Point2<f64>>>, eps: f64) -> Vec<Polygon> {
    let mut outers: Vec<Polygon> = Vec::new();
    let mut holes: Vec<Polygon> = Vec::new();
    for points in loops.into_iter().flat_map(|l| split_pinches(l, eps)) {
        let poly = Polygon::with_epsilon(points, eps).simplify();
        if poly.len() < 3 || poly.signed_area().abs() <= eps * eps {
            continue;
        }
        match poly.winding() {
            Winding::CounterClockwise => outers.push(poly),
            Winding::Clockwise => holes.push(poly),
            Winding::Unknown => {}
        }
    }
    for hole in holes {
        let host = outers
            .iter_mut()
            .filter(|o| o.contains_polygon(&hole))
            .min_by(|x, y| x.area().total_cmp(&y.area()));
        if let Some(host) = host {
            host.add_hole(hole);
        }
    }
    outers
}

/// Cut a traced loop at every vertex it passes through more than once.
///
/// A result region touching itself at a single point (an outline pinched
/// against a hole, or two cells meeting diagonally) comes out of the trace
/// as one loop visiting that point twice. Each piece keeps the orientation
/// it had in the loop, so pinched-off holes stay clockwise.
fn split_pinches(points: Vec<Point2<f64>>, eps: f64) -> Vec<Vec<Point2<f64>>> {
    let mut pending = vec![points];
    let mut done = Vec::new();
    while let Some(mut points) = pending.pop() {
        let repeat = (0..points.len()).find_map(|i| {
            (i + 1..points.len())
                .find(|&j| points_equal(&points[i], &points[j], eps))
                .map(|j| (i, j))
        });
        match repeat {
            Some((i, j)) => {
                let inner: Vec<_> = points.drain(i..j).collect();
                pending.push(inner);
                pending.push(points);
            }
            None => done.push(points),
        }
    }
    done
}
