// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simple polygons with optional holes
//!
//! A [`Polygon`] is a closed ring of 2D points. Construction runs a cleanup
//! pass so that no two consecutive points coincide (within the polygon's
//! relative epsilon), and records the winding order and bounding box.

use crate::error::{Error, Result};
use crate::primitives::{
    cross, distance_to_segment, intersect, points_equal, IntersectMode, Rect2D, EPSILON,
};
use nalgebra::Point2;
use rand::Rng;
use std::f64::consts::PI;

/// Rotational direction of a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
    Unknown,
}

/// Winding every outer boundary is normalized to
pub const DEFAULT_WINDING: Winding = Winding::CounterClockwise;

/// Where a point lies relative to a polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    Outside,
    Boundary,
}

/// Closed 2D point ring with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point2<f64>>,
    holes: Vec<Polygon>,
    bounds: Rect2D,
    epsilon: f64,
    winding: Winding,
}

impl Polygon {
    /// Create a polygon, removing consecutive duplicate points
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        let bounds = Rect2D::from_points(&points);
        let epsilon = bounds.epsilon();
        Self::with_epsilon(points, epsilon)
    }

    /// Create a polygon using an explicit comparison tolerance
    pub fn with_epsilon(points: Vec<Point2<f64>>, epsilon: f64) -> Self {
        let points = cleanup(points, epsilon);
        let bounds = Rect2D::from_points(&points);
        let area = ring_signed_area(&points);
        let winding = if area > epsilon * epsilon {
            Winding::CounterClockwise
        } else if area < -epsilon * epsilon {
            Winding::Clockwise
        } else {
            Winding::Unknown
        };
        Self {
            points,
            holes: Vec::new(),
            bounds,
            epsilon: epsilon.max(EPSILON),
            winding,
        }
    }

    /// Axis-aligned rectangle, counter-clockwise
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(vec![
            Point2::new(min_x, min_y),
            Point2::new(max_x, min_y),
            Point2::new(max_x, max_y),
            Point2::new(min_x, max_y),
        ])
    }

    #[inline]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    #[inline]
    pub fn holes(&self) -> &[Polygon] {
        &self.holes
    }

    #[inline]
    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn bounds(&self) -> &Rect2D {
        &self.bounds
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[inline]
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// Add a hole; it is stored clockwise
    pub fn add_hole(&mut self, hole: Polygon) {
        let mut hole = hole.without_holes();
        hole.set_winding(Winding::Clockwise);
        self.holes.push(hole);
    }

    /// Drop all holes, keeping only the outer ring
    pub fn without_holes(&self) -> Polygon {
        Polygon {
            points: self.points.clone(),
            holes: Vec::new(),
            bounds: self.bounds,
            epsilon: self.epsilon,
            winding: self.winding,
        }
    }

    pub(crate) fn take_holes(&mut self) -> Vec<Polygon> {
        std::mem::take(&mut self.holes)
    }

    /// Reverse the ring if needed so it has the requested winding
    pub fn set_winding(&mut self, winding: Winding) {
        if winding != Winding::Unknown && self.winding != Winding::Unknown && self.winding != winding {
            self.points.reverse();
            self.winding = winding;
        }
    }

    /// Outer ring in the default winding, holes clockwise
    pub fn normalized(mut self) -> Polygon {
        self.set_winding(DEFAULT_WINDING);
        for hole in &mut self.holes {
            hole.set_winding(Winding::Clockwise);
        }
        self
    }

    /// Signed area of the outer ring (positive when counter-clockwise)
    pub fn signed_area(&self) -> f64 {
        ring_signed_area(&self.points)
    }

    /// Enclosed area: outer ring minus holes
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| h.signed_area().abs()).sum();
        (self.signed_area().abs() - holes).max(0.0)
    }

    /// Edges of the outer ring as `(start, end)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (&Point2<f64>, &Point2<f64>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (&self.points[i], &self.points[(i + 1) % n]))
    }

    /// Check that the polygon can be triangulated: at least three vertices,
    /// area above tolerance, no folded-back spikes and no self-intersections
    pub fn validate(&self) -> Result<()> {
        if self.points.len() < 3 {
            return Err(Error::NotEnoughVertices(self.points.len()));
        }
        let area = self.signed_area().abs();
        if area <= self.epsilon * self.epsilon {
            return Err(Error::AreaTooSmall(area));
        }
        let n = self.points.len();
        for i in 0..n {
            let prev = &self.points[(i + n - 1) % n];
            let curr = &self.points[i];
            let next = &self.points[(i + 1) % n];
            let a = curr - prev;
            let b = next - curr;
            let folded = a.dot(&b) < 0.0
                && cross(prev, curr, next).abs() <= self.epsilon * a.norm().max(b.norm());
            if folded {
                return Err(Error::NearlyParallel);
            }
        }
        if !self.is_simple() {
            return Err(Error::NotSimple);
        }
        for hole in &self.holes {
            hole.validate()?;
        }
        Ok(())
    }

    /// No two non-adjacent edges touch or cross
    pub fn is_simple(&self) -> bool {
        find_crossing(&self.points, self.epsilon).is_none()
    }

    /// Sum of signed angles subtended by the ring's edges at `p`.
    /// About `±2π` for points inside, about `0` outside.
    pub fn winding_angle(&self, p: &Point2<f64>) -> f64 {
        ring_winding_angle(&self.points, p)
    }

    /// Point-in-ring test on the outer ring only, without boundary tolerance
    #[inline]
    pub(crate) fn ring_contains(&self, p: &Point2<f64>) -> bool {
        self.winding_angle(p).abs() > PI
    }

    /// Classify a point against the polygon including its holes
    pub fn locate(&self, p: &Point2<f64>) -> Location {
        if self.points.len() < 3 {
            return Location::Outside;
        }
        if !self.bounds.contains_point(p, self.epsilon) {
            return Location::Outside;
        }
        if self
            .edges()
            .any(|(a, b)| distance_to_segment(p, a, b) <= self.epsilon)
        {
            return Location::Boundary;
        }
        if !self.ring_contains(p) {
            return Location::Outside;
        }
        for hole in &self.holes {
            match hole.without_holes().locate(p) {
                Location::Boundary => return Location::Boundary,
                Location::Inside => return Location::Outside,
                Location::Outside => {}
            }
        }
        Location::Inside
    }

    /// Strictly inside (not on the boundary)
    #[inline]
    pub fn contains_point(&self, p: &Point2<f64>) -> bool {
        self.locate(p) == Location::Inside
    }

    /// Every vertex and edge midpoint of `other` is inside or on this polygon
    pub fn contains_polygon(&self, other: &Polygon) -> bool {
        if !self.bounds.overlaps(other.bounds(), self.epsilon) {
            return false;
        }
        other.edges().all(|(a, b)| {
            let mid = Point2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
            self.locate(a) != Location::Outside && self.locate(&mid) != Location::Outside
        })
    }

    /// Remove vertices lying on the line through their neighbours
    pub fn simplify(&self) -> Polygon {
        let mut points = self.points.clone();
        let eps = self.epsilon;
        loop {
            let n = points.len();
            if n <= 3 {
                break;
            }
            let removable = (0..n).find(|&i| {
                let prev = &points[(i + n - 1) % n];
                let curr = &points[i];
                let next = &points[(i + 1) % n];
                let base = (next - prev).norm();
                if base <= eps {
                    return true;
                }
                (cross(prev, curr, next) / base).abs() <= eps * 0.01
            });
            match removable {
                Some(i) => {
                    points.remove(i);
                }
                None => break,
            }
        }
        let mut out = Polygon::with_epsilon(points, self.epsilon);
        for hole in &self.holes {
            out.add_hole(hole.simplify());
        }
        out
    }

    /// Clip the outer ring to a rectangle (Sutherland-Hodgman)
    pub fn clip_to_rect(&self, rect: &Rect2D) -> Option<Polygon> {
        if !self.bounds.overlaps(rect, 0.0) {
            return None;
        }
        type Inside = fn(&Point2<f64>, &Rect2D) -> bool;
        type Cut = fn(&Point2<f64>, &Point2<f64>, &Rect2D) -> Point2<f64>;
        let planes: [(Inside, Cut); 4] = [
            (|p, r| p.x >= r.min_x, |a, b, r| lerp_x(a, b, r.min_x)),
            (|p, r| p.x <= r.max_x, |a, b, r| lerp_x(a, b, r.max_x)),
            (|p, r| p.y >= r.min_y, |a, b, r| lerp_y(a, b, r.min_y)),
            (|p, r| p.y <= r.max_y, |a, b, r| lerp_y(a, b, r.max_y)),
        ];

        let mut output = self.points.clone();
        for (inside, cut) in planes {
            if output.is_empty() {
                break;
            }
            let input = std::mem::take(&mut output);
            let n = input.len();
            for i in 0..n {
                let curr = &input[i];
                let prev = &input[(i + n - 1) % n];
                match (inside(curr, rect), inside(prev, rect)) {
                    (true, true) => output.push(*curr),
                    (true, false) => {
                        output.push(cut(prev, curr, rect));
                        output.push(*curr);
                    }
                    (false, true) => output.push(cut(prev, curr, rect)),
                    (false, false) => {}
                }
            }
        }

        let clipped = Polygon::with_epsilon(output, self.epsilon);
        if clipped.len() < 3 || clipped.signed_area().abs() <= self.epsilon * self.epsilon {
            None
        } else {
            Some(clipped)
        }
    }

    /// Find a point strictly inside the polygon.
    ///
    /// Random samples inside the bounding box are tried first; if none hits,
    /// centroids of fan triangles are used. The generator is passed in so
    /// results are reproducible for a given seed.
    pub fn sample_interior_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point2<f64>> {
        const ATTEMPTS: usize = 64;
        if self.points.len() < 3 || self.bounds.is_empty() {
            return None;
        }
        let b = &self.bounds;
        if b.width() > 0.0 && b.height() > 0.0 {
            for _ in 0..ATTEMPTS {
                let p = Point2::new(
                    rng.gen_range(b.min_x..b.max_x),
                    rng.gen_range(b.min_y..b.max_y),
                );
                if self.locate(&p) == Location::Inside {
                    return Some(p);
                }
            }
        }
        let n = self.points.len();
        (0..n).find_map(|i| {
            let a = &self.points[(i + n - 1) % n];
            let b = &self.points[i];
            let c = &self.points[(i + 1) % n];
            let p = Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
            (self.locate(&p) == Location::Inside).then_some(p)
        })
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Polygon {
        let mut out = Polygon::with_epsilon(
            self.points.iter().map(|p| Point2::new(p.x + dx, p.y + dy)).collect(),
            self.epsilon,
        );
        for hole in &self.holes {
            out.add_hole(hole.translate(dx, dy));
        }
        out
    }
}

/// Split a possibly self-intersecting ring into simple polygons.
///
/// Each crossing of two non-adjacent edges cuts the ring into two loops at
/// the crossing point; loops are split recursively until simple. Loops with
/// no area are dropped. Results use the default winding.
pub fn split_self_intersections(points: &[Point2<f64>]) -> Vec<Polygon> {
    let epsilon = Rect2D::from_points(points).epsilon();
    let mut stack = vec![cleanup(points.to_vec(), epsilon)];
    let mut out = Vec::new();

    while let Some(ring) = stack.pop() {
        if ring.len() < 3 {
            continue;
        }
        match find_crossing(&ring, epsilon) {
            None => {
                let poly = Polygon::with_epsilon(ring, epsilon);
                if poly.len() >= 3 && poly.signed_area().abs() > epsilon * epsilon {
                    out.push(poly.normalized());
                }
            }
            Some((i, j, x)) => {
                let n = ring.len();
                let mut first = Vec::with_capacity(j - i + 1);
                first.push(x);
                first.extend_from_slice(&ring[i + 1..=j]);

                let mut second = Vec::with_capacity(n - (j - i) + 1);
                second.push(x);
                second.extend_from_slice(&ring[j + 1..]);
                second.extend_from_slice(&ring[..=i]);

                stack.push(cleanup(first, epsilon));
                stack.push(cleanup(second, epsilon));
            }
        }
    }
    out
}

/// First pair of non-adjacent edges `(i, j)`, `i < j`, that touch or cross,
/// with the contact point
fn find_crossing(points: &[Point2<f64>], epsilon: f64) -> Option<(usize, usize, Point2<f64>)> {
    let n = points.len();
    if n < 4 {
        return None;
    }
    for i in 0..n {
        let a1 = &points[i];
        let a2 = &points[(i + 1) % n];
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = &points[j];
            let b2 = &points[(j + 1) % n];
            if let Ok(Some(hit)) = intersect(a1, a2, b1, b2, IntersectMode::Segments, true, epsilon) {
                return Some((i, j, hit.point));
            }
            // Collinear overlap never reports an intersection point
            for p in [b1, b2] {
                if distance_to_segment(p, a1, a2) <= epsilon {
                    return Some((i, j, *p));
                }
            }
        }
    }
    None
}

/// Remove consecutive duplicates (including a closing duplicate of the first point)
pub(crate) fn cleanup(points: Vec<Point2<f64>>, epsilon: f64) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if !p.x.is_finite() || !p.y.is_finite() {
            continue;
        }
        if out.last().map_or(true, |last| !points_equal(last, &p, epsilon)) {
            out.push(p);
        }
    }
    while out.len() > 1 && points_equal(&out[0], &out[out.len() - 1], epsilon) {
        out.pop();
    }
    out
}

pub(crate) fn ring_signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area * 0.5
}

pub(crate) fn ring_winding_angle(points: &[Point2<f64>], p: &Point2<f64>) -> f64 {
    let n = points.len();
    let mut total = 0.0;
    for i in 0..n {
        let a = points[i] - p;
        let b = points[(i + 1) % n] - p;
        total += (a.x * b.y - a.y * b.x).atan2(a.dot(&b));
    }
    total
}

#[inline]
fn lerp_x(a: &Point2<f64>, b: &Point2<f64>, x: f64) -> Point2<f64> {
    let t = (x - a.x) / (b.x - a.x);
    Point2::new(x, a.y + (b.y - a.y) * t)
}

#[inline]
fn lerp_y(a: &Point2<f64>, b: &Point2<f64>, y: f64) -> Point2<f64> {
    let t = (y - a.y) / (b.y - a.y);
    Point2::new(a.x + (b.x - a.x) * t, y)
}

/// Relative tolerance shared by two polygons
#[inline]
pub(crate) fn shared_epsilon(a: &Polygon, b: &Polygon) -> f64 {
    a.epsilon().min(b.epsilon()).max(EPSILON)
}
