// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric primitives and predicates
//!
//! Two epsilon policies are used throughout the crate:
//!
//! - [`EPSILON`] (`1e-12`) is an absolute band for raw determinant predicates.
//! - [`relative_epsilon`] scales with the size of the geometry being compared
//!   (`min(width, height) * 0.001`, floored at [`EPSILON`]). Voxel positions and
//!   texture coordinates live on very different scales, so point and polygon
//!   comparisons must use it.

use crate::error::{Error, Result};
use nalgebra::{Point2, Vector2};

/// Absolute tolerance for orientation and incircle determinants
pub const EPSILON: f64 = 1e-12;

/// Fraction of the smaller bounding-box side used as a comparison tolerance
pub const RELATIVE_EPSILON_FACTOR: f64 = 0.001;

/// Rotational direction of three points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

impl Orientation {
    /// Orientation of the same points with two of them swapped
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Clockwise => Orientation::CounterClockwise,
            Orientation::CounterClockwise => Orientation::Clockwise,
            Orientation::Collinear => Orientation::Collinear,
        }
    }
}

/// Signed-area orientation test with an absolute epsilon band
#[inline]
pub fn orient2d(pa: &Point2<f64>, pb: &Point2<f64>, pc: &Point2<f64>) -> Orientation {
    let detleft = (pa.x - pc.x) * (pb.y - pc.y);
    let detright = (pa.y - pc.y) * (pb.x - pc.x);
    let val = detleft - detright;
    if val > -EPSILON && val < EPSILON {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Clockwise
    }
}

/// Twice the signed area of triangle `abc` (positive when counter-clockwise)
#[inline]
pub fn cross(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether `pd` lies strictly inside the wedge spanned by `pb` and `pc` as
/// seen from `pa`.
///
/// Used to decide if an edge flip keeps a convex quadrilateral.
#[inline]
pub fn in_scan_area(pa: &Point2<f64>, pb: &Point2<f64>, pc: &Point2<f64>, pd: &Point2<f64>) -> bool {
    let oadb = (pa.x - pb.x) * (pd.y - pb.y) - (pd.x - pb.x) * (pa.y - pb.y);
    if oadb >= -EPSILON {
        return false;
    }

    let oadc = (pa.x - pc.x) * (pd.y - pc.y) - (pd.x - pc.x) * (pa.y - pc.y);
    if oadc <= EPSILON {
        return false;
    }
    true
}

/// Robust incircle test: is `pd` inside the circumcircle of `pa, pb, pc`?
///
/// `pa` must be the point opposite the shared edge. The test is gated by two
/// orientation checks so it only reports `true` when `pd` also lies on the
/// far side of both edges incident to `pa`, which is exactly when a flip of
/// the shared diagonal is legal.
pub fn smart_incircle(pa: &Point2<f64>, pb: &Point2<f64>, pc: &Point2<f64>, pd: &Point2<f64>) -> bool {
    let adx = pa.x - pd.x;
    let ady = pa.y - pd.y;
    let bdx = pb.x - pd.x;
    let bdy = pb.y - pd.y;

    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;
    let oabd = adxbdy - bdxady;
    if oabd <= 0.0 {
        return false;
    }

    let cdx = pc.x - pd.x;
    let cdy = pc.y - pd.y;

    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let ocad = cdxady - adxcdy;
    if ocad <= 0.0 {
        return false;
    }

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdxcdy - cdxbdy) + blift * ocad + clift * oabd;
    det > 0.0
}

/// How far an intersection test extends along its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectMode {
    /// Both inputs are bounded segments
    Segments,
    /// Both inputs are infinite lines through the given points
    Lines,
}

/// Result of a successful intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: Point2<f64>,
    /// Parameter along the first input (`0` at `a1`, `1` at `a2`)
    pub t: f64,
    /// Parameter along the second input
    pub u: f64,
    /// The intersection lies on an endpoint of either segment
    pub touching: bool,
}

/// Intersect `a1-a2` with `b1-b2`.
///
/// In [`IntersectMode::Segments`] mode parallel inputs yield `Ok(None)`; in
/// [`IntersectMode::Lines`] mode they are an error, since two parallel lines
/// have no meaningful intersection. `epsilon` is the distance under which a
/// hit counts as touching an endpoint; touching hits are only reported when
/// `include_touching` is set.
pub fn intersect(
    a1: &Point2<f64>,
    a2: &Point2<f64>,
    b1: &Point2<f64>,
    b2: &Point2<f64>,
    mode: IntersectMode,
    include_touching: bool,
    epsilon: f64,
) -> Result<Option<Intersection>> {
    let da: Vector2<f64> = a2 - a1;
    let db: Vector2<f64> = b2 - b1;
    let denom = da.perp(&db);
    let len_a = da.norm();
    let len_b = db.norm();

    if denom.abs() <= EPSILON * len_a.max(1.0) * len_b.max(1.0) {
        return match mode {
            IntersectMode::Segments => Ok(None),
            IntersectMode::Lines => Err(Error::NearlyParallel),
        };
    }

    let w: Vector2<f64> = b1 - a1;
    let t = w.perp(&db) / denom;
    let u = w.perp(&da) / denom;
    let point = a1 + da * t;

    if mode == IntersectMode::Lines {
        return Ok(Some(Intersection {
            point,
            t,
            u,
            touching: false,
        }));
    }

    let tol_a = if len_a > 0.0 { epsilon / len_a } else { 0.0 };
    let tol_b = if len_b > 0.0 { epsilon / len_b } else { 0.0 };
    if t < -tol_a || t > 1.0 + tol_a || u < -tol_b || u > 1.0 + tol_b {
        return Ok(None);
    }

    let touching = t.abs() <= tol_a
        || (1.0 - t).abs() <= tol_a
        || u.abs() <= tol_b
        || (1.0 - u).abs() <= tol_b;
    if touching && !include_touching {
        return Ok(None);
    }

    Ok(Some(Intersection {
        point,
        t: t.clamp(0.0, 1.0),
        u: u.clamp(0.0, 1.0),
        touching,
    }))
}

/// Distance from `p` to the segment `a-b`
pub fn distance_to_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= EPSILON * EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Parameter of the projection of `p` onto the line through `a-b`
#[inline]
pub fn project_parameter(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= EPSILON * EPSILON {
        return 0.0;
    }
    (p - a).dot(&ab) / len2
}

/// Approximate point equality
#[inline]
pub fn points_equal(a: &Point2<f64>, b: &Point2<f64>, epsilon: f64) -> bool {
    (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon
}

/// Relative comparison tolerance for geometry of the given extent
#[inline]
pub fn relative_epsilon(width: f64, height: f64) -> f64 {
    (width.min(height) * RELATIVE_EPSILON_FACTOR).max(EPSILON)
}

/// Axis-aligned 2D bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Rect2D {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rect2D {
    /// An empty box that any added point will replace
    pub const fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Self {
        let mut rect = Self::empty();
        for p in points {
            rect.add_point(p);
        }
        rect
    }

    #[inline]
    pub fn add_point(&mut self, p: &Point2<f64>) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    #[inline]
    pub fn center(&self) -> Point2<f64> {
        Point2::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    /// Relative tolerance for geometry inside this box
    #[inline]
    pub fn epsilon(&self) -> f64 {
        relative_epsilon(self.width(), self.height())
    }

    #[inline]
    pub fn contains_point(&self, p: &Point2<f64>, epsilon: f64) -> bool {
        p.x >= self.min_x - epsilon
            && p.x <= self.max_x + epsilon
            && p.y >= self.min_y - epsilon
            && p.y <= self.max_y + epsilon
    }

    /// Boxes overlap or touch within `epsilon`
    #[inline]
    pub fn overlaps(&self, other: &Rect2D, epsilon: f64) -> bool {
        self.min_x <= other.max_x + epsilon
            && self.max_x >= other.min_x - epsilon
            && self.min_y <= other.max_y + epsilon
            && self.max_y >= other.min_y - epsilon
    }

    pub fn union(&self, other: &Rect2D) -> Rect2D {
        Rect2D {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_orient2d_basic() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert_eq!(orient2d(&a, &b, &c), Orientation::CounterClockwise);
        assert_eq!(orient2d(&a, &c, &b), Orientation::Clockwise);
        assert_eq!(
            orient2d(&a, &b, &Point2::new(2.0, 0.0)),
            Orientation::Collinear
        );
    }

    #[test]
    fn test_orient2d_swap_flips() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let p = |rng: &mut ChaCha8Rng| Point2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let (a, b, c) = (p(&mut rng), p(&mut rng), p(&mut rng));
            assert_eq!(orient2d(&a, &b, &c), orient2d(&b, &a, &c).reversed());
            assert_eq!(orient2d(&a, &b, &c), orient2d(&a, &c, &b).reversed());
        }
    }

    #[test]
    fn test_collinear_invariant_under_permutation() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 1.0);
        let c = Point2::new(3.0, 3.0);
        for (p, q, r) in [(a, b, c), (b, a, c), (c, b, a), (a, c, b), (b, c, a), (c, a, b)] {
            assert_eq!(orient2d(&p, &q, &r), Orientation::Collinear);
        }
    }

    #[test]
    fn test_segment_intersection_crossing() {
        let hit = intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 2.0),
            &Point2::new(0.0, 2.0),
            &Point2::new(2.0, 0.0),
            IntersectMode::Segments,
            false,
            1e-9,
        )
        .unwrap()
        .unwrap();
        assert!((hit.point.x - 1.0).abs() < 1e-12);
        assert!((hit.point.y - 1.0).abs() < 1e-12);
        assert!(!hit.touching);
    }

    #[test]
    fn test_segment_touching_requires_flag() {
        let a1 = Point2::new(0.0, 0.0);
        let a2 = Point2::new(1.0, 0.0);
        let b1 = Point2::new(1.0, 0.0);
        let b2 = Point2::new(1.0, 1.0);
        assert!(intersect(&a1, &a2, &b1, &b2, IntersectMode::Segments, false, 1e-9)
            .unwrap()
            .is_none());
        let hit = intersect(&a1, &a2, &b1, &b2, IntersectMode::Segments, true, 1e-9)
            .unwrap()
            .unwrap();
        assert!(hit.touching);
    }

    #[test]
    fn test_lines_extend_past_segments() {
        let hit = intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(5.0, -1.0),
            &Point2::new(5.0, 1.0),
            IntersectMode::Lines,
            false,
            1e-9,
        )
        .unwrap()
        .unwrap();
        assert!((hit.point.x - 5.0).abs() < 1e-12);
        assert!((hit.t - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_lines_error() {
        let r = intersect(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
            IntersectMode::Lines,
            false,
            1e-9,
        );
        assert_eq!(r, Err(Error::NearlyParallel));
    }

    #[test]
    fn test_incircle() {
        // Unit-ish triangle, counter-clockwise
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        let c = Point2::new(0.0, 2.0);
        // Point near the hypotenuse, inside circumcircle on the far side of bc
        assert!(smart_incircle(&a, &b, &c, &Point2::new(1.9, 1.9)));
        // Far away
        assert!(!smart_incircle(&a, &b, &c, &Point2::new(5.0, 5.0)));
    }

    #[test]
    fn test_rect_epsilon_scales() {
        let small = Rect2D::new(0.0, 0.0, 1.0, 1.0);
        let large = Rect2D::new(0.0, 0.0, 1000.0, 500.0);
        assert!((small.epsilon() - 0.001).abs() < 1e-15);
        assert!((large.epsilon() - 0.5).abs() < 1e-12);
        assert_eq!(Rect2D::empty().epsilon(), EPSILON);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(4.0, 0.0);
        assert!((distance_to_segment(&Point2::new(2.0, 3.0), &a, &b) - 3.0).abs() < 1e-12);
        assert!((distance_to_segment(&Point2::new(-3.0, 4.0), &a, &b) - 5.0).abs() < 1e-12);
    }
}
