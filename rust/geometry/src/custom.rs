// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Custom-model face projection
//!
//! A non-cubic block is described by a set of boxes. For each of the six
//! sides, every box face pointing that way is projected onto the side's
//! plane and bucketed by its offset along the normal. Faces in one bucket
//! are merged, faces of the opposite side lying in the same plane are cut
//! away (two boxes touching back to back hide each other), and what remains
//! is triangulated.

use crate::bool2d::Clipper;
use crate::error::{Error, Result};
use crate::polygon::{split_self_intersections, Polygon};
use crate::triangulation::{quantize, triangulate_polygon, Triangulation};
use nalgebra::{Point2, Point3, Vector3};
use schem_mesh_core::{Block, BlockCatalog, ModelBox, Neighborhood, Side};
use smallvec::{smallvec, SmallVec};

/// One generated triangle or quad of a custom block
#[derive(Debug, Clone, PartialEq)]
pub struct CustomBlockData {
    /// World-space corners, counter-clockwise in the side's plane
    pub vertices: SmallVec<[Point3<f64>; 4]>,
    pub uvs: SmallVec<[Point2<f64>; 4]>,
    /// Reverse the winding when emitting (faces pointing down an axis)
    pub flip: bool,
    pub texture: String,
    pub block: Block,
    pub position: [i32; 3],
    pub side: Side,
    pub normal: Vector3<f64>,
}

impl CustomBlockData {
    #[inline]
    pub fn is_quad(&self) -> bool {
        self.vertices.len() == 4
    }

    /// Corner indices of the emitted triangles, in output winding
    pub fn triangles(&self) -> SmallVec<[[usize; 3]; 2]> {
        let mut tris: SmallVec<[[usize; 3]; 2]> = if self.is_quad() {
            smallvec![[0, 1, 2], [0, 2, 3]]
        } else {
            smallvec![[0, 1, 2]]
        };
        if self.flip {
            for t in &mut tris {
                t.swap(1, 2);
            }
        }
        tris
    }
}

/// Faces of one side lying in one plane, with the opposite faces in that plane
#[derive(Debug, Clone)]
pub struct FaceBucket {
    pub side: Side,
    /// Position of the plane along the side's axis, block-local
    pub offset: f64,
    pub faces: Vec<Polygon>,
    pub opposite: Vec<Polygon>,
}

/// Projection result of one bucket
#[derive(Debug)]
pub struct FaceOutcome {
    pub side: Side,
    pub offset: f64,
    pub result: Result<Vec<CustomBlockData>>,
}

/// Face rectangle of `model` on `side`, in the side's plane coordinates
pub fn project_box(model: &ModelBox, side: Side) -> Polygon {
    let (u, v) = side.axis().plane_axes();
    let (u, v) = (u.index(), v.index());
    Polygon::rect(model.min[u], model.min[v], model.max[u], model.max[v])
}

/// Group box faces by side and plane offset, in side order then increasing offset
pub fn bucket_faces(boxes: &[ModelBox]) -> Vec<FaceBucket> {
    let mut buckets: Vec<FaceBucket> = Vec::new();
    let mut keys: Vec<(usize, i64)> = Vec::new();
    for side in Side::ALL {
        for model in boxes.iter().filter(|b| b.is_valid()) {
            let offset = model.face_offset(side);
            let key = (side.index(), plane_key(offset));
            let face = project_box(model, side);
            match keys.iter().position(|k| *k == key) {
                Some(i) => buckets[i].faces.push(face),
                None => {
                    keys.push(key);
                    buckets.push(FaceBucket {
                        side,
                        offset,
                        faces: vec![face],
                        opposite: Vec::new(),
                    });
                }
            }
        }
    }

    for bucket in &mut buckets {
        let opposite = bucket.side.opposite();
        let key = plane_key(bucket.offset);
        bucket.opposite = boxes
            .iter()
            .filter(|b| b.is_valid() && plane_key(b.face_offset(opposite)) == key)
            .map(|b| project_box(b, opposite))
            .collect();
    }

    let mut order: Vec<usize> = (0..buckets.len()).collect();
    order.sort_by_key(|&i| keys[i]);
    let mut slots: Vec<Option<FaceBucket>> = buckets.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

#[inline]
fn plane_key(offset: f64) -> i64 {
    quantize(offset, 0.0).0
}

/// Block-local 3D point of plane coordinates `p` on `side` at `offset`
pub fn unproject(side: Side, offset: f64, p: &Point2<f64>) -> Point3<f64> {
    let (u, v) = side.axis().plane_axes();
    let mut c = [0.0; 3];
    c[side.axis().index()] = offset;
    c[u.index()] = p.x;
    c[v.index()] = p.y;
    Point3::new(c[0], c[1], c[2])
}

/// Texture coordinates of a block-local point on `side`
pub fn face_uv(side: Side, local: &Point3<f64>) -> Point2<f64> {
    match side {
        Side::East => Point2::new(1.0 - local.z, local.y),
        Side::West => Point2::new(local.z, local.y),
        Side::South => Point2::new(local.x, local.y),
        Side::North => Point2::new(1.0 - local.x, local.y),
        Side::Top => Point2::new(local.x, 1.0 - local.z),
        Side::Bottom => Point2::new(local.x, local.z),
    }
}

/// Triangulate `polygon`, cutting a self-touching outline into simple
/// pieces first. Holes go to the piece that contains them.
fn triangulate_parts(polygon: &Polygon) -> Result<Vec<Triangulation>> {
    match triangulate_polygon(polygon) {
        Err(Error::NotSimple) => {}
        other => return other.map(|tri| vec![tri]),
    }
    let mut pieces = split_self_intersections(polygon.points());
    tracing::debug!(pieces = pieces.len(), "splitting self-touching face outline");
    for hole in polygon.holes() {
        if let Some(host) = pieces.iter_mut().find(|p| p.contains_polygon(hole)) {
            host.add_hole(hole.clone());
        }
    }
    pieces.iter().map(triangulate_polygon).collect()
}

/// Turns model boxes into visible textured faces
#[derive(Debug, Clone, Default)]
pub struct CustomModelProjector {
    clipper: Clipper,
}

impl CustomModelProjector {
    /// `seed` drives the interior sampling of the boolean engine
    pub fn new(seed: u64) -> Self {
        Self {
            clipper: Clipper::new(seed),
        }
    }

    /// Merged faces of the bucket minus the merged opposite faces
    pub fn visible_polygons(&mut self, bucket: &FaceBucket) -> Result<Vec<Polygon>> {
        let faces = self.clipper.union_all(&bucket.faces)?;
        if bucket.opposite.is_empty() {
            return Ok(faces);
        }
        let cutters = self.clipper.union_all(&bucket.opposite)?;
        self.clipper.subtract_all(faces, &cutters)
    }

    /// Visible faces of one bucket as world-space triangles and quads
    pub fn project_bucket(
        &mut self,
        bucket: &FaceBucket,
        block: Block,
        position: [i32; 3],
        texture: &str,
    ) -> Result<Vec<CustomBlockData>> {
        let side = bucket.side;
        let [nx, ny, nz] = side.normal();
        let base = Vector3::new(position[0] as f64, position[1] as f64, position[2] as f64);
        let emit = |corners: &[Point2<f64>]| {
            let locals: SmallVec<[Point3<f64>; 4]> = corners
                .iter()
                .map(|p| unproject(side, bucket.offset, p))
                .collect();
            CustomBlockData {
                uvs: locals.iter().map(|l| face_uv(side, l)).collect(),
                vertices: locals.iter().map(|l| l + base).collect(),
                flip: !side.is_positive(),
                texture: texture.to_string(),
                block,
                position,
                side,
                normal: Vector3::new(nx as f64, ny as f64, nz as f64),
            }
        };

        let mut out = Vec::new();
        for polygon in self.visible_polygons(bucket)? {
            let polygon = polygon.normalized();
            if polygon.len() == 4 && !polygon.has_holes() {
                out.push(emit(polygon.points()));
                continue;
            }
            for tri in triangulate_parts(&polygon)? {
                for i in 0..tri.len() {
                    out.push(emit(&tri.triangle(i)[..]));
                }
            }
        }
        Ok(out)
    }

    /// Project every face bucket of a custom block. Buckets for which
    /// `hidden(side, offset)` is true are skipped without being computed.
    pub fn project_block<C, H>(
        &mut self,
        catalog: &C,
        neighborhood: &Neighborhood,
        mut hidden: H,
    ) -> Vec<FaceOutcome>
    where
        C: BlockCatalog + ?Sized,
        H: FnMut(Side, f64) -> bool,
    {
        let boxes = catalog.model_boxes(neighborhood);
        let block = neighborhood.block;
        bucket_faces(&boxes)
            .into_iter()
            .filter(|bucket| !hidden(bucket.side, bucket.offset))
            .map(|bucket| {
                let texture = catalog.texture_for(block, bucket.side);
                let result =
                    self.project_bucket(&bucket, block, neighborhood.position, &texture);
                FaceOutcome {
                    side: bucket.side,
                    offset: bucket.offset,
                    result,
                }
            })
            .collect()
    }
}
