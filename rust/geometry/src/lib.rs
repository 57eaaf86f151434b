// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schem-Mesh Geometry
//!
//! Geometry kernels for turning voxel faces into triangles: robust 2D
//! predicates, a polygon boolean engine, a sweep-line constrained Delaunay
//! triangulator, greedy rectangle merging of face layers and the projector
//! for non-cubic block models. Output is collected into material-keyed
//! data sets.

pub mod bool2d;
pub mod custom;
pub mod error;
pub mod mesh;
pub mod polygon;
pub mod primitives;
pub mod squareangulation;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use bool2d::{find_intersections, BooleanOp, Clipper, Containment};
pub use custom::{bucket_faces, CustomBlockData, CustomModelProjector, FaceBucket, FaceOutcome};
pub use error::{Error, ErrorKind, Result};
pub use mesh::{CoordinateShift, DataSet, KeyStruct, MaterialSide, MeshDataSet};
pub use polygon::{split_self_intersections, Location, Polygon, Winding};
pub use primitives::{orient2d, Orientation, Rect2D, EPSILON};
pub use squareangulation::{squareangulate, BlockRange, LayerSlab};
pub use triangulation::{
    triangulate_polygon, BoundaryPolygon, ConstrainedPointSet, PointCloud, Triangulatable,
    Triangulate, Triangulation,
};
