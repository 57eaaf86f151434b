// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a geometry failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input polygon is degenerate; skipping it is safe
    DegenerateInput,
    /// A boolean trace did not close; retrying reproduces the failure
    NonConvergence,
    /// The triangulation topology became inconsistent; no partial result exists
    TriangulationInvariant,
    /// Two constraint edges cross; the input cannot be triangulated as given
    ConstraintConflict,
}

/// Errors that can occur during geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Not enough vertices: {0} (need at least 3)")]
    NotEnoughVertices(usize),

    #[error("Polygon area too small: {0:e}")]
    AreaTooSmall(f64),

    #[error("Sides too close to parallel")]
    NearlyParallel,

    #[error("Polygon is self-intersecting")]
    NotSimple,

    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("Infinite loop while tracing boolean result after {steps} steps (malformed input)")]
    InfiniteLoop { steps: usize },

    #[error("Point ({x}, {y}) lies on a constrained edge")]
    PointOnConstrainedEdge { x: f64, y: f64 },

    #[error("Constraint edges intersect near ({x}, {y})")]
    IntersectingConstraints { x: f64, y: f64 },

    #[error("Missing neighbor triangle during {0}")]
    MissingNeighbor(&'static str),

    #[error("Triangulation internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotEnoughVertices(_)
            | Error::AreaTooSmall(_)
            | Error::NearlyParallel
            | Error::NotSimple
            | Error::InvalidPolygon(_) => ErrorKind::DegenerateInput,
            Error::InfiniteLoop { .. } => ErrorKind::NonConvergence,
            Error::PointOnConstrainedEdge { .. }
            | Error::MissingNeighbor(_)
            | Error::Internal(_) => ErrorKind::TriangulationInvariant,
            Error::IntersectingConstraints { .. } => ErrorKind::ConstraintConflict,
        }
    }

    /// True for errors caused by the input geometry rather than a bug or corrupt state
    #[inline]
    pub fn is_degenerate_input(&self) -> bool {
        self.kind() == ErrorKind::DegenerateInput
    }
}
