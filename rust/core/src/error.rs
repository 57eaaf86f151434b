// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or querying the voxel data model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid grid dimensions {width}x{height}x{length}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        length: usize,
    },

    #[error("Block count mismatch: expected {expected}, got {actual}")]
    BlockCountMismatch { expected: usize, actual: usize },

    #[error("Unknown block side: {0}")]
    UnknownSide(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}
