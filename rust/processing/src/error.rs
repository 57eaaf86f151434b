// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end an export job
#[derive(Error, Debug)]
pub enum Error {
    #[error("Data error: {0}")]
    Core(#[from] schem_mesh_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] schem_mesh_geometry::Error),

    #[error("Export cancelled")]
    Cancelled,

    #[error("Export worker panicked")]
    WorkerPanicked,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the job stopped because it was asked to
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
