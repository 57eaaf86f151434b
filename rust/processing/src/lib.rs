// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Schem-Mesh Processing
//!
//! Turns a voxel region into a textured triangle mesh:
//!
//! - **Visibility**: which block faces are exported ([`Visibility`])
//! - **Assembly**: per-direction layer sweeps, rectangle merging and custom
//!   model projection into a [`MeshDataSet`](schem_mesh_geometry::MeshDataSet)
//!   ([`MeshAssembler`], [`export_mesh`])
//! - **Jobs**: exports on a worker thread with progress and cancellation
//!   ([`ExportJob`], [`ExportHandle`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schem_mesh_core::{Block, BlockInfo, BlockTable, ExportConfig, VoxelGrid};
//! use schem_mesh_processing::export_mesh;
//!
//! let mut grid = VoxelGrid::new(4, 4, 4)?;
//! grid.fill([0, 0, 0], [3, 0, 3], Block::new(1, 0));
//! let catalog = BlockTable::new().with(1, None, BlockInfo::cube("stone", "stone"));
//!
//! let output = export_mesh(&grid, &catalog, &ExportConfig::default())?;
//! println!("{} triangles", output.summary.triangles);
//! ```

pub mod assembly;
pub mod cancel;
pub mod config;
pub mod error;
pub mod job;
pub mod progress;
pub mod visibility;

pub use assembly::{export_mesh, ExportOutput, ExportSummary, MeshAssembler};
pub use cancel::CancellationToken;
pub use config::{load_block_table, load_config, parse_block_table, parse_config, validate_config};
pub use error::{Error, Result};
pub use job::{ExportHandle, ExportJob};
pub use progress::{ChannelProgress, NoProgress, ProgressSink, ProgressUpdate};
pub use visibility::Visibility;
