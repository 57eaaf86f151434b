// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Schem-Mesh Core
//!
//! Data model shared by the schematic meshing crates:
//!
//! - **Voxel grid**: a dense, read-only array of `(id, metadata)` blocks with
//!   air returned for every out-of-range read ([`VoxelGrid`], [`VoxelSource`])
//! - **Block catalog**: the narrow lookup interface the mesher uses to learn
//!   about block types ([`BlockCatalog`]), with a map-backed implementation
//!   ([`BlockTable`])
//! - **Export configuration**: the toggles of one export job ([`ExportConfig`])
//!
//! ## Feature Flags
//!
//! - `serde`: serialization for configuration and block tables

pub mod block;
pub mod catalog;
pub mod config;
pub mod error;
pub mod grid;

pub use block::{Axis, Block, Side};
pub use catalog::{
    BlockCatalog, BlockEntry, BlockInfo, BlockTable, Connection, ModelBox, Neighborhood,
    SideTextures,
};
pub use config::{ErrorPolicy, ExportConfig};
pub use error::{Error, Result};
pub use grid::{Dimensions, VoxelGrid, VoxelSource};
