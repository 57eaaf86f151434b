// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh assembly
//!
//! Full-cube faces are swept one face direction at a time: every layer along
//! the direction's axis becomes a [`LayerSlab`] of visible faces, which is
//! merged into rectangles and emitted as quads. Custom-model blocks are then
//! projected block by block. All triangles land in a [`MeshDataSet`] keyed by
//! block and side.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::progress::{percent, NoProgress, ProgressSink};
use crate::visibility::Visibility;
use schem_mesh_core::{
    Axis, BlockCatalog, ErrorPolicy, ExportConfig, Neighborhood, Side, VoxelSource,
};
use schem_mesh_geometry::custom::{face_uv, unproject};
use schem_mesh_geometry::{
    squareangulate, BlockRange, CoordinateShift, CustomBlockData, CustomModelProjector,
    KeyStruct, LayerSlab, MeshDataSet, Point2, Vector3,
};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters of one export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Rectangles emitted for full-cube faces
    pub quads: usize,
    /// Triangles and quads emitted for custom models
    pub custom_faces: usize,
    /// Custom face buckets dropped under [`ErrorPolicy::SkipFace`]
    pub skipped_faces: usize,
    pub triangles: usize,
    pub vertices: usize,
    pub data_sets: usize,
}

/// Finished mesh of one export
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub mesh: MeshDataSet,
    pub summary: ExportSummary,
    /// Translation applied by centering; zero when centering is off
    pub shift: CoordinateShift,
}

/// Builds the mesh of a voxel source
pub struct MeshAssembler<'a, S: ?Sized, C: ?Sized> {
    source: &'a S,
    catalog: &'a C,
    config: &'a ExportConfig,
    progress: &'a dyn ProgressSink,
    cancel: CancellationToken,
}

impl<'a, S, C> MeshAssembler<'a, S, C>
where
    S: VoxelSource + ?Sized,
    C: BlockCatalog + ?Sized,
{
    pub fn new(source: &'a S, catalog: &'a C, config: &'a ExportConfig) -> Self {
        Self {
            source,
            catalog,
            config,
            progress: &NoProgress,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the export to completion
    pub fn assemble(&self) -> Result<ExportOutput> {
        let start = Instant::now();
        let dims = self.source.dimensions();
        info!(
            width = dims.width,
            height = dims.height,
            length = dims.length,
            optimize = self.config.optimize,
            "Starting mesh export"
        );

        let visibility = Visibility::new(self.source, self.catalog, self.config);
        let mut mesh = MeshDataSet::new(self.config.export_normals, self.config.export_uvs);
        let mut summary = ExportSummary::default();

        // One progress step per layer of every direction plus one per custom row
        let total = Side::ALL
            .iter()
            .map(|side| dims.extent(side.axis().index()))
            .sum::<usize>()
            + dims.height;
        let mut done = 0;

        for side in Side::ALL {
            let axis = side.axis();
            let (u_axis, v_axis) = axis.plane_axes();
            let depth = dims.extent(axis.index());
            let mut slab = LayerSlab::new(dims.extent(u_axis.index()), dims.extent(v_axis.index()));
            let label = format!("Exporting {side} faces");
            let mut quads = 0;

            for layer in 0..depth {
                self.cancel.check()?;
                self.progress
                    .report(percent(done, total), percent(layer, depth), &label);
                done += 1;

                slab.clear();
                for v in 0..slab.height() {
                    for u in 0..slab.width() {
                        let [x, y, z] = cell_position(axis, layer, u, v);
                        if let Some(block) = visibility.full_face(x, y, z, side) {
                            slab.set(u, v, Some(block));
                        }
                    }
                }
                if slab.is_empty() {
                    continue;
                }
                for range in squareangulate(&slab, self.config.optimize) {
                    self.emit_range(&mut mesh, side, layer, &range);
                    quads += 1;
                }
            }

            debug!(side = %side, quads, "Face direction done");
            summary.quads += quads;
        }

        self.project_custom(&visibility, &mut mesh, &mut summary, &mut done, total)?;

        let shift = if self.config.center_object {
            let shift = mesh.center();
            debug!(x = shift.x, y = shift.y, z = shift.z, "Centered mesh");
            shift
        } else {
            CoordinateShift::default()
        };

        summary.triangles = mesh.triangle_count();
        summary.vertices = mesh.vertex_count();
        summary.data_sets = mesh.len();
        self.progress.report(100, 100, "Export finished");

        info!(
            data_sets = summary.data_sets,
            triangles = summary.triangles,
            quads = summary.quads,
            custom_faces = summary.custom_faces,
            skipped_faces = summary.skipped_faces,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Mesh export finished"
        );

        Ok(ExportOutput {
            mesh,
            summary,
            shift,
        })
    }

    /// Emit one merged rectangle of a layer as a quad
    fn emit_range(&self, mesh: &mut MeshDataSet, side: Side, layer: usize, range: &BlockRange) {
        let axis = side.axis();
        let offset = layer as f64 + if side.is_positive() { 1.0 } else { 0.0 };
        let (u0, v0) = (range.from[0] as f64, range.from[1] as f64);
        let (u1, v1) = ((range.to[0] + 1) as f64, (range.to[1] + 1) as f64);
        let corners = [
            Point2::new(u0, v0),
            Point2::new(u1, v0),
            Point2::new(u1, v1),
            Point2::new(u0, v1),
        ]
        .map(|p| unproject(side, offset, &p));

        // Texture repeats once per block across a merged rectangle
        let [ox, oy, oz] = cell_position(axis, layer, range.from[0], range.from[1]);
        let origin = Vector3::new(ox as f64, oy as f64, oz as f64);
        let uvs = corners.map(|c| face_uv(side, &(c - origin)));

        let block = range.block;
        let key = KeyStruct::new(block, side, self.catalog.uses_single_texture(block));
        mesh.entry(key, || self.catalog.texture_for(block, side).into_owned())
            .add_quad(corners, uvs, &side_normal(side), !side.is_positive());
    }

    fn project_custom(
        &self,
        visibility: &Visibility<'_, S, C>,
        mesh: &mut MeshDataSet,
        summary: &mut ExportSummary,
        done: &mut usize,
        total: usize,
    ) -> Result<()> {
        let dims = self.source.dimensions();
        let mut projector = CustomModelProjector::new(self.config.rng_seed);
        let mut blocks = 0usize;

        for y in 0..dims.height as i32 {
            self.progress.report(
                percent(*done, total),
                percent(y as usize, dims.height),
                "Exporting custom models",
            );
            *done += 1;

            for z in 0..dims.length as i32 {
                for x in 0..dims.width as i32 {
                    let block = self.source.block(x, y, z);
                    if block.is_air()
                        || !self.catalog.is_custom_model(block)
                        || !visibility.block_included(x, y, z)
                    {
                        continue;
                    }
                    self.cancel.check()?;
                    blocks += 1;

                    let neighborhood = Neighborhood {
                        block,
                        position: [x, y, z],
                        neighbors: self.source.neighborhood(x, y, z),
                    };
                    let outcomes =
                        projector.project_block(self.catalog, &neighborhood, |side, offset| {
                            visibility.custom_plane_hidden(x, y, z, side, offset)
                        });

                    for outcome in outcomes {
                        match outcome.result {
                            Ok(faces) => {
                                for face in &faces {
                                    self.emit_custom(mesh, face);
                                }
                                summary.custom_faces += faces.len();
                            }
                            Err(err) => match self.config.error_policy {
                                ErrorPolicy::Abort => return Err(err.into()),
                                ErrorPolicy::SkipFace => {
                                    warn!(
                                        block = %self.catalog.block_name(block),
                                        x,
                                        y,
                                        z,
                                        side = %outcome.side,
                                        offset = outcome.offset,
                                        error = %err,
                                        "Skipping custom face"
                                    );
                                    summary.skipped_faces += 1;
                                }
                            },
                        }
                    }
                }
            }
        }

        debug!(
            blocks,
            custom_faces = summary.custom_faces,
            skipped_faces = summary.skipped_faces,
            "Custom models done"
        );
        Ok(())
    }

    fn emit_custom(&self, mesh: &mut MeshDataSet, face: &CustomBlockData) {
        let key = KeyStruct::new(
            face.block,
            face.side,
            self.catalog.uses_single_texture(face.block),
        );
        let set = mesh.entry(key, || face.texture.clone());
        for [a, b, c] in face.triangles() {
            set.add_triangle(
                [face.vertices[a], face.vertices[b], face.vertices[c]],
                [face.uvs[a], face.uvs[b], face.uvs[c]],
                &face.normal,
            );
        }
    }
}

/// Export a voxel source without progress reporting or cancellation
pub fn export_mesh<S, C>(source: &S, catalog: &C, config: &ExportConfig) -> Result<ExportOutput>
where
    S: VoxelSource + ?Sized,
    C: BlockCatalog + ?Sized,
{
    MeshAssembler::new(source, catalog, config).assemble()
}

/// Grid position of cell `(u, v)` in layer `layer` along `axis`
fn cell_position(axis: Axis, layer: usize, u: usize, v: usize) -> [i32; 3] {
    let (u_axis, v_axis) = axis.plane_axes();
    let mut c = [0i32; 3];
    c[axis.index()] = layer as i32;
    c[u_axis.index()] = u as i32;
    c[v_axis.index()] = v as i32;
    c
}

#[inline]
fn side_normal(side: Side) -> Vector3<f64> {
    let [x, y, z] = side.normal();
    Vector3::new(x as f64, y as f64, z as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_relative_eq;
    use schem_mesh_core::{Block, BlockInfo, BlockTable, ModelBox, VoxelGrid};
    use schem_mesh_geometry::{DataSet, MaterialSide};
    use std::sync::Mutex;

    const STONE: Block = Block::new(1, 0);
    const DIRT: Block = Block::new(3, 0);
    const LOG: Block = Block::new(17, 0);
    const SLAB: Block = Block::new(44, 0);

    fn table() -> BlockTable {
        BlockTable::new()
            .with(1, None, BlockInfo::cube("stone", "stone"))
            .with(3, None, BlockInfo::cube("dirt", "dirt"))
            .with(17, None, BlockInfo::column("log", "log_top", "log_top", "log_side"))
            .with(
                44,
                None,
                BlockInfo::cube("slab", "stone_slab")
                    .with_model([ModelBox::new([0.0; 3], [1.0, 0.5, 1.0])]),
            )
    }

    fn grid(width: usize, height: usize, length: usize, blocks: &[([i32; 3], Block)]) -> VoxelGrid {
        let mut grid = VoxelGrid::new(width, height, length).unwrap();
        for &([x, y, z], block) in blocks {
            grid.set_block(x, y, z, block);
        }
        grid
    }

    fn unoptimized() -> ExportConfig {
        ExportConfig {
            optimize: false,
            ..ExportConfig::default()
        }
    }

    fn triangle_normal(set: &DataSet, t: usize) -> Vector3<f64> {
        let (a, b, c) = (set.position(t * 3), set.position(t * 3 + 1), set.position(t * 3 + 2));
        (b - a).cross(&(c - a))
    }

    fn total_area(mesh: &MeshDataSet) -> f64 {
        mesh.iter()
            .map(|set| {
                (0..set.triangle_count())
                    .map(|t| triangle_normal(set, t).norm() * 0.5)
                    .sum::<f64>()
            })
            .sum()
    }

    #[test]
    fn test_single_cube() {
        let grid = grid(1, 1, 1, &[([0, 0, 0], STONE)]);
        let output = export_mesh(&grid, &table(), &ExportConfig::default()).unwrap();

        assert_eq!(output.summary.quads, 6);
        assert_eq!(output.summary.triangles, 12);
        assert_eq!(output.summary.data_sets, 1);
        assert_eq!(output.mesh.texture_names(), vec!["stone"]);
        assert_relative_eq!(total_area(&output.mesh), 6.0, epsilon = 1e-6);
        assert!(output.shift.is_zero());
    }

    #[test]
    fn test_winding_matches_normals() {
        let grid = grid(2, 2, 1, &[([0, 0, 0], STONE), ([1, 0, 0], STONE), ([0, 1, 0], STONE)]);
        let output = export_mesh(&grid, &table(), &ExportConfig::default()).unwrap();
        for set in output.mesh.iter() {
            for t in 0..set.triangle_count() {
                let n = triangle_normal(set, t).normalize();
                let stored = &set.normals()[t * 9..t * 9 + 3];
                assert_relative_eq!(n.x, stored[0] as f64, epsilon = 1e-6);
                assert_relative_eq!(n.y, stored[1] as f64, epsilon = 1e-6);
                assert_relative_eq!(n.z, stored[2] as f64, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_row_merges_when_optimized() {
        let grid = grid(2, 1, 1, &[([0, 0, 0], STONE), ([1, 0, 0], STONE)]);
        let catalog = table();

        let merged = export_mesh(&grid, &catalog, &ExportConfig::default()).unwrap();
        assert_eq!(merged.summary.quads, 6);
        assert_eq!(merged.summary.triangles, 12);

        let split = export_mesh(&grid, &catalog, &unoptimized()).unwrap();
        assert_eq!(split.summary.quads, 10);
        assert_eq!(split.summary.triangles, 20);

        assert_relative_eq!(total_area(&merged.mesh), 10.0, epsilon = 1e-6);
        assert_relative_eq!(total_area(&split.mesh), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_different_blocks_do_not_merge() {
        let grid = grid(2, 1, 1, &[([0, 0, 0], STONE), ([1, 0, 0], DIRT)]);
        let output = export_mesh(&grid, &table(), &ExportConfig::default()).unwrap();
        assert_eq!(output.summary.quads, 10);
        assert_eq!(output.summary.data_sets, 2);
    }

    #[test]
    fn test_solid_box_has_no_interior_faces() {
        let mut grid = VoxelGrid::new(3, 3, 3).unwrap();
        grid.fill([0, 0, 0], [2, 2, 2], STONE);
        let catalog = table();

        let merged = export_mesh(&grid, &catalog, &ExportConfig::default()).unwrap();
        assert_eq!(merged.summary.quads, 6);

        let split = export_mesh(&grid, &catalog, &unoptimized()).unwrap();
        assert_eq!(split.summary.quads, 54);
        assert_relative_eq!(total_area(&split.mesh), 54.0, epsilon = 1e-6);
    }

    #[test]
    fn test_column_textures_split_data_sets() {
        let grid = grid(1, 1, 1, &[([0, 0, 0], LOG)]);
        let output = export_mesh(&grid, &table(), &ExportConfig::default()).unwrap();
        assert_eq!(output.summary.data_sets, 6);

        let top = output
            .mesh
            .get(&KeyStruct {
                block: LOG,
                side: MaterialSide::Side(Side::Top),
            })
            .unwrap();
        assert_eq!(top.texture(), "log_top");
        assert_eq!(top.triangle_count(), 2);
        assert!(output.mesh.texture_names().contains(&"log_side"));
    }

    #[test]
    fn test_merged_uvs_tile_per_block() {
        let grid = grid(3, 1, 1, &[([0, 0, 0], STONE), ([1, 0, 0], STONE), ([2, 0, 0], STONE)]);
        let output = export_mesh(&grid, &table(), &ExportConfig::default()).unwrap();
        let set = output.mesh.iter().next().unwrap();
        let max_u = set
            .uvs()
            .chunks_exact(2)
            .map(|uv| uv[0].abs().max(uv[1].abs()))
            .fold(0.0f32, f32::max);
        assert_relative_eq!(max_u, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_slab_on_stone() {
        let grid = grid(1, 2, 1, &[([0, 0, 0], STONE), ([0, 1, 0], SLAB)]);
        let output = export_mesh(&grid, &table(), &ExportConfig::default()).unwrap();

        // Slab bottom and stone top cover each other
        assert_eq!(output.summary.quads, 5);
        assert_eq!(output.summary.custom_faces, 5);
        assert_eq!(output.summary.skipped_faces, 0);
        assert_relative_eq!(total_area(&output.mesh), 5.0 + 1.0 + 4.0 * 0.5, epsilon = 1e-6);

        let bounds = output.mesh.bounds().unwrap();
        assert_relative_eq!(bounds.1.y, 1.5, epsilon = 1e-6);
    }

    #[test]
    fn test_centering() {
        let grid = grid(2, 1, 1, &[([0, 0, 0], STONE), ([1, 0, 0], STONE)]);
        let config = ExportConfig {
            center_object: true,
            ..ExportConfig::default()
        };
        let output = export_mesh(&grid, &table(), &config).unwrap();

        assert_relative_eq!(output.shift.x, 1.0);
        assert_relative_eq!(output.shift.y, 0.5);
        assert_relative_eq!(output.shift.z, 0.5);
        let (min, max) = output.mesh.bounds().unwrap();
        assert_relative_eq!(min.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(max.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(min.y, -0.5, epsilon = 1e-6);
        assert_relative_eq!(max.z, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_toggles_drop_normals_and_uvs() {
        let grid = grid(1, 1, 1, &[([0, 0, 0], STONE)]);
        let config = ExportConfig {
            export_normals: false,
            export_uvs: false,
            ..ExportConfig::default()
        };
        let output = export_mesh(&grid, &table(), &config).unwrap();
        let set = output.mesh.iter().next().unwrap();
        assert_eq!(set.positions().len(), 12 * 3 * 3);
        assert!(set.normals().is_empty());
        assert!(set.uvs().is_empty());
    }

    #[test]
    fn test_empty_grid() {
        let grid = VoxelGrid::new(4, 4, 4).unwrap();
        let output = export_mesh(&grid, &table(), &ExportConfig::default()).unwrap();
        assert!(output.mesh.is_empty());
        assert_eq!(output.summary, ExportSummary::default());
    }

    #[test]
    fn test_cancelled_before_start() {
        let grid = grid(1, 1, 1, &[([0, 0, 0], STONE)]);
        let catalog = table();
        let config = ExportConfig::default();
        let token = CancellationToken::new();
        token.cancel();
        let result = MeshAssembler::new(&grid, &catalog, &config)
            .with_cancellation(token)
            .assemble();
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_cancel_from_progress_sink() {
        let grid = grid(2, 2, 2, &[([0, 0, 0], STONE)]);
        let catalog = table();
        let config = ExportConfig::default();
        let token = CancellationToken::new();
        let remote = token.clone();
        let sink = move |_overall: u8, _sub: u8, label: &str| {
            if label.contains("top") {
                remote.cancel();
            }
        };
        let result = MeshAssembler::new(&grid, &catalog, &config)
            .with_progress(&sink)
            .with_cancellation(token)
            .assemble();
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_progress_reaches_completion() {
        let grid = grid(2, 2, 2, &[([0, 0, 0], STONE)]);
        let catalog = table();
        let config = ExportConfig::default();
        let seen = Mutex::new(Vec::new());
        let sink = |overall: u8, _sub: u8, label: &str| {
            seen.lock().unwrap().push((overall, label.to_string()));
        };
        MeshAssembler::new(&grid, &catalog, &config)
            .with_progress(&sink)
            .assemble()
            .unwrap();

        let seen = seen.into_inner().unwrap();
        // 6 directions x 2 layers, 2 custom rows, final report
        assert_eq!(seen.len(), 15);
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(seen.last().unwrap(), &(100, "Export finished".to_string()));
    }
}
