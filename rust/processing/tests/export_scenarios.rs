// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end exports of small scenes

use approx::assert_relative_eq;
use schem_mesh_core::{Block, BlockTable, ExportConfig, VoxelGrid};
use schem_mesh_geometry::{MeshDataSet, Vector3};
use schem_mesh_processing::{export_mesh, parse_block_table, ChannelProgress, ExportJob};
use std::sync::Arc;

const STONE: Block = Block::new(1, 0);
const DIRT: Block = Block::new(3, 0);
const SLAB: Block = Block::new(44, 0);
const STAIRS: Block = Block::new(53, 0);
const FENCE: Block = Block::new(85, 0);

const BLOCKS_JSON: &str = r#"[
    {"id": 1, "name": "stone", "textures": "stone"},
    {"id": 3, "name": "dirt", "textures": "dirt"},
    {"id": 44, "name": "stone_slab", "textures": {"top": "slab_top", "bottom": "slab_top", "side": "slab_side"},
     "model": [{"min": [0.0, 0.0, 0.0], "max": [1.0, 0.5, 1.0]}]},
    {"id": 53, "name": "oak_stairs", "textures": "oak_planks",
     "model": [{"min": [0.0, 0.0, 0.0], "max": [1.0, 0.5, 1.0]},
               {"min": [0.0, 0.5, 0.5], "max": [1.0, 1.0, 1.0]}]},
    {"id": 85, "name": "fence", "textures": "oak_planks",
     "model": [{"min": [0.375, 0.0, 0.375], "max": [0.625, 1.0, 0.625]}],
     "connections": [
        {"side": "east", "box": {"min": [0.625, 0.375, 0.4375], "max": [1.0, 0.5625, 0.5625]}},
        {"side": "west", "box": {"min": [0.0, 0.375, 0.4375], "max": [0.375, 0.5625, 0.5625]}}
     ]}
]"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn catalog() -> BlockTable {
    parse_block_table(BLOCKS_JSON).unwrap()
}

fn triangle_normal(mesh: &MeshDataSet) -> impl Iterator<Item = (Vector3<f64>, [f32; 3])> + '_ {
    mesh.iter().flat_map(|set| {
        (0..set.triangle_count()).map(move |t| {
            let (a, b, c) = (set.position(t * 3), set.position(t * 3 + 1), set.position(t * 3 + 2));
            let n = &set.normals()[t * 9..t * 9 + 3];
            ((b - a).cross(&(c - a)), [n[0], n[1], n[2]])
        })
    })
}

fn area(mesh: &MeshDataSet) -> f64 {
    triangle_normal(mesh).map(|(n, _)| n.norm() * 0.5).sum()
}

fn assert_windings(mesh: &MeshDataSet) {
    for (n, stored) in triangle_normal(mesh) {
        let n = n.normalize();
        assert_relative_eq!(n.x, stored[0] as f64, epsilon = 1e-5);
        assert_relative_eq!(n.y, stored[1] as f64, epsilon = 1e-5);
        assert_relative_eq!(n.z, stored[2] as f64, epsilon = 1e-5);
    }
}

fn hollow_box() -> VoxelGrid {
    let mut grid = VoxelGrid::new(5, 5, 5).unwrap();
    grid.fill([0, 0, 0], [4, 4, 4], STONE);
    grid.fill([1, 1, 1], [3, 3, 3], Block::AIR);
    grid
}

#[test]
fn hollow_box_exports_both_shells() {
    init_tracing();
    let output = export_mesh(&hollow_box(), &catalog(), &ExportConfig::default()).unwrap();

    assert_eq!(output.summary.quads, 12);
    assert_eq!(output.summary.triangles, 24);
    assert_relative_eq!(area(&output.mesh), 6.0 * 25.0 + 6.0 * 9.0, epsilon = 1e-6);
    assert_windings(&output.mesh);
}

#[test]
fn interior_only_drops_the_shell() {
    let config = ExportConfig {
        interior_only: true,
        ..ExportConfig::default()
    };
    let output = export_mesh(&hollow_box(), &catalog(), &config).unwrap();
    assert!(output.mesh.is_empty());
}

#[test]
fn edge_exclusion_keeps_only_the_cavity() {
    let config = ExportConfig {
        exclude_edge_faces: true,
        ..ExportConfig::default()
    };
    let output = export_mesh(&hollow_box(), &catalog(), &config).unwrap();
    assert_eq!(output.summary.quads, 6);
    assert_relative_eq!(area(&output.mesh), 54.0, epsilon = 1e-6);
}

#[test]
fn checkerboard_never_merges() {
    let mut grid = VoxelGrid::new(4, 1, 4).unwrap();
    for x in 0..4 {
        for z in 0..4 {
            let block = if (x + z) % 2 == 0 { STONE } else { DIRT };
            grid.set_block(x, 0, z, block);
        }
    }
    let catalog = catalog();
    let merged = export_mesh(&grid, &catalog, &ExportConfig::default()).unwrap();
    let split = export_mesh(
        &grid,
        &catalog,
        &ExportConfig {
            optimize: false,
            ..ExportConfig::default()
        },
    )
    .unwrap();

    // 16 top + 16 bottom + 4 per outer side
    assert_eq!(merged.summary.quads, 48);
    assert_eq!(split.summary.quads, 48);
    assert_eq!(merged.summary.data_sets, 2);
}

#[test]
fn custom_models_in_a_scene() {
    init_tracing();
    let mut grid = VoxelGrid::new(4, 2, 1).unwrap();
    grid.fill([0, 0, 0], [3, 0, 0], STONE);
    grid.set_block(0, 1, 0, SLAB);
    grid.set_block(1, 1, 0, STAIRS);
    grid.set_block(2, 1, 0, FENCE);
    grid.set_block(3, 1, 0, FENCE);

    let output = export_mesh(&grid, &catalog(), &ExportConfig::default()).unwrap();
    assert_eq!(output.summary.skipped_faces, 0);
    assert!(output.summary.custom_faces > 0);
    assert_windings(&output.mesh);

    let textures = output.mesh.texture_names();
    for name in ["stone", "slab_top", "slab_side", "oak_planks"] {
        assert!(textures.contains(&name), "missing texture {name}");
    }

    let (min, max) = output.mesh.bounds().unwrap();
    assert_relative_eq!(min.y, 0.0, epsilon = 1e-6);
    assert_relative_eq!(max.y, 2.0, epsilon = 1e-6);
    assert_relative_eq!(max.x, 4.0, epsilon = 1e-6);
}

#[test]
fn slab_area_matches_its_surface() {
    let mut grid = VoxelGrid::new(1, 1, 1).unwrap();
    grid.set_block(0, 0, 0, SLAB);
    let output = export_mesh(&grid, &catalog(), &ExportConfig::default()).unwrap();
    assert_eq!(output.summary.custom_faces, 6);
    assert_relative_eq!(area(&output.mesh), 2.0 + 4.0 * 0.5, epsilon = 1e-6);
}

#[test]
fn job_matches_direct_export() {
    init_tracing();
    let grid = Arc::new(hollow_box());
    let catalog = Arc::new(catalog());
    let direct = export_mesh(&*grid, &*catalog, &ExportConfig::default()).unwrap();

    let (sink, rx) = ChannelProgress::channel();
    let handle = ExportJob::new(grid, catalog, ExportConfig::default())
        .with_progress(sink)
        .spawn()
        .unwrap();
    let output = handle.join().unwrap();

    assert_eq!(output.summary, direct.summary);
    let labels: Vec<String> = rx.try_iter().map(|u| u.label).collect();
    assert!(labels.iter().any(|l| l.contains("top")));
    assert_eq!(labels.last().map(String::as_str), Some("Export finished"));
}
