// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use schem_mesh_core::{
    Block, BlockCatalog, BlockInfo, BlockTable, Dimensions, ModelBox, Neighborhood, Side,
    VoxelGrid, VoxelSource,
};

const STONE: Block = Block::new(1, 0);
const PANE: Block = Block::new(102, 0);

fn pane_table() -> BlockTable {
    let post = ModelBox::from_pixels([7.0, 0.0, 7.0], [9.0, 16.0, 9.0]);
    BlockTable::new()
        .with(1, None, BlockInfo::cube("stone", "stone"))
        .with(
            102,
            None,
            BlockInfo::cube("glass_pane", "glass")
                .transparent()
                .with_model([post])
                .with_connection(Side::East, ModelBox::from_pixels([9.0, 0.0, 7.0], [16.0, 16.0, 9.0]))
                .with_connection(Side::West, ModelBox::from_pixels([0.0, 0.0, 7.0], [7.0, 16.0, 9.0])),
        )
}

#[test]
fn neighborhood_follows_side_order() {
    let mut grid = VoxelGrid::new(3, 3, 3).unwrap();
    grid.set_block(2, 1, 1, Block::new(5, 0));
    grid.set_block(1, 2, 1, Block::new(6, 0));
    grid.set_block(1, 1, 2, Block::new(7, 0));

    let around = grid.neighborhood(1, 1, 1);
    assert_eq!(around[Side::East.index()], Block::new(5, 0));
    assert_eq!(around[Side::Top.index()], Block::new(6, 0));
    assert_eq!(around[Side::South.index()], Block::new(7, 0));
    assert_eq!(around[Side::West.index()], Block::AIR);

    // The border reads air outside the grid
    let corner = grid.neighborhood(0, 0, 0);
    assert_eq!(corner[Side::West.index()], Block::AIR);
    assert_eq!(corner[Side::Bottom.index()], Block::AIR);
}

#[test]
fn pane_connects_to_solid_neighbours() {
    let mut grid = VoxelGrid::new(3, 1, 1).unwrap();
    grid.set_block(0, 0, 0, STONE);
    grid.set_block(1, 0, 0, PANE);
    let table = pane_table();

    let neighborhood = Neighborhood {
        block: PANE,
        position: [1, 0, 0],
        neighbors: grid.neighborhood(1, 0, 0),
    };
    let boxes = table.model_boxes(&neighborhood);
    assert_eq!(boxes.len(), 2);
    assert!(boxes.iter().any(|b| b.min[0] == 0.0));
    assert!(table.is_custom_model(PANE));
    assert!(table.is_transparent(PANE));
    assert!(!table.is_full_cube(PANE, Side::West));
    assert!(table.is_full_cube(STONE, Side::East));
}

#[test]
fn dimensions_cover_the_grid() {
    let dims = Dimensions::new(4, 2, 3).unwrap();
    let grid = VoxelGrid::new(dims.width, dims.height, dims.length).unwrap();
    assert_eq!(grid.dimensions(), dims);
    assert_eq!(grid.blocks().len(), 24);

    let shell = (0..2)
        .flat_map(|y| (0..3).flat_map(move |z| (0..4).map(move |x| (x, y, z))))
        .filter(|&(x, y, z)| dims.is_on_shell(x, y, z))
        .count();
    // Height 2 puts every position on the shell
    assert_eq!(shell, 24);
    assert!(!dims.contains(4, 0, 0));
}
