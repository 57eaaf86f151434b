// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block descriptor catalog
//!
//! The mesher never embeds block semantics. Everything it needs to know about
//! a block type (whether a side is a full square, transparency, textures, and
//! the box shape of non-cubic models) comes through [`BlockCatalog`].
//!
//! [`BlockTable`] is the bundled implementation: a map keyed by
//! `(id, Option<metadata>)` where a metadata-specific entry overrides the
//! id-wide one.

use crate::block::{Block, Side};
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::borrow::Cow;

/// Axis-aligned box in block-local coordinates (a full cube is `0..1` on every axis)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl ModelBox {
    #[inline]
    pub const fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// The unit cube
    #[inline]
    pub const fn full() -> Self {
        Self::new([0.0; 3], [1.0; 3])
    }

    /// Build from pixel coordinates on the usual 16-unit model grid
    pub fn from_pixels(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::new(
            [min[0] / 16.0, min[1] / 16.0, min[2] / 16.0],
            [max[0] / 16.0, max[1] / 16.0, max[2] / 16.0],
        )
    }

    /// A box has volume on every axis
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.max[i] > self.min[i])
    }

    /// Coordinate of the plane holding the face of this box that points along `side`
    #[inline]
    pub fn face_offset(&self, side: Side) -> f64 {
        let axis = side.axis().index();
        if side.is_positive() {
            self.max[axis]
        } else {
            self.min[axis]
        }
    }

    /// The face on `side` lies on the block boundary and spans the whole unit square
    pub fn covers_face(&self, side: Side) -> bool {
        const TOLERANCE: f64 = 1e-9;
        let boundary = if side.is_positive() { 1.0 } else { 0.0 };
        if (self.face_offset(side) - boundary).abs() > TOLERANCE {
            return false;
        }
        let (u, v) = side.axis().plane_axes();
        [u.index(), v.index()]
            .iter()
            .all(|&i| self.min[i] <= TOLERANCE && self.max[i] >= 1.0 - TOLERANCE)
    }
}

/// Texture names per side
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum SideTextures {
    /// One texture on every side
    All(String),
    /// Distinct top and bottom, shared on the four horizontal-facing sides
    Column {
        top: String,
        bottom: String,
        side: String,
    },
    /// Explicit texture per side, indexed by [`Side::index`]
    PerSide([String; 6]),
}

impl SideTextures {
    pub fn for_side(&self, side: Side) -> &str {
        match self {
            SideTextures::All(name) => name,
            SideTextures::Column { top, bottom, side: s } => match side {
                Side::Top => top,
                Side::Bottom => bottom,
                _ => s,
            },
            SideTextures::PerSide(names) => &names[side.index()],
        }
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        matches!(self, SideTextures::All(_))
    }
}

impl Default for SideTextures {
    fn default() -> Self {
        SideTextures::All("unknown".to_string())
    }
}

/// Extra model box added when the neighbour on `side` is not air (fence arms, panes)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connection {
    pub side: Side,
    #[cfg_attr(feature = "serde", serde(rename = "box"))]
    pub model: ModelBox,
}

/// Catalog entry for one block type
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlockInfo {
    pub name: String,
    pub transparent: bool,
    pub textures: SideTextures,
    /// Custom model boxes; empty means a plain full cube
    pub model: Vec<ModelBox>,
    pub connections: Vec<Connection>,
    /// Which sides cover the whole block face. When unset, cubes are full on
    /// every side and custom models on the sides one of their boxes covers.
    pub full_sides: Option<[bool; 6]>,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            transparent: false,
            textures: SideTextures::default(),
            model: Vec::new(),
            connections: Vec::new(),
            full_sides: None,
        }
    }
}

impl BlockInfo {
    /// Opaque full cube with one texture
    pub fn cube(name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: SideTextures::All(texture.into()),
            ..Self::default()
        }
    }

    /// Opaque full cube with separate top/bottom/side textures
    pub fn column(
        name: impl Into<String>,
        top: impl Into<String>,
        bottom: impl Into<String>,
        side: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            textures: SideTextures::Column {
                top: top.into(),
                bottom: bottom.into(),
                side: side.into(),
            },
            ..Self::default()
        }
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn with_model(mut self, boxes: impl IntoIterator<Item = ModelBox>) -> Self {
        self.model.extend(boxes.into_iter().filter(ModelBox::is_valid));
        self
    }

    pub fn with_connection(mut self, side: Side, model: ModelBox) -> Self {
        self.connections.push(Connection { side, model });
        self
    }

    pub fn with_full_sides(mut self, full: [bool; 6]) -> Self {
        self.full_sides = Some(full);
        self
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        !self.model.is_empty()
    }

    #[inline]
    pub fn is_full(&self, side: Side) -> bool {
        match self.full_sides {
            Some(full) => full[side.index()],
            None if self.is_custom() => self.model.iter().any(|b| b.covers_face(side)),
            None => true,
        }
    }

    /// Reject model and connection boxes without volume or with non-finite corners
    pub fn validate(&self) -> Result<()> {
        let boxes = self
            .model
            .iter()
            .map(|b| ("model", b))
            .chain(self.connections.iter().map(|c| ("connection", &c.model)));
        for (i, (kind, model)) in boxes.enumerate() {
            let finite = model.min.iter().chain(&model.max).all(|c| c.is_finite());
            if !finite || !model.is_valid() {
                return Err(Error::Catalog(format!(
                    "{}: {kind} box {i} {:?}..{:?} has no volume",
                    self.name, model.min, model.max
                )));
            }
        }
        Ok(())
    }
}

/// A block together with its position and its six neighbours (indexed by [`Side::index`])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    pub block: Block,
    pub position: [i32; 3],
    pub neighbors: [Block; 6],
}

impl Neighborhood {
    #[inline]
    pub fn neighbor(&self, side: Side) -> Block {
        self.neighbors[side.index()]
    }
}

/// Lookup service describing block types
pub trait BlockCatalog {
    /// Whether `side` of the block covers the whole unit face
    fn is_full_cube(&self, block: Block, side: Side) -> bool;

    fn is_transparent(&self, block: Block) -> bool;

    /// True when every side shares one texture, so faces can share one material
    fn uses_single_texture(&self, block: Block) -> bool;

    fn texture_for(&self, block: Block, side: Side) -> Cow<'_, str>;

    /// Whether the block has a non-cubic model that must go through the projector
    fn is_custom_model(&self, block: Block) -> bool;

    /// Model boxes for a custom block, given its neighbourhood
    fn model_boxes(&self, neighborhood: &Neighborhood) -> SmallVec<[ModelBox; 4]>;

    /// Display name, used for logging and material naming
    fn block_name(&self, block: Block) -> Cow<'_, str> {
        Cow::Owned(block.to_string())
    }
}

/// Entry of a serialized block table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockEntry {
    pub id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data: Option<u8>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub info: BlockInfo,
}

/// Hash-map backed [`BlockCatalog`]
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "Vec<BlockEntry>", into = "Vec<BlockEntry>")
)]
pub struct BlockTable {
    entries: FxHashMap<(u32, Option<u8>), BlockInfo>,
    fallback: BlockInfo,
}

impl BlockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type. `data = None` applies to every metadata value
    /// without a more specific entry.
    pub fn insert(&mut self, id: u32, data: Option<u8>, info: BlockInfo) -> &mut Self {
        self.entries.insert((id, data), info);
        self
    }

    /// Builder form of [`BlockTable::insert`]
    pub fn with(mut self, id: u32, data: Option<u8>, info: BlockInfo) -> Self {
        self.insert(id, data, info);
        self
    }

    /// Exact entry for the block, without the unknown-block fallback
    pub fn lookup(&self, block: Block) -> Option<&BlockInfo> {
        self.entries
            .get(&(block.id, Some(block.data)))
            .or_else(|| self.entries.get(&(block.id, None)))
    }

    /// Entry for the block; unknown ids resolve to an opaque "unknown" cube
    pub fn info(&self, block: Block) -> &BlockInfo {
        self.lookup(block).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every entry, naming the first offending block in the error
    pub fn validate(&self) -> Result<()> {
        let mut keys: Vec<_> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        for (id, data) in keys {
            self.entries[&(id, data)].validate().map_err(|err| match err {
                Error::Catalog(reason) => {
                    let data = data.map_or_else(|| "*".to_string(), |d| d.to_string());
                    Error::Catalog(format!("block {id}:{data} {reason}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

impl BlockCatalog for BlockTable {
    fn is_full_cube(&self, block: Block, side: Side) -> bool {
        !block.is_air() && self.info(block).is_full(side)
    }

    fn is_transparent(&self, block: Block) -> bool {
        block.is_air() || self.info(block).transparent
    }

    fn uses_single_texture(&self, block: Block) -> bool {
        self.info(block).textures.is_single()
    }

    fn texture_for(&self, block: Block, side: Side) -> Cow<'_, str> {
        Cow::Borrowed(self.info(block).textures.for_side(side))
    }

    fn is_custom_model(&self, block: Block) -> bool {
        !block.is_air() && self.info(block).is_custom()
    }

    fn model_boxes(&self, neighborhood: &Neighborhood) -> SmallVec<[ModelBox; 4]> {
        let info = self.info(neighborhood.block);
        let mut boxes: SmallVec<[ModelBox; 4]> = info.model.iter().copied().collect();
        for connection in &info.connections {
            if !neighborhood.neighbor(connection.side).is_air() {
                boxes.push(connection.model);
            }
        }
        boxes
    }

    fn block_name(&self, block: Block) -> Cow<'_, str> {
        match self.lookup(block) {
            Some(info) => Cow::Borrowed(info.name.as_str()),
            None => Cow::Owned(block.to_string()),
        }
    }
}

impl From<Vec<BlockEntry>> for BlockTable {
    fn from(entries: Vec<BlockEntry>) -> Self {
        let mut table = BlockTable::new();
        for entry in entries {
            table.insert(entry.id, entry.data, entry.info);
        }
        table
    }
}

impl From<BlockTable> for Vec<BlockEntry> {
    fn from(table: BlockTable) -> Self {
        let mut entries: Vec<BlockEntry> = table
            .entries
            .into_iter()
            .map(|((id, data), info)| BlockEntry { id, data, info })
            .collect();
        entries.sort_by_key(|e| (e.id, e.data));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab() -> BlockInfo {
        BlockInfo::cube("slab", "stone_slab")
            .with_model([ModelBox::new([0.0, 0.0, 0.0], [1.0, 0.5, 1.0])])
            .with_full_sides([false, false, false, true, false, false])
    }

    #[test]
    fn test_metadata_specific_entry_wins() {
        let table = BlockTable::new()
            .with(35, None, BlockInfo::cube("wool", "wool_white"))
            .with(35, Some(14), BlockInfo::cube("red wool", "wool_red"));

        assert_eq!(table.texture_for(Block::new(35, 14), Side::Top), "wool_red");
        assert_eq!(table.texture_for(Block::new(35, 3), Side::Top), "wool_white");
    }

    #[test]
    fn test_unknown_block_is_opaque_cube() {
        let table = BlockTable::new();
        let block = Block::new(999, 0);
        assert!(table.is_full_cube(block, Side::North));
        assert!(!table.is_transparent(block));
        assert!(!table.is_custom_model(block));
        assert_eq!(table.texture_for(block, Side::Top), "unknown");
    }

    #[test]
    fn test_air_is_transparent_and_empty() {
        let table = BlockTable::new();
        assert!(table.is_transparent(Block::AIR));
        assert!(!table.is_full_cube(Block::AIR, Side::Top));
    }

    #[test]
    fn test_custom_model_full_sides() {
        let table = BlockTable::new().with(44, None, slab());
        let block = Block::new(44, 0);
        assert!(table.is_custom_model(block));
        assert!(table.is_full_cube(block, Side::Bottom));
        assert!(!table.is_full_cube(block, Side::Top));
    }

    #[test]
    fn test_full_sides_derived_from_model() {
        let info = BlockInfo::cube("slab", "stone_slab")
            .with_model([ModelBox::new([0.0; 3], [1.0, 0.5, 1.0])]);
        assert!(info.is_full(Side::Bottom));
        assert!(!info.is_full(Side::Top));
        assert!(!info.is_full(Side::East));

        let stairs = BlockInfo::cube("stairs", "planks").with_model([
            ModelBox::new([0.0; 3], [1.0, 0.5, 1.0]),
            ModelBox::new([0.0, 0.5, 0.5], [1.0, 1.0, 1.0]),
        ]);
        assert!(stairs.is_full(Side::Bottom));
        // The back is covered by the two boxes together, not by one
        assert!(!stairs.is_full(Side::South));
        assert!(!stairs.is_full(Side::Top));

        let post = BlockInfo::cube("fence", "planks")
            .with_model([ModelBox::from_pixels([6.0, 0.0, 6.0], [10.0, 16.0, 10.0])]);
        assert!(Side::ALL.iter().all(|&side| !post.is_full(side)));

        // An explicit table entry wins over the derived one
        let open = info.clone().with_full_sides([false; 6]);
        assert!(!open.is_full(Side::Bottom));
    }

    #[test]
    fn test_validate_names_bad_block() {
        let mut flat = BlockInfo::cube("flat", "x");
        flat.model.push(ModelBox::new([0.0; 3], [1.0, 0.0, 1.0]));
        let table = BlockTable::new()
            .with(1, None, BlockInfo::cube("stone", "stone"))
            .with(44, Some(2), flat);
        match table.validate() {
            Err(Error::Catalog(reason)) => {
                assert!(reason.contains("44:2"), "{reason}");
                assert!(reason.contains("flat"), "{reason}");
            }
            other => panic!("expected a catalog error, got {other:?}"),
        }
        assert!(BlockTable::new().with(44, None, slab()).validate().is_ok());
    }

    #[test]
    fn test_column_textures() {
        let table = BlockTable::new().with(17, None, BlockInfo::column("log", "log_top", "log_top", "log_side"));
        let log = Block::new(17, 0);
        assert!(!table.uses_single_texture(log));
        assert_eq!(table.texture_for(log, Side::Top), "log_top");
        assert_eq!(table.texture_for(log, Side::East), "log_side");
    }

    #[test]
    fn test_connections_follow_neighbors() {
        let post = ModelBox::from_pixels([6.0, 0.0, 6.0], [10.0, 16.0, 10.0]);
        let arm = ModelBox::from_pixels([10.0, 6.0, 7.0], [16.0, 9.0, 9.0]);
        let table = BlockTable::new().with(
            85,
            None,
            BlockInfo::cube("fence", "planks").with_model([post]).with_connection(Side::East, arm),
        );
        let mut neighborhood = Neighborhood {
            block: Block::new(85, 0),
            position: [0, 0, 0],
            neighbors: [Block::AIR; 6],
        };
        assert_eq!(table.model_boxes(&neighborhood).len(), 1);
        neighborhood.neighbors[Side::East.index()] = Block::new(1, 0);
        assert_eq!(table.model_boxes(&neighborhood).len(), 2);
    }

    #[test]
    fn test_invalid_model_boxes_dropped() {
        let info = BlockInfo::cube("flat", "x").with_model([ModelBox::new([0.0; 3], [1.0, 0.0, 1.0])]);
        assert!(!info.is_custom());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_block_table_json() {
        let json = r#"[
            {"id": 1, "name": "stone", "textures": "stone"},
            {"id": 17, "name": "log", "textures": {"top": "log_top", "bottom": "log_top", "side": "log_side"}},
            {"id": 44, "data": 0, "name": "slab", "textures": "stone_slab",
             "model": [{"min": [0.0, 0.0, 0.0], "max": [1.0, 0.5, 1.0]}]},
            {"id": 20, "name": "glass", "textures": "glass", "transparent": true}
        ]"#;
        let table: BlockTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.is_custom_model(Block::new(44, 0)));
        assert!(!table.is_custom_model(Block::new(44, 1)));
        assert!(table.is_transparent(Block::new(20, 0)));
        assert_eq!(table.texture_for(Block::new(17, 0), Side::Bottom), "log_top");

        let back = serde_json::to_string(&table).unwrap();
        let again: BlockTable = serde_json::from_str(&back).unwrap();
        assert_eq!(again.len(), 4);
    }
}
