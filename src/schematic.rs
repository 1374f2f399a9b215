use crate::block::BlockIdentifier;
use crate::error::{Result, SchemError};
use crate::formats::palette::Palette;
use crate::formats::varint;
use serde::{Deserialize, Serialize};

/// Sponge schematic version written by default.
pub const DEFAULT_VERSION: i32 = 2;
/// Minecraft 1.21.5.
pub const DEFAULT_DATA_VERSION: i32 = 4325;

pub const MAX_DIMENSION: i64 = i16::MAX as i64;

/// Version fields carried through the container without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: i32,
    pub data_version: i32,
}

impl Default for VersionInfo {
    fn default() -> Self {
        VersionInfo {
            version: DEFAULT_VERSION,
            data_version: DEFAULT_DATA_VERSION,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchematicMetadata {
    pub name: Option<String>,
    pub author: Option<String>,
    /// Milliseconds since the epoch.
    pub date: Option<i64>,
    pub required_mods: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
    pub length: u16,
}

impl Dimensions {
    /// Validate sizes against the signed 16-bit container fields.
    pub fn new(width: i64, height: i64, length: i64) -> Result<Self> {
        let valid = |v: i64| (1..=MAX_DIMENSION).contains(&v);
        if !(valid(width) && valid(height) && valid(length)) {
            return Err(SchemError::InvalidDimensions(width, height, length));
        }
        Ok(Dimensions {
            width: width as u16,
            height: height as u16,
            length: length as u16,
        })
    }

    pub fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.length as usize
    }

    /// x varies fastest, then z, then y.
    #[inline(always)]
    pub fn index_to_coords(&self, index: usize) -> (i32, i32, i32) {
        let w = self.width as usize;
        let wl = w * self.length as usize;
        let x = (index % w) as i32;
        let z = ((index / w) % self.length as usize) as i32;
        let y = (index / wl) as i32;
        (x, y, z)
    }

    #[inline(always)]
    pub fn coords_to_index(&self, x: i32, y: i32, z: i32) -> usize {
        let w = self.width as usize;
        let l = self.length as usize;
        x as usize + z as usize * w + y as usize * w * l
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        (0..self.width as i32).contains(&x)
            && (0..self.height as i32).contains(&y)
            && (0..self.length as i32).contains(&z)
    }
}

/// One decoded cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(rename = "b")]
    pub block: BlockIdentifier,
}

/// Dense block grid in linear cell order, the input side of encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGrid {
    dimensions: Dimensions,
    cells: Vec<BlockIdentifier>,
}

impl BlockGrid {
    pub fn filled(dimensions: Dimensions, block: BlockIdentifier) -> Self {
        BlockGrid {
            dimensions,
            cells: vec![block; dimensions.volume()],
        }
    }

    pub fn from_fn<F>(dimensions: Dimensions, mut lookup: F) -> Self
    where
        F: FnMut(i32, i32, i32) -> BlockIdentifier,
    {
        let cells = (0..dimensions.volume())
            .map(|index| {
                let (x, y, z) = dimensions.index_to_coords(index);
                lookup(x, y, z)
            })
            .collect();
        BlockGrid { dimensions, cells }
    }

    /// Wrap identifiers already laid out in linear cell order.
    pub fn from_linear(dimensions: Dimensions, cells: Vec<BlockIdentifier>) -> Result<Self> {
        if cells.len() != dimensions.volume() {
            return Err(SchemError::BlockCountMismatch {
                expected: dimensions.volume(),
                found: cells.len(),
                trailing: 0,
            });
        }
        Ok(BlockGrid { dimensions, cells })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&BlockIdentifier> {
        if !self.dimensions.contains(x, y, z) {
            return None;
        }
        self.cells.get(self.dimensions.coords_to_index(x, y, z))
    }

    pub fn set(&mut self, x: i32, y: i32, z: i32, block: BlockIdentifier) -> bool {
        if !self.dimensions.contains(x, y, z) {
            return false;
        }
        let index = self.dimensions.coords_to_index(x, y, z);
        self.cells[index] = block;
        true
    }

    pub fn cells(&self) -> &[BlockIdentifier] {
        &self.cells
    }

    pub fn to_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let (x, y, z) = self.dimensions.index_to_coords(index);
                Cell {
                    x,
                    y,
                    z,
                    block: block.clone(),
                }
            })
            .collect()
    }
}

/// A Sponge schematic in semantic form: one palette id per cell.
///
/// `blocks.len() == width * height * length` holds for every value built by
/// [`Schematic::from_grid`] or decoded from bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Schematic {
    pub dimensions: Dimensions,
    pub palette: Palette,
    pub blocks: Vec<u32>,
    pub offset: [i32; 3],
    pub version: VersionInfo,
    pub metadata: SchematicMetadata,
}

impl Schematic {
    /// Build the palette over every cell and map each cell to its id.
    pub fn from_grid(grid: &BlockGrid, offset: [i32; 3], version: VersionInfo) -> Self {
        let palette = Palette::build(grid.cells());
        // the palette was built from these cells, so every lookup hits
        let blocks: Vec<u32> = grid
            .cells()
            .iter()
            .filter_map(|block| palette.id_of(block))
            .collect();

        tracing::debug!(
            "Encoded {} cells with {} palette entries",
            grid.cells().len(),
            palette.len()
        );

        Schematic {
            dimensions: grid.dimensions(),
            palette,
            blocks,
            offset,
            version,
            metadata: SchematicMetadata::default(),
        }
    }

    /// Encode a grid described by a per-cell lookup.
    pub fn encode<F>(
        dimensions: Dimensions,
        lookup: F,
        offset: [i32; 3],
        version: VersionInfo,
    ) -> Self
    where
        F: FnMut(i32, i32, i32) -> BlockIdentifier,
    {
        Self::from_grid(&BlockGrid::from_fn(dimensions, lookup), offset, version)
    }

    pub fn with_metadata(mut self, metadata: SchematicMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Varint-encoded `BlockData` bytes.
    pub fn block_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.blocks.len());
        for &id in &self.blocks {
            varint::encode_into(id, &mut out);
        }
        out
    }

    /// Decode a `BlockData` stream into exactly `dimensions.volume()` ids.
    pub fn decode_block_data(dimensions: Dimensions, data: &[u8]) -> Result<Vec<u32>> {
        let expected = dimensions.volume();
        // every varint takes at least one byte
        if data.len() < expected {
            let found = varint::VarintReader::new(data).take_while(|v| v.is_ok()).count();
            return Err(SchemError::BlockCountMismatch {
                expected,
                found,
                trailing: 0,
            });
        }
        let mut blocks = Vec::with_capacity(expected.min(data.len()));
        let mut reader = varint::VarintReader::new(data);

        while blocks.len() < expected {
            match reader.next() {
                Some(value) => blocks.push(value?),
                None => break,
            }
        }

        if blocks.len() != expected || reader.remaining() != 0 {
            return Err(SchemError::BlockCountMismatch {
                expected,
                found: blocks.len(),
                trailing: reader.remaining(),
            });
        }
        Ok(blocks)
    }

    /// Resolve one palette id. Ids missing from the palette resolve to
    /// `minecraft:air` instead of failing, so a partly understood file can
    /// still be inspected.
    pub fn resolve(&self, id: u32) -> BlockIdentifier {
        self.palette
            .get(id)
            .cloned()
            .unwrap_or_else(BlockIdentifier::air)
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockIdentifier> {
        if !self.dimensions.contains(x, y, z) {
            return None;
        }
        let index = self.dimensions.coords_to_index(x, y, z);
        self.blocks.get(index).map(|&id| self.resolve(id))
    }

    /// Number of cells whose id has no palette entry.
    pub fn unknown_id_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|&&id| self.palette.get(id).is_none())
            .count()
    }

    /// Every cell in linear order.
    pub fn cells(&self) -> Vec<Cell> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let (x, y, z) = self.dimensions.index_to_coords(index);
                Cell {
                    x,
                    y,
                    z,
                    block: self.resolve(id),
                }
            })
            .collect()
    }

    /// Non-empty cells ordered bottom-up; ties keep linear order.
    pub fn placed_cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .cells()
            .into_iter()
            .filter(|cell| !cell.block.is_empty_block())
            .collect();
        cells.sort_by_key(|cell| cell.y);
        cells
    }

    pub fn to_grid(&self) -> BlockGrid {
        BlockGrid {
            dimensions: self.dimensions,
            cells: self.blocks.iter().map(|&id| self.resolve(id)).collect(),
        }
    }

    pub fn count_non_empty(&self) -> usize {
        self.blocks
            .iter()
            .filter(|&&id| !self.resolve(id).is_empty_block())
            .count()
    }
}

/// Quarter turns about the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Clockwise180),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    /// Map `(x, z)` inside a `width` x `length` footprint.
    pub fn apply(self, x: i32, z: i32, width: i32, length: i32) -> (i32, i32) {
        match self {
            Rotation::None => (x, z),
            Rotation::Clockwise90 => (length - 1 - z, x),
            Rotation::Clockwise180 => (width - 1 - x, length - 1 - z),
            Rotation::Clockwise270 => (z, width - 1 - x),
        }
    }

    /// Footprint `(width, length)` after rotating.
    pub fn footprint(self, width: i32, length: i32) -> (i32, i32) {
        match self {
            Rotation::None | Rotation::Clockwise180 => (width, length),
            Rotation::Clockwise90 | Rotation::Clockwise270 => (length, width),
        }
    }
}

impl Schematic {
    /// Placed cells rotated within the footprint, still bottom-up.
    pub fn build_plan(&self, rotation: Rotation) -> Vec<Cell> {
        let width = self.dimensions.width as i32;
        let length = self.dimensions.length as i32;
        self.placed_cells()
            .into_iter()
            .map(|cell| {
                let (x, z) = rotation.apply(cell.x, cell.z, width, length);
                Cell { x, z, ..cell }
            })
            .collect()
    }
}
