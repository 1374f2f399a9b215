//! Color reference index: one averaged Oklab+alpha color per full-cube block,
//! searchable by nearest neighbour.

use crate::block::BlockIdentifier;
use crate::color::kdtree::{KdTree, Point};
use crate::color::oklab::{oklab_to_srgb, srgb_to_oklab};
use crate::error::{Result, SchemError};
use crate::formats::snapshot::{from_snapshot, to_snapshot, write_atomic};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const TREE_FILE: &str = "kdtree.bin";
pub const COLORS_FILE: &str = "colors.bin";
pub const MAP_FILE: &str = "col2block.bin";

const TREE_MAGIC: &[u8; 4] = b"SGKT";
const COLORS_MAGIC: &[u8; 4] = b"SGCO";
const MAP_MAGIC: &[u8; 4] = b"SGCB";

/// A decoded block texture as supplied by an asset source.
#[derive(Debug, Clone)]
pub struct ReferenceTexture {
    pub block: BlockIdentifier,
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major.
    pub pixels: Vec<u8>,
    /// Only plain cube models are eligible reference entries.
    pub full_cube: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorReferenceEntry {
    /// Oklab `[L, a, b]`.
    pub color: [f32; 3],
    pub alpha: f32,
    pub block: BlockIdentifier,
}

impl ColorReferenceEntry {
    pub fn point(&self) -> Point {
        [self.color[0], self.color[1], self.color[2], self.alpha]
    }

    /// The averaged color back in sRGB, clipped to `[0, 1]`, plus alpha.
    pub fn display_rgba(&self) -> [f32; 4] {
        let [r, g, b] = oklab_to_srgb(self.color);
        [r, g, b, self.alpha]
    }
}

/// Average every pixel in Oklab, and alpha separately.
pub fn average_texture(texture: &ReferenceTexture) -> Option<ColorReferenceEntry> {
    let pixel_count = texture.pixels.len() / 4;
    if pixel_count == 0 {
        return None;
    }

    let mut sum = [0.0f64; 4];
    for px in texture.pixels.chunks_exact(4) {
        let lab = srgb_to_oklab([
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        ]);
        sum[0] += lab[0] as f64;
        sum[1] += lab[1] as f64;
        sum[2] += lab[2] as f64;
        sum[3] += px[3] as f64 / 255.0;
    }

    let n = pixel_count as f64;
    Some(ColorReferenceEntry {
        color: [
            (sum[0] / n) as f32,
            (sum[1] / n) as f32,
            (sum[2] / n) as f32,
        ],
        alpha: (sum[3] / n) as f32,
        block: texture.block.clone(),
    })
}

/// Immutable nearest-color index. Point `i`, block `i` and tree entry `i`
/// always describe the same reference entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorIndex {
    tree: KdTree,
    points: Vec<Point>,
    blocks: Vec<BlockIdentifier>,
}

impl ColorIndex {
    /// Reduce every full-cube texture to one entry and index them, keeping
    /// input order as insertion order.
    pub fn build<I>(textures: I) -> Self
    where
        I: IntoIterator<Item = ReferenceTexture>,
    {
        let textures: Vec<ReferenceTexture> = textures.into_iter().collect();
        let total = textures.len();

        let entries: Vec<ColorReferenceEntry> = textures
            .par_iter()
            .filter(|texture| texture.full_cube)
            .filter_map(|texture| {
                let entry = average_texture(texture);
                if entry.is_none() {
                    tracing::warn!("Skipping empty texture for {}", texture.block);
                }
                entry
            })
            .collect();

        tracing::info!(
            "Built color index: {} of {} textures eligible",
            entries.len(),
            total
        );
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<ColorReferenceEntry>) -> Self {
        let points: Vec<Point> = entries.iter().map(ColorReferenceEntry::point).collect();
        let blocks = entries.into_iter().map(|e| e.block).collect();
        let tree = KdTree::build(&points);
        ColorIndex {
            tree,
            points,
            blocks,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<ColorReferenceEntry> {
        let point = self.points.get(index)?;
        Some(ColorReferenceEntry {
            color: [point[0], point[1], point[2]],
            alpha: point[3],
            block: self.blocks[index].clone(),
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = ColorReferenceEntry> + '_ {
        (0..self.len()).filter_map(|i| self.entry(i))
    }

    /// Closest entry by Euclidean distance over `(L, a, b, alpha)`.
    pub fn nearest(&self, point: &Point) -> Option<(&BlockIdentifier, f32)> {
        self.tree
            .nearest(&self.points, point)
            .map(|(index, dist)| (&self.blocks[index], dist.sqrt()))
    }

    /// Persist the tree, the raw vectors and the vector → block map as three
    /// files under `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let map: Vec<(Point, &BlockIdentifier)> =
            self.points.iter().copied().zip(self.blocks.iter()).collect();

        let tree_bytes = to_snapshot(TREE_MAGIC, &self.tree)?;
        let colors_bytes = to_snapshot(COLORS_MAGIC, &self.points)?;
        let map_bytes = to_snapshot(MAP_MAGIC, &map)?;

        write_atomic(&dir.join(TREE_FILE), &tree_bytes)?;
        write_atomic(&dir.join(COLORS_FILE), &colors_bytes)?;
        write_atomic(&dir.join(MAP_FILE), &map_bytes)?;

        tracing::info!("Saved color index ({} entries) to {}", self.len(), dir.display());
        Ok(())
    }

    /// Load all three files and check that they describe the same entries.
    /// Nothing is returned unless the whole set is consistent.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let tree: KdTree = from_snapshot(TREE_MAGIC, &std::fs::read(dir.join(TREE_FILE))?)?;
        let points: Vec<Point> =
            from_snapshot(COLORS_MAGIC, &std::fs::read(dir.join(COLORS_FILE))?)?;
        let map: Vec<(Point, BlockIdentifier)> =
            from_snapshot(MAP_MAGIC, &std::fs::read(dir.join(MAP_FILE))?)?;

        let index = Self::from_parts(tree, points, map)?;
        tracing::info!("Loaded color index ({} entries) from {}", index.len(), dir.display());
        Ok(index)
    }

    pub fn exists<P: AsRef<Path>>(dir: P) -> bool {
        let dir = dir.as_ref();
        [TREE_FILE, COLORS_FILE, MAP_FILE]
            .iter()
            .all(|name| dir.join(name).is_file())
    }

    fn from_parts(
        tree: KdTree,
        points: Vec<Point>,
        map: Vec<(Point, BlockIdentifier)>,
    ) -> Result<Self> {
        if map.len() != points.len() {
            return Err(SchemError::InconsistentIndex(format!(
                "{} colors but {} map entries",
                points.len(),
                map.len()
            )));
        }
        tree.validate(points.len())
            .map_err(SchemError::InconsistentIndex)?;
        // the build is deterministic, so a tree saved from these exact
        // vectors is reproduced bit for bit
        if tree != KdTree::build(&points) {
            return Err(SchemError::InconsistentIndex(
                "tree was not built from these color vectors".to_string(),
            ));
        }

        let mut blocks = Vec::with_capacity(map.len());
        for (i, (point, block)) in map.into_iter().enumerate() {
            let same = point
                .iter()
                .zip(&points[i])
                .all(|(a, b)| a.to_bits() == b.to_bits());
            if !same {
                return Err(SchemError::InconsistentIndex(format!(
                    "map entry {} ({}) does not match color vector {}",
                    i, block, i
                )));
            }
            blocks.push(block);
        }

        Ok(ColorIndex {
            tree,
            points,
            blocks,
        })
    }
}
