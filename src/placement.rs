//! Voxel grid → schematic: centering, per-voxel color matching and encoding.

use crate::block::BlockIdentifier;
use crate::color::matcher::{match_with, ColorMatcher};
use crate::config::SchemConfig;
use crate::error::{Result, SchemError};
use crate::formats::schem::write_schem_file;
use crate::schematic::{BlockGrid, Dimensions, Schematic};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cubic occupancy + color grid, indexed `[x][y][z]` (z fastest in memory).
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    side: usize,
    occupancy: Vec<bool>,
    /// sRGB, each channel in `[0, 1]`.
    colors: Vec<[f32; 3]>,
}

impl VoxelGrid {
    pub fn new(side: usize, occupancy: Vec<bool>, colors: Vec<[f32; 3]>) -> Result<Self> {
        let volume = Self::checked_volume(side)?;
        if occupancy.len() != volume || colors.len() != volume {
            return Err(SchemError::InvalidVoxelGrid(format!(
                "side {} needs {} cells, got {} occupancy and {} colors",
                side,
                volume,
                occupancy.len(),
                colors.len()
            )));
        }
        Ok(VoxelGrid {
            side,
            occupancy,
            colors,
        })
    }

    pub fn empty(side: usize) -> Result<Self> {
        let volume = Self::checked_volume(side)?;
        Ok(VoxelGrid {
            side,
            occupancy: vec![false; volume],
            colors: vec![[0.0; 3]; volume],
        })
    }

    /// Adapt float channels as produced by the sample source: `colors` is
    /// channel-major `[3][N][N][N]`, `occupancy` is `[N][N][N]`. A cell is
    /// occupied when its occupancy exceeds `threshold`.
    pub fn from_channels(
        colors: &[f32],
        occupancy: &[f32],
        side: usize,
        threshold: f32,
    ) -> Result<Self> {
        let volume = Self::checked_volume(side)?;
        if colors.len() != 3 * volume || occupancy.len() != volume {
            return Err(SchemError::InvalidVoxelGrid(format!(
                "side {} needs {} color and {} occupancy values, got {} and {}",
                side,
                3 * volume,
                volume,
                colors.len(),
                occupancy.len()
            )));
        }

        if let Some(bad) = colors.iter().position(|c| !c.is_finite()) {
            return Err(SchemError::InvalidVoxelGrid(format!(
                "non-finite color value {} at channel {}, cell {}",
                colors[bad],
                bad / volume,
                bad % volume
            )));
        }

        let occupancy = occupancy.iter().map(|&v| v > threshold).collect();
        let colors = (0..volume)
            .map(|i| [colors[i], colors[volume + i], colors[2 * volume + i]])
            .collect();
        Ok(VoxelGrid {
            side,
            occupancy,
            colors,
        })
    }

    fn checked_volume(side: usize) -> Result<usize> {
        if side == 0 || side > i16::MAX as usize {
            return Err(SchemError::InvalidVoxelGrid(format!(
                "side {} out of range",
                side
            )));
        }
        side.checked_mul(side)
            .and_then(|sq| sq.checked_mul(side))
            .ok_or_else(|| SchemError::InvalidVoxelGrid(format!("side {} too large", side)))
    }

    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.side + y) * self.side + z
    }

    #[inline]
    fn coords(&self, index: usize) -> (usize, usize, usize) {
        let n = self.side;
        (index / (n * n), (index / n) % n, index % n)
    }

    pub fn is_occupied(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.side && y < self.side && z < self.side && self.occupancy[self.index(x, y, z)]
    }

    pub fn color(&self, x: usize, y: usize, z: usize) -> Option<[f32; 3]> {
        if x < self.side && y < self.side && z < self.side {
            Some(self.colors[self.index(x, y, z)])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, color: [f32; 3]) {
        if x < self.side && y < self.side && z < self.side {
            let index = self.index(x, y, z);
            self.occupancy[index] = true;
            self.colors[index] = color;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|&&o| o).count()
    }

    /// Mean occupied coordinate per axis, truncated toward zero.
    pub fn centroid(&self) -> Option<[usize; 3]> {
        let mut sum = [0u64; 3];
        let mut count = 0u64;
        for (index, _) in self.occupancy.iter().enumerate().filter(|&(_, &o)| o) {
            let (x, y, z) = self.coords(index);
            sum[0] += x as u64;
            sum[1] += y as u64;
            sum[2] += z as u64;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(sum.map(|s| (s / count) as usize))
    }

    /// Circularly shift the grid so the centroid lands on `side / 2` along
    /// every axis. Cells leaving one face re-enter on the opposite face. An
    /// empty grid is returned unchanged.
    pub fn centered(&self) -> VoxelGrid {
        let Some(centroid) = self.centroid() else {
            return self.clone();
        };
        let n = self.side;
        let target = n / 2;
        // shift expressed as a non-negative amount modulo n
        let shift = centroid.map(|c| (target + n - c) % n);
        if shift == [0, 0, 0] {
            return self.clone();
        }

        let volume = self.occupancy.len();
        let mut occupancy = vec![false; volume];
        let mut colors = vec![[0.0; 3]; volume];
        for index in 0..volume {
            let (x, y, z) = self.coords(index);
            let dest = self.index((x + shift[0]) % n, (y + shift[1]) % n, (z + shift[2]) % n);
            occupancy[dest] = self.occupancy[index];
            colors[dest] = self.colors[index];
        }
        tracing::debug!("Centered voxel grid by {:?}", shift);
        VoxelGrid {
            side: n,
            occupancy,
            colors,
        }
    }

    /// Inclusive bounds `(min, max)` of occupied cells.
    pub fn occupied_bounds(&self) -> Option<([usize; 3], [usize; 3])> {
        let mut bounds: Option<([usize; 3], [usize; 3])> = None;
        for (index, _) in self.occupancy.iter().enumerate().filter(|&(_, &o)| o) {
            let (x, y, z) = self.coords(index);
            let p = [x, y, z];
            bounds = Some(match bounds {
                None => (p, p),
                Some((min, max)) => (
                    [min[0].min(x), min[1].min(y), min[2].min(z)],
                    [max[0].max(x), max[1].max(y), max[2].max(z)],
                ),
            });
        }
        bounds
    }
}

/// One sample as stored by the voxel sample source: channel-major float
/// colors plus float occupancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelSample {
    pub side: usize,
    pub colors: Vec<f32>,
    pub occupancy: Vec<f32>,
}

impl VoxelSample {
    pub fn to_grid(&self, threshold: f32) -> Result<VoxelGrid> {
        VoxelGrid::from_channels(&self.colors, &self.occupancy, self.side, threshold)
    }
}

/// Read samples from a JSON file holding either one sample or an array.
pub fn load_samples<P: AsRef<Path>>(path: P) -> Result<Vec<VoxelSample>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<VoxelSample>),
        One(VoxelSample),
    }

    let text = std::fs::read_to_string(path.as_ref())?;
    Ok(match serde_json::from_str(&text)? {
        OneOrMany::Many(samples) => samples,
        OneOrMany::One(sample) => vec![sample],
    })
}

/// Center `grid`, match every occupied voxel to a block and encode the result.
///
/// Unoccupied cells become `config.air_block`. With `crop_to_content` the box
/// shrinks to the occupied bounds and the minimum corner goes into `Offset`.
pub fn place(grid: &VoxelGrid, matcher: &ColorMatcher, config: &SchemConfig) -> Result<Schematic> {
    let index = matcher
        .snapshot()
        .filter(|index| !index.is_empty())
        .ok_or(SchemError::MatcherUnavailable)?;

    let centered = grid.centered();
    let occupied: Vec<usize> = (0..centered.occupancy.len())
        .filter(|&i| centered.occupancy[i])
        .collect();

    let matched: Vec<(usize, BlockIdentifier)> = occupied
        .par_iter()
        .map(|&i| {
            match_with(&index, centered.colors[i], config.alpha)
                .map(|block| (i, block))
                .map_err(|e| match e {
                    SchemError::IndexNotLoaded => SchemError::MatcherUnavailable,
                    other => other,
                })
        })
        .collect::<Result<_>>()?;

    let n = centered.side;
    let (min, max) = match centered.occupied_bounds() {
        Some(bounds) if config.crop_to_content => bounds,
        _ => ([0; 3], [n - 1; 3]),
    };
    let dimensions = Dimensions::new(
        (max[0] - min[0] + 1) as i64,
        (max[1] - min[1] + 1) as i64,
        (max[2] - min[2] + 1) as i64,
    )?;

    let mut blocks = BlockGrid::filled(dimensions, config.air_block.clone());
    for (i, block) in matched {
        let (x, y, z) = centered.coords(i);
        blocks.set(
            (x - min[0]) as i32,
            (y - min[1]) as i32,
            (z - min[2]) as i32,
            block,
        );
    }

    let offset = [min[0] as i32, min[1] as i32, min[2] as i32];
    let schematic = Schematic::from_grid(&blocks, offset, config.version_info());
    tracing::info!(
        "Placed {} voxels into a {}x{}x{} schematic ({} palette entries)",
        occupied.len(),
        dimensions.width,
        dimensions.height,
        dimensions.length,
        schematic.palette.len()
    );
    Ok(schematic)
}

/// [`place`] and write the result as a `.schem` file.
pub fn place_to_file<P: AsRef<Path>>(
    grid: &VoxelGrid,
    matcher: &ColorMatcher,
    config: &SchemConfig,
    path: P,
) -> Result<Schematic> {
    let schematic = place(grid, matcher, config)?;
    write_schem_file(path, &schematic, config.compression())?;
    Ok(schematic)
}
