//! # schemgen
//!
//! Turns colored voxel grids into Sponge `.schem` schematics.
//!
//! ## Overview
//!
//! - [`formats::schem`] reads and writes the schematic container (gzip NBT,
//!   varint `BlockData`, lexicographic palette).
//! - [`color`] builds a nearest-color index over full-cube block textures and
//!   answers "which block looks like this color" queries in Oklab.
//! - [`placement`] centers a voxel grid, matches every occupied voxel and
//!   encodes the result.
//!
//! ## Quick Start
//!
//! ```ignore
//! use schemgen::{ColorMatcher, SchemConfig, VoxelGrid, place_to_file};
//!
//! let matcher = ColorMatcher::load_dir("index/")?;
//! let mut grid = VoxelGrid::empty(32)?;
//! grid.set(3, 0, 7, [0.8, 0.2, 0.2]);
//! place_to_file(&grid, &matcher, &SchemConfig::default(), "out.schem")?;
//! ```

pub mod block;
pub mod color;
pub mod config;
pub mod error;
pub mod formats;
pub mod placement;
pub mod schematic;

// Re-export main types for convenience
pub use block::BlockIdentifier;
pub use color::index::{ColorIndex, ColorReferenceEntry, ReferenceTexture};
pub use color::matcher::ColorMatcher;
pub use color::source::{AssetSource, ResourcePack};
pub use config::SchemConfig;
pub use error::{Result, SchemError};
pub use formats::palette::Palette;
pub use formats::schem::{from_schem, read_schem_file, to_schem, write_schem_file};
pub use placement::{place, place_to_file, VoxelGrid, VoxelSample};
pub use schematic::{
    BlockGrid, Cell, Dimensions, Rotation, Schematic, SchematicMetadata, VersionInfo,
};
