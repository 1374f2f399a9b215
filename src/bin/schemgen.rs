//! schemgen CLI
//!
//! Build the color index, convert voxel samples to schematics and inspect
//! existing `.schem` files.

use clap::{Parser, Subcommand};
use schemgen::placement::load_samples;
use schemgen::{
    place_to_file, read_schem_file, AssetSource, ColorIndex, ColorMatcher, ResourcePack,
    Rotation, SchemConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemgen")]
#[command(
    author,
    version,
    about = "Convert voxel grids into Minecraft schematics",
    long_about = None
)]
struct Cli {
    /// JSON config file; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the color reference index from block textures
    BuildIndex {
        /// Resource pack or client jar (ZIP or directory)
        #[arg(short, long, conflicts_with_all = ["models", "textures"])]
        resource_pack: Option<PathBuf>,

        /// ZIP of extracted block model JSON files
        #[arg(long, requires = "textures")]
        models: Option<PathBuf>,

        /// ZIP of extracted block texture PNG files
        #[arg(long, requires = "models")]
        textures: Option<PathBuf>,

        /// Output directory for the index files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a voxel sample (JSON) into a .schem file
    Convert {
        /// JSON file with one sample or an array of samples
        #[arg(short, long)]
        input: PathBuf,

        /// Which sample to convert
        #[arg(short, long, default_value = "0")]
        sample: usize,

        /// Directory holding the color index
        #[arg(long)]
        index: Option<PathBuf>,

        /// Output .schem path
        #[arg(short, long)]
        output: PathBuf,

        /// Shrink the schematic to the occupied bounds
        #[arg(long)]
        crop: bool,

        /// gzip level (0-9)
        #[arg(long)]
        compression: Option<u32>,
    },

    /// Print a .schem file's dimensions, palette and blocks as JSON
    Inspect {
        /// Input .schem file
        input: PathBuf,

        /// Rotate the block list about the vertical axis (0, 90, 180, 270)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        rotation: i32,

        /// Only print the summary, not the block list
        #[arg(long)]
        summary: bool,
    },
}

#[derive(Serialize)]
struct Inspection<'a> {
    width: u16,
    height: u16,
    length: u16,
    offset: [i32; 3],
    version: i32,
    data_version: i32,
    palette: Vec<(u32, &'a str)>,
    non_empty: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocks: Option<Vec<schemgen::Cell>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SchemConfig::from_path(path)?,
        None => SchemConfig::default(),
    };

    match cli.command {
        Commands::BuildIndex {
            resource_pack,
            models,
            textures,
            output,
        } => {
            let pack = match (resource_pack, models, textures) {
                (Some(path), _, _) => ResourcePack::open(path)?,
                (None, Some(models), Some(textures)) => ResourcePack::open_split(models, textures)?,
                _ => return Err("pass --resource-pack or both --models and --textures".into()),
            };
            let output = output
                .or(config.index_dir.clone())
                .ok_or("no output directory: pass --output or set index_dir")?;

            let index = ColorIndex::build(pack.reference_textures()?);
            index.save(&output)?;
            println!("Indexed {} blocks into {:?}", index.len(), output);
        }

        Commands::Convert {
            input,
            sample,
            index,
            output,
            crop,
            compression,
        } => {
            if crop {
                config.crop_to_content = true;
            }
            if let Some(level) = compression {
                config.compression_level = level;
            }
            let index_dir = index
                .or(config.index_dir.clone())
                .ok_or("no index directory: pass --index or set index_dir")?;

            let samples = load_samples(&input)?;
            let chosen = samples.get(sample).ok_or_else(|| {
                format!("sample {} out of range ({} available)", sample, samples.len())
            })?;
            let grid = chosen.to_grid(config.occupancy_threshold)?;

            let matcher = ColorMatcher::load_dir(&index_dir)?;
            let schematic = place_to_file(&grid, &matcher, &config, &output)?;
            println!(
                "Wrote {} blocks ({} palette entries) to {:?}",
                schematic.count_non_empty(),
                schematic.palette.len(),
                output
            );
        }

        Commands::Inspect {
            input,
            rotation,
            summary,
        } => {
            let rotation = Rotation::from_degrees(rotation)
                .ok_or_else(|| format!("rotation must be a multiple of 90, got {}", rotation))?;
            let schematic = read_schem_file(&input)?;
            let report = Inspection {
                width: schematic.dimensions.width,
                height: schematic.dimensions.height,
                length: schematic.dimensions.length,
                offset: schematic.offset,
                version: schematic.version.version,
                data_version: schematic.version.data_version,
                palette: schematic
                    .palette
                    .iter()
                    .map(|(id, block)| (id, block.as_str()))
                    .collect(),
                non_empty: schematic.count_non_empty(),
                blocks: (!summary).then(|| schematic.build_plan(rotation)),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
