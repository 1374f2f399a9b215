//! Sponge schematic (`.schem`) reading and writing.
//!
//! The container is a gzip-compressed NBT document with an unnamed root
//! compound. [`SchemFields`] is the typed view of that root; the NBT object
//! model never leaks past this module.

use crate::block::BlockIdentifier;
use crate::error::{Result, SchemError};
use crate::formats::palette::Palette;
use crate::schematic::{Dimensions, Schematic, SchematicMetadata, VersionInfo};
use flate2::read::GzDecoder;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use std::io::{BufReader, Read};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

pub const DEFAULT_COMPRESSION: flate2::Compression = flate2::Compression::new(6);

/// Semantic fields of a Sponge schematic root compound.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemFields {
    pub version: i32,
    pub data_version: i32,
    pub width: i16,
    pub height: i16,
    pub length: i16,
    pub palette_max: i32,
    pub palette: Vec<(String, i32)>,
    pub block_data: Vec<u8>,
    pub offset: [i32; 3],
    pub metadata: Option<SchematicMetadata>,
}

impl SchemFields {
    pub fn to_nbt(&self) -> NbtCompound {
        let mut root = NbtCompound::new();
        root.insert("Version", NbtTag::Int(self.version));
        root.insert("DataVersion", NbtTag::Int(self.data_version));
        root.insert("Width", NbtTag::Short(self.width));
        root.insert("Height", NbtTag::Short(self.height));
        root.insert("Length", NbtTag::Short(self.length));
        root.insert("PaletteMax", NbtTag::Int(self.palette_max));

        let mut palette = NbtCompound::new();
        for (name, id) in &self.palette {
            palette.insert(name.as_str(), NbtTag::Int(*id));
        }
        root.insert("Palette", NbtTag::Compound(palette));

        root.insert(
            "BlockData",
            NbtTag::ByteArray(self.block_data.iter().map(|&b| b as i8).collect()),
        );
        root.insert("Offset", NbtTag::IntArray(self.offset.to_vec()));
        root.insert("BlockEntities", NbtTag::List(NbtList::new()));

        if let Some(metadata) = &self.metadata {
            root.insert("Metadata", NbtTag::Compound(metadata_to_nbt(metadata)));
        }

        root
    }

    pub fn from_nbt(root: &NbtCompound) -> Result<Self> {
        let width = positive_short(root, "Width")?;
        let height = positive_short(root, "Height")?;
        let length = positive_short(root, "Length")?;

        let palette_nbt = root
            .get::<_, &NbtCompound>("Palette")
            .map_err(|_| SchemError::MissingField("Palette"))?;
        let mut palette = Vec::with_capacity(palette_nbt.len());
        for (name, tag) in palette_nbt.inner() {
            match tag {
                NbtTag::Int(id) => palette.push((name.clone(), *id)),
                other => {
                    tracing::warn!("Skipping palette entry {} with non-int id {:?}", name, other)
                }
            }
        }

        let block_data = match root.get::<_, &NbtTag>("BlockData") {
            Ok(NbtTag::ByteArray(bytes)) => bytes.iter().map(|&b| b as u8).collect(),
            _ => return Err(SchemError::MissingField("BlockData")),
        };

        let offset = match root.get::<_, &NbtTag>("Offset") {
            Ok(NbtTag::IntArray(arr)) if arr.len() == 3 => [arr[0], arr[1], arr[2]],
            Ok(_) => return Err(SchemError::MissingField("Offset")),
            Err(_) => [0, 0, 0],
        };

        let metadata = root
            .get::<_, &NbtCompound>("Metadata")
            .ok()
            .map(metadata_from_nbt);

        Ok(SchemFields {
            version: root.get::<_, i32>("Version").unwrap_or(0),
            data_version: root.get::<_, i32>("DataVersion").unwrap_or(0),
            width,
            height,
            length,
            palette_max: root
                .get::<_, i32>("PaletteMax")
                .unwrap_or(palette.len() as i32),
            palette,
            block_data,
            offset,
            metadata,
        })
    }
}

fn positive_short(root: &NbtCompound, key: &'static str) -> Result<i16> {
    match root.get::<_, i16>(key) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(SchemError::MissingField(key)),
    }
}

fn metadata_to_nbt(metadata: &SchematicMetadata) -> NbtCompound {
    let mut nbt = NbtCompound::new();
    if let Some(name) = &metadata.name {
        nbt.insert("Name", NbtTag::String(name.clone()));
    }
    if let Some(author) = &metadata.author {
        nbt.insert("Author", NbtTag::String(author.clone()));
    }
    if let Some(date) = metadata.date {
        nbt.insert("Date", NbtTag::Long(date));
    }
    if !metadata.required_mods.is_empty() {
        let mods = NbtList::from(
            metadata
                .required_mods
                .iter()
                .map(|m| NbtTag::String(m.clone()))
                .collect::<Vec<NbtTag>>(),
        );
        nbt.insert("RequiredMods", NbtTag::List(mods));
    }
    nbt
}

fn metadata_from_nbt(nbt: &NbtCompound) -> SchematicMetadata {
    let required_mods = nbt
        .get::<_, &NbtList>("RequiredMods")
        .map(|list| {
            list.iter()
                .filter_map(|tag| match tag {
                    NbtTag::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    SchematicMetadata {
        name: nbt.get::<_, &str>("Name").ok().map(String::from),
        author: nbt.get::<_, &str>("Author").ok().map(String::from),
        date: nbt.get::<_, i64>("Date").ok(),
        required_mods,
    }
}

impl Schematic {
    pub fn to_fields(&self) -> SchemFields {
        let metadata = if self.metadata == SchematicMetadata::default() {
            None
        } else {
            Some(self.metadata.clone())
        };

        SchemFields {
            version: self.version.version,
            data_version: self.version.data_version,
            width: self.dimensions.width as i16,
            height: self.dimensions.height as i16,
            length: self.dimensions.length as i16,
            palette_max: self.palette.palette_max(),
            palette: self
                .palette
                .iter()
                .map(|(id, block)| (block.to_string(), id as i32))
                .collect(),
            block_data: self.block_data(),
            offset: self.offset,
            metadata,
        }
    }

    pub fn from_fields(fields: SchemFields) -> Result<Self> {
        let dimensions = Dimensions::new(
            fields.width as i64,
            fields.height as i64,
            fields.length as i64,
        )?;
        let palette = Palette::from_entries(
            fields
                .palette
                .into_iter()
                .map(|(name, id)| (BlockIdentifier::from(name), id)),
        )?;
        let blocks = Schematic::decode_block_data(dimensions, &fields.block_data)?;

        let schematic = Schematic {
            dimensions,
            palette,
            blocks,
            offset: fields.offset,
            version: VersionInfo {
                version: fields.version,
                data_version: fields.data_version,
            },
            metadata: fields.metadata.unwrap_or_default(),
        };

        let unknown = schematic.unknown_id_count();
        if unknown > 0 {
            tracing::warn!(
                "{} cells reference ids missing from the palette; reading them as air",
                unknown
            );
        }
        Ok(schematic)
    }
}

pub fn is_schem(data: &[u8]) -> bool {
    match read_root(data) {
        Ok(root) => {
            root.get::<_, &NbtCompound>("Palette").is_ok()
                && root.get::<_, &NbtTag>("BlockData").is_ok()
                && root.get::<_, i16>("Width").is_ok()
        }
        Err(_) => false,
    }
}

pub fn to_schem(schematic: &Schematic) -> Result<Vec<u8>> {
    to_schem_with_compression(schematic, DEFAULT_COMPRESSION)
}

pub fn to_schem_with_compression(
    schematic: &Schematic,
    compression: flate2::Compression,
) -> Result<Vec<u8>> {
    let root = schematic.to_fields().to_nbt();

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), compression);
    quartz_nbt::io::write_nbt(&mut encoder, None, &root, Flavor::Uncompressed)?;
    let bytes = encoder.finish()?;

    tracing::debug!(
        "Serialized {}x{}x{} schematic into {} bytes",
        schematic.dimensions.width,
        schematic.dimensions.height,
        schematic.dimensions.length,
        bytes.len()
    );
    Ok(bytes)
}

pub fn from_schem(data: &[u8]) -> Result<Schematic> {
    let root = read_root(data)?;
    Schematic::from_fields(SchemFields::from_nbt(&root)?)
}

/// Read the root compound, gzip-compressed or plain.
fn read_root(data: &[u8]) -> Result<NbtCompound> {
    let (root, _) = if data.starts_with(&GZIP_MAGIC) {
        // Stream-decompress directly into the NBT parser
        let reader = BufReader::with_capacity(1 << 16, data);
        let mut gz = GzDecoder::new(reader);
        quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)?
    } else {
        let mut cursor = std::io::Cursor::new(data);
        quartz_nbt::io::read_nbt(&mut cursor, Flavor::Uncompressed)?
    };
    Ok(root)
}

pub fn read_schem_file<P: AsRef<Path>>(path: P) -> Result<Schematic> {
    let mut data = Vec::new();
    std::fs::File::open(path.as_ref())?.read_to_end(&mut data)?;
    from_schem(&data)
}

/// Write through a sibling temporary file so readers never observe a
/// partially written schematic.
pub fn write_schem_file<P: AsRef<Path>>(
    path: P,
    schematic: &Schematic,
    compression: flate2::Compression,
) -> Result<()> {
    let bytes = to_schem_with_compression(schematic, compression)?;
    crate::formats::snapshot::write_atomic(path.as_ref(), &bytes)?;
    tracing::info!("Wrote schematic {}", path.as_ref().display());
    Ok(())
}
