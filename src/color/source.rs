//! Reference texture sources: extracted model/texture archives, resource-pack
//! ZIPs (or the client jar itself) and unpacked resource-pack directories.

use crate::block::{BlockIdentifier, DEFAULT_NAMESPACE};
use crate::color::index::ReferenceTexture;
use crate::error::{Result, SchemError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Model parents whose geometry is a plain unmodified cube.
const CUBE_PARENTS: &[&str] = &["minecraft:block/cube_all", "block/cube_all"];

/// Supplies `(block, image, is-full-cube)` tuples to the index builder.
pub trait AssetSource {
    fn reference_textures(&self) -> Result<Vec<ReferenceTexture>>;
}

/// Only the part of a block model that decides eligibility.
#[derive(Debug, Deserialize)]
struct ModelStub {
    #[serde(default)]
    parent: Option<String>,
}

impl ModelStub {
    fn is_full_cube(&self) -> bool {
        self.parent
            .as_deref()
            .map(|p| CUBE_PARENTS.contains(&p))
            .unwrap_or(false)
    }
}

pub enum ResourcePack {
    /// Two flat archives as produced by extracting `models/block/` and
    /// `textures/block/` out of the client jar.
    SplitArchives {
        models: Vec<u8>,
        textures: Vec<u8>,
        namespace: String,
    },
    /// A ZIP laid out as `assets/<namespace>/{models,textures}/block/...`.
    Archive(Vec<u8>),
    /// An unpacked resource pack directory with the same layout.
    Directory(PathBuf),
}

impl ResourcePack {
    pub fn split_archives(models: Vec<u8>, textures: Vec<u8>) -> Self {
        ResourcePack::SplitArchives {
            models,
            textures,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Open a ZIP file or a directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            if !path.join("assets").is_dir() {
                return Err(SchemError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no assets directory in {}", path.display()),
                )));
            }
            Ok(ResourcePack::Directory(path.to_path_buf()))
        } else {
            Ok(ResourcePack::Archive(std::fs::read(path)?))
        }
    }

    pub fn open_split<P: AsRef<Path>>(models: P, textures: P) -> Result<Self> {
        Ok(Self::split_archives(
            std::fs::read(models)?,
            std::fs::read(textures)?,
        ))
    }
}

impl AssetSource for ResourcePack {
    fn reference_textures(&self) -> Result<Vec<ReferenceTexture>> {
        let mut collector = AssetCollector::default();
        match self {
            ResourcePack::SplitArchives {
                models,
                textures,
                namespace,
            } => {
                for_each_zip_entry(models, |name, data| {
                    if let Some(stem) = flat_stem(name, ".json") {
                        collector.add_model(BlockIdentifier::namespaced(namespace, stem), data);
                    }
                })?;
                for_each_zip_entry(textures, |name, data| {
                    if let Some(stem) = flat_stem(name, ".png") {
                        collector.add_texture(BlockIdentifier::namespaced(namespace, stem), data);
                    }
                })?;
            }
            ResourcePack::Archive(bytes) => {
                for_each_zip_entry(bytes, |name, data| collector.add_asset_path(name, data))?;
            }
            ResourcePack::Directory(root) => collect_directory(root, &mut collector)?,
        }
        Ok(collector.finish())
    }
}

/// Walk `assets/<ns>/{models,textures}/block/` under `root`.
fn collect_directory(root: &Path, collector: &mut AssetCollector) -> Result<()> {
    for namespace in std::fs::read_dir(root.join("assets"))? {
        let namespace = namespace?;
        if !namespace.file_type()?.is_dir() {
            continue;
        }
        let ns = namespace.file_name().to_string_lossy().to_string();
        for (kind, ext) in [("models", "json"), ("textures", "png")] {
            let dir = namespace.path().join(kind).join("block");
            if !dir.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().map(|e| e != ext).unwrap_or(true) {
                    continue;
                }
                let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string())
                else {
                    continue;
                };
                let block = BlockIdentifier::namespaced(&ns, &stem);
                match std::fs::read(&path) {
                    Ok(data) if kind == "models" => collector.add_model(block, data),
                    Ok(data) => collector.add_texture(block, data),
                    Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
                }
            }
        }
    }
    Ok(())
}

/// Call `handler` with the name and contents of every file in a ZIP archive.
/// Entries that fail to read are logged and skipped.
fn for_each_zip_entry<F>(bytes: &[u8], mut handler: F) -> Result<()>
where
    F: FnMut(&str, Vec<u8>),
{
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    for i in 0..archive.len() {
        let mut file = match archive.by_index(i) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Skipping unreadable archive entry {}: {}", i, e);
                continue;
            }
        };
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut data = Vec::new();
        if let Err(e) = file.read_to_end(&mut data) {
            tracing::warn!("Skipping unreadable archive entry {}: {}", name, e);
            continue;
        }
        handler(&name, data);
    }
    Ok(())
}

/// File stem of the last path segment, if it carries `extension`.
fn flat_stem<'a>(name: &'a str, extension: &str) -> Option<&'a str> {
    let base = name.rsplit('/').next()?;
    base.strip_suffix(extension).filter(|stem| !stem.is_empty())
}

/// Split `assets/<ns>/<kind>/block/<name>.<ext>` into its parts.
fn parse_asset_path(path: &str) -> Option<(&str, &str, &str)> {
    let parts: Vec<&str> = path.splitn(5, '/').collect();
    if parts.len() == 5 && parts[0] == "assets" && parts[3] == "block" {
        Some((parts[1], parts[2], parts[4]))
    } else {
        None
    }
}

#[derive(Default)]
struct AssetCollector {
    full_cube: BTreeMap<BlockIdentifier, bool>,
    textures: BTreeMap<BlockIdentifier, Vec<u8>>,
}

impl AssetCollector {
    fn add_asset_path(&mut self, path: &str, data: Vec<u8>) {
        let Some((namespace, kind, file)) = parse_asset_path(path) else {
            return;
        };
        match kind {
            "models" => {
                if let Some(stem) = file.strip_suffix(".json") {
                    self.add_model(BlockIdentifier::namespaced(namespace, stem), data);
                }
            }
            "textures" => {
                if let Some(stem) = file.strip_suffix(".png") {
                    self.add_texture(BlockIdentifier::namespaced(namespace, stem), data);
                }
            }
            _ => {}
        }
    }

    fn add_model(&mut self, block: BlockIdentifier, data: Vec<u8>) {
        match serde_json::from_slice::<ModelStub>(&data) {
            Ok(model) => {
                self.full_cube.insert(block, model.is_full_cube());
            }
            Err(e) => tracing::warn!("Failed to parse model {}: {}", block, e),
        }
    }

    fn add_texture(&mut self, block: BlockIdentifier, data: Vec<u8>) {
        self.textures.insert(block, data);
    }

    /// Decode every texture; undecodable images are logged and dropped.
    /// Output is ordered by block identifier.
    fn finish(self) -> Vec<ReferenceTexture> {
        let mut out = Vec::with_capacity(self.textures.len());
        for (block, data) in self.textures {
            let rgba = match image::load_from_memory(&data) {
                Ok(img) => img.to_rgba8(),
                Err(e) => {
                    tracing::warn!("Could not decode texture {}: {}", block, e);
                    continue;
                }
            };
            let (width, height) = rgba.dimensions();
            let full_cube = self.full_cube.get(&block).copied().unwrap_or(false);
            out.push(ReferenceTexture {
                block,
                width,
                height,
                pixels: rgba.into_raw(),
                full_cube,
            });
        }
        tracing::debug!("Loaded {} reference textures", out.len());
        out
    }
}
