use crate::block::{BlockIdentifier, AIR};
use crate::error::Result;
use crate::schematic::{VersionInfo, DEFAULT_DATA_VERSION, DEFAULT_VERSION};
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline settings. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemConfig {
    pub version: i32,
    pub data_version: i32,
    /// gzip level, 0-9.
    pub compression_level: u32,
    /// Written for unoccupied cells.
    pub air_block: BlockIdentifier,
    pub occupancy_threshold: f32,
    /// Opacity passed to the matcher for every voxel.
    pub alpha: f32,
    pub crop_to_content: bool,
    pub index_dir: Option<PathBuf>,
}

impl Default for SchemConfig {
    fn default() -> Self {
        SchemConfig {
            version: DEFAULT_VERSION,
            data_version: DEFAULT_DATA_VERSION,
            compression_level: 6,
            air_block: BlockIdentifier::new(AIR),
            occupancy_threshold: 0.5,
            alpha: 1.0,
            crop_to_content: false,
            index_dir: None,
        }
    }
}

impl SchemConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: SchemConfig = serde_json::from_str(&text)?;
        tracing::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn version_info(&self) -> VersionInfo {
        VersionInfo {
            version: self.version,
            data_version: self.data_version,
        }
    }

    pub fn compression(&self) -> Compression {
        Compression::new(self.compression_level.min(9))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemgen.json");
        std::fs::write(&path, r#"{ "crop_to_content": true, "compression_level": 12 }"#).unwrap();

        let config = SchemConfig::from_path(&path).unwrap();
        assert!(config.crop_to_content);
        assert_eq!(config.compression(), Compression::new(9));
        assert_eq!(config.version_info(), VersionInfo::default());
        assert_eq!(config.air_block.as_str(), "minecraft:air");
        assert_eq!(config.occupancy_threshold, 0.5);
        assert_eq!(config.index_dir, None);
    }

    #[test]
    fn test_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ version: ").unwrap();
        assert!(matches!(
            SchemConfig::from_path(&path),
            Err(crate::error::SchemError::Json(_))
        ));
    }
}
