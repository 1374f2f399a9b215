//! Tagged binary blobs: 4-byte magic, little-endian u32 version, bincode payload.

use crate::error::{Result, SchemError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const VERSION: u32 = 1;

pub fn to_snapshot<T: Serialize>(magic: &[u8; 4], value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value)?;
    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(magic);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub fn from_snapshot<T: DeserializeOwned>(magic: &[u8; 4], data: &[u8]) -> Result<T> {
    if data.len() < 8 {
        return Err(SchemError::InvalidSnapshot("data too short".to_string()));
    }
    if &data[0..4] != magic {
        return Err(SchemError::InvalidSnapshot(format!(
            "expected magic {:?}, found {:?}",
            String::from_utf8_lossy(magic),
            String::from_utf8_lossy(&data[0..4])
        )));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != VERSION {
        return Err(SchemError::InvalidSnapshot(format!(
            "unsupported version {}",
            version
        )));
    }
    Ok(bincode::deserialize(&data[8..])?)
}

/// Write `bytes` to a sibling temporary file, then rename it over `path`.
/// The temporary file is removed if any step fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
