//! Error types for schematic encoding, color matching and voxel placement.

use thiserror::Error;

/// Result type alias using SchemError.
pub type Result<T> = std::result::Result<T, SchemError>;

#[derive(Error, Debug)]
pub enum SchemError {
    /// The byte stream ended before a varint's terminating byte.
    #[error("Malformed varint at byte {offset}: stream ended mid-value")]
    MalformedVarint { offset: usize },

    /// A varint decoded to a value outside the palette id range.
    #[error("Varint at byte {offset} exceeds the representable id range")]
    IntegerOverflow { offset: usize },

    /// A required container field is absent or has an invalid value.
    #[error("Missing or invalid field: {0}")]
    MissingField(&'static str),

    /// Two palette names were assigned the same id.
    #[error("Palette id {id} is shared by '{first}' and '{second}'")]
    DuplicatePaletteId {
        id: i32,
        first: String,
        second: String,
    },

    /// BlockData held fewer values than cells, or bytes were left over.
    #[error("BlockData mismatch: expected {expected} ids, decoded {found}, {trailing} bytes left")]
    BlockCountMismatch {
        expected: usize,
        found: usize,
        trailing: usize,
    },

    /// A color query was issued before an index was published.
    #[error("Color index is not loaded")]
    IndexNotLoaded,

    /// Placement could not obtain a usable color matcher.
    #[error("Color matcher is unavailable")]
    MatcherUnavailable,

    #[error("Invalid dimensions {0}x{1}x{2}: each side must be in 1..=32767")]
    InvalidDimensions(i64, i64, i64),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Inconsistent color index: {0}")]
    InconsistentIndex(String),

    #[error("Invalid voxel grid: {0}")]
    InvalidVoxelGrid(String),

    #[error("Invalid color {0:?}: every channel must be finite")]
    InvalidColor([f32; 4]),

    #[error("NBT error: {0}")]
    Nbt(#[from] quartz_nbt::io::NbtIoError),

    #[error("NBT structure error: {0}")]
    NbtStructure(#[from] quartz_nbt::NbtReprError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
