//! Shared color → block matcher.
//!
//! The index is published once (or atomically replaced) and then read
//! concurrently by any number of placement workers.

use crate::block::BlockIdentifier;
use crate::color::index::ColorIndex;
use crate::color::oklab::srgb_to_oklab;
use crate::error::{Result, SchemError};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct ColorMatcher {
    index: RwLock<Option<Arc<ColorIndex>>>,
}

impl ColorMatcher {
    /// A matcher with no index; every query fails with `IndexNotLoaded`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(index: Arc<ColorIndex>) -> Self {
        ColorMatcher {
            index: RwLock::new(Some(index)),
        }
    }

    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self::new(Arc::new(ColorIndex::load(dir)?)))
    }

    /// Swap in a new index. Queries already holding the old snapshot finish
    /// against it.
    pub fn publish(&self, index: Arc<ColorIndex>) {
        let mut slot = match self.index.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(index);
    }

    pub fn snapshot(&self) -> Option<Arc<ColorIndex>> {
        match self.index.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().map(|index| !index.is_empty()).unwrap_or(false)
    }

    /// Nearest full-cube block for an sRGB color in `[0, 1]` with opacity
    /// `alpha`. Equal inputs against the same index always give the same block.
    pub fn match_color(&self, rgb: [f32; 3], alpha: f32) -> Result<BlockIdentifier> {
        let index = self.snapshot().ok_or(SchemError::IndexNotLoaded)?;
        match_with(&index, rgb, alpha)
    }
}

/// Match against an already-acquired index snapshot.
pub fn match_with(index: &ColorIndex, rgb: [f32; 3], alpha: f32) -> Result<BlockIdentifier> {
    if !(rgb.iter().all(|c| c.is_finite()) && alpha.is_finite()) {
        return Err(SchemError::InvalidColor([rgb[0], rgb[1], rgb[2], alpha]));
    }
    let [l, a, b] = srgb_to_oklab(rgb);
    index
        .nearest(&[l, a, b, alpha])
        .map(|(block, _)| block.clone())
        .ok_or(SchemError::IndexNotLoaded)
}
