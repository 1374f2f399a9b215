//! Block palette: bijective name ⇄ id mapping for one schematic.

use crate::block::BlockIdentifier;
use crate::error::{Result, SchemError};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    by_id: BTreeMap<u32, BlockIdentifier>,
    ids: FxHashMap<BlockIdentifier, u32>,
}

impl Palette {
    /// Assign ids `0..n` to the distinct identifiers in ascending
    /// lexicographic order. Input order and multiplicity do not matter.
    pub fn build<'a, I>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = &'a BlockIdentifier>,
    {
        let distinct: BTreeSet<&BlockIdentifier> = identifiers.into_iter().collect();

        let mut palette = Palette {
            by_id: BTreeMap::new(),
            ids: FxHashMap::with_capacity_and_hasher(distinct.len(), Default::default()),
        };
        for (id, block) in distinct.into_iter().enumerate() {
            palette.by_id.insert(id as u32, block.clone());
            palette.ids.insert(block.clone(), id as u32);
        }
        palette
    }

    /// Rebuild a palette read from a file. Ids need not be contiguous or
    /// ordered; negative ids can never be referenced by a varint and are
    /// dropped.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (BlockIdentifier, i32)>,
    {
        let mut palette = Palette::default();
        for (block, id) in entries {
            if id < 0 {
                tracing::warn!("Ignoring palette entry {} with negative id {}", block, id);
                continue;
            }
            if let Some(existing) = palette.by_id.get(&(id as u32)) {
                return Err(SchemError::DuplicatePaletteId {
                    id,
                    first: existing.to_string(),
                    second: block.to_string(),
                });
            }
            palette.by_id.insert(id as u32, block.clone());
            palette.ids.insert(block, id as u32);
        }
        Ok(palette)
    }

    pub fn id_of(&self, block: &BlockIdentifier) -> Option<u32> {
        self.ids.get(block).copied()
    }

    pub fn get(&self, id: u32) -> Option<&BlockIdentifier> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &BlockIdentifier)> {
        self.by_id.iter().map(|(id, block)| (*id, block))
    }

    /// Value written as `PaletteMax`.
    pub fn palette_max(&self) -> i32 {
        self.by_id
            .keys()
            .next_back()
            .map(|max| *max as i32 + 1)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<BlockIdentifier> {
        names.iter().map(|n| BlockIdentifier::new(*n)).collect()
    }

    #[test]
    fn test_lexicographic_assignment() {
        let blocks = ids(&[
            "minecraft:stone",
            "minecraft:air",
            "minecraft:glass",
            "minecraft:air",
        ]);
        let palette = Palette::build(&blocks);

        assert_eq!(palette.len(), 3);
        assert_eq!(palette.id_of(&BlockIdentifier::air()), Some(0));
        assert_eq!(palette.id_of(&"minecraft:glass".into()), Some(1));
        assert_eq!(palette.id_of(&"minecraft:stone".into()), Some(2));
        assert_eq!(palette.palette_max(), 3);
    }

    #[test]
    fn test_order_and_multiplicity_independent() {
        let a = ids(&["b:x", "a:y", "c:z", "a:y"]);
        let b = ids(&["c:z", "c:z", "b:x", "a:y"]);
        assert_eq!(Palette::build(&a), Palette::build(&b));
        assert_eq!(Palette::build(&a), Palette::build(&a));
    }

    #[test]
    fn test_from_entries_rejects_shared_id() {
        let err = Palette::from_entries(vec![
            (BlockIdentifier::new("minecraft:stone"), 0),
            (BlockIdentifier::new("minecraft:dirt"), 0),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemError::DuplicatePaletteId { id: 0, .. }));
    }

    #[test]
    fn test_from_entries_sparse_ids() {
        let palette = Palette::from_entries(vec![
            (BlockIdentifier::new("minecraft:stone"), 7),
            (BlockIdentifier::new("minecraft:air"), 2),
        ])
        .unwrap();
        assert_eq!(palette.get(7).map(|b| b.as_str()), Some("minecraft:stone"));
        assert_eq!(palette.get(3), None);
        assert_eq!(palette.palette_max(), 8);
        let order: Vec<u32> = palette.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![2, 7]);
    }
}
