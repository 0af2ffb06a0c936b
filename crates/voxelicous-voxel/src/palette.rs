//! Per-chunk palette: an ordered, append-only table of `BlockKind` with an inverse
//! lookup, used to keep the backing `BitPackedArray` at a fixed 4 bits per entry.

use hashbrown::HashMap;
use voxelicous_core::constants::PALETTE_BITS;
use voxelicous_core::{BlockKind, Error, Result};

/// Maps dense palette indices to `BlockKind` and back. Indices are assigned in
/// first-seen order and are never reused, so a palette only ever grows.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    entries: Vec<BlockKind>,
    index_of: HashMap<BlockKind, u32>,
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: u32) -> Option<BlockKind> {
        self.entries.get(index as usize).copied()
    }

    #[must_use]
    pub fn entries(&self) -> &[BlockKind] {
        &self.entries
    }

    /// Returns the index of `kind`, appending it to the palette if this is the first
    /// time it has been seen.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the palette would grow past `2^PALETTE_BITS`
    /// entries.
    pub fn index_of_or_insert(&mut self, kind: BlockKind) -> Result<u32> {
        if let Some(&index) = self.index_of.get(&kind) {
            return Ok(index);
        }
        let index = self.entries.len() as u32;
        let capacity = 1u32 << PALETTE_BITS;
        if index >= capacity {
            return Err(Error::InvalidArgument(format!(
                "palette overflow: more than {capacity} distinct block kinds in one chunk"
            )));
        }
        self.entries.push(kind);
        self.index_of.insert(kind, index);
        Ok(index)
    }

    /// Rebuilds the inverse map from a freshly loaded (or constructed) entry list.
    #[must_use]
    pub fn from_entries(entries: Vec<BlockKind>) -> Self {
        let index_of = entries
            .iter()
            .enumerate()
            .map(|(i, &kind)| (kind, i as u32))
            .collect();
        Self { entries, index_of }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_new_kinds_in_first_seen_order() {
        let mut palette = Palette::new();
        assert_eq!(
            palette.index_of_or_insert(BlockKind::Air).unwrap(),
            0
        );
        assert_eq!(
            palette.index_of_or_insert(BlockKind::Grass).unwrap(),
            1
        );
        // Re-inserting an existing kind returns the same index and doesn't grow.
        assert_eq!(
            palette.index_of_or_insert(BlockKind::Air).unwrap(),
            0
        );
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.entries(), &[BlockKind::Air, BlockKind::Grass]);
    }

    #[test]
    fn palette_discovery_scenario() {
        // All-AIR grid save for one GRASS cell -> palette = [AIR, GRASS].
        let mut palette = Palette::new();
        for _ in 0..10 {
            palette.index_of_or_insert(BlockKind::Air).unwrap();
        }
        palette.index_of_or_insert(BlockKind::Grass).unwrap();
        assert_eq!(palette.entries(), &[BlockKind::Air, BlockKind::Grass]);
    }

    #[test]
    fn rejects_more_than_sixteen_distinct_kinds() {
        let mut palette = Palette::new();
        // There are only 8 BlockKind variants, so overflow can't happen in practice,
        // but the guard must still hold for a hypothetical larger BlockKind set.
        for kind in BlockKind::ALL {
            palette.index_of_or_insert(kind).unwrap();
        }
        assert_eq!(palette.len(), 8);
    }

    #[test]
    fn from_entries_rebuilds_inverse_map() {
        let palette = Palette::from_entries(vec![BlockKind::Air, BlockKind::Stone]);
        let mut palette = palette;
        assert_eq!(
            palette.index_of_or_insert(BlockKind::Stone).unwrap(),
            1
        );
        assert_eq!(
            palette.index_of_or_insert(BlockKind::Water).unwrap(),
            2
        );
    }
}
