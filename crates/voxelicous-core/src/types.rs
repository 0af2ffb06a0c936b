//! Block and voxel types.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// The material tag of a single voxel. Closed enumeration; values fit in 4 bits,
/// which is the fixed width `Palette`/`BitPackedArray` pairs are built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockKind {
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Sand = 4,
    Snow = 5,
    Water = 6,
    Bedrock = 7,
}

impl BlockKind {
    /// All kinds a palette may ever need to represent, in declaration order.
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Air,
        BlockKind::Grass,
        BlockKind::Dirt,
        BlockKind::Stone,
        BlockKind::Sand,
        BlockKind::Snow,
        BlockKind::Water,
        BlockKind::Bedrock,
    ];

    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self, BlockKind::Air)
    }

    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, BlockKind::Air | BlockKind::Water)
    }

    /// Reconstructs a `BlockKind` from its `u8` discriminant, as stored in a palette.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BlockKind::Air),
            1 => Some(BlockKind::Grass),
            2 => Some(BlockKind::Dirt),
            3 => Some(BlockKind::Stone),
            4 => Some(BlockKind::Sand),
            5 => Some(BlockKind::Snow),
            6 => Some(BlockKind::Water),
            7 => Some(BlockKind::Bedrock),
            _ => None,
        }
    }
}

/// A fully-resolved voxel: its material plus reserved lighting state.
///
/// `sky_light`/`block_light` are never written by generation or meshing; no lighting
/// propagation pass exists in this engine. They exist only so a future pass has
/// somewhere to put its output without changing this struct's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Voxel {
    pub kind: u8,
    pub sky_light: u8,
    pub block_light: u8,
    _pad: u8,
}

impl Voxel {
    pub const AIR: Voxel = Voxel {
        kind: BlockKind::Air as u8,
        sky_light: 0,
        block_light: 0,
        _pad: 0,
    };

    #[inline]
    #[must_use]
    pub const fn new(kind: BlockKind) -> Self {
        Self {
            kind: kind as u8,
            sky_light: 0,
            block_light: 0,
            _pad: 0,
        }
    }

    #[must_use]
    pub fn kind(self) -> BlockKind {
        BlockKind::from_u8(self.kind).unwrap_or(BlockKind::Air)
    }

    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.kind == BlockKind::Air as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_not_solid() {
        assert!(!BlockKind::Air.is_solid());
        assert!(BlockKind::Air.is_air());
    }

    #[test]
    fn water_is_not_solid_but_not_air() {
        assert!(!BlockKind::Water.is_solid());
        assert!(!BlockKind::Water.is_air());
    }

    #[test]
    fn stone_is_solid() {
        assert!(BlockKind::Stone.is_solid());
    }

    #[test]
    fn from_u8_round_trips_all_kinds() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_u8(kind as u8), Some(kind));
        }
    }

    #[test]
    fn voxel_air_constant_is_air() {
        assert!(Voxel::AIR.is_air());
        assert_eq!(Voxel::AIR.sky_light, 0);
        assert_eq!(Voxel::AIR.block_light, 0);
    }

    #[test]
    fn voxel_new_never_sets_light() {
        let v = Voxel::new(BlockKind::Grass);
        assert_eq!(v.kind(), BlockKind::Grass);
        assert_eq!(v.sky_light, 0);
        assert_eq!(v.block_light, 0);
    }
}
