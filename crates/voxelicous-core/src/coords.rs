//! Coordinate systems for the voxel world.

use serde::{Deserialize, Serialize};

/// Size of a chunk along X (and the block-storage stride along that axis).
pub const CHUNK_WIDTH: i32 = 16;
/// Height of a chunk column; chunks are not stacked vertically.
pub const CHUNK_HEIGHT: i32 = 256;
/// Size of a chunk along Z.
pub const CHUNK_DEPTH: i32 = 16;
/// Number of chunks on a side of one region file.
pub const REGION_SIZE: i32 = 32;

/// Position of a chunk in chunk-grid coordinates (one chunk = 16×256×16 voxels).
///
/// Hashable so it can key the world's chunk map directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World-space origin of this chunk: `(chunkX * WIDTH, chunkZ * DEPTH)`.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> (i32, i32) {
        (self.x * CHUNK_WIDTH, self.z * CHUNK_DEPTH)
    }

    /// The chunk containing world column `(world_x, world_z)`, using floor division so
    /// negative coordinates map correctly (no off-by-one at chunk boundaries below zero).
    #[inline]
    #[must_use]
    pub fn containing(world_x: i32, world_z: i32) -> Self {
        Self::new(
            world_x.div_euclid(CHUNK_WIDTH),
            world_z.div_euclid(CHUNK_DEPTH),
        )
    }

    /// Chebyshev (infinity-norm) distance between two chunk positions, as used by the
    /// streamer's load-radius test.
    #[inline]
    #[must_use]
    pub fn chebyshev_distance(self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// The neighbor one chunk away in the given horizontal direction.
    #[inline]
    #[must_use]
    pub const fn neighbor(self, dir: Direction) -> ChunkPos {
        match dir {
            Direction::North => ChunkPos::new(self.x, self.z + 1),
            Direction::South => ChunkPos::new(self.x, self.z - 1),
            Direction::East => ChunkPos::new(self.x + 1, self.z),
            Direction::West => ChunkPos::new(self.x - 1, self.z),
        }
    }

    /// Region this chunk belongs to: `(⌊chunkX/32⌋, ⌊chunkZ/32⌋)`.
    #[inline]
    #[must_use]
    pub fn region(self) -> (i32, i32) {
        (
            self.x.div_euclid(REGION_SIZE),
            self.z.div_euclid(REGION_SIZE),
        )
    }

    /// Position of this chunk within its region, each in `[0, 32)`.
    #[inline]
    #[must_use]
    pub fn local_in_region(self) -> (u32, u32) {
        (
            self.x.rem_euclid(REGION_SIZE) as u32,
            self.z.rem_euclid(REGION_SIZE) as u32,
        )
    }
}

/// One of the four horizontal neighbor directions a `Chunk` links against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +Z
    North,
    /// -Z
    South,
    /// +X
    East,
    /// -X
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// The direction a chunk observes its neighbor from, seen from that neighbor's side.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Stable small index for use as an array slot (`Chunk`'s four neighbor links).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }
}

/// Splits a world voxel coordinate into `(chunk coordinate, local coordinate in [0, size))`
/// using floor division, so negative world coordinates resolve correctly.
#[inline]
#[must_use]
pub fn world_to_chunk_local(world: i32, chunk_size: i32) -> (i32, i32) {
    (world.div_euclid(chunk_size), world.rem_euclid(chunk_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_matches_origin_for_positive_coords() {
        let pos = ChunkPos::containing(17, 33);
        assert_eq!(pos, ChunkPos::new(1, 2));
    }

    #[test]
    fn containing_floors_toward_negative_infinity() {
        // -1 is the last column of chunk -1, not chunk 0.
        let pos = ChunkPos::containing(-1, -1);
        assert_eq!(pos, ChunkPos::new(-1, -1));

        let pos = ChunkPos::containing(-16, -16);
        assert_eq!(pos, ChunkPos::new(-1, -1));

        let pos = ChunkPos::containing(-17, -17);
        assert_eq!(pos, ChunkPos::new(-2, -2));
    }

    #[test]
    fn world_to_chunk_local_negative_wraps_positive() {
        let (chunk, local) = world_to_chunk_local(-1, CHUNK_WIDTH);
        assert_eq!(chunk, -1);
        assert_eq!(local, 15);
    }

    #[test]
    fn chebyshev_distance_is_max_of_axes() {
        let a = ChunkPos::new(0, 0);
        let b = ChunkPos::new(3, -7);
        assert_eq!(a.chebyshev_distance(b), 7);
    }

    #[test]
    fn direction_opposite_is_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn region_and_local_in_region_round_trip_origin() {
        let pos = ChunkPos::new(65, -3);
        let (rx, rz) = pos.region();
        assert_eq!(rx, 2);
        assert_eq!(rz, -1);
        let (lx, lz) = pos.local_in_region();
        assert_eq!(lx, 1);
        assert_eq!(lz, 29);
    }
}
