//! Core types and traits for the Voxelicous world engine.
//!
//! This crate provides the foundational types used throughout the engine:
//! - Block and voxel types
//! - Coordinate systems (chunk, region, world-to-local mapping)
//! - The shared error type

pub mod coords;
pub mod error;
pub mod types;

pub use coords::{world_to_chunk_local, ChunkPos, Direction};
pub use error::{Error, Result};
pub use types::{BlockKind, Voxel};

/// Engine-wide constants describing the shape of one chunk and one region.
pub mod constants {
    pub use crate::coords::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH, REGION_SIZE};

    /// Total voxels in a chunk column (16 * 256 * 16).
    pub const CHUNK_VOLUME: usize =
        (CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_DEPTH) as usize;

    /// Bits per palette entry in a chunk's `BitPackedArray`; fixed, sufficient for all
    /// eight `BlockKind` values.
    pub const PALETTE_BITS: u8 = 4;
}
