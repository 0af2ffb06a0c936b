//! Procedural world generation and chunk streaming for the Voxelicous engine.
//!
//! [`world::World`] is the entry point: it owns every resident [`chunk::Chunk`],
//! runs [`generation::generate_blocks`] in a background worker pool to fill in
//! missing chunks around a moving center, links neighbors and rebuilds
//! [`mesh`] data as chunks arrive, and persists edited chunks through
//! [`region::RegionStore`].

pub mod chunk;
pub mod generation;
pub mod mesh;
pub mod noise;
pub mod params;
pub mod region;
pub mod world;

pub use chunk::Chunk;
pub use mesh::{NeighborLookup, Vertex};
pub use noise::Noise;
pub use params::{BiomeType, TerrainGenerationParams};
pub use region::RegionStore;
pub use world::{StreamingConfig, World};

/// Root seed type every `Noise` instance and `TerrainGenerationParams` derive from.
pub type WorldSeed = i32;
