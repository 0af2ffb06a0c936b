//! The chunk streamer: owns every resident chunk, keeps a bounded pool of
//! background generation jobs in flight, and integrates their results a few
//! at a time per [`World::update`] call.
//!
//! Exactly one thread — whichever calls `update` — ever touches `chunks`.
//! Worker threads run [`Chunk::generate`] in a `rayon::spawn` task and hand the
//! finished chunk back over an `mpsc` channel; this mirrors the
//! sender/receiver shape `ClipmapStreamingController` uses for its page jobs,
//! minus the LOD bookkeeping this crate doesn't need.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use hashbrown::{HashMap, HashSet};
use tracing::warn;

use voxelicous_core::coords::{world_to_chunk_local, CHUNK_DEPTH, CHUNK_WIDTH};
use voxelicous_core::{BlockKind, ChunkPos, Direction, Result};

use crate::chunk::Chunk;
use crate::mesh::NeighborLookup;
use crate::params::TerrainGenerationParams;
use crate::region::RegionStore;

const WIDTH: i32 = CHUNK_WIDTH;
const DEPTH: i32 = CHUNK_DEPTH;

/// Runtime knobs the streamer reads every [`World::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingConfig {
    /// Chebyshev radius, in chunks, around the camera's chunk that should stay loaded.
    pub load_radius: i32,
    /// Upper bound on simultaneously in-flight background generation tasks.
    pub max_concurrent_generation: usize,
    /// Upper bound on how many finished tasks `update` integrates per call.
    pub max_chunk_process_per_frame: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius: 16,
            max_concurrent_generation: 1,
            max_chunk_process_per_frame: 1000,
        }
    }
}

/// A chunk handed back from a background generation task.
struct GeneratedChunk {
    pos: ChunkPos,
    chunk: Box<Chunk>,
}

/// Resolves a chunk's cross-border neighbor reads against whatever is
/// currently resident in the world's chunk map.
struct WorldNeighbors<'a> {
    chunks: &'a HashMap<ChunkPos, Chunk>,
    pos: ChunkPos,
}

impl NeighborLookup for WorldNeighbors<'_> {
    fn neighbor_block(&self, dir: Direction, perpendicular: i32, y: i32) -> Option<BlockKind> {
        let neighbor = self.chunks.get(&self.pos.neighbor(dir))?;
        let (x, z) = match dir {
            Direction::East => (0, perpendicular),
            Direction::West => (WIDTH - 1, perpendicular),
            Direction::North => (perpendicular, 0),
            Direction::South => (perpendicular, DEPTH - 1),
        };
        Some(neighbor.get_block(x, y, z))
    }
}

/// Owns every resident chunk and the background generation pool that fills
/// in missing ones around a moving center point.
pub struct World {
    params: TerrainGenerationParams,
    config: StreamingConfig,
    chunks: HashMap<ChunkPos, Chunk>,
    inflight: HashSet<ChunkPos>,
    tx: Sender<GeneratedChunk>,
    rx: Receiver<GeneratedChunk>,
    region_store: Option<RegionStore>,
    loaded_regions: HashSet<(i32, i32)>,
    last_center: Option<ChunkPos>,
}

impl World {
    #[must_use]
    pub fn new(params: TerrainGenerationParams, config: StreamingConfig) -> Self {
        Self::with_region_store(params, config, None)
    }

    /// Like [`Self::new`], additionally persisting evicted, edited chunks under
    /// `region_dir` and loading them back instead of regenerating on revisit.
    #[must_use]
    pub fn with_region_store(
        params: TerrainGenerationParams,
        config: StreamingConfig,
        region_dir: Option<PathBuf>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            params,
            config,
            chunks: HashMap::new(),
            inflight: HashSet::new(),
            tx,
            rx,
            region_store: region_dir.map(RegionStore::new),
            loaded_regions: HashSet::new(),
            last_center: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> StreamingConfig {
        self.config
    }

    pub fn set_config(&mut self, config: StreamingConfig) {
        self.config = config;
    }

    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Sum of every resident chunk's current mesh vertex count, for coarse
    /// reporting (e.g. the demo binary's frame summary).
    #[must_use]
    pub fn total_vertex_count(&self) -> usize {
        self.chunks.values().map(Chunk::vertex_count).sum()
    }

    #[must_use]
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    /// Advances streaming around `center`: integrates finished background
    /// generation tasks, loads any not-yet-seen region files the camera has
    /// entered, spawns generation tasks for still-missing chunks inside the
    /// load radius, and evicts chunks that fell outside it.
    pub fn update(&mut self, center: ChunkPos) {
        self.last_center = Some(center);
        self.apply_finished_jobs();
        self.load_nearby_regions(center);
        self.spawn_missing_jobs(center);
        self.evict_far_chunks(center);
    }

    /// Positions within the current load radius whose mesh is ready to draw.
    /// A chunk's mesh is built as soon as it's inserted into the map (using
    /// whatever neighbors are linked at that moment), so this is simply every
    /// resident chunk inside the radius computed by the last `update` call.
    #[must_use]
    pub fn rendered_chunks(&self) -> Vec<ChunkPos> {
        let Some(center) = self.last_center else {
            return Vec::new();
        };
        self.chunks
            .keys()
            .copied()
            .filter(|pos| pos.chebyshev_distance(center) <= self.config.load_radius)
            .collect()
    }

    fn wanted_positions(&self, center: ChunkPos) -> Vec<ChunkPos> {
        let radius = self.config.load_radius;
        let mut wanted = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let pos = ChunkPos::new(center.x + dx, center.z + dz);
                if pos.chebyshev_distance(center) <= radius {
                    wanted.push(pos);
                }
            }
        }
        wanted.sort_unstable_by_key(|pos| pos.chebyshev_distance(center));
        wanted
    }

    /// Region files are cheap to check and rare to touch, so loading happens
    /// synchronously on the calling thread rather than through the worker pool.
    fn load_nearby_regions(&mut self, center: ChunkPos) {
        let Some(store) = &self.region_store else {
            return;
        };
        let mut regions: Vec<(i32, i32)> = self
            .wanted_positions(center)
            .into_iter()
            .map(ChunkPos::region)
            .collect();
        regions.dedup();

        let mut loaded_positions = Vec::new();
        for region in regions {
            if !self.loaded_regions.insert(region) {
                continue;
            }
            match store.load_region(region.0, region.1) {
                Ok(chunks) => {
                    for chunk in chunks {
                        if self.chunks.contains_key(&chunk.pos) {
                            continue;
                        }
                        loaded_positions.push(chunk.pos);
                        self.chunks.insert(chunk.pos, chunk);
                    }
                }
                Err(err) => {
                    warn!(?region, %err, "failed to read region file, chunks in it will be regenerated");
                }
            }
        }
        for pos in loaded_positions {
            self.link_and_remesh_around(pos);
        }
    }

    fn spawn_missing_jobs(&mut self, center: ChunkPos) {
        for pos in self.wanted_positions(center) {
            if self.inflight.len() >= self.config.max_concurrent_generation {
                break;
            }
            if self.chunks.contains_key(&pos) || self.inflight.contains(&pos) {
                continue;
            }
            self.inflight.insert(pos);
            let tx = self.tx.clone();
            let params = self.params;
            rayon::spawn(move || match Chunk::generate(pos, &params) {
                Ok(chunk) => {
                    let _ = tx.send(GeneratedChunk {
                        pos,
                        chunk: Box::new(chunk),
                    });
                }
                Err(err) => {
                    warn!(?pos, %err, "chunk generation task failed, position will be retried");
                }
            });
        }
    }

    fn apply_finished_jobs(&mut self) {
        let mut touched = Vec::new();
        for _ in 0..self.config.max_chunk_process_per_frame {
            match self.rx.try_recv() {
                Ok(GeneratedChunk { pos, chunk }) => {
                    self.inflight.remove(&pos);
                    self.chunks.insert(pos, *chunk);
                    touched.push(pos);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        for pos in touched {
            self.link_and_remesh_around(pos);
        }
    }

    fn link_and_remesh_around(&mut self, pos: ChunkPos) {
        let mut to_remesh = vec![pos];
        for dir in Direction::ALL {
            let neighbor_pos = pos.neighbor(dir);
            if self.chunks.contains_key(&neighbor_pos) {
                if let Some(chunk) = self.chunks.get_mut(&pos) {
                    chunk.link(dir);
                }
                if let Some(neighbor) = self.chunks.get_mut(&neighbor_pos) {
                    neighbor.link(dir.opposite());
                }
                to_remesh.push(neighbor_pos);
            }
        }
        for p in to_remesh {
            self.remesh_chunk(p);
        }
    }

    fn remesh_chunk(&mut self, pos: ChunkPos) {
        let Some(mut chunk) = self.chunks.remove(&pos) else {
            return;
        };
        {
            let lookup = WorldNeighbors {
                chunks: &self.chunks,
                pos,
            };
            chunk.build_mesh(&lookup);
        }
        self.chunks.insert(pos, chunk);
    }

    fn evict_far_chunks(&mut self, center: ChunkPos) {
        // A small hysteresis margin beyond the load radius keeps a chunk that
        // just crossed the boundary from being evicted and immediately
        // regenerated on the next update.
        let evict_beyond = self.config.load_radius + 2;
        let to_evict: Vec<ChunkPos> = self
            .chunks
            .keys()
            .copied()
            .filter(|pos| pos.chebyshev_distance(center) > evict_beyond)
            .collect();
        if to_evict.is_empty() {
            return;
        }

        let mut dirty_regions: HashSet<(i32, i32)> = HashSet::new();
        for pos in &to_evict {
            if let Some(chunk) = self.chunks.get(pos) {
                if chunk.is_dirty() {
                    dirty_regions.insert(pos.region());
                }
            }
        }
        if let Some(store) = &self.region_store {
            for region in &dirty_regions {
                let chunks_in_region = self
                    .chunks
                    .values()
                    .filter(|chunk| chunk.pos.region() == *region);
                if let Err(err) = store.save_region(region.0, region.1, chunks_in_region) {
                    warn!(?region, %err, "failed to persist region on eviction");
                }
            }
        }

        for pos in &to_evict {
            self.chunks.remove(pos);
        }
        for pos in &to_evict {
            for dir in Direction::ALL {
                if let Some(neighbor) = self.chunks.get_mut(&pos.neighbor(dir)) {
                    neighbor.unlink(dir.opposite());
                }
            }
        }
        for pos in &to_evict {
            for dir in Direction::ALL {
                self.remesh_chunk(pos.neighbor(dir));
            }
        }
    }

    /// Reads the block at world coordinates. A chunk not currently resident
    /// reads as AIR rather than an error.
    #[must_use]
    pub fn get_block_world(&self, world_x: i32, world_y: i32, world_z: i32) -> BlockKind {
        let pos = ChunkPos::containing(world_x, world_z);
        let Some(chunk) = self.chunks.get(&pos) else {
            return BlockKind::Air;
        };
        let (_, lx) = world_to_chunk_local(world_x, WIDTH);
        let (_, lz) = world_to_chunk_local(world_z, DEPTH);
        chunk.get_block(lx, world_y, lz)
    }

    /// Writes a block at world coordinates, remeshing this chunk and any
    /// bordering neighbor the write touched. A chunk not currently resident
    /// silently drops the write (returns `false`) rather than erroring.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the write would overflow the chunk's palette.
    pub fn set_block_world(
        &mut self,
        world_x: i32,
        world_y: i32,
        world_z: i32,
        kind: BlockKind,
    ) -> Result<bool> {
        let pos = ChunkPos::containing(world_x, world_z);
        let (_, lx) = world_to_chunk_local(world_x, WIDTH);
        let (_, lz) = world_to_chunk_local(world_z, DEPTH);

        let touched = {
            let Some(chunk) = self.chunks.get_mut(&pos) else {
                return Ok(false);
            };
            chunk.set_block(lx, world_y, lz, kind)?
        };

        self.remesh_chunk(pos);
        for dir in touched {
            self.remesh_chunk(pos.neighbor(dir));
        }
        Ok(true)
    }

    /// Whether the block at world coordinates has at least one AIR-facing
    /// side. A chunk not currently resident reports not visible.
    #[must_use]
    pub fn is_block_visible_world(&self, world_x: i32, world_y: i32, world_z: i32) -> bool {
        let pos = ChunkPos::containing(world_x, world_z);
        let Some(chunk) = self.chunks.get(&pos) else {
            return false;
        };
        let (_, lx) = world_to_chunk_local(world_x, WIDTH);
        let (_, lz) = world_to_chunk_local(world_z, DEPTH);
        let lookup = WorldNeighbors {
            chunks: &self.chunks,
            pos,
        };
        chunk.is_block_visible(lx, world_y, lz, &lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn drain_until(world: &mut World, center: ChunkPos, want: usize, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while world.loaded_chunk_count() < want && Instant::now() < deadline {
            world.update(center);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn update_eventually_fills_the_load_radius() {
        let config = StreamingConfig {
            load_radius: 1,
            max_concurrent_generation: 4,
            max_chunk_process_per_frame: 8,
        };
        let mut world = World::new(TerrainGenerationParams::default(), config);
        let center = ChunkPos::new(0, 0);
        drain_until(&mut world, center, 9, Duration::from_secs(5));
        assert_eq!(world.loaded_chunk_count(), 9);
    }

    #[test]
    fn rendered_chunks_covers_every_resident_position_in_radius() {
        let config = StreamingConfig {
            load_radius: 1,
            max_concurrent_generation: 4,
            max_chunk_process_per_frame: 8,
        };
        let mut world = World::new(TerrainGenerationParams::default(), config);
        let center = ChunkPos::new(0, 0);
        drain_until(&mut world, center, 9, Duration::from_secs(5));

        let mut rendered = world.rendered_chunks();
        rendered.sort_unstable_by_key(|pos| (pos.x, pos.z));
        let mut expected: Vec<ChunkPos> = (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dz| ChunkPos::new(dx, dz)))
            .collect();
        expected.sort_unstable_by_key(|pos| (pos.x, pos.z));
        assert_eq!(rendered, expected);
    }

    #[test]
    fn rendered_chunks_is_empty_before_the_first_update() {
        let world = World::new(TerrainGenerationParams::default(), StreamingConfig::default());
        assert!(world.rendered_chunks().is_empty());
    }

    #[test]
    fn adjacent_chunks_link_once_both_are_resident() {
        let config = StreamingConfig {
            load_radius: 1,
            max_concurrent_generation: 8,
            max_chunk_process_per_frame: 16,
        };
        let mut world = World::new(TerrainGenerationParams::default(), config);
        let center = ChunkPos::new(0, 0);
        drain_until(&mut world, center, 9, Duration::from_secs(5));

        let middle = world.chunk(center).unwrap();
        assert!(middle.has_all_neighbors());
    }

    #[test]
    fn chunk_outside_the_load_radius_reads_as_air() {
        let config = StreamingConfig {
            load_radius: 1,
            max_concurrent_generation: 4,
            max_chunk_process_per_frame: 8,
        };
        let mut world = World::new(TerrainGenerationParams::default(), config);
        world.update(ChunkPos::new(0, 0));
        assert_eq!(world.get_block_world(10_000, 70, 10_000), BlockKind::Air);
        assert!(!world.is_block_visible_world(10_000, 70, 10_000));
    }

    #[test]
    fn set_block_world_on_missing_chunk_is_a_silent_no_op() {
        let config = StreamingConfig::default();
        let mut world = World::new(TerrainGenerationParams::default(), config);
        let applied = world
            .set_block_world(10_000, 70, 10_000, BlockKind::Stone)
            .unwrap();
        assert!(!applied);
    }

    #[test]
    fn set_block_world_mutates_a_resident_chunk() {
        let config = StreamingConfig {
            load_radius: 0,
            max_concurrent_generation: 1,
            max_chunk_process_per_frame: 1,
        };
        let mut world = World::new(TerrainGenerationParams::default(), config);
        let center = ChunkPos::new(0, 0);
        drain_until(&mut world, center, 1, Duration::from_secs(5));

        let applied = world.set_block_world(0, 70, 0, BlockKind::Stone).unwrap();
        assert!(applied);
        assert_eq!(world.get_block_world(0, 70, 0), BlockKind::Stone);
    }

    #[test]
    fn evicting_a_chunk_beyond_the_radius_drops_it() {
        let config = StreamingConfig {
            load_radius: 0,
            max_concurrent_generation: 4,
            max_chunk_process_per_frame: 4,
        };
        let mut world = World::new(TerrainGenerationParams::default(), config);
        drain_until(&mut world, ChunkPos::new(0, 0), 1, Duration::from_secs(5));
        assert_eq!(world.loaded_chunk_count(), 1);

        // A far jump leaves the old chunk outside even the eviction hysteresis margin.
        world.update(ChunkPos::new(1000, 1000));
        assert!(world.chunk(ChunkPos::new(0, 0)).is_none());
    }

    #[test]
    fn dirty_chunk_persists_across_eviction_and_reload() {
        let dir = std::env::temp_dir().join(format!(
            "voxelicous-world-test-{}",
            std::process::id()
        ));
        let config = StreamingConfig {
            load_radius: 0,
            max_concurrent_generation: 1,
            max_chunk_process_per_frame: 1,
        };
        let mut world = World::with_region_store(
            TerrainGenerationParams::default(),
            config,
            Some(dir.clone()),
        );
        drain_until(&mut world, ChunkPos::new(0, 0), 1, Duration::from_secs(5));
        world.set_block_world(0, 70, 0, BlockKind::Stone).unwrap();

        world.update(ChunkPos::new(1000, 1000));
        assert!(world.chunk(ChunkPos::new(0, 0)).is_none());

        let mut reloaded = World::with_region_store(
            TerrainGenerationParams::default(),
            config,
            Some(dir.clone()),
        );
        drain_until(&mut reloaded, ChunkPos::new(0, 0), 1, Duration::from_secs(5));
        assert_eq!(reloaded.get_block_world(0, 70, 0), BlockKind::Stone);

        std::fs::remove_dir_all(&dir).ok();
    }
}
