//! A single chunk: palette-compressed block storage plus its built mesh and its
//! links to the four horizontal neighbors.

use hashbrown::HashMap;
use voxelicous_core::coords::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use voxelicous_core::constants::PALETTE_BITS;
use voxelicous_core::{BlockKind, ChunkPos, Direction, Error, Result};
use voxelicous_voxel::{BitPackedArray, Palette};

use crate::generation::{self, block_index, BLOCK_COUNT};
use crate::mesh::{self, NeighborLookup, Vertex};
use crate::params::TerrainGenerationParams;

const WIDTH: i32 = CHUNK_WIDTH;
const HEIGHT: i32 = CHUNK_HEIGHT;
const DEPTH: i32 = CHUNK_DEPTH;

/// One loaded chunk: its compact voxel storage, its built mesh (a stand-in for the
/// external GPU handle `uploadMesh` would hand off to), and which of its four
/// horizontal neighbors are currently linked.
pub struct Chunk {
    pub pos: ChunkPos,
    palette: Palette,
    blocks: BitPackedArray,
    linked: [bool; 4],
    mesh: Vec<Vertex>,
    /// Set by `set_block`, cleared by `generate`/`load_from`. The streamer only
    /// writes a region payload for chunks that were actually mutated — terrain is
    /// cheap to regenerate, so an untouched chunk doesn't need to round-trip disk.
    dirty: bool,
}

impl Chunk {
    /// Runs the terrain pipeline for `pos` and encodes the result into a fresh
    /// palette + bit-packed array. No mesh is built yet; the caller does that once
    /// neighbors are known.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if generation somehow produces more than
    /// `2^PALETTE_BITS` distinct block kinds in one chunk (a bug, not a user error).
    pub fn generate(pos: ChunkPos, params: &TerrainGenerationParams) -> Result<Self> {
        let raw_blocks = generation::generate_blocks(pos, params);
        let mut palette_entries = Vec::new();
        let mut palette_map = HashMap::new();
        let blocks = BitPackedArray::encode_all(
            &raw_blocks,
            &mut palette_entries,
            &mut palette_map,
            PALETTE_BITS,
        )?;
        Ok(Self {
            pos,
            palette: Palette::from_entries(palette_entries),
            blocks,
            linked: [false; 4],
            mesh: Vec::new(),
            dirty: false,
        })
    }

    #[inline]
    fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        (0..WIDTH).contains(&x) && (0..HEIGHT).contains(&y) && (0..DEPTH).contains(&z)
    }

    /// Reads the block at chunk-local `(x, y, z)`. Out-of-range reads as AIR.
    #[must_use]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockKind {
        if !Self::in_bounds(x, y, z) {
            return BlockKind::Air;
        }
        let index = self
            .blocks
            .get(block_index(x, y, z))
            .expect("in-bounds index always valid");
        self.palette.get(index).unwrap_or(BlockKind::Air)
    }

    /// Writes `kind` at chunk-local `(x, y, z)`. Out-of-range writes are no-ops.
    /// Returns the neighbor directions whose border this write touched — the caller
    /// is expected to rebuild this chunk's mesh and each returned neighbor's mesh.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if this write would introduce a ninth distinct block
    /// kind into the chunk (the palette is full at `2^PALETTE_BITS` entries).
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, kind: BlockKind) -> Result<Vec<Direction>> {
        if !Self::in_bounds(x, y, z) {
            return Ok(Vec::new());
        }
        let index = self.palette.index_of_or_insert(kind)?;
        self.blocks.set(block_index(x, y, z), index)?;
        self.dirty = true;

        let mut touched = Vec::new();
        if x == 0 {
            touched.push(Direction::West);
        }
        if x == WIDTH - 1 {
            touched.push(Direction::East);
        }
        if z == 0 {
            touched.push(Direction::South);
        }
        if z == DEPTH - 1 {
            touched.push(Direction::North);
        }
        Ok(touched)
    }

    /// Whether the block at `(x, y, z)` has at least one AIR-facing side, peeking
    /// across chunk borders via `neighbors` exactly as the mesh builder does.
    #[must_use]
    pub fn is_block_visible(&self, x: i32, y: i32, z: i32, neighbors: &dyn NeighborLookup) -> bool {
        if self.get_block(x, y, z).is_air() {
            return false;
        }
        let check = |dx: i32, dy: i32, dz: i32, dir: Option<Direction>| -> bool {
            let (nx, ny, nz) = (x + dx, y + dy, z + dz);
            if Self::in_bounds(nx, ny, nz) {
                return self.get_block(nx, ny, nz).is_air();
            }
            match dir {
                Some(d) => neighbors
                    .neighbor_block(d, Self::edge_perpendicular(d, nx, nz), ny)
                    .map_or(true, |k| k.is_air()),
                None => true,
            }
        };
        check(0, 1, 0, None)
            || check(0, -1, 0, None)
            || check(1, 0, 0, Some(Direction::East))
            || check(-1, 0, 0, Some(Direction::West))
            || check(0, 0, 1, Some(Direction::North))
            || check(0, 0, -1, Some(Direction::South))
    }

    fn edge_perpendicular(dir: Direction, x: i32, z: i32) -> i32 {
        match dir {
            Direction::North | Direction::South => x,
            Direction::East | Direction::West => z,
        }
    }

    pub fn link(&mut self, dir: Direction) {
        self.linked[dir.index()] = true;
    }

    pub fn unlink(&mut self, dir: Direction) {
        self.linked[dir.index()] = false;
    }

    #[must_use]
    pub fn has_all_neighbors(&self) -> bool {
        self.linked.iter().all(|&l| l)
    }

    /// Decodes the full block grid, indexed by [`generation::block_index`].
    #[must_use]
    pub fn decode_blocks(&self) -> Vec<BlockKind> {
        self.blocks
            .decode_all()
            .into_iter()
            .map(|index| self.palette.get(index).unwrap_or(BlockKind::Air))
            .collect()
    }

    /// Rebuilds this chunk's mesh, peeking across linked borders via `neighbors`.
    pub fn build_mesh(&mut self, neighbors: &dyn NeighborLookup) {
        let blocks = self.decode_blocks();
        self.mesh = mesh::build_mesh_data(&blocks, neighbors);
    }

    #[must_use]
    pub fn mesh_vertices(&self) -> &[Vertex] {
        &self.mesh
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palette.entries().iter().all(BlockKind::is_air)
    }

    /// Whether this chunk has been edited since it was generated or loaded.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes `originX, originZ, paletteSize, palette entries..., bit-packed payload`.
    ///
    /// # Errors
    /// Propagates any underlying I/O error.
    pub fn save_to<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        let (origin_x, origin_z) = self.pos.origin();
        writer.write_all(&origin_x.to_le_bytes())?;
        writer.write_all(&origin_z.to_le_bytes())?;
        let entries = self.palette.entries();
        writer.write_all(&(entries.len() as u32).to_le_bytes())?;
        for &kind in entries {
            writer.write_all(&[kind as u8])?;
        }
        self.blocks.save_to(writer)?;
        Ok(())
    }

    /// Reads back the format written by [`Self::save_to`].
    ///
    /// # Errors
    /// Returns `InvalidArgument` if a stored palette byte isn't a valid `BlockKind`,
    /// or propagates an underlying I/O error.
    pub fn load_from<R: std::io::Read>(reader: &mut R) -> Result<Self> {
        let mut i32_buf = [0u8; 4];
        reader.read_exact(&mut i32_buf)?;
        let origin_x = i32::from_le_bytes(i32_buf);
        reader.read_exact(&mut i32_buf)?;
        let origin_z = i32::from_le_bytes(i32_buf);

        let mut u32_buf = [0u8; 4];
        reader.read_exact(&mut u32_buf)?;
        let palette_size = u32::from_le_bytes(u32_buf) as usize;

        let mut entries = Vec::with_capacity(palette_size);
        for _ in 0..palette_size {
            let mut byte = [0u8; 1];
            reader.read_exact(&mut byte)?;
            let kind = BlockKind::from_u8(byte[0]).ok_or_else(|| {
                Error::InvalidArgument(format!("invalid block kind byte {}", byte[0]))
            })?;
            entries.push(kind);
        }

        let blocks = BitPackedArray::load_from(reader)?;
        debug_assert_eq!(blocks.len(), BLOCK_COUNT);

        Ok(Self {
            pos: ChunkPos::new(origin_x.div_euclid(WIDTH), origin_z.div_euclid(DEPTH)),
            palette: Palette::from_entries(entries),
            blocks,
            linked: [false; 4],
            mesh: Vec::new(),
            dirty: false,
        })
    }
}
