//! Neighbor-aware mesh building: a chunk's voxel grid to an interleaved vertex list.
//!
//! Face culling needs to see one block beyond this chunk's horizontal edges, so
//! [`build_mesh_data`] takes a closure rather than only `&[BlockKind]`: the chunk
//! supplies its own blocks plus a way to peek at a linked neighbor's edge column.
//! A neighbor that isn't linked yet (or has been evicted) reads as AIR, which always
//! draws the face — better an extra triangle than a hole in the world.

use bytemuck::{Pod, Zeroable};
use voxelicous_core::coords::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use voxelicous_core::{BlockKind, Direction};

use crate::generation::block_index;

const WIDTH: i32 = CHUNK_WIDTH;
const HEIGHT: i32 = CHUNK_HEIGHT;
const DEPTH: i32 = CHUNK_DEPTH;

const ATLAS_COLS: f32 = 7.0;
const ATLAS_ROWS: f32 = 1.0;

/// One mesh vertex: world-space position, atlas UV, a gradient input (the vertex's
/// world Y, for a cheap height-based tint in the renderer), and a face normal.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub gradient: f32,
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Top,
    Bottom,
    East,
    West,
    North,
    South,
}

const FACES: [Face; 6] = [
    Face::Top,
    Face::Bottom,
    Face::East,
    Face::West,
    Face::North,
    Face::South,
];

/// Two triangles (six vertices) per face, as offsets from the voxel's min corner.
fn face_corners(face: Face) -> [[f32; 3]; 6] {
    match face {
        Face::Top => [
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ],
        Face::Bottom => [
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
        ],
        Face::East => [
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
        ],
        Face::West => [
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
        ],
        Face::North => [
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.0, 0.0, 1.0],
        ],
        Face::South => [
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
        ],
    }
}

const BASE_UV: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
];

fn face_normal(face: Face) -> [f32; 3] {
    match face {
        Face::Top => [0.0, 1.0, 0.0],
        Face::Bottom => [0.0, -1.0, 0.0],
        Face::East => [1.0, 0.0, 0.0],
        Face::West => [-1.0, 0.0, 0.0],
        Face::North => [0.0, 0.0, 1.0],
        Face::South => [0.0, 0.0, -1.0],
    }
}

/// Atlas tile `(col, row)` for a block kind and the face being drawn. Grass is the
/// only kind with distinct top/bottom/side tiles; bedrock reuses grass-top's slot
/// since the two are never visible at once (bedrock only ever sits at world-bottom).
fn tile_offset(kind: BlockKind, face: Face) -> (f32, f32) {
    match kind {
        BlockKind::Grass => match face {
            Face::Top => (0.0, 0.0),
            Face::Bottom => (2.0, 0.0),
            _ => (1.0, 0.0),
        },
        BlockKind::Dirt => (2.0, 0.0),
        BlockKind::Stone => (3.0, 0.0),
        BlockKind::Sand => (4.0, 0.0),
        BlockKind::Snow => (5.0, 0.0),
        BlockKind::Water => (6.0, 0.0),
        BlockKind::Bedrock | BlockKind::Air => (0.0, 0.0),
    }
}

fn face_uv(kind: BlockKind, face: Face, corner: usize) -> [f32; 2] {
    let (tile_col, tile_row) = tile_offset(kind, face);
    let [u, v] = BASE_UV[corner];
    [
        u / ATLAS_COLS + tile_col / ATLAS_COLS,
        v / ATLAS_ROWS + tile_row / ATLAS_ROWS,
    ]
}

/// Resolves the block just across one of the four horizontal chunk edges, from the
/// perspective of the chunk being meshed. `perpendicular` is the coordinate along the
/// edge (an x for North/South, a z for East/West); `y` is the world height. Returns
/// `None` when that neighbor isn't linked, which [`build_mesh_data`] treats as AIR.
pub trait NeighborLookup {
    fn neighbor_block(&self, dir: Direction, perpendicular: i32, y: i32) -> Option<BlockKind>;
}

/// Builds the interleaved vertex list for a chunk's non-AIR blocks, emitting a face
/// only where the adjacent cell (in-chunk or across a linked neighbor) is AIR.
#[must_use]
pub fn build_mesh_data(blocks: &[BlockKind], neighbors: &dyn NeighborLookup) -> Vec<Vertex> {
    let mut vertices = Vec::new();

    for z in 0..DEPTH {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let kind = blocks[block_index(x, y, z)];
                if kind.is_air() {
                    continue;
                }

                for &face in &FACES {
                    let neighbor = match face {
                        Face::Top => {
                            if y + 1 < HEIGHT {
                                Some(blocks[block_index(x, y + 1, z)])
                            } else {
                                None
                            }
                        }
                        Face::Bottom => {
                            if y > 0 {
                                Some(blocks[block_index(x, y - 1, z)])
                            } else {
                                None
                            }
                        }
                        Face::East => {
                            if x + 1 < WIDTH {
                                Some(blocks[block_index(x + 1, y, z)])
                            } else {
                                neighbors.neighbor_block(Direction::East, z, y)
                            }
                        }
                        Face::West => {
                            if x > 0 {
                                Some(blocks[block_index(x - 1, y, z)])
                            } else {
                                neighbors.neighbor_block(Direction::West, z, y)
                            }
                        }
                        Face::North => {
                            if z + 1 < DEPTH {
                                Some(blocks[block_index(x, y, z + 1)])
                            } else {
                                neighbors.neighbor_block(Direction::North, x, y)
                            }
                        }
                        Face::South => {
                            if z > 0 {
                                Some(blocks[block_index(x, y, z - 1)])
                            } else {
                                neighbors.neighbor_block(Direction::South, x, y)
                            }
                        }
                    };

                    let visible = neighbor.map_or(true, |k| k.is_air());
                    if !visible {
                        continue;
                    }

                    let normal = face_normal(face);
                    for (corner, offset) in face_corners(face).into_iter().enumerate() {
                        let position = [
                            x as f32 + offset[0],
                            y as f32 + offset[1],
                            z as f32 + offset[2],
                        ];
                        vertices.push(Vertex {
                            position,
                            uv: face_uv(kind, face, corner),
                            gradient: position[1],
                            normal,
                        });
                    }
                }
            }
        }
    }

    vertices
}

/// A [`NeighborLookup`] that treats every edge as unlinked (always AIR). Useful for
/// meshing a chunk in isolation, before it has any neighbors.
pub struct NoNeighbors;

impl NeighborLookup for NoNeighbors {
    fn neighbor_block(&self, _dir: Direction, _perpendicular: i32, _y: i32) -> Option<BlockKind> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_column_blocks() -> Vec<BlockKind> {
        let mut blocks = vec![BlockKind::Air; (WIDTH * HEIGHT * DEPTH) as usize];
        blocks[block_index(8, 5, 8)] = BlockKind::Stone;
        blocks
    }

    #[test]
    fn isolated_block_emits_all_six_faces() {
        let blocks = solid_column_blocks();
        let verts = build_mesh_data(&blocks, &NoNeighbors);
        assert_eq!(verts.len(), 6 * 6);
    }

    #[test]
    fn buried_block_emits_no_faces() {
        let mut blocks = vec![BlockKind::Stone; (WIDTH * HEIGHT * DEPTH) as usize];
        // Keep it away from the world floor/ceiling and horizontal edges so every
        // neighbor lookup resolves in-chunk.
        let verts = build_mesh_data(&blocks, &NoNeighbors);
        // Only the outermost shell (edges peeking past the chunk, which reads as AIR)
        // should contribute faces; the bulk of solid stone contributes none.
        let total = (WIDTH * HEIGHT * DEPTH) as usize;
        assert!(verts.len() / 6 < total, "expected most faces culled");
        blocks[block_index(8, 128, 8)] = BlockKind::Air;
        let verts_with_hole = build_mesh_data(&blocks, &NoNeighbors);
        assert!(verts_with_hole.len() > verts.len());
    }

    #[test]
    fn linked_solid_neighbor_culls_the_shared_face() {
        let blocks = solid_column_blocks();

        struct AllSolid;
        impl NeighborLookup for AllSolid {
            fn neighbor_block(&self, _: Direction, _: i32, _: i32) -> Option<BlockKind> {
                Some(BlockKind::Stone)
            }
        }

        let verts_open = build_mesh_data(&blocks, &NoNeighbors);
        let verts_linked = build_mesh_data(&blocks, &AllSolid);
        assert!(verts_linked.len() < verts_open.len());
    }

    #[test]
    fn grass_top_and_bottom_use_different_tiles() {
        let top = face_uv(BlockKind::Grass, Face::Top, 0);
        let bottom = face_uv(BlockKind::Grass, Face::Bottom, 0);
        assert_ne!(top, bottom);
    }
}
