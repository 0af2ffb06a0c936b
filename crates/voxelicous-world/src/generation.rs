//! The terrain pipeline: turns `(chunk position, parameters)` into a full voxel grid.
//!
//! Mirrors the staged pipeline of the system this was distilled from: a heightmap pass,
//! shore smoothing, a light blur, biome classification with a majority filter, biome
//! height adjustments, per-column material selection, and cave carving — each stage
//! reads the previous stage's output and nothing else.

use std::collections::VecDeque;

use glam::Mat3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voxelicous_core::coords::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use voxelicous_core::{BlockKind, ChunkPos};

use crate::noise::Noise;
use crate::params::{BiomeType, TerrainGenerationParams};

const WIDTH: i32 = CHUNK_WIDTH;
const HEIGHT: i32 = CHUNK_HEIGHT;
const DEPTH: i32 = CHUNK_DEPTH;
const COLUMNS: usize = (WIDTH * DEPTH) as usize;
pub const BLOCK_COUNT: usize = (WIDTH * HEIGHT * DEPTH) as usize;

/// `i = x + WIDTH*(y + HEIGHT*z)`, the linear index every chunk-shaped flat array uses.
#[inline]
#[must_use]
pub const fn block_index(x: i32, y: i32, z: i32) -> usize {
    (x + WIDTH * (y + HEIGHT * z)) as usize
}

#[inline]
fn column_index(x: i32, z: i32) -> usize {
    (x + WIDTH * z) as usize
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// All the independent noise fields the pipeline samples, each seeded from
/// `params.seed` with a fixed per-field offset so the same seed always reproduces the
/// same world.
struct NoiseFields {
    base: Noise,
    detail: Noise,
    warp: Noise,
    weirdness: Noise,
    moisture: Noise,
    temperature: Noise,
    river: Noise,
}

impl NoiseFields {
    fn new(seed: i32) -> Self {
        Self {
            base: Noise::new(seed.wrapping_add(1)),
            detail: Noise::new(seed.wrapping_add(2)),
            warp: Noise::new(seed.wrapping_add(3)),
            weirdness: Noise::new(seed.wrapping_add(98789)),
            moisture: Noise::new(seed.wrapping_add(54321)),
            temperature: Noise::new(seed.wrapping_add(424242)),
            river: Noise::new(seed.wrapping_add(99999)),
        }
    }
}

/// Step A. Samples continent/hills/weirdness/warp/river fields and folds them into a
/// single pre-smoothing column height.
fn compute_column_height(
    params: &TerrainGenerationParams,
    noise: &NoiseFields,
    world_x: f32,
    world_z: f32,
) -> f32 {
    let continent = noise
        .base
        .fractal_brownian_motion_2d(world_x * 0.0005, world_z * 0.0005, 8, 2.0, 0.5)
        .clamp(-3.8, 3.8);

    let hills = noise
        .base
        .fractal_brownian_motion_2d(world_x * 0.005, world_z * 0.005, 5, 2.0, 0.5)
        .clamp(0.0, 1.0);

    let weirdness = noise
        .weirdness
        .fractal_brownian_motion_2d(world_x * 0.002, world_z * 0.002, 5, 2.0, 0.5)
        .clamp(-1.0, 1.0);
    let pv = 1.0 - (3.0 * weirdness.abs() - 2.0).abs();

    let warp_x = world_x + noise.warp.get_noise2(world_x, world_z) * 20.0;
    let warp_z = world_z + noise.warp.get_noise2(world_z, world_x) * 20.0;

    let inland_factor = smoothstep(-0.455, 0.5, continent);
    let plains_baseline = 10.0;
    let mut base_h = params.sea_level as f32 + inland_factor * plains_baseline;

    let mut mountain_mask = smoothstep(0.45, 0.85, inland_factor);
    mountain_mask *= params.mountain_boost;

    if mountain_mask > 0.15 {
        base_h += pv * 40.0 * params.pv_boost * mountain_mask;
    }

    let hills_term = hills * 20.0 * mountain_mask;
    let detail_term = noise
        .detail
        .fractal_brownian_motion_2d(warp_x * 0.03, warp_z * 0.03, 3, 2.0, 0.5)
        * 6.0
        * mix(0.6, 1.0, mountain_mask);
    let fine_detail = noise
        .detail
        .fractal_brownian_motion_2d(warp_x * 0.1, warp_z * 0.1, 2, 2.0, 0.5)
        * 2.0;

    let mut final_h = base_h + hills_term + detail_term + fine_detail;

    let r = noise
        .river
        .get_noise2(world_x * 0.002, world_z * 0.002)
        .abs();
    if r < params.river_threshold {
        let mix_amount =
            (smoothstep(params.river_threshold, 0.0, r) * params.river_strength * 0.6)
                .clamp(0.0, 1.0);
        final_h = mix(final_h, params.sea_level as f32 - 2.0, mix_amount);
    }

    final_h.clamp(1.0, (HEIGHT - 20) as f32)
}

/// Step D. Classifies one column by coarse climate, with height-driven overrides for
/// high-altitude snow/mountain terrain.
fn compute_column_biome(
    params: &TerrainGenerationParams,
    noise: &NoiseFields,
    world_x: f32,
    world_z: f32,
    base_height: f32,
) -> BiomeType {
    if base_height <= params.sea_level as f32 {
        return BiomeType::Ocean;
    }

    let chunks = params.biome_scale_chunks.max(1) as f32;
    let world_units_per_patch = chunks * WIDTH as f32 * 8.0;
    let freq_coarse = 1.0 / world_units_per_patch.max(256.0);

    let temp_coarse = (noise
        .temperature
        .fractal_brownian_motion_2d(world_x * freq_coarse, world_z * freq_coarse, 4, 2.0, 0.5)
        + 1.0)
        * 0.5;
    let moist_coarse = (noise.moisture.fractal_brownian_motion_2d(
        world_x * freq_coarse * 0.9,
        world_z * freq_coarse * 0.9,
        4,
        2.0,
        0.5,
    ) + 1.0)
        * 0.5;

    let region_bias = Noise::new(params.seed.wrapping_add(4242));
    let bias = (region_bias.fractal_brownian_motion_2d(
        world_x * freq_coarse * 0.6,
        world_z * freq_coarse * 0.6,
        3,
        2.0,
        0.5,
    ) + 1.0)
        * 0.5;

    let mut climate =
        (mix(temp_coarse, 1.0 - moist_coarse, 0.35) * 0.7 + bias * 0.3).clamp(0.0, 1.0);

    let continent = noise
        .base
        .fractal_brownian_motion_2d(world_x * 0.0005, world_z * 0.0005, 6, 2.0, 0.5);
    let inland_factor = smoothstep(-0.455, 0.5, continent);

    let mountain_range = ((noise
        .base
        .fractal_brownian_motion_2d(world_x * 0.0022, world_z * 0.0022, 5, 2.0, 0.5)
        + 1.0)
        * 0.5)
        .clamp(0.0, 1.0);

    if base_height > params.sea_level as f32 + 28.0 {
        if temp_coarse < params.snow_temperature_threshold
            || base_height > params.sea_level as f32 + 60.0
        {
            return BiomeType::Snow;
        }
        return BiomeType::Mountain;
    }
    if mountain_range > 0.58 && inland_factor > 0.45 {
        if temp_coarse < params.snow_temperature_threshold {
            return BiomeType::Snow;
        }
        return BiomeType::Mountain;
    }

    climate = ((climate - 0.5) * 1.6 + 0.5).clamp(0.0, 1.0);

    if climate < 0.18 {
        return BiomeType::Snow;
    }
    if base_height > params.sea_level as f32 + 30.0 && temp_coarse < 0.45 {
        return BiomeType::Snow;
    }
    if moist_coarse > params.forest_moisture_threshold * 0.9 && climate < 0.65 {
        return BiomeType::Forest;
    }
    if climate > 0.68 && moist_coarse < params.desert_moisture_threshold + 0.05 {
        return BiomeType::Desert;
    }
    BiomeType::Plains
}

/// Step B: BFS distance-from-water ramp that softens the coastline.
fn apply_shore_smoothing(heightmap: &mut [f32], params: &TerrainGenerationParams) {
    let radius = params.shore_smooth_radius;
    if radius <= 0 {
        return;
    }
    let mut dist = vec![i32::MAX; COLUMNS];
    let mut queue = VecDeque::new();
    for z in 0..DEPTH {
        for x in 0..WIDTH {
            let idx = column_index(x, z);
            if heightmap[idx] <= params.sea_level as f32 {
                dist[idx] = 0;
                queue.push_back(idx);
            }
        }
    }
    let dx4 = [1i32, -1, 0, 0];
    let dz4 = [0i32, 0, 1, -1];
    while let Some(cur) = queue.pop_front() {
        let cx = (cur as i32) % WIDTH;
        let cz = (cur as i32) / WIDTH;
        for k in 0..4 {
            let nx = cx + dx4[k];
            let nz = cz + dz4[k];
            if nx < 0 || nx >= WIDTH || nz < 0 || nz >= DEPTH {
                continue;
            }
            let nidx = column_index(nx, nz);
            if dist[nidx] > dist[cur] + 1 {
                dist[nidx] = dist[cur] + 1;
                if dist[nidx] < radius {
                    queue.push_back(nidx);
                }
            }
        }
    }
    for z in 0..DEPTH {
        for x in 0..WIDTH {
            let idx = column_index(x, z);
            let d = dist[idx];
            if d > 0 && d <= radius {
                let t = 1.0 - (d as f32 / radius as f32);
                let target = params.sea_level as f32 + d as f32 * params.shore_slope_factor;
                let mix_amt = (t * params.shore_smooth_strength).clamp(0.0, 1.0);
                heightmap[idx] = mix(heightmap[idx], target, mix_amt);
            }
        }
    }
}

/// Step C: a single weak 3x3-mean pass that removes single-cell spikes.
fn apply_single_pass_smoothing(heightmap: &[f32]) -> Vec<f32> {
    let mut out = heightmap.to_vec();
    for x in 1..WIDTH - 1 {
        for z in 1..DEPTH - 1 {
            let idx = column_index(x, z);
            let mut sum = 0.0;
            for ox in -1..=1 {
                for oz in -1..=1 {
                    sum += heightmap[column_index(x + ox, z + oz)];
                }
            }
            out[idx] = mix(heightmap[idx], sum / 9.0, 0.35);
        }
    }
    out
}

/// Deterministic per-chunk cave-worm seeding: `A`/`B` are the fixed 64-bit mixing
/// constants; `seed` folds the terrain seed with the source chunk's position so every
/// chunk in the 5x5 carving neighborhood gets an independent, reproducible worm count.
const WORM_SEED_A: i64 = 341_873_128_712;
const WORM_SEED_B: i64 = 132_897_987_541;

struct Worm {
    pos: glam::Vec3,
    radius: f32,
    steps: u32,
}

fn carve_worm(worm: &Worm, blocks: &mut [BlockKind], origin_x: i32, origin_z: i32) {
    let mut worm_noise = Noise::new(1337);
    worm_noise.set_frequency(0.1);

    let mut pos = worm.pos;
    let mut dir = glam::Vec3::new(0.0, 0.0, 1.0).normalize();
    let radius = worm.radius;
    let radius_i = radius.ceil() as i32;

    for _ in 0..worm.steps {
        let angle_x = worm_noise.get_noise3(pos.x, pos.y, pos.z) * 0.5;
        let angle_y = worm_noise.get_noise3(pos.y, pos.z, pos.x) * 0.5;
        let rot = Mat3::from_rotation_x(angle_x) * Mat3::from_rotation_y(angle_y);
        dir = (rot * dir).normalize();
        pos += dir;

        for ox in -radius_i..=radius_i {
            for oy in -radius_i..=radius_i {
                for oz in -radius_i..=radius_i {
                    let offset = glam::Vec3::new(ox as f32, oy as f32, oz as f32);
                    if offset.length() > radius {
                        continue;
                    }
                    let p = pos + offset;
                    let bx = (p.x - origin_x as f32) as i32;
                    let by = p.y as i32;
                    let bz = (p.z - origin_z as f32) as i32;
                    if (0..WIDTH).contains(&bx)
                        && (0..HEIGHT).contains(&by)
                        && (0..DEPTH).contains(&bz)
                    {
                        blocks[block_index(bx, by, bz)] = BlockKind::Air;
                    }
                }
            }
        }
    }
}

/// Step G: carves caves from a 5x5 neighborhood of chunk positions so worms cross
/// chunk borders without ever writing outside the chunk currently being generated.
fn carve_caves(blocks: &mut [BlockKind], pos: ChunkPos, params: &TerrainGenerationParams) {
    let (origin_x, origin_z) = pos.origin();
    let world_seed = params.seed as i64 as u64;

    for dx in -2..=2i32 {
        for dz in -2..=2i32 {
            let source_chunk_x = pos.x + dx;
            let source_chunk_z = pos.z + dz;

            let mix_term = (source_chunk_x as i64)
                .wrapping_mul(WORM_SEED_A)
                .wrapping_add((source_chunk_z as i64).wrapping_mul(WORM_SEED_B));
            let chunk_seed = (world_seed ^ (mix_term as u32 as u64)) & 0xFFFF_FFFF;

            let mut rng = StdRng::seed_from_u64(chunk_seed);
            let num_worms = i32::from(rng.gen_range(0..50) == 0);

            for _ in 0..num_worms {
                let local_x = rng.gen_range(0..WIDTH) as f32;
                let local_z = rng.gen_range(0..DEPTH) as f32;
                let world_x = (source_chunk_x * WIDTH) as f32 + local_x;
                let world_z = (source_chunk_z * DEPTH) as f32 + local_z;
                let world_y = 10.0 + rng.gen_range(0..40) as f32;

                let worm = Worm {
                    pos: glam::Vec3::new(world_x, world_y, world_z),
                    radius: 2.0,
                    steps: 240,
                };
                carve_worm(&worm, blocks, origin_x, origin_z);
            }
        }
    }
}

/// Runs the full pipeline (Steps A-G) and returns the chunk's flat `BlockKind` grid,
/// indexed by [`block_index`]. Step H (palette encoding) happens in `Chunk::generate`.
#[must_use]
pub fn generate_blocks(pos: ChunkPos, params: &TerrainGenerationParams) -> Vec<BlockKind> {
    let noise = NoiseFields::new(params.seed);
    let (origin_x, origin_z) = pos.origin();

    let mut heightmap = vec![params.sea_level as f32; COLUMNS];
    let mut moisture_map = vec![0.0f32; COLUMNS];
    let mut hills_map = vec![0.0f32; COLUMNS];
    let mut continent_map = vec![0.0f32; COLUMNS];

    for x in 0..WIDTH {
        for z in 0..DEPTH {
            let idx = column_index(x, z);
            let wx = (origin_x + x) as f32;
            let wz = (origin_z + z) as f32;

            moisture_map[idx] = (noise
                .moisture
                .fractal_brownian_motion_2d(wx * 0.0008, wz * 0.0008, 6, 2.0, 0.5)
                + 1.0)
                * 0.5;

            heightmap[idx] = compute_column_height(params, &noise, wx, wz);

            hills_map[idx] = noise
                .base
                .fractal_brownian_motion_2d(wx * 0.005, wz * 0.005, 5, 2.0, 0.5)
                .clamp(0.0, 1.0);

            let continent = noise
                .base
                .fractal_brownian_motion_2d(wx * 0.0005, wz * 0.0005, 8, 2.0, 0.5);
            continent_map[idx] = smoothstep(-0.455, 0.5, continent);
        }
    }

    apply_shore_smoothing(&mut heightmap, params);
    let mut heightmap = apply_single_pass_smoothing(&heightmap);

    let mut blocks = vec![BlockKind::Air; BLOCK_COUNT];

    for x in 0..WIDTH {
        for z in 0..DEPTH {
            let idx = column_index(x, z);
            let wx = (origin_x + x) as f32;
            let wz = (origin_z + z) as f32;

            let mut base_h = heightmap[idx];
            let moisture = moisture_map[idx];

            let mountain_noise = noise
                .weirdness
                .fractal_brownian_motion_2d(wx * 0.006, wz * 0.006, 4, 2.0, 0.5)
                .clamp(-1.0, 1.0);

            let mut biome = compute_column_biome(params, &noise, wx, wz, base_h);

            // Step D: 3x3 majority filter, removing isolated single-column speckles.
            let mut counts = [0u32; 6];
            for ox in -1..=1 {
                for oz in -1..=1 {
                    let nx = (x + ox).clamp(0, WIDTH - 1);
                    let nz = (z + oz).clamp(0, DEPTH - 1);
                    let nwx = (origin_x + nx) as f32;
                    let nwz = (origin_z + nz) as f32;
                    let n_base_h = heightmap[column_index(nx, nz)];
                    let nb = compute_column_biome(params, &noise, nwx, nwz, n_base_h);
                    counts[biome_index(nb)] += 1;
                }
            }
            let (max_idx, max_val) = counts
                .iter()
                .enumerate()
                .max_by_key(|&(_, &v)| v)
                .map(|(i, &v)| (i, v))
                .unwrap();
            let majority = biome_from_index(max_idx);
            if majority != biome && max_val >= 5 {
                biome = majority;
            }

            // Step E: biome height adjustments.
            if biome == BiomeType::Mountain {
                let mountain_range = ((noise
                    .base
                    .fractal_brownian_motion_2d(wx * 0.0022, wz * 0.0022, 5, 2.0, 0.5)
                    + 1.0)
                    * 0.5)
                    .clamp(0.0, 1.0);
                let amp =
                    smoothstep(0.45, 1.0, mountain_range) * smoothstep(0.15, 1.0, mountain_noise);
                let ridge = ((noise
                    .detail
                    .fractal_brownian_motion_2d(wx * 0.08, wz * 0.08, 3, 2.0, 0.5)
                    + 1.0)
                    * 0.5)
                    .clamp(0.0, 1.0);
                let ridge_amp = smoothstep(0.4, 1.0, ridge);
                base_h += amp * 60.0 * params.mountain_boost * (0.7 + 0.6 * ridge_amp);
            }
            if biome == BiomeType::Desert {
                base_h -= 6.0;
            }

            heightmap[idx] = base_h;

            let surface_y = (base_h.round() as i32).clamp(1, HEIGHT - 20);

            let h_l = if x > 0 {
                heightmap[column_index(x - 1, z)]
            } else {
                heightmap[idx]
            };
            let h_r = if x < WIDTH - 1 {
                heightmap[column_index(x + 1, z)]
            } else {
                heightmap[idx]
            };
            let h_d = if z > 0 {
                heightmap[column_index(x, z - 1)]
            } else {
                heightmap[idx]
            };
            let h_u = if z < DEPTH - 1 {
                heightmap[column_index(x, z + 1)]
            } else {
                heightmap[idx]
            };
            let dhdx = (h_r - h_l) * 0.5;
            let dhdz = (h_u - h_d) * 0.5;
            let slope = (dhdx * dhdx + dhdz * dhdz).sqrt();

            // Step F: material selection.
            let is_cliff = slope > params.cliff_slope_threshold
                && surface_y > params.sea_level + params.min_cliff_elevation
                && hills_map[idx] > 0.55
                && continent_map[idx] > -0.1;

            let (mut top, mut fill) = (BlockKind::Grass, BlockKind::Dirt);

            if surface_y <= params.sea_level {
                top = BlockKind::Sand;
                fill = BlockKind::Sand;
            } else if is_cliff || biome == BiomeType::Mountain {
                if surface_y > params.sea_level + 80 || biome == BiomeType::Snow {
                    top = BlockKind::Snow;
                    fill = BlockKind::Stone;
                } else {
                    top = BlockKind::Stone;
                    fill = BlockKind::Stone;
                }
            } else {
                match biome {
                    BiomeType::Desert => {
                        top = BlockKind::Sand;
                        fill = BlockKind::Sand;
                    }
                    BiomeType::Forest => {
                        top = BlockKind::Grass;
                        fill = BlockKind::Dirt;
                    }
                    BiomeType::Snow => {
                        top = BlockKind::Snow;
                        fill = BlockKind::Stone;
                    }
                    BiomeType::Plains | BiomeType::Ocean | BiomeType::Mountain => {
                        if moisture < 0.25 {
                            top = BlockKind::Sand;
                            fill = BlockKind::Sand;
                        } else {
                            top = BlockKind::Grass;
                            fill = BlockKind::Dirt;
                        }
                    }
                }
                if surface_y > params.sea_level + 110 {
                    top = BlockKind::Snow;
                    fill = BlockKind::Stone;
                }
                if biome == BiomeType::Desert {
                    top = BlockKind::Sand;
                    fill = BlockKind::Sand;
                }
            }

            for y in 0..=params.bedrock_level {
                blocks[block_index(x, y, z)] = BlockKind::Bedrock;
            }
            for y in (params.bedrock_level + 1)..(surface_y - 4) {
                blocks[block_index(x, y, z)] = BlockKind::Stone;
            }
            for y in (params.bedrock_level + 1).max(surface_y - 4)..surface_y {
                blocks[block_index(x, y, z)] = fill;
            }
            blocks[block_index(x, surface_y, z)] = top;
            for y in (surface_y + 1)..=params.sea_level.min(HEIGHT - 1) {
                blocks[block_index(x, y, z)] = BlockKind::Water;
            }
            for y in (surface_y + 1).max(params.sea_level + 1)..HEIGHT {
                blocks[block_index(x, y, z)] = BlockKind::Air;
            }
        }
    }

    carve_caves(&mut blocks, pos, params);

    blocks
}

fn biome_index(biome: BiomeType) -> usize {
    match biome {
        BiomeType::Ocean => 0,
        BiomeType::Plains => 1,
        BiomeType::Desert => 2,
        BiomeType::Forest => 3,
        BiomeType::Mountain => 4,
        BiomeType::Snow => 5,
    }
}

fn biome_from_index(index: usize) -> BiomeType {
    match index {
        0 => BiomeType::Ocean,
        1 => BiomeType::Plains,
        2 => BiomeType::Desert,
        3 => BiomeType::Forest,
        4 => BiomeType::Mountain,
        _ => BiomeType::Snow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_deterministic_across_calls() {
        let params = TerrainGenerationParams::default();
        let a = generate_blocks(ChunkPos::new(0, 0), &params);
        let b = generate_blocks(ChunkPos::new(0, 0), &params);
        assert_eq!(a, b);
    }

    #[test]
    fn different_chunk_positions_usually_differ() {
        let params = TerrainGenerationParams::default();
        let a = generate_blocks(ChunkPos::new(0, 0), &params);
        let b = generate_blocks(ChunkPos::new(40, 40), &params);
        assert_ne!(a, b);
    }

    #[test]
    fn column_above_sea_level_plus_one_is_water_or_air_never_solid() {
        let params = TerrainGenerationParams::default();
        let blocks = generate_blocks(ChunkPos::new(0, 0), &params);
        let y = params.sea_level + 1;
        let kind = blocks[block_index(8, y, 8)];
        assert!(
            matches!(kind, BlockKind::Water | BlockKind::Air),
            "expected water or air at sea_level+1, got {kind:?}"
        );
    }

    #[test]
    fn bedrock_forms_the_base_layer() {
        let params = TerrainGenerationParams::default();
        let blocks = generate_blocks(ChunkPos::new(2, -3), &params);
        for x in 0..WIDTH {
            for z in 0..DEPTH {
                assert_eq!(
                    blocks[block_index(x, params.bedrock_level, z)],
                    BlockKind::Bedrock
                );
            }
        }
    }

    #[test]
    fn generation_spans_a_mix_of_materials() {
        let params = TerrainGenerationParams::default();
        let blocks = generate_blocks(ChunkPos::new(0, 0), &params);
        let mut seen = hashbrown::HashSet::new();
        for &b in &blocks {
            seen.insert(b);
        }
        assert!(
            seen.len() > 1,
            "expected more than one material, saw {seen:?}"
        );
    }
}
