//! Terrain generation tunables.

/// Flat record of every tunable the terrain pipeline reads. Constructible with
/// struct-update syntax over [`TerrainGenerationParams::default`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainGenerationParams {
    /// Root seed for every `Noise` instance the generator creates.
    pub seed: i32,
    pub sea_level: i32,
    pub bedrock_level: i32,

    pub river_threshold: f32,
    pub river_strength: f32,

    pub mountain_boost: f32,
    pub pv_boost: f32,

    pub smoothing_strength: f32,

    pub cliff_slope_threshold: f32,
    pub min_cliff_elevation: i32,

    pub shore_smooth_radius: i32,
    pub shore_slope_factor: f32,
    pub shore_smooth_strength: f32,

    pub biome_scale_chunks: i32,
    pub snow_temperature_threshold: f32,
    pub forest_moisture_threshold: f32,
    pub desert_moisture_threshold: f32,

    /// Only used by the biome-map dump utility.
    pub gen_size: i32,
    /// Only used by the biome-map dump utility.
    pub downsample: i32,
}

impl Default for TerrainGenerationParams {
    fn default() -> Self {
        Self {
            seed: 1337,
            sea_level: 62,
            bedrock_level: 0,
            river_threshold: 0.005,
            river_strength: 0.25,
            mountain_boost: 1.6,
            pv_boost: 1.8,
            smoothing_strength: 0.25,
            cliff_slope_threshold: 1.6,
            min_cliff_elevation: 24,
            shore_smooth_radius: 10,
            shore_slope_factor: 1.5,
            shore_smooth_strength: 0.9,
            biome_scale_chunks: 4,
            snow_temperature_threshold: 0.35,
            forest_moisture_threshold: 0.55,
            desert_moisture_threshold: 0.35,
            gen_size: 1000,
            downsample: 16,
        }
    }
}

/// Coarse climate classification, used only inside the generator to decide surface
/// materials and height adjustments. Never persisted — only the resulting `BlockKind`
/// per cell is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiomeType {
    Ocean,
    Plains,
    Desert,
    Forest,
    Mountain,
    Snow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = TerrainGenerationParams::default();
        assert_eq!(p.seed, 1337);
        assert_eq!(p.sea_level, 62);
        assert_eq!(p.bedrock_level, 0);
        assert!((p.river_threshold - 0.005).abs() < f32::EPSILON);
        assert!((p.mountain_boost - 1.6).abs() < 1e-6);
        assert_eq!(p.shore_smooth_radius, 10);
    }

    #[test]
    fn struct_update_syntax_overrides_one_field() {
        let p = TerrainGenerationParams {
            seed: 7,
            ..Default::default()
        };
        assert_eq!(p.seed, 7);
        assert_eq!(p.sea_level, 62);
    }
}
