//! Per-position tint colors.

use noise::{NoiseFn, Perlin};

use crate::engine_state::voxels::block::catalog::{BlockCatalogEntry, TintSource};

/// Scale applied to world coordinates before sampling the temperature field.
pub const TEMPERATURE_SCALE: f64 = 0.005;

/// Untinted.
pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A smooth temperature field over the world that blends foliage between a cool and a
/// warm color. Deterministic for a given seed.
pub struct BiomeColors {
    perlin: Perlin,
    cool: [f32; 4],
    warm: [f32; 4],
}

impl BiomeColors {
    pub fn new(seed: u32) -> Self {
        BiomeColors {
            perlin: Perlin::new(seed),
            cool: [0.38, 0.61, 0.45, 1.0],
            warm: [0.57, 0.74, 0.29, 1.0],
        }
    }

    pub fn with_colors(mut self, cool: [f32; 4], warm: [f32; 4]) -> Self {
        self.cool = cool;
        self.warm = warm;
        self
    }

    /// Temperature in `0.0..=1.0` at a world column.
    pub fn temperature(&self, world_x: i32, world_z: i32) -> f32 {
        let sample = self.perlin.get([
            world_x as f64 * TEMPERATURE_SCALE,
            world_z as f64 * TEMPERATURE_SCALE,
        ]);
        ((sample as f32 + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Foliage color at a world column.
    pub fn color_at(&self, world_x: i32, world_z: i32) -> [f32; 4] {
        let t = self.temperature(world_x, world_z);
        std::array::from_fn(|channel| self.cool[channel] + (self.warm[channel] - self.cool[channel]) * t)
    }

    /// Resolves a block's tint at a world position.
    pub fn tint(&self, entry: &BlockCatalogEntry, world_x: i32, world_z: i32) -> [f32; 4] {
        match entry.tint {
            TintSource::None => WHITE,
            TintSource::Biome => self.color_at(world_x, world_z),
            TintSource::Fixed(color) => color,
        }
    }
}

impl Default for BiomeColors {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_stay_between_endpoints() {
        let colors = BiomeColors::new(3).with_colors([0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]);
        for (x, z) in [(0, 0), (150, -40), (-999, 2048)] {
            let color = colors.color_at(x, z);
            assert!(color[..3].iter().all(|c| (0.0..=1.0).contains(c)));
            assert_eq!(color[3], 1.0);
        }
    }

    #[test]
    fn test_field_is_deterministic() {
        let a = BiomeColors::new(9);
        let b = BiomeColors::new(9);
        assert_eq!(a.color_at(123, -77), b.color_at(123, -77));
    }
}
