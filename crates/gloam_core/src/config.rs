//! World configuration
//!
//! Every fixed capacity and tuning constant of the simulation lives here so the
//! services layer can load it from a settings file. Missing fields fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};

/// Tuning and capacity settings for one `World`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum number of simultaneously allocated entity slots.
    pub max_entities: usize,
    /// Leaf entry count that triggers a quadtree split.
    pub quadtree_split_threshold: usize,
    /// Deepest quadtree level; leaves at this depth never split.
    pub quadtree_max_depth: u32,
    /// Extra world units added around a mover's swept box when querying candidates.
    pub collision_query_margin: f32,
    /// Fixed hitsplat capacity.
    pub max_hitsplats: usize,
    /// Seconds a hitsplat stays on screen.
    pub hitsplat_lifetime: f32,
    /// Upward drift of hitsplats in world units per second.
    pub hitsplat_rise_speed: f32,
    /// Particle ring capacity per chunk.
    pub particles_per_chunk: usize,
    /// Gravity applied to particles (world units per second squared, +y is down).
    pub particle_gravity: f32,
    /// Seconds a transferred light takes to fade out after its owner dies.
    pub light_fade_seconds: f32,
    /// Margin in world units around the camera rectangle for culling and particle updates.
    pub render_margin: f32,
    /// Health granted per point of vitality.
    pub health_per_vitality: i32,
    /// Seed for the world RNG.
    pub rng_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: 4096,
            quadtree_split_threshold: 8,
            quadtree_max_depth: 8,
            collision_query_margin: 32.0,
            max_hitsplats: 128,
            hitsplat_lifetime: 1.0,
            hitsplat_rise_speed: 24.0,
            particles_per_chunk: 512,
            particle_gravity: 0.0,
            light_fade_seconds: 1.5,
            render_margin: 64.0,
            health_per_vitality: 5,
            rng_seed: 0x5EED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: WorldConfig =
            serde_json::from_str(r#"{ "max_entities": 16, "rng_seed": 7 }"#).unwrap();
        assert_eq!(config.max_entities, 16);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.quadtree_max_depth, WorldConfig::default().quadtree_max_depth);
    }
}
