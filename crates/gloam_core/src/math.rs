//! Deterministic math utilities
//!
//! Re-exports glam with the axis-aligned rectangle used by the spatial index,
//! the collision resolver and render culling.

pub use glam::*;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world units (`min` inclusive, `max` inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(Vec2::ZERO, Vec2::ZERO);

    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn half_size(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Overlap test that counts touching edges as overlapping.
    ///
    /// Spatial queries use this form so an entity lying exactly on a node
    /// boundary is never missed.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Overlap test with positive area only.
    #[inline]
    pub fn overlaps_strict(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Whether `other` lies entirely inside `self`.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn expanded(&self, margin: f32) -> Rect {
        Rect {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Box covering this rect at its current position and after moving by `displacement`.
    pub fn swept(&self, displacement: Vec2) -> Rect {
        self.union(&self.translated(displacement))
    }

    /// Split into the four equal quadrants, ordered top-left, top-right,
    /// bottom-right, bottom-left (y grows downward).
    pub fn quadrants(&self) -> [Rect; 4] {
        let c = self.center();
        [
            Rect::new(self.min, c),
            Rect::new(Vec2::new(c.x, self.min.y), Vec2::new(self.max.x, c.y)),
            Rect::new(c, self.max),
            Rect::new(Vec2::new(self.min.x, c.y), Vec2::new(c.x, self.max.y)),
        ]
    }
}

/// Deterministic xorshift generator owned by the world.
///
/// Seeded from configuration so replays of the same inputs produce the same frames.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        // xorshift has a fixed point at zero
        let state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { seed, state }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Unit vector rotated `spread` radians at most either side of `direction`.
    pub fn direction_within(&mut self, direction: Vec2, spread: f32) -> Vec2 {
        let base = if direction.length_squared() > 0.0 {
            direction.y.atan2(direction.x)
        } else {
            self.range_f32(0.0, std::f32::consts::TAU)
        };
        let angle = base + self.range_f32(-spread, spread);
        Vec2::from_angle(angle)
    }
}
