//! Game Components
//!
//! All component types the simulation knows about. Components are plain data;
//! behavior lives in the world's per-frame phases. A component never owns another
//! entity: cross-entity links are `EntityId`s that must be looked up again.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::component::declare_components;
use super::entity::EntityId;
use crate::collision::RetriggerPolicy;
use crate::math::Rect;

declare_components! {
    Physics => physics,
    Collider => colliders,
    Health => health,
    Stats => stats,
    Equipment => equipment,
    ItemStats => item_stats,
    Ai => ai,
    ParticleSpawner => spawners,
    Lifetime => lifetimes,
    StatusEffects => status_effects,
    Animation => animations,
    Light => lights,
    DamageField => damage_fields,
    EffectApplier => effect_appliers,
    ArcingProjectile => projectiles,
    ChainLink => chain_links,
    Sprite => sprites,
}

// =============================================================================
// Physics / Movement
// =============================================================================

/// Facing only follows velocity above this speed, so near-stationary entities
/// keep their last direction instead of flickering.
pub const FACING_SPEED_THRESHOLD: f32 = 1.0;

/// Spatial presence. Entities without it have no quadtree location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Physics {
    pub position: Vec2,
    /// World units per second.
    pub velocity: Vec2,
    /// Unit vector of the last meaningful movement direction.
    pub facing: Vec2,
    /// Multiplier applied to velocity during movement (slows write this).
    pub speed_scale: f32,
    /// Fraction of last frame's displacement that was applied.
    pub last_movement_fraction: f32,
}

impl Physics {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing: Vec2::X,
            speed_scale: 1.0,
            last_movement_fraction: 1.0,
        }
    }
}

/// How a collider reacts when its swept box hits a solid obstacle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Stop at the time of impact.
    #[default]
    Stop,
    /// Stop at the time of impact and reflect velocity along the contact normal.
    Bounce,
    /// Never blocks; contacts are still recorded and triggers still fire.
    PassThrough,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Collider {
    pub size: Vec2,
    /// Offset of the box center from `Physics::position`.
    pub offset: Vec2,
    /// Entities sharing a nonzero group never collide with each other.
    pub group: u16,
    pub policy: CollisionPolicy,
    /// Skip the tile sweep (ghosts, projectiles fired over walls).
    pub ignores_tiles: bool,
}

impl Collider {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_group(mut self, group: u16) -> Self {
        self.group = group;
        self
    }

    #[inline]
    pub fn bounds(&self, position: Vec2) -> Rect {
        Rect::from_center_size(position + self.offset, self.size)
    }

    #[inline]
    pub fn blocks(&self) -> bool {
        self.policy != CollisionPolicy::PassThrough
    }
}

// =============================================================================
// Combat / Stats
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
    /// Max before stat and equipment bonuses.
    pub base_max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self {
            current: max,
            max,
            base_max: max,
        }
    }

    /// Apply damage, clamping at zero. Returns true when this hit was lethal.
    pub fn damage(&mut self, amount: i32) -> bool {
        let was_alive = self.current > 0;
        self.current = self.current.saturating_sub(amount.max(0)).max(0);
        was_alive && self.current == 0
    }

    pub fn heal(&mut self, amount: i32) {
        self.current = self.current.saturating_add(amount.max(0)).min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    pub fn ratio(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Stats {
    pub vitality: i32,
    pub strength: i32,
    /// Flat reduction applied to every incoming hit.
    pub armor: i32,
}

pub const EQUIPMENT_SLOTS: usize = 4;

/// Item entities worn by this entity. Slots hold weak ids; a stale id is an empty slot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub items: [EntityId; EQUIPMENT_SLOTS],
}

/// Bonuses an item entity grants while equipped.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ItemStats {
    pub vitality: i32,
    pub armor: i32,
}

// =============================================================================
// AI
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Idle,
    Wander,
    Chase,
    Flee,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Ai {
    pub state: AiState,
    pub target: EntityId,
    pub speed: f32,
    pub sight_radius: f32,
    /// Seconds between target searches.
    pub think_interval: f32,
    pub think_timer: f32,
    pub wander_direction: Vec2,
    /// Health ratio under which a chasing entity turns to flee.
    pub flee_below: f32,
}

impl Ai {
    pub fn hunter(speed: f32, sight_radius: f32) -> Self {
        Self {
            speed,
            sight_radius,
            think_interval: 0.5,
            ..Self::default()
        }
    }
}

// =============================================================================
// Effects
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ParticleSpawner {
    /// Particles per second while running.
    pub rate: f32,
    pub accumulator: f32,
    /// Particles emitted on the first tick.
    pub burst: u32,
    pub burst_emitted: bool,
    pub particle_lifetime: f32,
    pub speed: f32,
    pub direction: Vec2,
    /// Half-angle in radians around `direction`.
    pub spread: f32,
    pub drag: f32,
    /// One-shot spawners finish after `duration` seconds.
    pub one_shot: bool,
    pub duration: f32,
    pub elapsed: f32,
    pub finished: bool,
    pub remove_entity_when_finished: bool,
}

impl ParticleSpawner {
    pub fn burst(count: u32, particle_lifetime: f32, speed: f32) -> Self {
        Self {
            burst: count,
            particle_lifetime,
            speed,
            spread: std::f32::consts::PI,
            one_shot: true,
            remove_entity_when_finished: true,
            ..Self::default()
        }
    }

    pub fn stream(rate: f32, particle_lifetime: f32, speed: f32) -> Self {
        Self {
            rate,
            particle_lifetime,
            speed,
            spread: std::f32::consts::PI,
            ..Self::default()
        }
    }
}

/// Counts down and removes its entity at zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn seconds(remaining: f32) -> Self {
        Self { remaining }
    }

    pub fn expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

pub const MAX_STATUS_EFFECTS: usize = 4;
/// Seconds between damage/heal pulses of periodic effects.
pub const STATUS_PULSE_INTERVAL: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    #[default]
    Poison,
    Burn,
    /// Magnitude is the fraction of speed removed (0.3 = 30% slower).
    Slow,
    Regen,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub magnitude: f32,
    pub remaining: f32,
    pub pulse_timer: f32,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, magnitude: f32, duration: f32) -> Self {
        Self {
            kind,
            magnitude,
            remaining: duration,
            pulse_timer: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub slots: [Option<StatusEffect>; MAX_STATUS_EFFECTS],
}

impl StatusEffects {
    /// Add an effect. Same-kind effects refresh to the longer duration and stronger
    /// magnitude; when every slot is busy the effect closest to expiry is replaced.
    pub fn apply(&mut self, effect: StatusEffect) {
        if let Some(existing) = self
            .slots
            .iter_mut()
            .flatten()
            .find(|e| e.kind == effect.kind)
        {
            existing.remaining = existing.remaining.max(effect.remaining);
            existing.magnitude = existing.magnitude.max(effect.magnitude);
            return;
        }
        if let Some(free) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *free = Some(effect);
            return;
        }
        let mut shortest = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            if let (Some(candidate), Some(current)) = (slot, &self.slots[shortest]) {
                if candidate.remaining < current.remaining {
                    shortest = i;
                }
            }
        }
        self.slots[shortest] = Some(effect);
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.slots.iter().flatten().any(|e| e.kind == kind)
    }

    pub fn active(&self) -> impl Iterator<Item = &StatusEffect> {
        self.slots.iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Animation {
    pub frame: u16,
    pub frame_count: u16,
    pub frame_duration: f32,
    pub timer: f32,
    pub looping: bool,
    pub finished: bool,
}

impl Animation {
    pub fn looping(frame_count: u16, frame_duration: f32) -> Self {
        Self {
            frame_count,
            frame_duration,
            looping: true,
            ..Self::default()
        }
    }

    pub fn once(frame_count: u16, frame_duration: f32) -> Self {
        Self {
            frame_count,
            frame_duration,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LightFade {
    pub elapsed: f32,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Light {
    pub radius: f32,
    pub color: Vec3,
    pub base_intensity: f32,
    pub intensity: f32,
    pub fade: Option<LightFade>,
}

impl Light {
    pub fn new(radius: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            radius,
            color,
            base_intensity: intensity,
            intensity,
            fade: None,
        }
    }
}

// =============================================================================
// Hostile triggers
// =============================================================================

/// Deals damage to hostile entities it touches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DamageField {
    pub amount: i32,
    pub retrigger: RetriggerPolicy,
}

/// Applies a status effect to hostile entities it touches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EffectApplier {
    pub effect: StatusEffect,
    pub retrigger: RetriggerPolicy,
}

/// Projectile homing on a target's last known position.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ArcingProjectile {
    pub target: EntityId,
    pub last_target_position: Vec2,
    pub speed: f32,
    /// Fraction of the steering error corrected per second.
    pub turn_rate: f32,
    pub impact_damage: i32,
    pub impact_distance_sq: f32,
    pub impacted: bool,
}

/// Doubly linked chain; removing any link tears down its neighbours.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChainLink {
    pub prev: EntityId,
    pub next: EntityId,
}

/// Render description. Ids are opaque asset handles resolved by the renderer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sprite {
    pub texture: u16,
    pub shader: u16,
    pub size: Vec2,
    pub tint: [u8; 4],
}
