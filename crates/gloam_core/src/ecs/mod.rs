//! Entity store and component registry.
//!
//! Entities are generational slot handles; components live in one fixed-capacity
//! table per type, and each entity slot carries a bitset of the kinds it owns so
//! multi-component checks are a single mask test.

mod component;
mod components;
mod ecs_error;
mod entity;
mod store;

pub use component::{Component, ComponentMask, ComponentTable, Record};
pub use components::{
    Ai, AiState, Animation, ArcingProjectile, ChainLink, Collider, CollisionPolicy,
    ComponentKind, ComponentTables, DamageField, EffectApplier, Equipment, Health, ItemStats,
    Lifetime, Light, LightFade, ParticleSpawner, Physics, Sprite, Stats, StatusEffect,
    StatusEffects, StatusKind, EQUIPMENT_SLOTS, FACING_SPEED_THRESHOLD, MAX_STATUS_EFFECTS,
    STATUS_PULSE_INTERVAL,
};
pub use ecs_error::EcsError;
pub use entity::{EntityId, Faction};
pub use store::{EntityMut, EntityRef, EntityStore};
