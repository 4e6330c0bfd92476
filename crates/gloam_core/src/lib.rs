//! Gloam Core
//!
//! Contains the simulation substrate of the game:
//! - Entity store with generational ids and bitset-gated component tables
//! - Quadtree spatial index and tile map
//! - Swept collision resolver with cooldown and contact bookkeeping
//! - Particle buffers, hitsplats and the per-frame world orchestrator

pub mod collision;
pub mod config;
pub mod ecs;
pub mod effects;
pub mod math;
pub mod memory;
pub mod spatial;
pub mod time;
pub mod world;

pub use glam;

pub use config::WorldConfig;
pub use ecs::{EcsError, EntityId, Faction};
pub use math::Rect;
pub use time::FrameInput;
pub use world::{FrameReport, GameEvent, World};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
