//! Collision bookkeeping and swept tests.
//!
//! - `resolve`: pure swept AABB tests against tiles and other bodies
//! - `events`: double-buffered set of pairs that touched this frame / last frame
//! - `cooldown`: per pair and trigger kind retrigger timers

mod cooldown;
mod events;
mod pair;
mod resolve;

pub use cooldown::{RetriggerPolicy, TriggerCooldownTable};
pub use events::CollisionTable;
pub use pair::EntityPair;
pub use resolve::{
    entity_vs_entity_collision, reflect, sweep_aabb, tile_sweep, Body, CollisionStatus, Sweep,
};
