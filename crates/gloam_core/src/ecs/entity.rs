//! Entity handle with generational index
//!
//! Entities are lightweight handles (8 bytes) that reference slots in the store.
//! The generation counter makes stale handles resolve to "not found" instead of
//! aliasing whatever entity reused the slot.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Entity handle (generation-indexed for safety)
///
/// - Index: position in the entity slot array
/// - Generation: bumped on allocation and on destruction; never 0 for a live entity
///
/// The zero value is the null id. Ordering looks at the index only, which gives
/// unordered pairs a canonical order.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub const NULL: EntityId = EntityId {
        index: 0,
        generation: 0,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.index == 0 && self.generation == 0
    }

    /// Serialize to 64-bit integer (for logs and debug overlays)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.index ^ self.generation);
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Which side an entity fights for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Neutral,
    Player,
    Enemy,
}

impl Faction {
    /// Hostile triggers only fire between different factions. Neutral hazards
    /// therefore hurt both players and enemies.
    #[inline]
    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other
    }
}
