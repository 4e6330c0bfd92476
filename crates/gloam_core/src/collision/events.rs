//! Double-buffered record of which pairs touched this frame and last frame.

use std::collections::HashSet;

use super::pair::EntityPair;
use crate::ecs::EntityId;

/// Two pair sets plus a parity bit selecting the current one.
#[derive(Default)]
pub struct CollisionTable {
    buffers: [HashSet<EntityPair>; 2],
    current: usize,
}

impl CollisionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contact this frame. Returns false when the pair was already recorded.
    pub fn insert(&mut self, pair: EntityPair) -> bool {
        self.buffers[self.current].insert(pair)
    }

    #[inline]
    pub fn contains_current(&self, pair: EntityPair) -> bool {
        self.buffers[self.current].contains(&pair)
    }

    #[inline]
    pub fn contains_previous(&self, pair: EntityPair) -> bool {
        self.buffers[self.current ^ 1].contains(&pair)
    }

    pub fn current(&self) -> impl Iterator<Item = &EntityPair> {
        self.buffers[self.current].iter()
    }

    pub fn previous(&self) -> impl Iterator<Item = &EntityPair> {
        self.buffers[self.current ^ 1].iter()
    }

    pub fn current_len(&self) -> usize {
        self.buffers[self.current].len()
    }

    /// Current becomes previous; the new current starts empty.
    pub fn swap(&mut self) {
        self.current ^= 1;
        self.buffers[self.current].clear();
    }

    pub fn purge(&mut self, entity: EntityId) {
        for buffer in &mut self.buffers {
            buffer.retain(|pair| !pair.involves(entity));
        }
    }
}
