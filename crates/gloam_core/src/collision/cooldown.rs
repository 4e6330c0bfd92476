//! Retrigger bookkeeping for persistent hostile triggers.
//!
//! An entry keyed by (pair, trigger component) blocks that trigger from firing
//! between the same two entities until its timer runs out.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::pair::EntityPair;
use crate::ecs::{ComponentKind, EntityId};

/// How often a trigger may fire again against the same target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum RetriggerPolicy {
    /// Fire on the first contact only, for as long as both entities exist.
    #[default]
    Once,
    /// Fire again after this many seconds of contact.
    Every(f32),
    /// Fire on every frame the pair touches.
    EveryFrame,
}

impl RetriggerPolicy {
    /// Timer to register after firing, or `None` when nothing blocks the next frame.
    pub fn cooldown(self) -> Option<f32> {
        match self {
            RetriggerPolicy::Once => Some(f32::INFINITY),
            RetriggerPolicy::Every(seconds) if seconds > 0.0 => Some(seconds),
            RetriggerPolicy::Every(_) | RetriggerPolicy::EveryFrame => None,
        }
    }
}

#[derive(Default)]
pub struct TriggerCooldownTable {
    entries: HashMap<(EntityPair, ComponentKind), f32>,
}

impl TriggerCooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_cooling_down(&self, pair: EntityPair, trigger: ComponentKind) -> bool {
        self.entries.contains_key(&(pair, trigger))
    }

    pub fn remaining(&self, pair: EntityPair, trigger: ComponentKind) -> Option<f32> {
        self.entries.get(&(pair, trigger)).copied()
    }

    /// Record that `trigger` fired for `pair`.
    pub fn register(&mut self, pair: EntityPair, trigger: ComponentKind, policy: RetriggerPolicy) {
        if let Some(timer) = policy.cooldown() {
            self.entries.insert((pair, trigger), timer);
        }
    }

    /// Count every timer down by `dt` and drop the expired ones.
    pub fn tick(&mut self, dt: f32) {
        self.entries.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
    }

    /// Forget every entry that mentions `entity`.
    pub fn purge(&mut self, entity: EntityId) {
        self.entries.retain(|(pair, _), _| !pair.involves(entity));
    }
}
