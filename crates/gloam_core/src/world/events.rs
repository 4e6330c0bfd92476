use tracing::debug;

use super::World;
use crate::ecs::{Ai, AiState, EntityId, StatusKind};

/// Something that happened to an entity this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// First frame two hostile entities touched. Sent once to each side.
    HostileCollision { entity: EntityId, other: EntityId },
    Damaged {
        target: EntityId,
        source: EntityId,
        amount: i32,
        remaining: i32,
    },
    Healed { target: EntityId, amount: i32 },
    StatusApplied { target: EntityId, kind: StatusKind },
    ProjectileImpact { projectile: EntityId, target: EntityId },
    Died { entity: EntityId },
}

impl World {
    /// Let the affected entity react, then queue the event for outside consumers.
    pub(crate) fn dispatch_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::HostileCollision { entity, other } => {
                self.provoke(entity, other);
            }
            GameEvent::Damaged { target, source, .. } => {
                self.provoke(target, source);
            }
            GameEvent::Died { entity } => {
                debug!(%entity, "entity died");
            }
            GameEvent::Healed { .. }
            | GameEvent::StatusApplied { .. }
            | GameEvent::ProjectileImpact { .. } => {}
        }
        self.events.push(event);
    }

    /// An AI without a target turns on whoever touched or hurt it.
    fn provoke(&mut self, entity: EntityId, by: EntityId) {
        if by.is_null() || !self.store.contains(by) {
            return;
        }
        let hostile = match (self.store.faction(entity), self.store.faction(by)) {
            (Some(a), Some(b)) => a.is_hostile_to(b),
            _ => false,
        };
        if !hostile {
            return;
        }
        if let Some(ai) = self.store.get_mut::<Ai>(entity) {
            if ai.target.is_null() && ai.state != AiState::Flee {
                ai.target = by;
                ai.state = AiState::Chase;
            }
        }
    }
}
