use crate::ecs::EntityId;

/// Unordered entity pair, stored with the lower slot index first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityPair {
    first: EntityId,
    second: EntityId,
}

impl EntityPair {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if b < a {
            Self { first: b, second: a }
        } else {
            Self { first: a, second: b }
        }
    }

    #[inline]
    pub fn first(&self) -> EntityId {
        self.first
    }

    #[inline]
    pub fn second(&self) -> EntityId {
        self.second
    }

    #[inline]
    pub fn involves(&self, entity: EntityId) -> bool {
        self.first == entity || self.second == entity
    }

    /// The member that is not `entity`.
    pub fn other(&self, entity: EntityId) -> Option<EntityId> {
        if self.first == entity {
            Some(self.second)
        } else if self.second == entity {
            Some(self.first)
        } else {
            None
        }
    }
}
