// store.rs - Entity slots, free list and component attachment
//
// Slots are reused LIFO. A slot's generation is bumped when it is handed out and
// again when it is destroyed, so a live entity never carries generation 0 and a
// handle from a previous occupant never matches.

use tracing::{debug, warn};

use super::component::{Component, ComponentMask, Record};
use super::components::{ComponentKind, ComponentTables};
use super::ecs_error::EcsError;
use super::entity::{EntityId, Faction};

#[derive(Debug, Clone, Copy, Default)]
struct EntitySlot {
    generation: u32,
    alive: bool,
    scheduled_for_removal: bool,
    faction: Faction,
    mask: ComponentMask,
}

/// Fixed-capacity entity store.
pub struct EntityStore {
    slots: Vec<EntitySlot>,
    free: Vec<u32>,
    tables: ComponentTables,
    capacity: usize,
    live: usize,
}

impl EntityStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            tables: ComponentTables::with_capacity(capacity),
            capacity,
            live: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocated (not yet destroyed) entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocate an entity with no components.
    pub fn create_entity(&mut self, faction: Faction) -> Result<(EntityId, EntityMut<'_>), EcsError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(EntitySlot::default());
                (self.slots.len() - 1) as u32
            }
            None => {
                warn!(capacity = self.capacity, "entity store exhausted");
                return Err(EcsError::CapacityExceeded {
                    capacity: self.capacity,
                });
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.generation = next_generation(slot.generation);
        slot.alive = true;
        slot.scheduled_for_removal = false;
        slot.faction = faction;
        slot.mask = ComponentMask::EMPTY;
        self.live += 1;

        let id = EntityId::new(index, slot.generation);
        debug!(entity = %id, ?faction, "entity created");
        Ok((id, EntityMut { id, store: self }))
    }

    #[inline]
    fn slot(&self, id: EntityId) -> Option<&EntitySlot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.alive && slot.generation == id.generation())
    }

    #[inline]
    fn slot_mut(&mut self, id: EntityId) -> Option<&mut EntitySlot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.alive && slot.generation == id.generation())
    }

    /// Resolve an id. Stale, null, destroyed and out-of-range ids yield `None`.
    pub fn get_entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        let slot = self.slot(id)?;
        Some(EntityRef {
            id,
            slot,
            tables: &self.tables,
        })
    }

    pub fn get_entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        self.slot(id)?;
        Some(EntityMut { id, store: self })
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    /// Current live id for a slot index, if that slot is occupied.
    pub fn id_at(&self, index: u32) -> Option<EntityId> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.alive)
            .map(|slot| EntityId::new(index, slot.generation))
    }

    pub fn faction(&self, id: EntityId) -> Option<Faction> {
        self.slot(id).map(|slot| slot.faction)
    }

    pub fn mask(&self, id: EntityId) -> ComponentMask {
        self.slot(id).map_or(ComponentMask::EMPTY, |slot| slot.mask)
    }

    /// Attach a default-valued component.
    ///
    /// # Panics
    /// If the entity is unknown or already has the component.
    pub fn add_component<T: Component>(&mut self, id: EntityId) -> &mut T {
        self.insert_new(id, T::default())
    }

    /// Attach `value`, replacing any existing component of the same kind.
    ///
    /// # Panics
    /// If the entity is unknown.
    pub fn insert_component<T: Component>(&mut self, id: EntityId, value: T) -> &mut T {
        let Some(slot) = self.slot_mut(id) else {
            panic!("insert_component::<{}> on unknown entity {id}", T::KIND.name());
        };
        slot.mask.insert(T::KIND);
        T::table_mut(&mut self.tables).insert(id.index(), value)
    }

    fn insert_new<T: Component>(&mut self, id: EntityId, value: T) -> &mut T {
        let Some(slot) = self.slot_mut(id) else {
            panic!("add_component::<{}> on unknown entity {id}", T::KIND.name());
        };
        assert!(
            !slot.mask.contains(T::KIND),
            "entity {id} already has a {} component",
            T::KIND.name()
        );
        slot.mask.insert(T::KIND);
        T::table_mut(&mut self.tables).insert(id.index(), value)
    }

    /// Detach a component. No-op when absent or the entity is unknown.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        if !slot.mask.contains(T::KIND) {
            return None;
        }
        slot.mask.remove(T::KIND);
        T::table_mut(&mut self.tables).remove(id.index())
    }

    #[inline]
    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.slot(id).is_some_and(|slot| slot.mask.contains(kind))
    }

    /// True when the entity carries every kind in `required`.
    #[inline]
    pub fn has_components(&self, id: EntityId, required: ComponentMask) -> bool {
        self.slot(id)
            .is_some_and(|slot| slot.mask.contains_all(required))
    }

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        let slot = self.slot(id)?;
        if !slot.mask.contains(T::KIND) {
            return None;
        }
        T::table(&self.tables).get(id.index())
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        let slot = self.slot(id)?;
        if !slot.mask.contains(T::KIND) {
            return None;
        }
        T::table_mut(&mut self.tables).get_mut(id.index())
    }

    /// Entity owning a stored component record.
    pub fn get_component_owner<T>(&self, record: &Record<T>) -> Option<EntityId> {
        self.id_at(record.owner_index())
    }

    /// Soft delete: the entity stays fully queryable until the world's removal sweep.
    pub fn schedule_for_removal(&mut self, id: EntityId) -> bool {
        match self.slot_mut(id) {
            Some(slot) if !slot.scheduled_for_removal => {
                slot.scheduled_for_removal = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_scheduled(&self, id: EntityId) -> bool {
        self.slot(id).is_some_and(|slot| slot.scheduled_for_removal)
    }

    /// Physically remove an entity and all its components.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        slot.generation = next_generation(slot.generation);
        slot.alive = false;
        slot.scheduled_for_removal = false;
        slot.mask = ComponentMask::EMPTY;
        self.tables.clear_slot(id.index());
        self.free.push(id.index());
        self.live -= 1;
        debug!(entity = %id, "entity destroyed");
        true
    }

    /// Typed tables, for borrowing two component kinds at once.
    #[inline]
    pub fn tables(&self) -> &ComponentTables {
        &self.tables
    }

    #[inline]
    pub fn tables_mut(&mut self) -> &mut ComponentTables {
        &mut self.tables
    }
}

#[inline]
fn next_generation(generation: u32) -> u32 {
    match generation.wrapping_add(1) {
        0 => 1,
        g => g,
    }
}

/// Read view of a live entity.
#[derive(Clone, Copy)]
pub struct EntityRef<'a> {
    id: EntityId,
    slot: &'a EntitySlot,
    tables: &'a ComponentTables,
}

impl<'a> EntityRef<'a> {
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn faction(&self) -> Faction {
        self.slot.faction
    }

    #[inline]
    pub fn mask(&self) -> ComponentMask {
        self.slot.mask
    }

    #[inline]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.slot.mask.contains(kind)
    }

    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.slot.scheduled_for_removal
    }

    pub fn get<T: Component>(&self) -> Option<&'a T> {
        if !self.slot.mask.contains(T::KIND) {
            return None;
        }
        T::table(self.tables).get(self.id.index())
    }
}

/// Write view of a live entity, used to attach components right after creation.
pub struct EntityMut<'a> {
    id: EntityId,
    store: &'a mut EntityStore,
}

impl<'a> EntityMut<'a> {
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Attach (or replace) a component; chains.
    pub fn with<T: Component>(&mut self, value: T) -> &mut Self {
        self.store.insert_component(self.id, value);
        self
    }

    pub fn add<T: Component>(&mut self) -> &mut T {
        self.store.add_component::<T>(self.id)
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.store.get_mut::<T>(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Health, Physics};

    #[test]
    fn stale_id_is_not_found_after_reuse() {
        let mut store = EntityStore::new(4);
        let (first, _) = store.create_entity(Faction::Player).unwrap();
        assert!(store.destroy_entity(first));
        let (second, _) = store.create_entity(Faction::Enemy).unwrap();

        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(store.get_entity(first).is_none());
        assert_eq!(store.get_entity(second).map(|e| e.faction()), Some(Faction::Enemy));
    }

    #[test]
    fn null_never_resolves() {
        let mut store = EntityStore::new(2);
        let (id, _) = store.create_entity(Faction::Neutral).unwrap();
        assert_eq!(id.index(), 0);
        assert_ne!(id.generation(), 0);
        assert!(store.get_entity(EntityId::NULL).is_none());
    }

    #[test]
    fn capacity_is_reported() {
        let mut store = EntityStore::new(1);
        store.create_entity(Faction::Neutral).unwrap();
        assert_eq!(
            store.create_entity(Faction::Neutral).err(),
            Some(EcsError::CapacityExceeded { capacity: 1 })
        );
    }

    #[test]
    fn components_follow_the_mask() {
        let mut store = EntityStore::new(4);
        let (id, mut entity) = store.create_entity(Faction::Player).unwrap();
        entity.with(Health::new(10)).with(Physics::default());

        let both = ComponentKind::Health.mask() | ComponentKind::Physics;
        assert!(store.has_components(id, both));
        assert_eq!(store.get::<Health>(id).map(|h| h.current), Some(10));

        store.remove_component::<Health>(id);
        assert!(!store.has_component(id, ComponentKind::Health));
        assert!(store.get::<Health>(id).is_none());
        assert!(store.remove_component::<Health>(id).is_none());
    }

    #[test]
    #[should_panic(expected = "already has a Health component")]
    fn adding_twice_panics() {
        let mut store = EntityStore::new(4);
        let (id, _) = store.create_entity(Faction::Player).unwrap();
        store.add_component::<Health>(id);
        store.add_component::<Health>(id);
    }

    #[test]
    fn owner_is_read_from_the_record() {
        let mut store = EntityStore::new(8);
        store.create_entity(Faction::Neutral).unwrap();
        let (id, mut entity) = store.create_entity(Faction::Neutral).unwrap();
        entity.add::<Health>().max = 3;

        let record = store.tables().health.record(id.index()).unwrap();
        assert_eq!(store.get_component_owner(record), Some(id));
    }

    #[test]
    fn scheduled_entities_stay_queryable() {
        let mut store = EntityStore::new(4);
        let (id, mut entity) = store.create_entity(Faction::Enemy).unwrap();
        entity.with(Health::new(1));

        assert!(store.schedule_for_removal(id));
        assert!(!store.schedule_for_removal(id));
        assert!(store.is_scheduled(id));
        assert!(store.get::<Health>(id).is_some());

        store.destroy_entity(id);
        assert!(store.get_entity(id).is_none());
        assert!(store.tables().health.is_empty());
    }

    #[test]
    fn free_slots_are_reused_lifo() {
        let mut store = EntityStore::new(4);
        let (a, _) = store.create_entity(Faction::Neutral).unwrap();
        let (b, _) = store.create_entity(Faction::Neutral).unwrap();
        store.destroy_entity(a);
        store.destroy_entity(b);
        let (c, _) = store.create_entity(Faction::Neutral).unwrap();
        assert_eq!(c.index(), b.index());
        assert_eq!(c.generation(), 3);
    }
}
