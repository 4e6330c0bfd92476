//! Removal sweep and quadtree refresh.

use tracing::{debug, warn};

use super::{World, NOT_ALIVE};
use crate::ecs::{ChainLink, EntityId, Faction, Lifetime, Light, LightFade, Physics};
use crate::spatial::QuadTreeLocation;

impl World {
    /// Destroy every scheduled entity, walking `alive` backwards so swap-removal
    /// never skips an element. Returns the destroyed ids.
    ///
    /// Removing a chain link schedules its neighbours; links already passed in
    /// this walk go in the next sweep.
    pub(super) fn sweep_removed(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        let mut i = self.alive.len();
        while i > 0 {
            i -= 1;
            let id = self.alive[i];
            if !self.store.is_scheduled(id) {
                continue;
            }

            self.transfer_light(id);
            if let Some(link) = self.store.get::<ChainLink>(id).copied() {
                for neighbour in [link.prev, link.next] {
                    if self.store.contains(neighbour) {
                        self.store.schedule_for_removal(neighbour);
                    }
                }
            }

            self.cooldowns.purge(id);
            self.collisions.purge(id);
            let location = self.locations[i];
            if !location.is_null() {
                self.quadtree.remove_entity(id, location);
            }
            self.store.destroy_entity(id);

            self.alive.swap_remove(i);
            self.locations.swap_remove(i);
            self.alive_slot[id.index() as usize] = NOT_ALIVE;
            if let Some(&moved) = self.alive.get(i) {
                self.alive_slot[moved.index() as usize] = i as u32;
            }
            removed.push(id);
        }

        if !removed.is_empty() {
            debug!(count = removed.len(), alive = self.alive.len(), "removal sweep");
        }
        removed
    }

    /// Hand a steady light over to a short-lived entity that fades it out.
    fn transfer_light(&mut self, id: EntityId) {
        let (Some(light), Some(position)) = (
            self.store.get::<Light>(id).copied(),
            self.store.get::<Physics>(id).map(|p| p.position),
        ) else {
            return;
        };
        if light.fade.is_some() {
            return;
        }

        let duration = self.config.light_fade_seconds;
        match self.spawn(Faction::Neutral, Some(position)) {
            Ok(mut entity) => {
                entity
                    .with(Light {
                        fade: Some(LightFade {
                            elapsed: 0.0,
                            duration,
                        }),
                        ..light
                    })
                    .with(Lifetime::seconds(duration));
            }
            Err(err) => warn!(entity = %id, %err, "light dropped on removal"),
        }
    }

    /// Move every positioned entity's quadtree area to its current bounds.
    pub fn refresh_locations(&mut self) {
        for i in 0..self.alive.len() {
            let id = self.alive[i];
            let location = self.locations[i];
            self.locations[i] = match self.entity_bounds(id) {
                Some(area) => self.quadtree.set_entity_area(id, location, area),
                None => {
                    if !location.is_null() {
                        self.quadtree.remove_entity(id, location);
                    }
                    QuadTreeLocation::NULL
                }
            };
        }
    }

    /// Link `a -> b`, attaching `ChainLink` components where missing.
    pub fn link_chain(&mut self, a: EntityId, b: EntityId) -> bool {
        if !self.store.contains(a) || !self.store.contains(b) || a == b {
            return false;
        }
        let mut link = self.store.get::<ChainLink>(a).copied().unwrap_or_default();
        link.next = b;
        self.store.insert_component(a, link);

        let mut link = self.store.get::<ChainLink>(b).copied().unwrap_or_default();
        link.prev = a;
        self.store.insert_component(b, link);
        true
    }
}
