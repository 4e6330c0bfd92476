//! Collision and movement phase.

use glam::Vec2;

use super::{GameEvent, MoveScratch, World};
use crate::collision::{
    entity_vs_entity_collision, reflect, tile_sweep, Body, CollisionStatus, EntityPair,
};
use crate::ecs::{
    Collider, CollisionPolicy, ComponentKind, EntityId, Physics, FACING_SPEED_THRESHOLD,
};

impl World {
    pub(super) fn run_movement(&mut self, snapshot: usize, dt: f32) {
        self.move_scratch.fill(MoveScratch::default());
        for i in 0..snapshot {
            let id = self.alive[i];
            self.move_entity(id, dt);
        }
    }

    /// Displacement an entity still intends to make this frame.
    fn pending_displacement(&self, id: EntityId, physics: &Physics, dt: f32) -> Vec2 {
        if self.move_scratch[id.index() as usize].moved {
            Vec2::ZERO
        } else {
            physics.velocity * physics.speed_scale * dt
        }
    }

    fn move_entity(&mut self, id: EntityId, dt: f32) {
        let Some(physics) = self.store.get::<Physics>(id).copied() else {
            return;
        };
        let slot = id.index() as usize;
        let velocity = physics.velocity * physics.speed_scale;
        let displacement = velocity * dt;

        let Some(collider) = self.store.get::<Collider>(id).copied() else {
            // Colliderless entities (lights, emitters) move freely.
            if let Some(p) = self.store.get_mut::<Physics>(id) {
                p.position += displacement;
                p.last_movement_fraction = 1.0;
            }
            self.move_scratch[slot].moved = true;
            return;
        };

        let bounds = collider.bounds(physics.position);
        let mut fraction = self.move_scratch[slot].cap.min(1.0);
        let mut new_velocity = physics.velocity;

        // 1. Tiles
        if !collider.ignores_tiles && displacement != Vec2::ZERO {
            if let Some(hit) = tile_sweep(&self.tilemap, &bounds, displacement) {
                fraction = fraction.min(hit.time);
                if collider.policy == CollisionPolicy::Bounce && hit.normal != Vec2::ZERO {
                    new_velocity = reflect(new_velocity, hit.normal);
                }
            }
        }

        // 2. Other entities
        let query = bounds
            .swept(displacement)
            .expanded(self.config.collision_query_margin);
        let mut candidates = self.arena.take_ids();
        self.quadtree.get_entities_in_area(&query, &mut candidates);

        let me = Body {
            id,
            bounds,
            displacement,
        };
        for &other in &candidates {
            if other == id {
                continue;
            }
            let (Some(other_physics), Some(other_collider)) = (
                self.store.get::<Physics>(other).copied(),
                self.store.get::<Collider>(other).copied(),
            ) else {
                continue;
            };
            if collider.group != 0 && collider.group == other_collider.group {
                continue;
            }
            let pair = EntityPair::new(id, other);
            if self.collisions.contains_current(pair) {
                continue;
            }

            let them = Body {
                id: other,
                bounds: other_collider.bounds(other_physics.position),
                displacement: self.pending_displacement(other, &other_physics, dt),
            };
            let CollisionStatus::Colliding {
                time_of_impact,
                normal,
            } = entity_vs_entity_collision(&me, &them)
            else {
                continue;
            };

            let first_contact = !self.collisions.contains_previous(pair);
            self.collisions.insert(pair);

            // A trigger still cooling down on this pair lets it pass through.
            let cooling = self.cooldowns.is_cooling_down(pair, ComponentKind::DamageField)
                || self.cooldowns.is_cooling_down(pair, ComponentKind::EffectApplier);
            if !cooling && collider.blocks() && other_collider.blocks() {
                fraction = fraction.min(time_of_impact);
                let other_slot = other.index() as usize;
                if !self.move_scratch[other_slot].moved {
                    let cap = &mut self.move_scratch[other_slot].cap;
                    *cap = cap.min(time_of_impact);
                }
                if normal != Vec2::ZERO {
                    if collider.policy == CollisionPolicy::Bounce {
                        new_velocity = reflect(new_velocity, normal);
                    }
                    if other_collider.policy == CollisionPolicy::Bounce {
                        if let Some(p) = self.store.get_mut::<Physics>(other) {
                            p.velocity = reflect(p.velocity, -normal);
                        }
                    }
                }
            }

            self.fire_triggers(id, other, pair);
            self.fire_triggers(other, id, pair);

            if first_contact && self.hostile(id, other) {
                self.dispatch_event(GameEvent::HostileCollision { entity: id, other });
                self.dispatch_event(GameEvent::HostileCollision {
                    entity: other,
                    other: id,
                });
            }
        }
        self.arena.give_back(candidates);

        // 3. Apply once
        debug_assert!(
            (0.0..=1.0).contains(&fraction),
            "movement fraction {fraction} out of range for {id}"
        );
        if let Some(p) = self.store.get_mut::<Physics>(id) {
            p.position += velocity * fraction * dt;
            p.velocity = new_velocity;
            p.last_movement_fraction = fraction;
            // 4. Facing
            if new_velocity.length() > FACING_SPEED_THRESHOLD {
                p.facing = new_velocity.normalize();
            }
        }
        self.move_scratch[slot].moved = true;
    }

    fn hostile(&self, a: EntityId, b: EntityId) -> bool {
        match (self.store.faction(a), self.store.faction(b)) {
            (Some(a), Some(b)) => a.is_hostile_to(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::room_world;
    use super::*;
    use crate::collision::RetriggerPolicy;
    use crate::ecs::{DamageField, Faction, Health};
    use crate::time::FrameInput;

    fn mover(world: &mut World, faction: Faction, at: Vec2, velocity: Vec2) -> EntityId {
        let id = world
            .spawn(faction, Some(at))
            .unwrap()
            .with(Collider::new(Vec2::splat(16.0)))
            .id();
        if let Some(p) = world.get_mut::<Physics>(id) {
            p.velocity = velocity;
        }
        id
    }

    #[test]
    fn free_movement_applies_full_displacement() {
        let mut world = room_world();
        let id = mover(&mut world, Faction::Player, Vec2::ZERO, Vec2::new(60.0, 0.0));
        world.update(&FrameInput::with_dt(0.5));
        let p = world.get::<Physics>(id).unwrap();
        assert_eq!(p.position, Vec2::new(30.0, 0.0));
        assert_eq!(p.last_movement_fraction, 1.0);
        assert_eq!(p.facing, Vec2::X);
    }

    #[test]
    fn walls_stop_movement() {
        let mut world = room_world();
        // Room floor spans tiles -8..=8, so x = 144 is the wall face.
        let id = mover(&mut world, Faction::Player, Vec2::new(120.0, 0.0), Vec2::new(100.0, 0.0));
        world.update(&FrameInput::with_dt(0.5));
        let p = world.get::<Physics>(id).unwrap();
        assert!((p.last_movement_fraction - 0.32).abs() < 1e-4);
        assert!((p.position.x - 136.0).abs() < 1e-3);
    }

    #[test]
    fn bounce_reflects_velocity() {
        let mut world = room_world();
        let id = mover(&mut world, Faction::Player, Vec2::new(120.0, 0.0), Vec2::new(100.0, 0.0));
        if let Some(c) = world.get_mut::<Collider>(id) {
            c.policy = CollisionPolicy::Bounce;
        }
        world.update(&FrameInput::with_dt(0.5));
        assert_eq!(world.get::<Physics>(id).unwrap().velocity, Vec2::new(-100.0, 0.0));
    }

    #[test]
    fn same_group_never_collides() {
        let mut world = room_world();
        let a = mover(&mut world, Faction::Player, Vec2::ZERO, Vec2::new(10.0, 0.0));
        let b = mover(&mut world, Faction::Enemy, Vec2::new(8.0, 0.0), Vec2::new(-10.0, 0.0));
        for id in [a, b] {
            if let Some(c) = world.get_mut::<Collider>(id) {
                c.group = 3;
            }
        }
        let report = world.update(&FrameInput::default());
        assert_eq!(report.collision_pairs, 0);
        assert_eq!(world.get::<Physics>(a).unwrap().last_movement_fraction, 1.0);
    }

    #[test]
    fn pass_through_records_contact_without_blocking() {
        let mut world = room_world();
        let a = mover(&mut world, Faction::Player, Vec2::ZERO, Vec2::new(10.0, 0.0));
        let b = mover(&mut world, Faction::Player, Vec2::new(8.0, 0.0), Vec2::ZERO);
        if let Some(c) = world.get_mut::<Collider>(b) {
            c.policy = CollisionPolicy::PassThrough;
        }
        world.update(&FrameInput::default());
        assert!(world.collisions().contains_previous(EntityPair::new(a, b)));
        assert_eq!(world.get::<Physics>(a).unwrap().last_movement_fraction, 1.0);
    }

    #[test]
    fn damage_field_respects_once_policy() {
        let mut world = room_world();
        let player = mover(&mut world, Faction::Player, Vec2::ZERO, Vec2::ZERO);
        if let Some(mut e) = world.entity_mut(player) {
            e.with(Health::new(100));
        }
        let field = world
            .spawn(Faction::Neutral, Some(Vec2::new(4.0, 0.0)))
            .unwrap()
            .with(Collider::new(Vec2::splat(16.0)).with_policy(CollisionPolicy::PassThrough))
            .with(DamageField {
                amount: 10,
                retrigger: RetriggerPolicy::Once,
            })
            .id();

        for _ in 0..30 {
            world.update(&FrameInput::default());
        }
        assert_eq!(world.get::<Health>(player).unwrap().current, 90);
        assert!(world
            .cooldowns()
            .is_cooling_down(EntityPair::new(player, field), ComponentKind::DamageField));
    }

    #[test]
    fn cooling_trigger_stops_blocking() {
        let mut world = room_world();
        let player = mover(&mut world, Faction::Player, Vec2::ZERO, Vec2::new(60.0, 0.0));
        if let Some(mut e) = world.entity_mut(player) {
            e.with(Health::new(100));
        }
        let enemy = mover(&mut world, Faction::Enemy, Vec2::new(17.0, 0.0), Vec2::ZERO);
        if let Some(mut e) = world.entity_mut(enemy) {
            e.with(DamageField {
                amount: 1,
                retrigger: RetriggerPolicy::Once,
            });
        }

        for _ in 0..6 {
            world.update(&FrameInput::default());
        }
        let p = world.get::<Physics>(player).unwrap();
        assert_eq!(world.get::<Health>(player).unwrap().current, 99);
        assert_eq!(p.last_movement_fraction, 1.0);
        assert!(p.position.x > 3.0);
        assert!(world.collisions().contains_previous(EntityPair::new(player, enemy)));
    }
}
