//! Per-entity update phase.
//!
//! Each step reads its component, works on a copy and writes it back, so steps
//! that need the rest of the world (damage, particle spawns, target searches)
//! never hold a component borrow.

use glam::Vec2;
use tracing::{trace, warn};

use super::{GameEvent, World};
use crate::ecs::{
    Ai, AiState, Animation, ArcingProjectile, ComponentKind, EntityId, Equipment, Faction,
    Health, ItemStats, Lifetime, Light, ParticleSpawner, Physics, Stats, StatusKind, StatusEffects,
    STATUS_PULSE_INTERVAL,
};
use crate::effects::{Particle, SpawnOutcome};
use crate::math::Rect;

/// AI gives up a chase once the target is this many sight radii away.
const LOSE_TARGET_FACTOR: f32 = 1.5;

impl World {
    pub(super) fn update_entity(&mut self, id: EntityId, dt: f32) {
        if !self.store.contains(id) {
            return;
        }
        self.update_projectile(id, dt);
        self.recompute_max_health(id);
        self.update_ai(id, dt);
        self.update_spawner(id, dt);
        if let Some(lifetime) = self.store.get_mut::<Lifetime>(id) {
            lifetime.remaining -= dt;
        }
        self.update_status_effects(id, dt);
        if let Some(animation) = self.store.get_mut::<Animation>(id) {
            advance_animation(animation, dt);
        }
        if let Some(light) = self.store.get_mut::<Light>(id) {
            advance_light(light, dt);
        }
        self.check_death(id);
    }

    fn update_projectile(&mut self, id: EntityId, dt: f32) {
        let (Some(mut projectile), Some(position)) = (
            self.store.get::<ArcingProjectile>(id).copied(),
            self.store.get::<Physics>(id).map(|p| p.position),
        ) else {
            return;
        };
        if projectile.impacted {
            return;
        }

        if let Some(target) = self.store.get::<Physics>(projectile.target) {
            projectile.last_target_position = target.position;
        }
        let to_target = projectile.last_target_position - position;

        if to_target.length_squared() <= projectile.impact_distance_sq {
            projectile.impacted = true;
            if let Some(p) = self.store.get_mut::<Physics>(id) {
                p.velocity = Vec2::ZERO;
            }
            self.store.insert_component(id, projectile);
            if self.store.contains(projectile.target) {
                self.deal_damage(projectile.target, projectile.impact_damage, id);
            }
            self.dispatch_event(GameEvent::ProjectileImpact {
                projectile: id,
                target: projectile.target,
            });
            self.store.schedule_for_removal(id);
            return;
        }

        let desired = to_target.normalize_or_zero() * projectile.speed;
        let steer = (projectile.turn_rate * dt).clamp(0.0, 1.0);
        if let Some(p) = self.store.get_mut::<Physics>(id) {
            p.velocity += (desired - p.velocity) * steer;
        }
        self.store.insert_component(id, projectile);
    }

    /// Max health = base + vitality from stats and equipped items.
    fn recompute_max_health(&mut self, id: EntityId) {
        let has_stats = self.store.has_component(id, ComponentKind::Stats);
        let has_equipment = self.store.has_component(id, ComponentKind::Equipment);
        if !self.store.has_component(id, ComponentKind::Health) || !(has_stats || has_equipment) {
            return;
        }

        let mut vitality = self.store.get::<Stats>(id).map_or(0, |s| s.vitality);
        if let Some(equipment) = self.store.get::<Equipment>(id) {
            vitality = equipment
                .items
                .iter()
                .filter_map(|&item| self.store.get::<ItemStats>(item))
                .fold(vitality, |sum, stats| sum.saturating_add(stats.vitality));
        }
        let per_point = self.config.health_per_vitality;
        if let Some(health) = self.store.get_mut::<Health>(id) {
            health.max = health
                .base_max
                .saturating_add(vitality.saturating_mul(per_point))
                .max(1);
            health.current = health.current.min(health.max);
        }
    }

    fn update_ai(&mut self, id: EntityId, dt: f32) {
        let (Some(mut ai), Some(position)) = (
            self.store.get::<Ai>(id).copied(),
            self.store.get::<Physics>(id).map(|p| p.position),
        ) else {
            return;
        };

        ai.think_timer -= dt;
        if ai.think_timer <= 0.0 {
            ai.think_timer = ai.think_interval.max(dt);
            if !self.store.contains(ai.target) {
                ai.target = EntityId::NULL;
            }
            if ai.target.is_null() {
                ai.target = self.find_hostile(id, position, ai.sight_radius);
            }
            match (ai.target.is_null(), ai.state) {
                (false, AiState::Idle | AiState::Wander) => ai.state = AiState::Chase,
                (true, AiState::Chase | AiState::Flee) => ai.state = AiState::Idle,
                (true, AiState::Idle) => {
                    ai.state = AiState::Wander;
                    ai.wander_direction = self.rng.direction_within(Vec2::ZERO, 0.0);
                }
                (true, AiState::Wander) => {
                    // Alternate between standing and strolling.
                    ai.state = AiState::Idle;
                }
                (false, AiState::Chase | AiState::Flee) => {}
            }
        }

        let health_ratio = self.store.get::<Health>(id).map_or(1.0, Health::ratio);
        let target_position = self.store.get::<Physics>(ai.target).map(|p| p.position);

        let velocity = match (ai.state, target_position) {
            (AiState::Chase | AiState::Flee, Some(target)) => {
                let offset = target - position;
                if offset.length() > ai.sight_radius * LOSE_TARGET_FACTOR {
                    ai.target = EntityId::NULL;
                    ai.state = AiState::Idle;
                    Vec2::ZERO
                } else {
                    if health_ratio < ai.flee_below {
                        ai.state = AiState::Flee;
                    }
                    let direction = offset.normalize_or_zero();
                    if ai.state == AiState::Flee {
                        -direction * ai.speed
                    } else {
                        direction * ai.speed
                    }
                }
            }
            (AiState::Chase | AiState::Flee, None) => {
                ai.target = EntityId::NULL;
                ai.state = AiState::Idle;
                Vec2::ZERO
            }
            (AiState::Wander, _) => ai.wander_direction * ai.speed * 0.5,
            (AiState::Idle, _) => Vec2::ZERO,
        };

        if let Some(p) = self.store.get_mut::<Physics>(id) {
            p.velocity = velocity;
        }
        self.store.insert_component(id, ai);
    }

    /// Nearest live hostile entity with health within `radius`.
    fn find_hostile(&mut self, id: EntityId, position: Vec2, radius: f32) -> EntityId {
        let Some(faction) = self.store.faction(id) else {
            return EntityId::NULL;
        };
        let mut candidates = self.arena.take_ids();
        let area = Rect::from_center_size(position, Vec2::splat(radius * 2.0));
        self.quadtree.get_entities_in_area(&area, &mut candidates);

        let mut best = EntityId::NULL;
        let mut best_distance = radius * radius;
        for &other in &candidates {
            if other == id
                || self.store.is_scheduled(other)
                || !self.store.has_component(other, ComponentKind::Health)
                || !self.store.faction(other).is_some_and(|f| faction.is_hostile_to(f))
            {
                continue;
            }
            // Neutral entities are scenery to AI, not prey.
            if self.store.faction(other) == Some(Faction::Neutral) {
                continue;
            }
            let Some(other_position) = self.store.get::<Physics>(other).map(|p| p.position) else {
                continue;
            };
            let distance = other_position.distance_squared(position);
            if distance <= best_distance {
                best = other;
                best_distance = distance;
            }
        }
        self.arena.give_back(candidates);
        best
    }

    fn update_spawner(&mut self, id: EntityId, dt: f32) {
        let (Some(mut spawner), Some(position)) = (
            self.store.get::<ParticleSpawner>(id).copied(),
            self.store.get::<Physics>(id).map(|p| p.position),
        ) else {
            return;
        };
        if spawner.finished {
            return;
        }

        let mut count = 0;
        if !spawner.burst_emitted {
            spawner.burst_emitted = true;
            count += spawner.burst;
        }
        spawner.elapsed += dt;
        spawner.accumulator += spawner.rate * dt;
        while spawner.accumulator >= 1.0 {
            spawner.accumulator -= 1.0;
            count += 1;
        }
        if spawner.one_shot && spawner.elapsed >= spawner.duration {
            spawner.finished = true;
        }

        for _ in 0..count {
            let direction = self.rng.direction_within(spawner.direction, spawner.spread);
            let speed = spawner.speed * self.rng.range_f32(0.5, 1.0);
            let mut particle = Particle::new(position, direction * speed, spawner.particle_lifetime);
            particle.drag = spawner.drag;
            match self.particles.spawn(particle) {
                Ok(SpawnOutcome::Spawned) => {}
                Ok(SpawnOutcome::Replaced) => trace!(entity = %id, "particle chunk full, oldest replaced"),
                Err(err) => {
                    warn!(entity = %id, %err, "particle dropped");
                    break;
                }
            }
        }
        self.store.insert_component(id, spawner);
    }

    fn update_status_effects(&mut self, id: EntityId, dt: f32) {
        let Some(mut effects) = self.store.get::<StatusEffects>(id).copied() else {
            return;
        };

        let mut damage = 0.0;
        let mut healing = 0.0;
        let mut speed_scale: f32 = 1.0;
        for slot in effects.slots.iter_mut() {
            let Some(effect) = slot else { continue };
            effect.remaining -= dt;
            effect.pulse_timer += dt;
            while effect.pulse_timer >= STATUS_PULSE_INTERVAL {
                effect.pulse_timer -= STATUS_PULSE_INTERVAL;
                match effect.kind {
                    StatusKind::Poison | StatusKind::Burn => damage += effect.magnitude,
                    StatusKind::Regen => healing += effect.magnitude,
                    StatusKind::Slow => {}
                }
            }
            if effect.kind == StatusKind::Slow {
                speed_scale = speed_scale.min(1.0 - effect.magnitude.clamp(0.0, 1.0));
            }
            if effect.remaining <= 0.0 {
                *slot = None;
            }
        }
        self.store.insert_component(id, effects);
        if let Some(p) = self.store.get_mut::<Physics>(id) {
            p.speed_scale = speed_scale;
        }

        let damage = damage.round() as i32;
        if damage > 0 {
            self.deal_damage(id, damage, EntityId::NULL);
        }
        let healing = healing.round() as i32;
        if healing > 0 {
            self.heal(id, healing);
        }
    }

    /// Schedule removal on zero health, a finished self-removing spawner or an
    /// expired lifetime.
    fn check_death(&mut self, id: EntityId) {
        let dead = self.store.get::<Health>(id).is_some_and(Health::is_dead);
        let spawner_done = self
            .store
            .get::<ParticleSpawner>(id)
            .is_some_and(|s| s.finished && s.remove_entity_when_finished);
        let expired = self.store.get::<Lifetime>(id).is_some_and(Lifetime::expired);

        if (dead || spawner_done || expired) && self.store.schedule_for_removal(id) && dead {
            self.dispatch_event(GameEvent::Died { entity: id });
        }
    }
}

fn advance_animation(animation: &mut Animation, dt: f32) {
    if animation.finished || animation.frame_count == 0 || animation.frame_duration <= 0.0 {
        return;
    }
    animation.timer += dt;
    while animation.timer >= animation.frame_duration {
        animation.timer -= animation.frame_duration;
        if animation.frame + 1 < animation.frame_count {
            animation.frame += 1;
        } else if animation.looping {
            animation.frame = 0;
        } else {
            animation.finished = true;
            break;
        }
    }
}

fn advance_light(light: &mut Light, dt: f32) {
    let Some(fade) = light.fade.as_mut() else {
        return;
    };
    fade.elapsed += dt;
    let t = if fade.duration > 0.0 {
        (fade.elapsed / fade.duration).min(1.0)
    } else {
        1.0
    };
    light.intensity = light.base_intensity * (1.0 - t);
}

#[cfg(test)]
mod tests {
    use super::super::tests::room_world;
    use super::*;
    use crate::ecs::{LightFade, StatusEffect};
    use crate::time::FrameInput;
    use glam::Vec3;

    #[test]
    fn animation_loops_and_finishes() {
        let mut looping = Animation::looping(3, 0.1);
        advance_animation(&mut looping, 0.35);
        assert_eq!(looping.frame, 0);
        assert!(!looping.finished);

        let mut once = Animation::once(3, 0.1);
        advance_animation(&mut once, 0.5);
        assert_eq!(once.frame, 2);
        assert!(once.finished);
    }

    #[test]
    fn light_fades_to_zero() {
        let mut light = Light::new(64.0, Vec3::ONE, 2.0);
        light.fade = Some(LightFade {
            elapsed: 0.0,
            duration: 1.0,
        });
        advance_light(&mut light, 0.5);
        assert_eq!(light.intensity, 1.0);
        advance_light(&mut light, 1.0);
        assert_eq!(light.intensity, 0.0);
    }

    #[test]
    fn lethal_damage_schedules_removal_same_frame() {
        let mut world = room_world();
        let id = world
            .spawn(Faction::Enemy, Some(Vec2::ZERO))
            .unwrap()
            .with(Health::new(1))
            .id();
        world.deal_damage(id, 5, EntityId::NULL);
        assert_eq!(world.get::<Health>(id).map(|h| h.current), Some(0));

        world.update_entity(id, 1.0 / 60.0);
        assert!(world.store().is_scheduled(id));
        assert!(world.events().contains(&GameEvent::Died { entity: id }));
    }

    #[test]
    fn vitality_raises_max_health() {
        let mut world = room_world();
        let item = world
            .spawn(Faction::Neutral, None)
            .unwrap()
            .with(ItemStats {
                vitality: 2,
                armor: 0,
            })
            .id();
        let mut equipment = Equipment::default();
        equipment.items[1] = item;
        let id = world
            .spawn(Faction::Player, Some(Vec2::ZERO))
            .unwrap()
            .with(Health::new(10))
            .with(Stats {
                vitality: 3,
                ..Stats::default()
            })
            .with(equipment)
            .id();

        world.update(&FrameInput::default());
        let per_point = world.config().health_per_vitality;
        assert_eq!(world.get::<Health>(id).unwrap().max, 10 + 5 * per_point);
    }

    #[test]
    fn huge_vitality_saturates_max_health() {
        let mut world = room_world();
        let item = world
            .spawn(Faction::Neutral, None)
            .unwrap()
            .with(ItemStats {
                vitality: i32::MAX,
                armor: 0,
            })
            .id();
        let mut equipment = Equipment::default();
        equipment.items[0] = item;
        let id = world
            .spawn(Faction::Player, Some(Vec2::ZERO))
            .unwrap()
            .with(Health::new(10))
            .with(Stats {
                vitality: i32::MAX,
                ..Stats::default()
            })
            .with(equipment)
            .id();

        world.update(&FrameInput::default());
        let health = world.get::<Health>(id).unwrap();
        assert_eq!(health.max, i32::MAX);
        assert_eq!(health.current, 10);
    }

    #[test]
    fn poison_pulses_and_slow_scales_speed() {
        let mut world = room_world();
        let id = world
            .spawn(Faction::Player, Some(Vec2::ZERO))
            .unwrap()
            .with(Health::new(20))
            .id();
        world.apply_status(id, StatusEffect::new(StatusKind::Poison, 2.0, 1.0));
        world.apply_status(id, StatusEffect::new(StatusKind::Slow, 0.25, 10.0));

        for _ in 0..8 {
            world.update(&FrameInput::with_dt(0.25));
        }
        // Two pulses inside the one-second poison.
        assert_eq!(world.get::<Health>(id).unwrap().current, 16);
        assert!(!world.get::<StatusEffects>(id).unwrap().has(StatusKind::Poison));
        assert_eq!(world.get::<Physics>(id).unwrap().speed_scale, 0.75);
    }

    #[test]
    fn one_shot_spawner_removes_its_entity() {
        let mut world = room_world();
        let id = world
            .spawn(Faction::Neutral, Some(Vec2::ZERO))
            .unwrap()
            .with(ParticleSpawner::burst(12, 1.0, 30.0))
            .id();
        let report = world.update(&FrameInput::default());
        assert_eq!(report.removed, vec![id]);
        assert_eq!(world.particles().len(), 12);
    }

    #[test]
    fn projectile_homes_and_hits() {
        let mut world = room_world();
        let target = world
            .spawn(Faction::Enemy, Some(Vec2::new(60.0, 0.0)))
            .unwrap()
            .with(Health::new(10))
            .id();
        let projectile = world
            .spawn(Faction::Player, Some(Vec2::ZERO))
            .unwrap()
            .with(ArcingProjectile {
                target,
                speed: 120.0,
                turn_rate: 60.0,
                impact_damage: 4,
                impact_distance_sq: 16.0,
                ..ArcingProjectile::default()
            })
            .id();

        let mut hit = false;
        for _ in 0..120 {
            world.update(&FrameInput::default());
            hit |= world.events().iter().any(|e| {
                matches!(e, GameEvent::ProjectileImpact { projectile: p, .. } if *p == projectile)
            });
            if hit {
                break;
            }
        }
        assert!(hit);
        assert_eq!(world.get::<Health>(target).unwrap().current, 6);
        assert!(world.store().get_entity(projectile).is_none());
    }

    #[test]
    fn ai_chases_hostiles_in_sight() {
        let mut world = room_world();
        let player = world
            .spawn(Faction::Player, Some(Vec2::new(50.0, 0.0)))
            .unwrap()
            .with(Health::new(10))
            .id();
        let hunter = world
            .spawn(Faction::Enemy, Some(Vec2::ZERO))
            .unwrap()
            .with(Ai::hunter(40.0, 100.0))
            .with(Health::new(10))
            .id();

        world.update(&FrameInput::default());
        let ai = world.get::<Ai>(hunter).unwrap();
        assert_eq!(ai.state, AiState::Chase);
        assert_eq!(ai.target, player);
        assert_eq!(world.get::<Physics>(hunter).unwrap().velocity, Vec2::new(40.0, 0.0));
    }
}
