//! Whole-frame scenarios run against a small walled room.

use glam::Vec2;

use super::tests::room_world;
use super::{GameEvent, World};
use crate::collision::{entity_vs_entity_collision, Body, EntityPair, RetriggerPolicy};
use crate::ecs::{
    Collider, CollisionPolicy, ComponentKind, DamageField, EntityId, EntityStore, Faction, Health,
    Physics,
};
use crate::math::Rect;
use crate::spatial::{QuadTree, QuadTreeConfig, QuadTreeLocation};
use crate::time::{FrameInput, TICK_DURATION_SECS};

fn boxed(world: &mut World, faction: Faction, at: Vec2, velocity: Vec2) -> EntityId {
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
fn approaching_boxes_are_blocked_and_recorded() {
    let mut world = room_world();
    let a = boxed(&mut world, Faction::Player, Vec2::ZERO, Vec2::new(10.0, 0.0));
    let b = boxed(&mut world, Faction::Player, Vec2::new(8.0, 0.0), Vec2::new(-10.0, 0.0));

    let report = world.update(&FrameInput::with_dt(TICK_DURATION_SECS));
    assert_eq!(report.collision_pairs, 1);
    let fa = world.get::<Physics>(a).unwrap().last_movement_fraction;
    let fb = world.get::<Physics>(b).unwrap().last_movement_fraction;
    assert!(fa < 1.0 || fb < 1.0);
    assert!(world.collisions().contains_previous(EntityPair::new(b, a)));
}

#[test]
fn lethal_hit_clamps_and_removes_same_frame() {
    let mut world = room_world();
    let id = world
        .spawn(Faction::Enemy, Some(Vec2::ZERO))
        .unwrap()
        .with(Health::new(1))
        .id();
    world.deal_damage(id, 5, EntityId::NULL);
    assert_eq!(world.get::<Health>(id).unwrap().current, 0);

    let report = world.update(&FrameInput::default());
    assert_eq!(report.removed, vec![id]);
    assert!(world.store().get_entity(id).is_none());
}

#[test]
fn hostile_contact_fires_once_per_overlap() {
    let mut world = room_world();
    let a = boxed(&mut world, Faction::Player, Vec2::ZERO, Vec2::ZERO);
    let b = boxed(&mut world, Faction::Enemy, Vec2::new(4.0, 0.0), Vec2::ZERO);
    let pair = EntityPair::new(a, b);

    assert!(!world.collisions().contains_previous(pair));
    let mut contacts = 0;
    for frame in 0..10 {
        world.update(&FrameInput::default());
        assert!(world.collisions().contains_previous(pair), "frame {frame}");
        contacts += world
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::HostileCollision { entity, .. } if *entity == a))
            .count();
    }
    assert_eq!(contacts, 1);
}

#[test]
fn separated_pair_counts_as_new_contact_again() {
    let mut world = room_world();
    let a = boxed(&mut world, Faction::Player, Vec2::ZERO, Vec2::ZERO);
    let b = boxed(&mut world, Faction::Enemy, Vec2::new(4.0, 0.0), Vec2::ZERO);
    world.update(&FrameInput::default());

    if let Some(p) = world.get_mut::<Physics>(b) {
        p.position = Vec2::new(80.0, 0.0);
    }
    world.update(&FrameInput::default());
    assert!(!world.collisions().contains_previous(EntityPair::new(a, b)));

    if let Some(p) = world.get_mut::<Physics>(b) {
        p.position = Vec2::new(4.0, 0.0);
    }
    world.update(&FrameInput::default());
    assert!(world
        .events()
        .iter()
        .any(|e| matches!(e, GameEvent::HostileCollision { entity, .. } if *entity == b)));
}

fn field_scenario(retrigger: RetriggerPolicy, frames: usize) -> i32 {
    let mut world = room_world();
    let player = boxed(&mut world, Faction::Player, Vec2::ZERO, Vec2::ZERO);
    if let Some(mut entity) = world.entity_mut(player) {
        entity.with(Health::new(100));
    }
    world
        .spawn(Faction::Neutral, Some(Vec2::new(2.0, 0.0)))
        .unwrap()
        .with(Collider::new(Vec2::splat(16.0)).with_policy(CollisionPolicy::PassThrough))
        .with(DamageField {
            amount: 1,
            retrigger,
        });

    for _ in 0..frames {
        world.update(&FrameInput::with_dt(0.25));
    }
    world.get::<Health>(player).unwrap().current
}

#[test]
fn retrigger_policies_pace_damage() {
    assert_eq!(field_scenario(RetriggerPolicy::Once, 8), 99);
    // Half-second cooldown at quarter-second ticks fires every other frame.
    assert_eq!(field_scenario(RetriggerPolicy::Every(0.5), 8), 96);
    assert_eq!(field_scenario(RetriggerPolicy::EveryFrame, 8), 92);
}

#[test]
fn once_cooldown_outlives_contact() {
    let mut world = room_world();
    let player = boxed(&mut world, Faction::Player, Vec2::ZERO, Vec2::ZERO);
    if let Some(mut entity) = world.entity_mut(player) {
        entity.with(Health::new(10));
    }
    let field = world
        .spawn(Faction::Enemy, Some(Vec2::new(2.0, 0.0)))
        .unwrap()
        .with(Collider::new(Vec2::splat(16.0)).with_policy(CollisionPolicy::PassThrough))
        .with(DamageField {
            amount: 3,
            retrigger: RetriggerPolicy::Once,
        })
        .id();
    world.update(&FrameInput::default());

    // Step off, then back on.
    for x in [100.0, 2.0] {
        if let Some(p) = world.get_mut::<Physics>(field) {
            p.position = Vec2::new(x, 0.0);
        }
        world.update(&FrameInput::default());
    }
    assert_eq!(world.get::<Health>(player).unwrap().current, 7);
    assert!(world
        .cooldowns()
        .is_cooling_down(EntityPair::new(player, field), ComponentKind::DamageField));
}

#[test]
fn stale_ids_never_resolve() {
    let mut store = EntityStore::new(4);
    let old = store.create_entity(Faction::Neutral).unwrap().0;
    store.insert_component(old, Health::new(5));
    assert!(store.destroy_entity(old));

    let fresh = store.create_entity(Faction::Neutral).unwrap().0;
    assert_eq!(fresh.index(), old.index());
    assert_ne!(fresh, old);
    assert!(store.get_entity(old).is_none());
    assert!(store.get::<Health>(old).is_none());
    assert!(!store.schedule_for_removal(old));
}

#[test]
fn quadtree_round_trip_and_relocation() {
    let mut store = EntityStore::new(64);
    let mut tree = QuadTree::new(
        Rect::new(Vec2::splat(-512.0), Vec2::splat(512.0)),
        QuadTreeConfig {
            split_threshold: 4,
            max_depth: 6,
        },
    );

    let mut boxes = Vec::new();
    for i in 0..40 {
        let id = store.create_entity(Faction::Neutral).unwrap().0;
        let min = Vec2::new((i % 8) as f32 * 50.0 - 200.0, (i / 8) as f32 * 60.0 - 150.0);
        let area = Rect::from_min_size(min, Vec2::new(30.0 + i as f32, 20.0));
        let location = tree.set_entity_area(id, QuadTreeLocation::NULL, area);
        boxes.push((id, area, location));
    }

    let union = boxes.iter().skip(1).fold(boxes[0].1, |acc, (_, r, _)| acc.union(r));
    let mut found = Vec::new();
    tree.get_entities_in_area(&union, &mut found);
    found.sort();
    let mut expected: Vec<EntityId> = boxes.iter().map(|(id, _, _)| *id).collect();
    expected.sort();
    assert_eq!(found, expected);

    found.clear();
    tree.get_entities_in_area(&Rect::new(Vec2::splat(450.0), Vec2::splat(500.0)), &mut found);
    assert!(found.is_empty());

    let (id, area, location) = boxes[7];
    let again = tree.set_entity_area(id, location, area);
    assert_eq!(again, location);
    let again = tree.set_entity_area(id, again, area);
    assert_eq!(again, location);
    found.clear();
    tree.get_entities_in_area(&area, &mut found);
    assert!(found.contains(&id));
    assert_eq!(tree.len(), 40);
}

#[test]
fn collision_bound_ignores_argument_order() {
    let mut store = EntityStore::new(4);
    let a = store.create_entity(Faction::Player).unwrap().0;
    let b = store.create_entity(Faction::Enemy).unwrap().0;
    let cases = [
        (Vec2::ZERO, Vec2::new(30.0, 0.0), Vec2::new(40.0, 0.0), Vec2::new(-20.0, 0.0)),
        (Vec2::ZERO, Vec2::new(8.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(-10.0, 0.0)),
        (Vec2::new(0.0, -40.0), Vec2::new(5.0, 3.0), Vec2::new(0.0, 90.0), Vec2::ZERO),
    ];
    for (pa, pb, da, db) in cases {
        let body_a = Body {
            id: a,
            bounds: Rect::from_center_size(pa, Vec2::splat(16.0)),
            displacement: da,
        };
        let body_b = Body {
            id: b,
            bounds: Rect::from_center_size(pb, Vec2::splat(16.0)),
            displacement: db,
        };
        let ab = entity_vs_entity_collision(&body_a, &body_b);
        let ba = entity_vs_entity_collision(&body_b, &body_a);
        assert!(ab.is_colliding());
        assert_eq!(ab.time_of_impact(), ba.time_of_impact());
    }
}
