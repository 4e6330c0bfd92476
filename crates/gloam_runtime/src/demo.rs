//! Demo dungeon used by the headless runtime.

use anyhow::{Context, Result};
use gloam_core::collision::RetriggerPolicy;
use gloam_core::ecs::{
    Ai, Animation, Collider, CollisionPolicy, DamageField, EffectApplier, Equipment, Health,
    ItemStats, Light, ParticleSpawner, Sprite, Stats, StatusEffect, StatusKind,
};
use gloam_core::glam::{IVec2, Vec2, Vec3};
use gloam_core::spatial::{Tile, Tilemap};
use gloam_core::{EntityId, Faction, World, WorldConfig};
use tracing::info;

pub const TILE_SIZE: f32 = 16.0;
pub const CHUNK_TILES: i32 = 8;

const PLAYER_TEXTURE: u16 = 10;
const SLIME_TEXTURE: u16 = 11;
const TORCH_TEXTURE: u16 = 12;
const SPIKES_TEXTURE: u16 = 13;

fn tile_center(coord: IVec2) -> Vec2 {
    (coord.as_vec2() + Vec2::splat(0.5)) * TILE_SIZE
}

fn sprite(texture: u16, size: f32) -> Sprite {
    Sprite {
        texture,
        shader: 1,
        size: Vec2::splat(size),
        tint: [255; 4],
    }
}

/// Two rooms joined by a corridor, with a pillar in the east room.
pub fn dungeon_map() -> Tilemap {
    let mut map = Tilemap::new(TILE_SIZE, CHUNK_TILES);
    map.carve_room(IVec2::new(0, 0), IVec2::new(14, 10));
    map.carve_room(IVec2::new(24, -2), IVec2::new(40, 12));
    map.carve_corridor(IVec2::new(14, 5), IVec2::new(24, 5));
    map.fill(IVec2::new(31, 4), IVec2::new(32, 5), Tile::Wall);
    map
}

/// Populate the dungeon. Returns the player.
pub fn populate(world: &mut World) -> Result<EntityId> {
    let ring = world
        .spawn(Faction::Neutral, None)
        .context("spawning ring")?
        .with(ItemStats {
            vitality: 2,
            armor: 1,
        })
        .id();
    let mut equipment = Equipment::default();
    equipment.items[0] = ring;

    let player = world
        .spawn(Faction::Player, Some(tile_center(IVec2::new(4, 5))))
        .context("spawning player")?
        .with(Collider::new(Vec2::splat(12.0)))
        .with(Health::new(30))
        .with(Stats {
            vitality: 2,
            strength: 3,
            armor: 0,
        })
        .with(equipment)
        .with(sprite(PLAYER_TEXTURE, 16.0))
        .with(Animation::looping(4, 0.15))
        .with(Light::new(96.0, Vec3::new(1.0, 0.9, 0.7), 1.0))
        .id();
    world.set_camera(player);

    for (i, coord) in [IVec2::new(28, 2), IVec2::new(36, 9), IVec2::new(38, 1)]
        .into_iter()
        .enumerate()
    {
        world
            .spawn(Faction::Enemy, Some(tile_center(coord)))
            .with_context(|| format!("spawning slime {i}"))?
            .with(Collider::new(Vec2::splat(14.0)).with_group(1))
            .with(Health::new(12))
            .with(Ai {
                flee_below: 0.25,
                ..Ai::hunter(28.0, 160.0)
            })
            .with(DamageField {
                amount: 2,
                retrigger: RetriggerPolicy::Every(1.0),
            })
            .with(EffectApplier {
                effect: StatusEffect::new(StatusKind::Poison, 1.0, 3.0),
                retrigger: RetriggerPolicy::Once,
            })
            .with(sprite(SLIME_TEXTURE, 16.0))
            .with(Animation::looping(2, 0.3));
    }

    // Spike trap in the corridor.
    world
        .spawn(Faction::Neutral, Some(tile_center(IVec2::new(19, 5))))
        .context("spawning spikes")?
        .with(Collider::new(Vec2::splat(16.0)).with_policy(CollisionPolicy::PassThrough))
        .with(DamageField {
            amount: 3,
            retrigger: RetriggerPolicy::Every(1.5),
        })
        .with(sprite(SPIKES_TEXTURE, 16.0));

    // Torches: a light plus a gentle ember stream.
    for coord in [IVec2::new(1, 1), IVec2::new(13, 1), IVec2::new(25, -1), IVec2::new(39, 11)] {
        world
            .spawn(Faction::Neutral, Some(tile_center(coord)))
            .context("spawning torch")?
            .with(Light::new(64.0, Vec3::new(1.0, 0.6, 0.2), 0.8))
            .with(ParticleSpawner {
                direction: Vec2::NEG_Y,
                spread: 0.4,
                drag: 0.5,
                ..ParticleSpawner::stream(6.0, 1.2, 20.0)
            })
            .with(sprite(TORCH_TEXTURE, 8.0));
    }

    info!(entities = world.alive().len(), "dungeon populated");
    Ok(player)
}

pub fn build_world(config: WorldConfig) -> Result<(World, EntityId)> {
    let mut world = World::new(config, dungeon_map());
    let player = populate(&mut world)?;
    Ok((world, player))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gloam_core::ecs::Physics;
    use gloam_core::FrameInput;
    use gloam_render::{render_world, DrawBatch, Layer, RenderAssets};

    #[test]
    fn dungeon_is_walled_and_connected() {
        let map = dungeon_map();
        assert_eq!(map.get(IVec2::new(19, 5)), Some(Tile::Floor));
        assert_eq!(map.get(IVec2::new(15, 5)), Some(Tile::Floor));
        assert_eq!(map.get(IVec2::new(31, 4)), Some(Tile::Wall));
        assert_eq!(map.get(IVec2::new(-1, 0)), Some(Tile::Wall));
        assert!(map.get(IVec2::new(-5, -5)).is_none());
    }

    #[test]
    fn demo_world_runs_and_renders() {
        let (mut world, player) = build_world(WorldConfig::default()).unwrap();
        let start = world.get::<Physics>(player).unwrap().position;
        assert_eq!(world.camera().center, start);

        let assets = RenderAssets::default();
        let mut batch = DrawBatch::new();
        for _ in 0..120 {
            world.update(&FrameInput::default());
        }
        render_world(&world, &assets, &mut batch);
        assert!(batch.count_layer(Layer::Floor) > 0);
        assert!(batch.count_layer(Layer::Entity) > 0);
        assert!(!world.particles().is_empty());
    }
}
