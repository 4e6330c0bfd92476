//! Read-only extraction of draw commands from a `World`.

use glam::Vec2;
use gloam_core::ecs::{Animation, Collider, Light, Physics, Sprite};
use gloam_core::effects::HitsplatKind;
use gloam_core::math::Rect;
use gloam_core::spatial::Tile;
use gloam_core::{EntityId, World};
use tracing::trace;

use crate::command::{DrawBatch, Layer, SortKey};
use crate::handles::{FontHandle, ShaderHandle, TextureHandle};

/// Alpha of a wall that hides an entity behind it.
const TRANSLUCENT_WALL_ALPHA: u8 = 96;

const DAMAGE_COLOR: [u8; 3] = [230, 40, 40];
const HEAL_COLOR: [u8; 3] = [60, 220, 90];
const DEBUG_COLLIDER_COLOR: [u8; 4] = [255, 0, 255, 160];
const DEBUG_NODE_COLOR: [u8; 4] = [0, 200, 255, 96];

/// Handles the extractor needs for things that carry no `Sprite`.
#[derive(Debug, Clone, Copy)]
pub struct RenderAssets {
    pub sprite_shader: ShaderHandle,
    pub light_shader: ShaderHandle,
    pub text_shader: ShaderHandle,
    pub debug_shader: ShaderHandle,
    pub floor_texture: TextureHandle,
    pub wall_texture: TextureHandle,
    pub particle_texture: TextureHandle,
    pub hitsplat_font: FontHandle,
}

impl Default for RenderAssets {
    fn default() -> Self {
        Self {
            sprite_shader: ShaderHandle::new(1),
            light_shader: ShaderHandle::new(2),
            text_shader: ShaderHandle::new(3),
            debug_shader: ShaderHandle::new(4),
            floor_texture: TextureHandle::new(1),
            wall_texture: TextureHandle::new(2),
            particle_texture: TextureHandle::new(3),
            hitsplat_font: FontHandle::new(1),
        }
    }
}

/// Fill `batch` with everything visible this frame, sorted by key.
pub fn render_world(world: &World, assets: &RenderAssets, batch: &mut DrawBatch) {
    batch.clear();
    let camera = world.camera();
    let view = world.visible_rect(world.config().render_margin);
    let screen_rect = |r: &Rect| {
        let min = camera.world_to_screen(r.min);
        let size = r.size();
        [min.x, min.y, size.x, size.y]
    };
    let depth_of =
        |world_y: f32| SortKey::depth_from_screen_y(camera.world_to_screen(Vec2::new(0.0, world_y)).y);

    let mut visible = Vec::new();
    world.quadtree().query(&view, &mut visible);
    let occluders: Vec<Rect> = visible
        .iter()
        .filter(|&&id| world.get::<Sprite>(id).is_some())
        .filter_map(|&id| world.entity_bounds(id))
        .collect();

    // Tiles
    let tilemap = world.tilemap();
    let tile_size = tilemap.tile_size();
    for (coord, tile) in tilemap.tiles_in(&view) {
        let rect = tilemap.tile_rect(coord);
        let (layer, texture, alpha) = match tile {
            Tile::Floor => (Layer::Floor, assets.floor_texture, 255),
            Tile::Wall => {
                // Wall art stands one tile taller than its footprint.
                let sprite_area = Rect::new(rect.min - Vec2::new(0.0, tile_size), rect.max);
                let hides_entity = occluders.iter().any(|b| b.overlaps_strict(&sprite_area));
                let alpha = if hides_entity { TRANSLUCENT_WALL_ALPHA } else { 255 };
                (Layer::Wall, assets.wall_texture, alpha)
            }
        };
        let key = SortKey::new(
            layer,
            assets.sprite_shader,
            texture,
            FontHandle::default(),
            depth_of(rect.max.y),
        );
        batch.push(key, screen_rect(&rect), [255, 255, 255, alpha], 0);
    }

    // Entities
    for &id in &visible {
        emit_entity(world, assets, batch, id, &screen_rect, &depth_of);
    }

    // Particles
    for particle in world.particles().particles_in(&view) {
        let rect = Rect::from_center_size(particle.position, Vec2::splat(particle.size));
        let life = if particle.lifetime > 0.0 {
            (1.0 - particle.timer / particle.lifetime).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut color = particle.color;
        color[3] = (color[3] as f32 * life) as u8;
        let key = SortKey::new(
            Layer::Particle,
            assets.sprite_shader,
            assets.particle_texture,
            FontHandle::default(),
            depth_of(particle.position.y),
        );
        batch.push(key, screen_rect(&rect), color, 0);
    }

    // Hitsplats
    let hitsplats = world.hitsplats();
    for splat in hitsplats.iter() {
        if !view.contains_point(splat.position) {
            continue;
        }
        let [r, g, b] = match splat.kind {
            HitsplatKind::Damage => DAMAGE_COLOR,
            HitsplatKind::Heal => HEAL_COLOR,
        };
        let alpha = (hitsplats.opacity(splat) * 255.0) as u8;
        let rect = Rect::from_center_size(splat.position, Vec2::splat(tile_size));
        let key = SortKey::new(
            Layer::Overlay,
            assets.text_shader,
            TextureHandle::default(),
            assets.hitsplat_font,
            depth_of(splat.position.y),
        );
        batch.push(key, screen_rect(&rect), [r, g, b, alpha], splat.amount.unsigned_abs());
    }

    if world.debug_overlay() {
        let key = SortKey::new(
            Layer::Debug,
            assets.debug_shader,
            TextureHandle::default(),
            FontHandle::default(),
            0,
        );
        for &id in &visible {
            if world.get::<Collider>(id).is_some() {
                if let Some(bounds) = world.entity_bounds(id) {
                    batch.push(key, screen_rect(&bounds), DEBUG_COLLIDER_COLOR, 0);
                }
            }
        }
        for node in world.quadtree().node_rects().filter(|r| r.intersects(&view)) {
            batch.push(key, screen_rect(&node), DEBUG_NODE_COLOR, 0);
        }
    }

    batch.sort();
    trace!(commands = batch.len(), entities = visible.len(), "render extracted");
}

fn emit_entity(
    world: &World,
    assets: &RenderAssets,
    batch: &mut DrawBatch,
    id: EntityId,
    screen_rect: &impl Fn(&Rect) -> [f32; 4],
    depth_of: &impl Fn(f32) -> u32,
) {
    let Some(physics) = world.get::<Physics>(id) else {
        return;
    };

    if let Some(sprite) = world.get::<Sprite>(id) {
        let rect = Rect::from_center_size(physics.position, sprite.size);
        let frame = world.get::<Animation>(id).map_or(0, |a| a.frame as u32);
        let key = SortKey::new(
            Layer::Entity,
            ShaderHandle::new(sprite.shader),
            TextureHandle::new(sprite.texture),
            FontHandle::default(),
            depth_of(rect.max.y),
        );
        batch.push(key, screen_rect(&rect), sprite.tint, frame);
    }

    if let Some(light) = world.get::<Light>(id) {
        if light.intensity > 0.0 {
            let rect = Rect::from_center_size(physics.position, Vec2::splat(light.radius * 2.0));
            let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
            let color = [
                to_u8(light.color.x),
                to_u8(light.color.y),
                to_u8(light.color.z),
                to_u8(light.intensity),
            ];
            let key = SortKey::new(
                Layer::Overlay,
                assets.light_shader,
                TextureHandle::default(),
                FontHandle::default(),
                depth_of(physics.position.y),
            );
            batch.push(key, screen_rect(&rect), color, 0);
        }
    }
}
