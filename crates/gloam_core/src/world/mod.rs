//! World orchestrator
//!
//! Owns every simulation structure and advances them one frame per `update`:
//!
//! 1. collision and movement
//! 2. per-entity component updates and death checks
//! 3. hitsplats
//! 4. particles in visible chunks
//! 5. trigger cooldown timers
//! 6. collision table swap
//! 7. removal sweep
//! 8. quadtree refresh
//!
//! Rendering reads the world through `&World` afterwards.

mod camera;
mod combat;
mod events;
mod movement;
mod removal;
mod update;

#[cfg(test)]
mod scenarios;

pub use camera::Camera;
pub use events::GameEvent;

use std::time::Instant;

use glam::Vec2;
use gloam_metrics::SystemProfiler;
use tracing::{info, trace};

use crate::collision::{CollisionTable, TriggerCooldownTable};
use crate::config::WorldConfig;
use crate::ecs::{Collider, Component, EcsError, EntityId, EntityMut, EntityStore, Faction, Physics};
use crate::effects::{Hitsplats, ParticleChunks};
use crate::math::{DeterministicRng, Rect};
use crate::memory::FrameArena;
use crate::spatial::{QuadTree, QuadTreeConfig, QuadTreeLocation, Tilemap};
use crate::time::{ButtonState, FrameInput, SimulationTime};

const NOT_ALIVE: u32 = u32::MAX;

/// Summary of one `update` call.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub tick: u64,
    /// Entities considered by the movement and update phases.
    pub simulated: usize,
    /// Pairs recorded in the collision table this frame.
    pub collision_pairs: usize,
    pub particle_chunks_updated: usize,
    pub removed: Vec<EntityId>,
    pub alive: usize,
}

/// Per-slot movement scratch, reset at the start of every movement phase.
#[derive(Debug, Clone, Copy)]
struct MoveScratch {
    /// Upper bound on this frame's movement fraction set by earlier contacts.
    cap: f32,
    moved: bool,
}

impl Default for MoveScratch {
    fn default() -> Self {
        Self {
            cap: 1.0,
            moved: false,
        }
    }
}

pub struct World {
    config: WorldConfig,
    store: EntityStore,
    /// Dense list of allocated entities; order changes on removal.
    alive: Vec<EntityId>,
    /// Quadtree location of `alive[i]`.
    locations: Vec<QuadTreeLocation>,
    /// Position in `alive` by entity slot index.
    alive_slot: Vec<u32>,
    quadtree: QuadTree,
    tilemap: Tilemap,
    cooldowns: TriggerCooldownTable,
    collisions: CollisionTable,
    particles: ParticleChunks,
    hitsplats: Hitsplats,
    events: Vec<GameEvent>,
    rng: DeterministicRng,
    arena: FrameArena,
    time: SimulationTime,
    camera: Camera,
    move_scratch: Vec<MoveScratch>,
    debug_overlay: bool,
    profiler: SystemProfiler,
}

impl World {
    /// Build a world around a populated tile map. The quadtree covers the map's bounds.
    pub fn new(config: WorldConfig, tilemap: Tilemap) -> Self {
        let bounds = tilemap
            .world_bounds()
            .unwrap_or_else(|| Rect::from_min_size(Vec2::ZERO, Vec2::splat(tilemap.chunk_world_size())));
        let quadtree = QuadTree::new(
            bounds,
            QuadTreeConfig {
                split_threshold: config.quadtree_split_threshold,
                max_depth: config.quadtree_max_depth,
            },
        );
        let particles = ParticleChunks::new(config.particles_per_chunk, tilemap.chunk_world_size());
        let hitsplats = Hitsplats::new(
            config.max_hitsplats,
            config.hitsplat_lifetime,
            config.hitsplat_rise_speed,
        );

        info!(
            max_entities = config.max_entities,
            tiles = tilemap.len(),
            ?bounds,
            "world created"
        );

        Self {
            store: EntityStore::new(config.max_entities),
            alive: Vec::with_capacity(config.max_entities),
            locations: Vec::with_capacity(config.max_entities),
            alive_slot: vec![NOT_ALIVE; config.max_entities],
            quadtree,
            tilemap,
            cooldowns: TriggerCooldownTable::new(),
            collisions: CollisionTable::new(),
            particles,
            hitsplats,
            events: Vec::new(),
            rng: DeterministicRng::new(config.rng_seed),
            arena: FrameArena::new(),
            time: SimulationTime::new(),
            camera: Camera::new(bounds.center(), FrameInput::default().window_size),
            move_scratch: vec![MoveScratch::default(); config.max_entities],
            debug_overlay: false,
            profiler: SystemProfiler::new(60),
            config,
        }
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create an entity, optionally with a `Physics` component at `position`.
    ///
    /// Positioned entities go into the quadtree right away so queries made before
    /// the next frame can see them.
    pub fn spawn(&mut self, faction: Faction, position: Option<Vec2>) -> Result<EntityMut<'_>, EcsError> {
        let (id, mut entity) = self.store.create_entity(faction)?;

        let mut location = QuadTreeLocation::NULL;
        if let Some(position) = position {
            entity.with(Physics::at(position));
            location = self
                .quadtree
                .set_entity_area(id, QuadTreeLocation::NULL, Rect::new(position, position));
        }

        self.alive_slot[id.index() as usize] = self.alive.len() as u32;
        self.alive.push(id);
        self.locations.push(location);
        Ok(entity)
    }

    /// Soft delete; the entity disappears in this frame's (or the next) removal sweep.
    pub fn schedule_for_removal(&mut self, id: EntityId) -> bool {
        self.store.schedule_for_removal(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        self.store.get_entity_mut(id)
    }

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.store.get::<T>(id)
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.store.get_mut::<T>(id)
    }

    /// World-space box of an entity: its collider, or a point at its position.
    pub fn entity_bounds(&self, id: EntityId) -> Option<Rect> {
        let physics = self.store.get::<Physics>(id)?;
        Some(match self.store.get::<Collider>(id) {
            Some(collider) => collider.bounds(physics.position),
            None => Rect::new(physics.position, physics.position),
        })
    }

    /// Entities whose stored area overlaps `area`.
    pub fn entities_in_area(&mut self, area: &Rect) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.quadtree.get_entities_in_area(area, &mut out);
        out
    }

    pub fn location_of(&self, id: EntityId) -> QuadTreeLocation {
        match self.alive_index(id) {
            Some(i) => self.locations[i],
            None => QuadTreeLocation::NULL,
        }
    }

    fn alive_index(&self, id: EntityId) -> Option<usize> {
        if !self.store.contains(id) {
            return None;
        }
        let slot = *self.alive_slot.get(id.index() as usize)?;
        (slot != NOT_ALIVE).then_some(slot as usize)
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Advance the simulation by one frame.
    pub fn update(&mut self, input: &FrameInput) -> FrameReport {
        let dt = input.dt;
        self.arena.reset();
        // Events nobody drained last frame are dropped.
        self.events.clear();
        self.camera.set_viewport(input.window_size);
        if input.buttons.is_down(ButtonState::DEBUG_OVERLAY) {
            self.debug_overlay = !self.debug_overlay;
        }

        let snapshot = self.alive.len();

        let start = Instant::now();
        self.run_movement(snapshot, dt);
        self.profiler.record("movement", start.elapsed());
        let collision_pairs = self.collisions.current_len();

        let start = Instant::now();
        for i in 0..snapshot {
            let id = self.alive[i];
            self.update_entity(id, dt);
        }
        self.profiler.record("entities", start.elapsed());

        let start = Instant::now();
        self.hitsplats.update(dt);
        self.profiler.record("hitsplats", start.elapsed());

        let start = Instant::now();
        let visible = self.visible_rect(self.config.render_margin);
        let particle_chunks_updated =
            self.particles
                .update_visible(dt, self.config.particle_gravity, &visible);
        self.profiler.record("particles", start.elapsed());

        self.cooldowns.tick(dt);
        self.collisions.swap();

        let start = Instant::now();
        let removed = self.sweep_removed();
        self.profiler.record("removal", start.elapsed());

        let start = Instant::now();
        self.refresh_locations();
        self.camera.follow(&self.store);
        self.profiler.record("refresh", start.elapsed());

        self.time.advance_tick(dt);
        if self.debug_overlay {
            self.arena.debug_line(format_args!(
                "tick {} alive {} pairs {} particles {}",
                self.time.tick_count(),
                self.alive.len(),
                collision_pairs,
                self.particles.len()
            ));
        }

        trace!(
            tick = self.time.tick_count(),
            simulated = snapshot,
            collision_pairs,
            removed = removed.len(),
            alive = self.alive.len(),
            "frame complete"
        );

        FrameReport {
            tick: self.time.tick_count(),
            simulated: snapshot,
            collision_pairs,
            particle_chunks_updated,
            removed,
            alive: self.alive.len(),
        }
    }

    /// Margin-expanded rectangle the camera can see.
    pub fn visible_rect(&self, margin: f32) -> Rect {
        self.camera.view_rect().expanded(margin)
    }

    /// Events produced since the last `update` started.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Allocated entities in dense order.
    pub fn alive(&self) -> &[EntityId] {
        &self.alive
    }

    pub fn quadtree(&self) -> &QuadTree {
        &self.quadtree
    }

    pub fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    pub fn collisions(&self) -> &CollisionTable {
        &self.collisions
    }

    pub fn cooldowns(&self) -> &TriggerCooldownTable {
        &self.cooldowns
    }

    pub fn particles(&self) -> &ParticleChunks {
        &self.particles
    }

    pub fn hitsplats(&self) -> &Hitsplats {
        &self.hitsplats
    }

    pub fn time(&self) -> &SimulationTime {
        &self.time
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Follow `target` from now on and snap to it if it has a position.
    pub fn set_camera(&mut self, target: EntityId) {
        self.camera.target = target;
        self.camera.follow(&self.store);
    }

    pub fn arena(&self) -> &FrameArena {
        &self.arena
    }

    pub fn debug_overlay(&self) -> bool {
        self.debug_overlay
    }

    pub fn set_debug_overlay(&mut self, enabled: bool) {
        self.debug_overlay = enabled;
    }

    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Health;
    use glam::IVec2;

    pub(super) fn room_world() -> World {
        let mut map = Tilemap::new(16.0, 8);
        map.carve_room(IVec2::new(-8, -8), IVec2::new(8, 8));
        let mut world = World::new(WorldConfig::default(), map);
        world.camera_mut().center = Vec2::ZERO;
        world
    }

    #[test]
    fn spawned_entities_are_queryable_immediately() {
        let mut world = room_world();
        let id = world
            .spawn(Faction::Player, Some(Vec2::new(10.0, 10.0)))
            .unwrap()
            .id();
        let found = world.entities_in_area(&Rect::from_center_size(Vec2::new(10.0, 10.0), Vec2::ONE));
        assert_eq!(found, vec![id]);
        assert!(!world.location_of(id).is_null());
    }

    #[test]
    fn scheduled_entity_survives_until_sweep() {
        let mut world = room_world();
        let id = world
            .spawn(Faction::Enemy, Some(Vec2::ZERO))
            .unwrap()
            .with(Health::new(3))
            .id();
        world.schedule_for_removal(id);
        assert!(world.store().get_entity(id).is_some());

        let report = world.update(&FrameInput::default());
        assert_eq!(report.removed, vec![id]);
        assert!(world.store().get_entity(id).is_none());
        assert!(world.alive().is_empty());
        assert!(world.quadtree().is_empty());
    }

    #[test]
    fn refresh_tracks_collider_bounds() {
        let mut world = room_world();
        let id = world
            .spawn(Faction::Neutral, Some(Vec2::new(20.0, 20.0)))
            .unwrap()
            .with(Collider::new(Vec2::splat(8.0)))
            .id();
        world.update(&FrameInput::default());
        assert_eq!(
            world.location_of(id).area,
            Rect::from_center_size(Vec2::new(20.0, 20.0), Vec2::splat(8.0))
        );
    }

    #[test]
    fn capacity_errors_propagate() {
        let mut map = Tilemap::new(16.0, 8);
        map.carve_room(IVec2::ZERO, IVec2::splat(2));
        let config = WorldConfig {
            max_entities: 1,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, map);
        assert!(world.spawn(Faction::Neutral, None).is_ok());
        assert_eq!(
            world.spawn(Faction::Neutral, None).err(),
            Some(EcsError::CapacityExceeded { capacity: 1 })
        );
    }
}
