//! Per-chunk particle buffers.
//!
//! Each chunk owns a bounded buffer. Only chunks overlapping the visible
//! rectangle are integrated, so off-screen effects freeze until seen again.

use std::collections::HashMap;

use glam::{IVec2, Vec2};

use super::CapacityError;
use crate::math::Rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds alive so far.
    pub timer: f32,
    pub lifetime: f32,
    /// Fraction of velocity lost per second.
    pub drag: f32,
    pub color: [u8; 4],
    pub size: f32,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, lifetime: f32) -> Self {
        Self {
            position,
            velocity,
            timer: 0.0,
            lifetime,
            drag: 0.0,
            color: [255, 255, 255, 255],
            size: 2.0,
        }
    }

    /// Expired once the age is within half a step of the lifetime, so an
    /// accumulated f32 timer that lands just under it still counts.
    #[inline]
    pub fn expired(&self, dt: f32) -> bool {
        self.timer + dt * 0.5 >= self.lifetime
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned,
    /// The buffer was full and its oldest particle was overwritten.
    Replaced,
}

/// Bounded particle storage for one chunk.
pub struct ParticleBuffer {
    particles: Vec<Particle>,
    capacity: usize,
}

impl ParticleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn spawn(&mut self, particle: Particle) -> Result<SpawnOutcome, CapacityError> {
        if self.capacity == 0 {
            return Err(CapacityError::ParticlesFull);
        }
        if self.particles.len() < self.capacity {
            self.particles.push(particle);
            return Ok(SpawnOutcome::Spawned);
        }

        let oldest = self
            .particles
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.timer.total_cmp(&b.timer))
            .map_or(0, |(i, _)| i);
        self.particles[oldest] = particle;
        Ok(SpawnOutcome::Replaced)
    }

    /// Integrate and drop expired particles (swap-with-last).
    pub fn update(&mut self, dt: f32, gravity: f32) {
        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.timer += dt;
            if p.expired(dt) {
                self.particles.swap_remove(i);
                continue;
            }
            p.velocity *= (1.0 - p.drag * dt).max(0.0);
            p.velocity.y += gravity * dt;
            p.position += p.velocity * dt;
            i += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Particle buffers keyed by chunk coordinate, created on first spawn.
pub struct ParticleChunks {
    chunks: HashMap<IVec2, ParticleBuffer>,
    capacity_per_chunk: usize,
    chunk_world_size: f32,
}

impl ParticleChunks {
    pub fn new(capacity_per_chunk: usize, chunk_world_size: f32) -> Self {
        assert!(chunk_world_size > 0.0, "chunk size must be positive");
        Self {
            chunks: HashMap::new(),
            capacity_per_chunk,
            chunk_world_size,
        }
    }

    #[inline]
    pub fn chunk_of(&self, position: Vec2) -> IVec2 {
        (position / self.chunk_world_size).floor().as_ivec2()
    }

    pub fn chunk_rect(&self, chunk: IVec2) -> Rect {
        Rect::from_min_size(
            chunk.as_vec2() * self.chunk_world_size,
            Vec2::splat(self.chunk_world_size),
        )
    }

    pub fn spawn(&mut self, particle: Particle) -> Result<SpawnOutcome, CapacityError> {
        let chunk = self.chunk_of(particle.position);
        let capacity = self.capacity_per_chunk;
        self.chunks
            .entry(chunk)
            .or_insert_with(|| ParticleBuffer::new(capacity))
            .spawn(particle)
    }

    /// Integrate every chunk overlapping `visible`. Returns the number of chunks touched.
    pub fn update_visible(&mut self, dt: f32, gravity: f32, visible: &Rect) -> usize {
        let (min, max) = (self.chunk_of(visible.min), self.chunk_of(visible.max));
        let mut updated = 0;
        for (coord, buffer) in self.chunks.iter_mut() {
            if coord.x >= min.x && coord.x <= max.x && coord.y >= min.y && coord.y <= max.y {
                buffer.update(dt, gravity);
                updated += 1;
            }
        }
        updated
    }

    /// Particles inside `area`. Chunks one ring beyond the area are searched too,
    /// since particles drift out of the chunk they were spawned in.
    pub fn particles_in<'a>(&'a self, area: &'a Rect) -> impl Iterator<Item = &'a Particle> + 'a {
        let min = self.chunk_of(area.min) - IVec2::ONE;
        let max = self.chunk_of(area.max) + IVec2::ONE;
        self.chunks
            .iter()
            .filter(move |(c, _)| c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y)
            .flat_map(|(_, buffer)| buffer.iter())
            .filter(move |p| area.contains_point(p.position))
    }

    /// Total live particles across all chunks.
    pub fn len(&self) -> usize {
        self.chunks.values().map(ParticleBuffer::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_buffer_overwrites_oldest() {
        let mut buffer = ParticleBuffer::new(2);
        let mut old = Particle::new(Vec2::ZERO, Vec2::ZERO, 10.0);
        old.timer = 5.0;
        buffer.spawn(old).unwrap();
        buffer.spawn(Particle::new(Vec2::ONE, Vec2::ZERO, 10.0)).unwrap();

        let fresh = Particle::new(Vec2::splat(9.0), Vec2::ZERO, 10.0);
        assert_eq!(buffer.spawn(fresh), Ok(SpawnOutcome::Replaced));
        assert_eq!(buffer.len(), 2);
        assert!(buffer.iter().all(|p| p.timer == 0.0));
    }

    #[test]
    fn zero_capacity_is_an_error() {
        let mut buffer = ParticleBuffer::new(0);
        assert_eq!(
            buffer.spawn(Particle::new(Vec2::ZERO, Vec2::ZERO, 1.0)),
            Err(CapacityError::ParticlesFull)
        );
    }

    #[test]
    fn particle_lives_for_its_lifetime() {
        let dt = 1.0 / 60.0;
        let mut chunks = ParticleChunks::new(16, 128.0);
        chunks
            .spawn(Particle::new(Vec2::splat(64.0), Vec2::ZERO, 2.0))
            .unwrap();
        let view = Rect::new(Vec2::ZERO, Vec2::splat(128.0));

        let mut last_present = 0;
        for frame in 1..=180 {
            chunks.update_visible(dt, 0.0, &view);
            if chunks.particles_in(&view).count() == 1 {
                last_present = frame;
            }
        }
        // Frame 120 is t = 2.0, the first moment it must be gone.
        assert_eq!(last_present, 119);
        assert!(chunks.is_empty());
    }

    #[test]
    fn off_screen_chunks_are_frozen() {
        let mut chunks = ParticleChunks::new(16, 100.0);
        chunks
            .spawn(Particle::new(Vec2::new(550.0, 50.0), Vec2::X, 1.0))
            .unwrap();
        let view = Rect::new(Vec2::ZERO, Vec2::splat(99.0));
        assert_eq!(chunks.update_visible(5.0, 0.0, &view), 0);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn drag_and_gravity() {
        let mut buffer = ParticleBuffer::new(1);
        let mut p = Particle::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0);
        p.drag = 0.5;
        buffer.spawn(p).unwrap();
        buffer.update(1.0, 4.0);
        let p = buffer.iter().next().unwrap();
        assert_eq!(p.velocity, Vec2::new(5.0, 4.0));
        assert_eq!(p.position, Vec2::new(5.0, 4.0));
    }
}
