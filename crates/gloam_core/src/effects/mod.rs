//! Visual effect state owned by the simulation: particles and hitsplats.

mod hitsplat;
mod particles;

pub use hitsplat::{Hitsplat, HitsplatKind, Hitsplats};
pub use particles::{Particle, ParticleBuffer, ParticleChunks, SpawnOutcome};

use thiserror::Error;

/// A fixed-size effect buffer had no room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    #[error("hitsplat buffer is full ({capacity} entries)")]
    HitsplatsFull { capacity: usize },
    #[error("particle buffer has no capacity")]
    ParticlesFull,
}
