use thiserror::Error;

/// Errors raised by the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity store is full ({capacity} slots)")]
    CapacityExceeded { capacity: usize },
}
