//! Injected identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of fresh identifiers.
///
/// Factories receive a generator instead of calling `Uuid::new_v4` directly so
/// that tests can produce stable ids.
pub trait IdGenerator: Send + Sync {
    /// Returns a new, never-before-returned UUID.
    fn next_uuid(&self) -> Uuid;
}

/// Random v4 UUIDs. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic generator yielding `1, 2, 3, ...` as UUIDs.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first id is `Uuid::from_u128(1)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that continues after `start`.
    pub fn starting_after(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_uuid(&self) -> Uuid {
        let next = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Uuid::from_u128(u128::from(next))
    }
}
