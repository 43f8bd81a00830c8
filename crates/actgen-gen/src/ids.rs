//! Identifier sources.
//!
//! Clients without a fixed `id` get a UUID per instance. [`RandomIds`] draws
//! from the OS-seeded UUIDv4 generator; [`SeededIds`] derives UUIDs from a
//! seeded `StdRng` so the same request and seed always yield the same
//! dataset.

use actgen_core::Result;
use rand::{rngs::StdRng, Rng as _, SeedableRng};
use uuid::{Builder, Uuid};

/// Produces fresh client identifiers.
pub trait IdSource {
    /// Next unique identifier. A failure aborts the whole request.
    fn next_id(&mut self) -> Result<String>;
}

/// UUIDv4 identifiers from the OS random source.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> Result<String> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Reproducible UUIDv4-shaped identifiers from a seeded generator.
#[derive(Clone, Debug)]
pub struct SeededIds {
    rng: StdRng,
}

impl SeededIds {
    /// Source seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl IdSource for SeededIds {
    fn next_id(&mut self) -> Result<String> {
        let bytes: [u8; 16] = self.rng.random();
        Ok(Builder::from_random_bytes(bytes).into_uuid().to_string())
    }
}

/// Pick [`SeededIds`] when a seed is configured, [`RandomIds`] otherwise.
#[must_use]
pub fn id_source(seed: Option<u64>) -> Box<dyn IdSource> {
    match seed {
        Some(s) => Box::new(SeededIds::new(s)),
        None => Box::new(RandomIds),
    }
}
