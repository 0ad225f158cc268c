//! Seeded environment for deterministic tests.

use std::sync::{Arc, Mutex, PoisonError};

use rand_chacha::{
    ChaCha20Rng,
    rand_core::{RngCore, SeedableRng},
};
use wardline_crypto::Environment;

/// Seed used by [`SimEnv::new`].
pub const DEFAULT_SEED: u64 = 0x5741_5244_4C49_4E45;

/// Environment drawing from a seeded `ChaCha20` stream.
///
/// Clones share one stream, so a context and everything it hands the
/// environment to draw from the same reproducible sequence.
#[derive(Clone)]
pub struct SimEnv {
    seed: u64,
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimEnv {
    /// Environment seeded with [`DEFAULT_SEED`].
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Environment seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))) }
    }

    /// Seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("seed", &self.seed).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);

        assert_eq!(a.random_array::<32>(), b.random_array::<32>());
    }

    #[test]
    fn clones_share_the_stream() {
        let a = SimEnv::with_seed(42);
        let b = a.clone();

        assert_ne!(a.random_array::<32>(), b.random_array::<32>());
    }
}
