//! Environment abstraction for deterministic testing.
//!
//! Decouples crypto contexts and key exchange from the system random source.
//! Production uses OS entropy; tests use a seeded RNG so that key material,
//! nonces and handshakes are reproducible.

/// Abstract environment providing the random source.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `random_bytes()` fills the whole buffer and never fails silently
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a fixed-size array of random bytes.
    ///
    /// Convenience for nonces and raw key material.
    fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes);
        bytes
    }
}

/// RNG adapter that delegates to our Environment trait.
///
/// RSA key generation and OAEP padding take a `rand_core` RNG. This adapter
/// lets them draw from the deterministic RNG in tests and from the OS in
/// production.
pub struct EnvironmentRng<E: Environment> {
    env: E,
}

impl<E: Environment> EnvironmentRng<E> {
    /// Wrap an environment as a `rand_core` RNG.
    pub fn new(env: E) -> Self {
        Self { env }
    }
}

impl<E: Environment> rand_core::RngCore for EnvironmentRng<E> {
    fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.env.random_array())
    }

    fn next_u64(&mut self) -> u64 {
        u64::from_le_bytes(self.env.random_array())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.env.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.env.random_bytes(dest);
        Ok(())
    }
}

impl<E: Environment> rand_core::CryptoRng for EnvironmentRng<E> {}

#[cfg(test)]
mod tests {
    use rand_core::RngCore;

    use super::*;

    #[derive(Clone)]
    struct CountingEnv;

    impl Environment for CountingEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = i as u8;
            }
        }
    }

    #[test]
    fn random_array_fills_every_byte() {
        let bytes: [u8; 4] = CountingEnv.random_array();
        assert_eq!(bytes, [0, 1, 2, 3]);
    }

    #[test]
    fn rng_adapter_delegates_to_environment() {
        let mut rng = EnvironmentRng::new(CountingEnv);

        assert_eq!(rng.next_u32(), u32::from_le_bytes([0, 1, 2, 3]));

        let mut dest = [0xFFu8; 3];
        rng.fill_bytes(&mut dest);
        assert_eq!(dest, [0, 1, 2]);
    }
}
