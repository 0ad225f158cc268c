//! Production environment backed by the OS random source.

use wardline_crypto::Environment;

/// Production environment using the OS cryptographic RNG (getrandom).
///
/// Not reproducible. Suitable for ephemeral keys, session keys and nonces.
///
/// # Panics
///
/// Panics if the OS RNG fails. Continuing without working randomness would
/// compromise every key and nonce the core produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - keys cannot be generated securely");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_are_random() {
        let env = SystemEnv::new();

        let first: [u8; 32] = env.random_array();
        let second: [u8; 32] = env.random_array();

        assert_ne!(first, second, "Random bytes should differ");
    }

    #[test]
    fn random_bytes_fill_buffer() {
        let env = SystemEnv::new();

        let mut bytes = [0u8; 64];
        env.random_bytes(&mut bytes);

        let non_zero_count = bytes.iter().filter(|&&b| b != 0).count();
        assert!(non_zero_count > 32, "Most bytes should be non-zero");
    }
}
