//! Credential store interface and in-memory implementation.

use std::collections::HashMap;

use wardline_crypto::{
    AsymmetricKeyPair, CipherKey, CryptoError, Environment, KeyAlgorithm, KeyUsage,
    SymmetricCryptoContext,
};

/// Diffie-Hellman group behind a parameter set ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DhGroup {
    /// Curve25519 (RFC 7748)
    X25519,
}

/// Long-term symmetric credentials shared out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresharedKey {
    encryption_key: CipherKey,
    hmac_key: CipherKey,
    wrapping_key: CipherKey,
}

impl PresharedKey {
    /// Bundle existing keys, checking each against its slot.
    pub fn new(
        encryption_key: CipherKey,
        hmac_key: CipherKey,
        wrapping_key: CipherKey,
    ) -> Result<Self, CryptoError> {
        encryption_key.require(KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)?;
        hmac_key.require(KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)?;
        wrapping_key.require(KeyAlgorithm::XChaCha20Poly1305, KeyUsage::WrapUnwrap)?;

        Ok(Self { encryption_key, hmac_key, wrapping_key })
    }

    /// Generate fresh credentials.
    pub fn generate<E: Environment>(env: &E) -> Result<Self, CryptoError> {
        Self::new(
            CipherKey::generate(env, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)?,
            CipherKey::generate(env, KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)?,
            CipherKey::generate(env, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::WrapUnwrap)?,
        )
    }

    /// Crypto context over these credentials, able to wrap session keys.
    pub fn crypto_context<E: Environment>(
        &self,
        env: E,
        id: impl Into<String>,
    ) -> Result<SymmetricCryptoContext<E>, CryptoError> {
        SymmetricCryptoContext::new(
            env,
            id,
            self.encryption_key.clone(),
            self.hmac_key.clone(),
            Some(self.wrapping_key.clone()),
        )
    }
}

/// Credential store consulted by the key exchange schemes.
///
/// Lookups return `None` for unknown IDs; callers turn that into a
/// `KeyExchangeError` and never substitute another ID.
pub trait KeyStore: Send + Sync {
    /// Pre-shared key by ID.
    fn preshared_key(&self, key_id: &str) -> Option<PresharedKey>;

    /// Diffie-Hellman group by parameter set ID.
    fn dh_parameters(&self, parameters_id: &str) -> Option<DhGroup>;

    /// Asymmetric key pair by ID.
    fn key_pair(&self, key_pair_id: &str) -> Option<AsymmetricKeyPair>;
}

/// In-memory key store, populated at construction.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    preshared_keys: HashMap<String, PresharedKey>,
    dh_parameters: HashMap<String, DhGroup>,
    key_pairs: HashMap<String, AsymmetricKeyPair>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-shared key.
    #[must_use]
    pub fn with_preshared_key(mut self, key_id: impl Into<String>, key: PresharedKey) -> Self {
        self.preshared_keys.insert(key_id.into(), key);
        self
    }

    /// Add a Diffie-Hellman parameter set.
    #[must_use]
    pub fn with_dh_parameters(mut self, parameters_id: impl Into<String>, group: DhGroup) -> Self {
        self.dh_parameters.insert(parameters_id.into(), group);
        self
    }

    /// Add an asymmetric key pair.
    #[must_use]
    pub fn with_key_pair(mut self, key_pair_id: impl Into<String>, key_pair: AsymmetricKeyPair) -> Self {
        self.key_pairs.insert(key_pair_id.into(), key_pair);
        self
    }
}

impl KeyStore for MemoryKeyStore {
    fn preshared_key(&self, key_id: &str) -> Option<PresharedKey> {
        self.preshared_keys.get(key_id).cloned()
    }

    fn dh_parameters(&self, parameters_id: &str) -> Option<DhGroup> {
        self.dh_parameters.get(parameters_id).copied()
    }

    fn key_pair(&self, key_pair_id: &str) -> Option<AsymmetricKeyPair> {
        self.key_pairs.get(key_pair_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FixedEnv(u8);

    impl Environment for FixedEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.0);
        }
    }

    #[test]
    fn lookups_are_exact() {
        let psk = PresharedKey::generate(&FixedEnv(1)).unwrap();
        let store = MemoryKeyStore::new()
            .with_preshared_key("PSK", psk.clone())
            .with_dh_parameters("1", DhGroup::X25519);

        assert_eq!(store.preshared_key("PSK"), Some(psk));
        assert_eq!(store.preshared_key("psk"), None);
        assert_eq!(store.dh_parameters("1"), Some(DhGroup::X25519));
        assert_eq!(store.dh_parameters("2"), None);
        assert!(store.key_pair("rsaKeypairId").is_none());
    }

    #[test]
    fn preshared_key_rejects_misplaced_keys() {
        let env = FixedEnv(2);
        let hmac = CipherKey::generate(&env, KeyAlgorithm::HmacSha256, KeyUsage::SignVerify).unwrap();
        let enc =
            CipherKey::generate(&env, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)
                .unwrap();

        assert!(matches!(
            PresharedKey::new(enc.clone(), hmac, enc),
            Err(CryptoError::KeyMismatch { .. })
        ));
    }
}
