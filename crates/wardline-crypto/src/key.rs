//! Typed, usage-scoped key material.
//!
//! Raw bytes only become a key through [`CipherKey::import`], which checks
//! the length against the algorithm and rejects usages the algorithm cannot
//! serve. Every key carries exactly one usage, so a session's cipher key can
//! never double as its integrity key.

use std::fmt;

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePublicKey},
};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{
    env::{Environment, EnvironmentRng},
    error::CryptoError,
};

/// Symmetric key algorithms understood by the crypto contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// 256-bit `XChaCha20-Poly1305` key (encryption and key wrapping)
    XChaCha20Poly1305,
    /// 256-bit HMAC-SHA256 key (integrity tags)
    HmacSha256,
}

impl KeyAlgorithm {
    /// Required raw key length in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Self::XChaCha20Poly1305 | Self::HmacSha256 => 32,
        }
    }

    /// Whether keys of this algorithm may be scoped to `usage`.
    pub const fn supports(self, usage: KeyUsage) -> bool {
        matches!(
            (self, usage),
            (Self::XChaCha20Poly1305, KeyUsage::EncryptDecrypt | KeyUsage::WrapUnwrap)
                | (Self::HmacSha256, KeyUsage::SignVerify)
        )
    }

    /// Canonical algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::XChaCha20Poly1305 => "XChaCha20-Poly1305",
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The single operation pair a key is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyUsage {
    /// Encrypt and decrypt payloads
    EncryptDecrypt,
    /// Compute and verify integrity tags
    SignVerify,
    /// Wrap and unwrap other keys
    WrapUnwrap,
}

impl KeyUsage {
    /// Canonical usage name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::EncryptDecrypt => "encrypt/decrypt",
            Self::SignVerify => "sign/verify",
            Self::WrapUnwrap => "wrap/unwrap",
        }
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Symmetric key material bound to an algorithm and a usage.
///
/// # Security
///
/// - Material is zeroized on drop
/// - Equality compares material in constant time
/// - `Debug` never prints material
#[derive(Clone)]
pub struct CipherKey {
    algorithm: KeyAlgorithm,
    usage: KeyUsage,
    material: Zeroizing<Vec<u8>>,
}

impl CipherKey {
    /// Import raw bytes as a typed key.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` if the length does not match the
    ///   algorithm
    /// - `CryptoError::UnsupportedUsage` if the algorithm cannot serve `usage`
    pub fn import(
        material: &[u8],
        algorithm: KeyAlgorithm,
        usage: KeyUsage,
    ) -> Result<Self, CryptoError> {
        if material.len() != algorithm.key_len() {
            return Err(CryptoError::InvalidKeyLength {
                algorithm,
                expected: algorithm.key_len(),
                actual: material.len(),
            });
        }

        if !algorithm.supports(usage) {
            return Err(CryptoError::UnsupportedUsage { algorithm, usage });
        }

        Ok(Self { algorithm, usage, material: Zeroizing::new(material.to_vec()) })
    }

    /// Generate fresh key material from the environment's random source.
    pub fn generate<E: Environment>(
        env: &E,
        algorithm: KeyAlgorithm,
        usage: KeyUsage,
    ) -> Result<Self, CryptoError> {
        let mut material = Zeroizing::new(vec![0u8; algorithm.key_len()]);
        env.random_bytes(&mut material);
        Self::import(&material, algorithm, usage)
    }

    /// Key algorithm.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Key usage.
    pub fn usage(&self) -> KeyUsage {
        self.usage
    }

    /// Check that this key fits a slot requiring `algorithm` and `usage`.
    pub fn require(&self, algorithm: KeyAlgorithm, usage: KeyUsage) -> Result<(), CryptoError> {
        if self.algorithm == algorithm && self.usage == usage {
            return Ok(());
        }

        Err(CryptoError::KeyMismatch {
            expected_algorithm: algorithm,
            expected_usage: usage,
            actual_algorithm: self.algorithm,
            actual_usage: self.usage,
        })
    }

    pub(crate) fn material(&self) -> &[u8] {
        &self.material
    }
}

impl PartialEq for CipherKey {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && self.usage == other.usage
            && bool::from(self.material.as_slice().ct_eq(other.material.as_slice()))
    }
}

impl Eq for CipherKey {}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherKey")
            .field("algorithm", &self.algorithm)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// RSA public key used as an asymmetric wrapping key.
#[derive(Clone, PartialEq, Eq)]
pub struct AsymmetricPublicKey {
    inner: RsaPublicKey,
}

impl AsymmetricPublicKey {
    /// Decode a DER-encoded `SubjectPublicKeyInfo`.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        RsaPublicKey::from_public_key_der(der)
            .map(|inner| Self { inner })
            .map_err(|e| CryptoError::InvalidPublicKey { reason: e.to_string() })
    }

    /// Encode as DER `SubjectPublicKeyInfo`.
    pub fn to_der(&self) -> Result<Vec<u8>, CryptoError> {
        self.inner
            .to_public_key_der()
            .map(|document| document.as_bytes().to_vec())
            .map_err(|e| CryptoError::InvalidPublicKey { reason: e.to_string() })
    }

    pub(crate) fn rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl fmt::Debug for AsymmetricPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricPublicKey").finish_non_exhaustive()
    }
}

/// RSA key pair. The private half never leaves the process.
#[derive(Clone)]
pub struct AsymmetricKeyPair {
    public: AsymmetricPublicKey,
    private: RsaPrivateKey,
}

impl AsymmetricKeyPair {
    /// Modulus size for production key pairs.
    pub const DEFAULT_BITS: usize = 2048;

    /// Generate a key pair with a `bits`-bit modulus.
    pub fn generate<E: Environment>(env: &E, bits: usize) -> Result<Self, CryptoError> {
        let mut rng = EnvironmentRng::new(env.clone());
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CryptoError::KeyGeneration { reason: e.to_string() })?;
        let public = AsymmetricPublicKey { inner: private.to_public_key() };

        Ok(Self { public, private })
    }

    /// Public half.
    pub fn public_key(&self) -> &AsymmetricPublicKey {
        &self.public
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }
}

impl fmt::Debug for AsymmetricKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricKeyPair").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SeededEnv;

    #[derive(Clone)]
    struct FixedEnv(u8);

    impl Environment for FixedEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.0);
        }
    }

    #[test]
    fn import_rejects_wrong_length() {
        let result =
            CipherKey::import(&[0u8; 16], KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt);

        assert_eq!(
            result.unwrap_err(),
            CryptoError::InvalidKeyLength {
                algorithm: KeyAlgorithm::XChaCha20Poly1305,
                expected: 32,
                actual: 16,
            }
        );
    }

    #[test]
    fn import_rejects_incompatible_usage() {
        let result = CipherKey::import(&[0u8; 32], KeyAlgorithm::HmacSha256, KeyUsage::WrapUnwrap);

        assert!(matches!(result, Err(CryptoError::UnsupportedUsage { .. })));
    }

    #[test]
    fn equality_is_by_material() {
        let a = CipherKey::import(&[7u8; 32], KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .unwrap();
        let b = CipherKey::import(&[7u8; 32], KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .unwrap();
        let c = CipherKey::import(&[8u8; 32], KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn same_material_different_usage_is_not_equal() {
        let encrypt =
            CipherKey::import(&[1u8; 32], KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)
                .unwrap();
        let wrap =
            CipherKey::import(&[1u8; 32], KeyAlgorithm::XChaCha20Poly1305, KeyUsage::WrapUnwrap)
                .unwrap();

        assert_ne!(encrypt, wrap);
    }

    #[test]
    fn generate_draws_from_environment() {
        let key = CipherKey::generate(&FixedEnv(0x42), KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .unwrap();
        let expected =
            CipherKey::import(&[0x42; 32], KeyAlgorithm::HmacSha256, KeyUsage::SignVerify).unwrap();

        assert_eq!(key, expected);
    }

    #[test]
    fn require_reports_mismatch() {
        let key = CipherKey::import(&[0u8; 32], KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .unwrap();

        assert!(key.require(KeyAlgorithm::HmacSha256, KeyUsage::SignVerify).is_ok());
        assert!(matches!(
            key.require(KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt),
            Err(CryptoError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn debug_redacts_material() {
        let key = CipherKey::import(&[0xAB; 32], KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .unwrap();
        let rendered = format!("{key:?}");

        assert!(!rendered.contains("171"), "material must not be printed: {rendered}");
        assert!(rendered.contains("HmacSha256"));
    }

    #[test]
    fn public_key_der_is_decodable() {
        let pair = AsymmetricKeyPair::generate(&SeededEnv::with_seed(1), 1024).unwrap();
        let der = pair.public_key().to_der().unwrap();

        assert_eq!(&AsymmetricPublicKey::from_der(&der).unwrap(), pair.public_key());
    }

    #[test]
    fn garbage_public_key_is_rejected() {
        assert!(matches!(
            AsymmetricPublicKey::from_der(&[0x30, 0x03, 0x01]),
            Err(CryptoError::InvalidPublicKey { .. })
        ));
    }
}
