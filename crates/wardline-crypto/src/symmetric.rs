//! Symmetric crypto context.
//!
//! Encryption uses `XChaCha20-Poly1305` with a random 24-byte nonce prepended
//! to the ciphertext. Integrity tags are HMAC-SHA256 under an independent key.
//! With an optional wrapping key the context can also wrap other keys; the
//! wrapped key's algorithm and usage are bound as associated data, so a key
//! cannot be unwrapped into a different slot.
//!
//! Ciphertext layout (encrypt and wrap):
//!
//! ```text
//! [nonce: 24][ciphertext][poly1305 tag: 16]
//! ```

use std::fmt;

use async_trait::async_trait;
use chacha20poly1305::{
    KeyInit, XChaCha20Poly1305, XNonce,
    aead::{Aead, Payload},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    context::CryptoContext,
    env::Environment,
    error::CryptoError,
    key::{CipherKey, KeyAlgorithm, KeyUsage},
};

type HmacSha256 = Hmac<Sha256>;

/// Size of the `XChaCha20` nonce prefix
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size
const POLY1305_TAG_SIZE: usize = 16;

/// HMAC-SHA256 tag size
pub const HMAC_TAG_SIZE: usize = 32;

/// Crypto context over a cipher key, an integrity key and an optional
/// wrapping key.
///
/// # Invariants
///
/// - The encryption key is `XChaCha20Poly1305` scoped to encrypt/decrypt
/// - The HMAC key is `HmacSha256` scoped to sign/verify
/// - The wrapping key, if present, is `XChaCha20Poly1305` scoped to
///   wrap/unwrap
#[derive(Clone)]
pub struct SymmetricCryptoContext<E: Environment> {
    id: String,
    env: E,
    encryption_key: CipherKey,
    hmac_key: CipherKey,
    wrapping_key: Option<CipherKey>,
}

impl<E: Environment> SymmetricCryptoContext<E> {
    /// Create a context, checking every key against its slot.
    ///
    /// # Errors
    ///
    /// - `CryptoError::KeyMismatch` if a key has the wrong algorithm or usage
    pub fn new(
        env: E,
        id: impl Into<String>,
        encryption_key: CipherKey,
        hmac_key: CipherKey,
        wrapping_key: Option<CipherKey>,
    ) -> Result<Self, CryptoError> {
        encryption_key.require(KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)?;
        hmac_key.require(KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)?;
        if let Some(key) = &wrapping_key {
            key.require(KeyAlgorithm::XChaCha20Poly1305, KeyUsage::WrapUnwrap)?;
        }

        Ok(Self { id: id.into(), env, encryption_key, hmac_key, wrapping_key })
    }

    /// Create a context over freshly generated encryption and HMAC keys.
    pub fn generate(env: E, id: impl Into<String>) -> Result<Self, CryptoError> {
        let encryption_key =
            CipherKey::generate(&env, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)?;
        let hmac_key = CipherKey::generate(&env, KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)?;
        Self::new(env, id, encryption_key, hmac_key, None)
    }

    /// Cipher key.
    pub fn encryption_key(&self) -> &CipherKey {
        &self.encryption_key
    }

    /// Integrity key.
    pub fn hmac_key(&self) -> &CipherKey {
        &self.hmac_key
    }

    fn wrapping_key(&self, operation: &'static str) -> Result<&CipherKey, CryptoError> {
        self.wrapping_key
            .as_ref()
            .ok_or_else(|| CryptoError::NotSupported { operation, context: self.id.clone() })
    }

    fn hmac(&self, data: &[u8]) -> HmacSha256 {
        let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(self.hmac_key.material()) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        mac.update(data);
        mac
    }
}

/// AEAD seal with a fresh random nonce: `nonce || ciphertext`.
fn seal<E: Environment>(env: &E, key: &CipherKey, msg: &[u8], aad: &[u8]) -> Option<Vec<u8>> {
    let cipher = <XChaCha20Poly1305 as KeyInit>::new_from_slice(key.material()).ok()?;
    let nonce: [u8; NONCE_SIZE] = env.random_array();

    let ciphertext = cipher.encrypt(XNonce::from_slice(&nonce), Payload { msg, aad }).ok()?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Some(sealed)
}

/// AEAD open of `nonce || ciphertext`. Fails closed on any malformation.
fn open(key: &CipherKey, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>, &'static str> {
    if sealed.len() < NONCE_SIZE + POLY1305_TAG_SIZE {
        return Err("ciphertext too short");
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
    let cipher = <XChaCha20Poly1305 as KeyInit>::new_from_slice(key.material())
        .map_err(|_| "invalid key length")?;

    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| "authentication failed")
}

/// Associated data binding a wrapped key to its slot.
fn wrap_aad(algorithm: KeyAlgorithm, usage: KeyUsage) -> Vec<u8> {
    format!("{algorithm}|{usage}").into_bytes()
}

#[async_trait]
impl<E: Environment> CryptoContext for SymmetricCryptoContext<E> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        seal(&self.env, &self.encryption_key, data, &[]).ok_or_else(|| {
            CryptoError::EncryptionFailed { reason: "plaintext exceeds AEAD limits".to_string() }
        })
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        open(&self.encryption_key, ciphertext, &[])
            .map_err(|reason| CryptoError::DecryptionFailed { reason: reason.to_string() })
    }

    async fn wrap(&self, key: &CipherKey) -> Result<Vec<u8>, CryptoError> {
        let wrapping_key = self.wrapping_key("wrap")?;
        let aad = wrap_aad(key.algorithm(), key.usage());

        seal(&self.env, wrapping_key, key.material(), &aad).ok_or_else(|| {
            CryptoError::WrapFailed { reason: "key exceeds AEAD limits".to_string() }
        })
    }

    async fn unwrap(
        &self,
        data: &[u8],
        algorithm: KeyAlgorithm,
        usage: KeyUsage,
    ) -> Result<CipherKey, CryptoError> {
        let wrapping_key = self.wrapping_key("unwrap")?;
        let aad = wrap_aad(algorithm, usage);

        let material = Zeroizing::new(
            open(wrapping_key, data, &aad)
                .map_err(|reason| CryptoError::UnwrapFailed { reason: reason.to_string() })?,
        );

        CipherKey::import(&material, algorithm, usage)
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.hmac(data).finalize().into_bytes().to_vec())
    }

    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        if signature.len() != HMAC_TAG_SIZE {
            return Err(CryptoError::MalformedSignature {
                expected: HMAC_TAG_SIZE,
                actual: signature.len(),
            });
        }

        Ok(self.hmac(data).verify_slice(signature).is_ok())
    }
}

impl<E: Environment> fmt::Debug for SymmetricCryptoContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricCryptoContext")
            .field("id", &self.id)
            .field("wraps", &self.wrapping_key.is_some())
            .finish_non_exhaustive()
    }
}
