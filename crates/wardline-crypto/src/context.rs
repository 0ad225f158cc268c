//! The crypto context capability.
//!
//! A crypto context bundles encrypt/decrypt, wrap/unwrap and sign/verify over
//! key material bound at construction. Contexts are immutable: no operation
//! changes the bound keys, and inputs are borrowed, never modified. Results
//! are always freshly allocated.
//!
//! Every operation is async so a context may be backed by a platform crypto
//! service. Each call completes exactly once, either with its value or with a
//! [`CryptoError`].

use async_trait::async_trait;

use crate::{
    error::CryptoError,
    key::{CipherKey, KeyAlgorithm, KeyUsage},
};

/// Capability bundle over bound key material.
///
/// # Invariants
///
/// - `decrypt(encrypt(p)) == p`; `encrypt` may be non-deterministic
/// - `decrypt` of malformed or unauthenticated ciphertext fails and never
///   returns partial plaintext
/// - `unwrap(wrap(k), k.algorithm(), k.usage()) == k`
/// - `verify(d, sign(d)) == true`; a well-formed tag over other data yields
///   `Ok(false)`, a malformed tag yields an error
/// - Unsupported operations fail with `CryptoError::NotSupported` rather than
///   silently succeeding
#[async_trait]
pub trait CryptoContext: Send + Sync {
    /// Context identifier, used in errors and logs.
    fn id(&self) -> &str;

    /// Encrypt `data`.
    async fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt `ciphertext`.
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Wrap `key` for transport.
    async fn wrap(&self, key: &CipherKey) -> Result<Vec<u8>, CryptoError>;

    /// Unwrap `data` into a key of the given algorithm and usage.
    async fn unwrap(
        &self,
        data: &[u8],
        algorithm: KeyAlgorithm,
        usage: KeyUsage,
    ) -> Result<CipherKey, CryptoError>;

    /// Compute an integrity tag over `data`.
    ///
    /// The tag need not be a signature proper; any deterministic
    /// key-dependent tag qualifies.
    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Check `signature` against `data`.
    ///
    /// A mismatch is `Ok(false)`, not an error. Callers must branch on the
    /// result.
    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, CryptoError>;
}
