//! Pass-through crypto context for unprotected exchanges.

use async_trait::async_trait;

use crate::{
    context::CryptoContext,
    error::CryptoError,
    key::{CipherKey, KeyAlgorithm, KeyUsage},
};

/// Crypto context that performs no cryptography.
///
/// Encrypt and decrypt return their input, sign returns an empty tag and
/// verify always succeeds. Wrap and unwrap fail with
/// [`CryptoError::NotSupported`]: an identity wrap would put raw key material
/// on the wire. Only use this where the transport already provides
/// confidentiality and integrity.
#[derive(Debug, Clone)]
pub struct NullCryptoContext {
    id: String,
}

impl NullCryptoContext {
    /// Create a null context.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        tracing::warn!(context = %id, "null crypto context created; data will not be protected");
        Self { id }
    }
}

#[async_trait]
impl CryptoContext for NullCryptoContext {
    fn id(&self) -> &str {
        &self.id
    }

    async fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(data.to_vec())
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(ciphertext.to_vec())
    }

    async fn wrap(&self, _key: &CipherKey) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::NotSupported { operation: "wrap", context: self.id.clone() })
    }

    async fn unwrap(
        &self,
        _data: &[u8],
        _algorithm: KeyAlgorithm,
        _usage: KeyUsage,
    ) -> Result<CipherKey, CryptoError> {
        Err(CryptoError::NotSupported { operation: "unwrap", context: self.id.clone() })
    }

    async fn sign(&self, _data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(Vec::new())
    }

    async fn verify(&self, _data: &[u8], _signature: &[u8]) -> Result<bool, CryptoError> {
        Ok(true)
    }
}
