//! RSA-OAEP crypto context.
//!
//! Encryption and key wrapping use RSA-OAEP with SHA-256. Wrapped keys carry
//! their algorithm and usage in the OAEP label. Signing is not offered.

use std::fmt;

use async_trait::async_trait;
use rsa::{Oaep, RsaPrivateKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    context::CryptoContext,
    env::{Environment, EnvironmentRng},
    error::CryptoError,
    key::{AsymmetricKeyPair, AsymmetricPublicKey, CipherKey, KeyAlgorithm, KeyUsage},
};

/// Crypto context over an RSA public key and, optionally, its private half.
///
/// A context built from a public key alone can encrypt and wrap; decrypt and
/// unwrap return [`CryptoError::MissingKey`].
#[derive(Clone)]
pub struct AsymmetricCryptoContext<E: Environment> {
    id: String,
    env: E,
    public_key: AsymmetricPublicKey,
    private_key: Option<RsaPrivateKey>,
}

impl<E: Environment> AsymmetricCryptoContext<E> {
    /// Context able to perform every supported operation.
    pub fn from_key_pair(env: E, id: impl Into<String>, key_pair: &AsymmetricKeyPair) -> Self {
        Self {
            id: id.into(),
            env,
            public_key: key_pair.public_key().clone(),
            private_key: Some(key_pair.private_key().clone()),
        }
    }

    /// Encrypt-only context.
    pub fn from_public_key(env: E, id: impl Into<String>, public_key: AsymmetricPublicKey) -> Self {
        Self { id: id.into(), env, public_key, private_key: None }
    }

    /// Public key of this context.
    pub fn public_key(&self) -> &AsymmetricPublicKey {
        &self.public_key
    }

    fn private_key(&self) -> Result<&RsaPrivateKey, CryptoError> {
        self.private_key
            .as_ref()
            .ok_or_else(|| CryptoError::MissingKey { context: self.id.clone(), role: "private" })
    }

    fn rng(&self) -> EnvironmentRng<E> {
        EnvironmentRng::new(self.env.clone())
    }
}

fn wrap_padding(algorithm: KeyAlgorithm, usage: KeyUsage) -> Oaep {
    Oaep::new_with_label::<Sha256, _>(format!("{algorithm}|{usage}"))
}

#[async_trait]
impl<E: Environment> CryptoContext for AsymmetricCryptoContext<E> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.public_key
            .rsa()
            .encrypt(&mut self.rng(), Oaep::new::<Sha256>(), data)
            .map_err(|e| CryptoError::EncryptionFailed { reason: e.to_string() })
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.private_key()?
            .decrypt_blinded(&mut self.rng(), Oaep::new::<Sha256>(), ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed { reason: e.to_string() })
    }

    async fn wrap(&self, key: &CipherKey) -> Result<Vec<u8>, CryptoError> {
        let padding = wrap_padding(key.algorithm(), key.usage());

        self.public_key
            .rsa()
            .encrypt(&mut self.rng(), padding, key.material())
            .map_err(|e| CryptoError::WrapFailed { reason: e.to_string() })
    }

    async fn unwrap(
        &self,
        data: &[u8],
        algorithm: KeyAlgorithm,
        usage: KeyUsage,
    ) -> Result<CipherKey, CryptoError> {
        let private_key = self.private_key()?;
        let padding = wrap_padding(algorithm, usage);

        let material = Zeroizing::new(
            private_key
                .decrypt_blinded(&mut self.rng(), padding, data)
                .map_err(|e| CryptoError::UnwrapFailed { reason: e.to_string() })?,
        );

        CipherKey::import(&material, algorithm, usage)
    }

    async fn sign(&self, _data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::NotSupported { operation: "sign", context: self.id.clone() })
    }

    async fn verify(&self, _data: &[u8], _signature: &[u8]) -> Result<bool, CryptoError> {
        Err(CryptoError::NotSupported { operation: "verify", context: self.id.clone() })
    }
}

impl<E: Environment> fmt::Debug for AsymmetricCryptoContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricCryptoContext")
            .field("id", &self.id)
            .field("has_private_key", &self.private_key.is_some())
            .finish_non_exhaustive()
    }
}
