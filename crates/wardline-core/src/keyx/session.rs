//! Handshake state shared by every scheme.

use std::{fmt, sync::Arc};

use wardline_crypto::{
    AsymmetricKeyPair, CipherKey, Environment, KeyAlgorithm, KeyUsage, SymmetricCryptoContext,
};
use x25519_dalek::StaticSecret;

use super::{
    KeyExchangeError, KeyExchangeScheme, KeyRequestData, KeyResponseData, KeyStore,
    data::REQUEST_NONCE_SIZE,
};

/// Random source and credential store used by the schemes.
#[derive(Clone)]
pub struct KeyExchangeContext<E: Environment> {
    env: E,
    key_store: Arc<dyn KeyStore>,
}

impl<E: Environment> KeyExchangeContext<E> {
    /// Create a context.
    pub fn new(env: E, key_store: Arc<dyn KeyStore>) -> Self {
        Self { env, key_store }
    }

    /// Random source.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Credential store.
    pub fn key_store(&self) -> &dyn KeyStore {
        self.key_store.as_ref()
    }
}

impl<E: Environment> fmt::Debug for KeyExchangeContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyExchangeContext").finish_non_exhaustive()
    }
}

/// Initiator-side secret retained until the response arrives.
#[derive(Clone)]
pub enum LocalSecret {
    /// Ephemeral Diffie-Hellman private value
    DiffieHellman(StaticSecret),
    /// Key pair whose public half was offered
    AsymmetricWrapped(AsymmetricKeyPair),
    /// Nothing local; the pre-shared key is looked up again on derive
    SymmetricWrapped,
}

impl fmt::Debug for LocalSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiffieHellman(_) => f.write_str("DiffieHellman(..)"),
            Self::AsymmetricWrapped(_) => f.write_str("AsymmetricWrapped(..)"),
            Self::SymmetricWrapped => f.write_str("SymmetricWrapped"),
        }
    }
}

/// An offered key request together with the secret needed to complete it.
///
/// Only [`PendingKeyRequest::data`] crosses the wire.
#[derive(Debug, Clone)]
pub struct PendingKeyRequest {
    data: KeyRequestData,
    secret: LocalSecret,
}

impl PendingKeyRequest {
    pub(crate) fn new(data: KeyRequestData, secret: LocalSecret) -> Self {
        Self { data, secret }
    }

    /// Wire record.
    pub fn data(&self) -> &KeyRequestData {
        &self.data
    }

    /// Scheme of the offer.
    pub fn scheme(&self) -> KeyExchangeScheme {
        self.data.scheme()
    }

    pub(crate) fn secret(&self) -> &LocalSecret {
        &self.secret
    }

    /// Check that `response` answers this request.
    pub fn matches(&self, response: &KeyResponseData) -> Result<(), KeyExchangeError> {
        if self.data.scheme() != response.scheme() {
            return Err(KeyExchangeError::SchemeMismatch {
                request: self.data.scheme(),
                response: response.scheme(),
            });
        }

        if self.data.identifier() != response.identifier() {
            return Err(KeyExchangeError::IdentifierMismatch {
                request: self.data.identifier().to_string(),
                response: response.identifier().to_string(),
            });
        }

        if self.data.nonce() != response.nonce() {
            return Err(KeyExchangeError::NonceMismatch {
                scheme: self.data.scheme(),
                identifier: self.data.identifier().to_string(),
            });
        }

        Ok(())
    }
}

/// Responder output: the wire response and the session context built from
/// the same session keys.
#[derive(Debug, Clone)]
pub struct KeyExchangeResponse<E: Environment> {
    /// Wire record for the initiator
    pub data: KeyResponseData,
    /// Responder's session context
    pub crypto_context: SymmetricCryptoContext<E>,
}

/// Session context ID, `scheme:identifier`.
pub(crate) fn session_id(scheme: KeyExchangeScheme, identifier: &str) -> String {
    format!("{scheme}:{identifier}")
}

/// Fresh per-request nonce for wrapped-scheme records.
pub(crate) fn fresh_nonce<E: Environment>(env: &E) -> Vec<u8> {
    env.random_array::<REQUEST_NONCE_SIZE>().to_vec()
}

/// Fresh single-purpose session keys: (cipher, integrity).
pub(crate) fn generate_session_keys<E: Environment>(
    env: &E,
) -> Result<(CipherKey, CipherKey), KeyExchangeError> {
    Ok((
        CipherKey::generate(env, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)?,
        CipherKey::generate(env, KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)?,
    ))
}

pub(crate) fn session_context<E: Environment>(
    env: &E,
    scheme: KeyExchangeScheme,
    identifier: &str,
    encryption_key: CipherKey,
    hmac_key: CipherKey,
) -> Result<SymmetricCryptoContext<E>, KeyExchangeError> {
    Ok(SymmetricCryptoContext::new(
        env.clone(),
        session_id(scheme, identifier),
        encryption_key,
        hmac_key,
        None,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(key_id: &str) -> PendingKeyRequest {
        PendingKeyRequest::new(
            KeyRequestData::SymmetricWrapped { key_id: key_id.to_string(), nonce: vec![1; REQUEST_NONCE_SIZE] },
            LocalSecret::SymmetricWrapped,
        )
    }

    #[test]
    fn matches_requires_same_scheme() {
        let response = KeyResponseData::DiffieHellman {
            parameters_id: "PSK".to_string(),
            public_value: vec![0; 32],
        };

        assert_eq!(
            pending("PSK").matches(&response),
            Err(KeyExchangeError::SchemeMismatch {
                request: KeyExchangeScheme::SymmetricWrapped,
                response: KeyExchangeScheme::DiffieHellman,
            })
        );
    }

    #[test]
    fn matches_requires_same_identifier() {
        let response = KeyResponseData::SymmetricWrapped {
            key_id: "OTHER".to_string(),
            encryption_key: Vec::new(),
            hmac_key: Vec::new(),
            nonce: vec![1; REQUEST_NONCE_SIZE],
        };

        assert!(matches!(
            pending("PSK").matches(&response),
            Err(KeyExchangeError::IdentifierMismatch { .. })
        ));
    }

    #[test]
    fn matches_requires_echoed_nonce() {
        let response = KeyResponseData::SymmetricWrapped {
            key_id: "PSK".to_string(),
            encryption_key: Vec::new(),
            hmac_key: Vec::new(),
            nonce: vec![2; REQUEST_NONCE_SIZE],
        };

        assert_eq!(
            pending("PSK").matches(&response),
            Err(KeyExchangeError::NonceMismatch {
                scheme: KeyExchangeScheme::SymmetricWrapped,
                identifier: "PSK".to_string(),
            })
        );
    }

    #[test]
    fn session_id_format() {
        assert_eq!(session_id(KeyExchangeScheme::SymmetricWrapped, "PSK"), "SYMMETRIC_WRAPPED:PSK");
    }
}
