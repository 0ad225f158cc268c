//! Ephemeral Diffie-Hellman key exchange.
//!
//! Both sides contribute an ephemeral X25519 value. Session keys are derived
//! with HKDF-SHA256 over the shared secret:
//!
//! ```text
//! info = "wardlineDhSessionV1" || parameters_id || initiator_pub || responder_pub
//! okm  = HKDF-Expand(HKDF-Extract(0, shared), info, 64)
//! cipher key = okm[0..32], integrity key = okm[32..64]
//! ```
//!
//! Non-contributory shared secrets (low-order peer points) are rejected.

use hkdf::Hkdf;
use sha2::Sha256;
use wardline_crypto::{CipherKey, Environment, KeyAlgorithm, KeyUsage, SymmetricCryptoContext};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use super::{
    DhGroup, KeyExchangeContext, KeyExchangeError, KeyExchangeResponse, KeyExchangeScheme,
    KeyRequestData, KeyResponseData, LocalSecret, PendingKeyRequest, session::session_context,
};

/// Label bound into every derived session key
const DH_SESSION_LABEL: &[u8] = b"wardlineDhSessionV1";

/// X25519 public value length
const PUBLIC_VALUE_SIZE: usize = 32;

/// Diffie-Hellman scheme over a named parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffieHellmanExchange {
    parameters_id: String,
}

impl DiffieHellmanExchange {
    /// Scheme using the parameter set `parameters_id`.
    pub fn new(parameters_id: impl Into<String>) -> Self {
        Self { parameters_id: parameters_id.into() }
    }

    /// Parameter set ID.
    pub fn parameters_id(&self) -> &str {
        &self.parameters_id
    }

    /// Draw a fresh private value and offer its public value.
    pub fn generate_request<E: Environment>(
        &self,
        ctx: &KeyExchangeContext<E>,
    ) -> Result<PendingKeyRequest, KeyExchangeError> {
        let DhGroup::X25519 = group(ctx, &self.parameters_id)?;

        let secret = ephemeral_secret(ctx.env());
        let public = PublicKey::from(&secret);

        let data = KeyRequestData::DiffieHellman {
            parameters_id: self.parameters_id.clone(),
            public_value: public.as_bytes().to_vec(),
        };

        Ok(PendingKeyRequest::new(data, LocalSecret::DiffieHellman(secret)))
    }

    /// Answer a request with a fresh public value and derive the session.
    pub fn respond<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        parameters_id: &str,
        public_value: &[u8],
    ) -> Result<KeyExchangeResponse<E>, KeyExchangeError> {
        let DhGroup::X25519 = group(ctx, parameters_id)?;

        let initiator_public = parse_public(public_value)?;
        let secret = ephemeral_secret(ctx.env());
        let responder_public = PublicKey::from(&secret);

        let crypto_context = derive(
            ctx.env(),
            &secret,
            &initiator_public,
            parameters_id,
            &initiator_public,
            &responder_public,
        )?;

        let data = KeyResponseData::DiffieHellman {
            parameters_id: parameters_id.to_string(),
            public_value: responder_public.as_bytes().to_vec(),
        };

        Ok(KeyExchangeResponse { data, crypto_context })
    }

    /// Combine the retained private value with the responder's public value.
    pub fn derive_crypto_context<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        secret: &StaticSecret,
        parameters_id: &str,
        response_public_value: &[u8],
    ) -> Result<SymmetricCryptoContext<E>, KeyExchangeError> {
        let DhGroup::X25519 = group(ctx, parameters_id)?;

        let initiator_public = PublicKey::from(secret);
        let responder_public = parse_public(response_public_value)?;

        derive(
            ctx.env(),
            secret,
            &responder_public,
            parameters_id,
            &initiator_public,
            &responder_public,
        )
    }
}

fn group<E: Environment>(
    ctx: &KeyExchangeContext<E>,
    parameters_id: &str,
) -> Result<DhGroup, KeyExchangeError> {
    ctx.key_store()
        .dh_parameters(parameters_id)
        .ok_or_else(|| KeyExchangeError::UnknownParametersId(parameters_id.to_string()))
}

fn ephemeral_secret<E: Environment>(env: &E) -> StaticSecret {
    let bytes = Zeroizing::new(env.random_array::<32>());
    StaticSecret::from(*bytes)
}

fn parse_public(bytes: &[u8]) -> Result<PublicKey, KeyExchangeError> {
    let array: [u8; PUBLIC_VALUE_SIZE] =
        bytes.try_into().map_err(|_| KeyExchangeError::InvalidPublicValue)?;
    Ok(PublicKey::from(array))
}

fn derive<E: Environment>(
    env: &E,
    secret: &StaticSecret,
    peer: &PublicKey,
    parameters_id: &str,
    initiator_public: &PublicKey,
    responder_public: &PublicKey,
) -> Result<SymmetricCryptoContext<E>, KeyExchangeError> {
    let shared = secret.diffie_hellman(peer);
    if !shared.was_contributory() {
        tracing::warn!(parameters_id, "rejecting non-contributory Diffie-Hellman value");
        return Err(KeyExchangeError::InvalidPublicValue);
    }

    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());

    let mut info = Vec::with_capacity(
        DH_SESSION_LABEL.len() + parameters_id.len() + 2 * PUBLIC_VALUE_SIZE,
    );
    info.extend_from_slice(DH_SESSION_LABEL);
    info.extend_from_slice(parameters_id.as_bytes());
    info.extend_from_slice(initiator_public.as_bytes());
    info.extend_from_slice(responder_public.as_bytes());

    let mut okm = Zeroizing::new([0u8; 64]);
    let Ok(()) = hkdf.expand(&info, okm.as_mut_slice()) else {
        unreachable!("64 bytes is a valid HKDF-SHA256 output length");
    };

    let (cipher, integrity) = okm.split_at(32);
    let encryption_key =
        CipherKey::import(cipher, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)?;
    let hmac_key = CipherKey::import(integrity, KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)?;

    session_context(env, KeyExchangeScheme::DiffieHellman, parameters_id, encryption_key, hmac_key)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wardline_crypto::CryptoContext;

    use super::*;
    use crate::keyx::MemoryKeyStore;

    #[derive(Clone, Debug)]
    struct CountingEnv(Arc<std::sync::atomic::AtomicU8>);

    impl Environment for CountingEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            let base = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = base.wrapping_mul(31).wrapping_add(i as u8);
            }
        }
    }

    fn context() -> KeyExchangeContext<CountingEnv> {
        let store = MemoryKeyStore::new().with_dh_parameters("1", DhGroup::X25519);
        KeyExchangeContext::new(CountingEnv(Arc::default()), Arc::new(store))
    }

    fn public_value(pending: &PendingKeyRequest) -> Vec<u8> {
        match pending.data() {
            KeyRequestData::DiffieHellman { public_value, .. } => public_value.clone(),
            other => panic!("unexpected request {other:?}"),
        }
    }

    fn secret(pending: &PendingKeyRequest) -> &StaticSecret {
        match pending.secret() {
            LocalSecret::DiffieHellman(secret) => secret,
            other => panic!("unexpected secret {other:?}"),
        }
    }

    #[tokio::test]
    async fn both_sides_derive_the_same_session() {
        let ctx = context();
        let pending = DiffieHellmanExchange::new("1").generate_request(&ctx).unwrap();

        let response = DiffieHellmanExchange::respond(&ctx, "1", &public_value(&pending)).unwrap();
        let KeyResponseData::DiffieHellman { public_value: responder_public, .. } = &response.data
        else {
            panic!("unexpected response {:?}", response.data);
        };

        let initiator =
            DiffieHellmanExchange::derive_crypto_context(&ctx, secret(&pending), "1", responder_public)
                .unwrap();

        assert_eq!(initiator.encryption_key(), response.crypto_context.encryption_key());
        assert_eq!(initiator.hmac_key(), response.crypto_context.hmac_key());

        let ciphertext = response.crypto_context.encrypt(b"from responder").await.unwrap();
        assert_eq!(initiator.decrypt(&ciphertext).await.unwrap(), b"from responder");
    }

    #[test]
    fn unknown_parameters_id_is_rejected() {
        let ctx = context();

        assert_eq!(
            DiffieHellmanExchange::new("2").generate_request(&ctx).unwrap_err(),
            KeyExchangeError::UnknownParametersId("2".to_string())
        );
        assert_eq!(
            DiffieHellmanExchange::respond(&ctx, "2", &[9u8; 32]).unwrap_err(),
            KeyExchangeError::UnknownParametersId("2".to_string())
        );
    }

    #[test]
    fn short_public_value_is_rejected() {
        let ctx = context();

        assert_eq!(
            DiffieHellmanExchange::respond(&ctx, "1", &[9u8; 31]).unwrap_err(),
            KeyExchangeError::InvalidPublicValue
        );
    }

    #[test]
    fn low_order_point_is_rejected() {
        let ctx = context();

        assert_eq!(
            DiffieHellmanExchange::respond(&ctx, "1", &[0u8; 32]).unwrap_err(),
            KeyExchangeError::InvalidPublicValue
        );
    }

    #[test]
    fn request_carries_only_public_value() {
        let ctx = context();
        let pending = DiffieHellmanExchange::new("1").generate_request(&ctx).unwrap();

        assert_eq!(public_value(&pending), PublicKey::from(secret(&pending)).as_bytes().to_vec());
    }
}
