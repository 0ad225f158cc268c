//! Asymmetric-wrapped key exchange.
//!
//! The initiator offers the public half of a stored key pair. The responder
//! generates session keys and wraps each with that public key; only the
//! initiator's private key can unwrap them. A fresh nonce in the request is
//! echoed by the response.

use wardline_crypto::{
    AsymmetricCryptoContext, AsymmetricKeyPair, AsymmetricPublicKey, CryptoContext, Environment,
    KeyAlgorithm, KeyUsage, SymmetricCryptoContext,
};

use super::{
    KeyExchangeContext, KeyExchangeError, KeyExchangeResponse, KeyExchangeScheme, KeyRequestData,
    KeyResponseData, LocalSecret, Mechanism, PendingKeyRequest,
    data::check_nonce,
    session::{fresh_nonce, generate_session_keys, session_context, session_id},
};

/// Asymmetric-wrapped scheme over a stored key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricWrappedExchange {
    key_pair_id: String,
    mechanism: Mechanism,
}

impl AsymmetricWrappedExchange {
    /// Scheme offering the key pair `key_pair_id`.
    pub fn new(key_pair_id: impl Into<String>, mechanism: Mechanism) -> Self {
        Self { key_pair_id: key_pair_id.into(), mechanism }
    }

    /// Key pair ID.
    pub fn key_pair_id(&self) -> &str {
        &self.key_pair_id
    }

    /// Wrapping mechanism.
    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// Offer the public half of the key pair; keep the pair locally.
    pub fn generate_request<E: Environment>(
        &self,
        ctx: &KeyExchangeContext<E>,
    ) -> Result<PendingKeyRequest, KeyExchangeError> {
        let key_pair = ctx
            .key_store()
            .key_pair(&self.key_pair_id)
            .ok_or_else(|| KeyExchangeError::UnknownKeyPairId(self.key_pair_id.clone()))?;

        let data = KeyRequestData::AsymmetricWrapped {
            key_pair_id: self.key_pair_id.clone(),
            mechanism: self.mechanism,
            public_key: key_pair.public_key().to_der()?,
            nonce: fresh_nonce(ctx.env()),
        };

        Ok(PendingKeyRequest::new(data, LocalSecret::AsymmetricWrapped(key_pair)))
    }

    /// Wrap fresh session keys with the offered public key.
    pub async fn respond<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        key_pair_id: &str,
        mechanism: Mechanism,
        public_key: &[u8],
        nonce: &[u8],
    ) -> Result<KeyExchangeResponse<E>, KeyExchangeError> {
        let Mechanism::Rsa = mechanism;
        check_nonce(nonce)?;

        let public_key = AsymmetricPublicKey::from_der(public_key)?;
        let wrapper = AsymmetricCryptoContext::from_public_key(
            ctx.env().clone(),
            session_id(KeyExchangeScheme::AsymmetricWrapped, key_pair_id),
            public_key,
        );

        let (encryption_key, hmac_key) = generate_session_keys(ctx.env())?;
        let wrapped_encryption_key = wrapper.wrap(&encryption_key).await?;
        let wrapped_hmac_key = wrapper.wrap(&hmac_key).await?;

        let crypto_context = session_context(
            ctx.env(),
            KeyExchangeScheme::AsymmetricWrapped,
            key_pair_id,
            encryption_key,
            hmac_key,
        )?;

        let data = KeyResponseData::AsymmetricWrapped {
            key_pair_id: key_pair_id.to_string(),
            mechanism,
            encryption_key: wrapped_encryption_key,
            hmac_key: wrapped_hmac_key,
            nonce: nonce.to_vec(),
        };

        Ok(KeyExchangeResponse { data, crypto_context })
    }

    /// Unwrap the session keys with the retained private key.
    pub async fn derive_crypto_context<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        key_pair: &AsymmetricKeyPair,
        key_pair_id: &str,
        wrapped_encryption_key: &[u8],
        wrapped_hmac_key: &[u8],
    ) -> Result<SymmetricCryptoContext<E>, KeyExchangeError> {
        let unwrapper = AsymmetricCryptoContext::from_key_pair(
            ctx.env().clone(),
            session_id(KeyExchangeScheme::AsymmetricWrapped, key_pair_id),
            key_pair,
        );

        let encryption_key = unwrapper
            .unwrap(wrapped_encryption_key, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)
            .await?;
        let hmac_key = unwrapper
            .unwrap(wrapped_hmac_key, KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .await?;

        session_context(
            ctx.env(),
            KeyExchangeScheme::AsymmetricWrapped,
            key_pair_id,
            encryption_key,
            hmac_key,
        )
    }
}
