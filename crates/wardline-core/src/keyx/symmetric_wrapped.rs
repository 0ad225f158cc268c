//! Symmetric-wrapped key exchange.
//!
//! Both sides already hold a pre-shared key under a common ID. The request
//! names the ID and a fresh nonce and carries no key material; the responder
//! wraps fresh session keys with the pre-shared wrapping key and echoes the
//! nonce.

use wardline_crypto::{CryptoContext, Environment, KeyAlgorithm, KeyUsage, SymmetricCryptoContext};

use super::{
    KeyExchangeContext, KeyExchangeError, KeyExchangeResponse, KeyExchangeScheme, KeyRequestData,
    KeyResponseData, LocalSecret, PendingKeyRequest,
    data::check_nonce,
    session::{fresh_nonce, generate_session_keys, session_context, session_id},
};

/// Symmetric-wrapped scheme over a pre-shared key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricWrappedExchange {
    key_id: String,
}

impl SymmetricWrappedExchange {
    /// Scheme referencing the pre-shared key `key_id`.
    pub fn new(key_id: impl Into<String>) -> Self {
        Self { key_id: key_id.into() }
    }

    /// Pre-shared key ID.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Offer the pre-shared key ID.
    pub fn generate_request<E: Environment>(
        &self,
        ctx: &KeyExchangeContext<E>,
    ) -> Result<PendingKeyRequest, KeyExchangeError> {
        psk_context(ctx, &self.key_id)?;

        let data =
            KeyRequestData::SymmetricWrapped { key_id: self.key_id.clone(), nonce: fresh_nonce(ctx.env()) };
        Ok(PendingKeyRequest::new(data, LocalSecret::SymmetricWrapped))
    }

    /// Wrap fresh session keys with the pre-shared key.
    pub async fn respond<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        key_id: &str,
        nonce: &[u8],
    ) -> Result<KeyExchangeResponse<E>, KeyExchangeError> {
        let wrapper = psk_context(ctx, key_id)?;
        check_nonce(nonce)?;

        let (encryption_key, hmac_key) = generate_session_keys(ctx.env())?;
        let wrapped_encryption_key = wrapper.wrap(&encryption_key).await?;
        let wrapped_hmac_key = wrapper.wrap(&hmac_key).await?;

        let crypto_context = session_context(
            ctx.env(),
            KeyExchangeScheme::SymmetricWrapped,
            key_id,
            encryption_key,
            hmac_key,
        )?;

        let data = KeyResponseData::SymmetricWrapped {
            key_id: key_id.to_string(),
            encryption_key: wrapped_encryption_key,
            hmac_key: wrapped_hmac_key,
            nonce: nonce.to_vec(),
        };

        Ok(KeyExchangeResponse { data, crypto_context })
    }

    /// Unwrap the session keys with the pre-shared key.
    pub async fn derive_crypto_context<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        key_id: &str,
        wrapped_encryption_key: &[u8],
        wrapped_hmac_key: &[u8],
    ) -> Result<SymmetricCryptoContext<E>, KeyExchangeError> {
        let unwrapper = psk_context(ctx, key_id)?;

        let encryption_key = unwrapper
            .unwrap(wrapped_encryption_key, KeyAlgorithm::XChaCha20Poly1305, KeyUsage::EncryptDecrypt)
            .await?;
        let hmac_key = unwrapper
            .unwrap(wrapped_hmac_key, KeyAlgorithm::HmacSha256, KeyUsage::SignVerify)
            .await?;

        session_context(ctx.env(), KeyExchangeScheme::SymmetricWrapped, key_id, encryption_key, hmac_key)
    }
}

fn psk_context<E: Environment>(
    ctx: &KeyExchangeContext<E>,
    key_id: &str,
) -> Result<SymmetricCryptoContext<E>, KeyExchangeError> {
    let psk = ctx
        .key_store()
        .preshared_key(key_id)
        .ok_or_else(|| KeyExchangeError::UnknownKeyId(key_id.to_string()))?;

    Ok(psk.crypto_context(ctx.env().clone(), session_id(KeyExchangeScheme::SymmetricWrapped, key_id))?)
}
