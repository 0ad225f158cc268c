//! Key exchange schemes.
//!
//! Three schemes negotiate a fresh session [`SymmetricCryptoContext`] through
//! one request/response handshake:
//!
//! ```text
//! DiffieHellman      request: public value      response: public value
//! AsymmetricWrapped  request: RSA public key    response: session keys wrapped with it
//! SymmetricWrapped   request: pre-shared key ID response: session keys wrapped with the PSK
//! ```
//!
//! Wrapped-scheme requests also carry a fresh nonce that the response must
//! echo:
//!
//! ```text
//! request { key_pair_id | key_id, .., nonce }  ->  response { .., nonce }
//! ```
//!
//! [`KeyExchange`] is the tagged union over the schemes and dispatches the
//! shared contract: `generate_request`, `respond_to_request`,
//! `derive_crypto_context`. The initiator keeps its secret in a
//! [`PendingKeyRequest`]; only [`KeyRequestData`] crosses the wire.
//!
//! # Invariants
//!
//! - Unknown parameter, key pair or key IDs fail; no other ID is substituted
//! - A response completes a request only with the same scheme, identifier
//!   and nonce
//! - Truncated or forged wrapped keys fail closed
//! - Every handshake yields fresh single-purpose session keys

mod asymmetric_wrapped;
mod data;
mod diffie_hellman;
mod error;
mod responder;
mod session;
mod store;
mod symmetric_wrapped;

pub use asymmetric_wrapped::AsymmetricWrappedExchange;
pub use data::{KeyExchangeScheme, KeyRequestData, KeyResponseData, Mechanism, REQUEST_NONCE_SIZE};
pub use diffie_hellman::DiffieHellmanExchange;
pub use error::KeyExchangeError;
pub use responder::KeyExchangeResponder;
pub use session::{KeyExchangeContext, KeyExchangeResponse, LocalSecret, PendingKeyRequest};
pub use store::{DhGroup, KeyStore, MemoryKeyStore, PresharedKey};
pub use symmetric_wrapped::SymmetricWrappedExchange;
use wardline_crypto::{Environment, SymmetricCryptoContext};

use crate::config::KeyExchangeConfig;

/// A key exchange scheme with its initiator-side parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyExchange {
    /// Ephemeral Diffie-Hellman
    DiffieHellman(DiffieHellmanExchange),
    /// Session keys wrapped with the initiator's public key
    AsymmetricWrapped(AsymmetricWrappedExchange),
    /// Session keys wrapped with a pre-shared key
    SymmetricWrapped(SymmetricWrappedExchange),
}

impl KeyExchange {
    /// Offers an initiator makes under `config`, in message order.
    ///
    /// Diffie-Hellman is included only when enabled, and then first.
    pub fn offers(config: &KeyExchangeConfig) -> Vec<Self> {
        let mut offers = Vec::with_capacity(3);
        if config.offer_diffie_hellman {
            offers.push(Self::DiffieHellman(DiffieHellmanExchange::new(
                config.dh_parameters_id.clone(),
            )));
        }
        offers.push(Self::AsymmetricWrapped(AsymmetricWrappedExchange::new(
            config.key_pair_id.clone(),
            config.mechanism,
        )));
        offers.push(Self::SymmetricWrapped(SymmetricWrappedExchange::new(config.psk_id.clone())));
        offers
    }

    /// Scheme tag.
    pub fn scheme(&self) -> KeyExchangeScheme {
        match self {
            Self::DiffieHellman(_) => KeyExchangeScheme::DiffieHellman,
            Self::AsymmetricWrapped(_) => KeyExchangeScheme::AsymmetricWrapped,
            Self::SymmetricWrapped(_) => KeyExchangeScheme::SymmetricWrapped,
        }
    }

    /// Create a fresh request and the secret needed to complete it.
    pub fn generate_request<E: Environment>(
        &self,
        ctx: &KeyExchangeContext<E>,
    ) -> Result<PendingKeyRequest, KeyExchangeError> {
        let pending = match self {
            Self::DiffieHellman(scheme) => scheme.generate_request(ctx)?,
            Self::AsymmetricWrapped(scheme) => scheme.generate_request(ctx)?,
            Self::SymmetricWrapped(scheme) => scheme.generate_request(ctx)?,
        };

        tracing::debug!(
            scheme = %pending.scheme(),
            identifier = pending.data().identifier(),
            "generated key request"
        );

        Ok(pending)
    }

    /// Answer a request with fresh session keys.
    pub async fn respond_to_request<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        request: &KeyRequestData,
    ) -> Result<KeyExchangeResponse<E>, KeyExchangeError> {
        tracing::debug!(
            scheme = %request.scheme(),
            identifier = request.identifier(),
            "responding to key request"
        );

        match request {
            KeyRequestData::DiffieHellman { parameters_id, public_value } => {
                DiffieHellmanExchange::respond(ctx, parameters_id, public_value)
            },
            KeyRequestData::AsymmetricWrapped { key_pair_id, mechanism, public_key, nonce } => {
                AsymmetricWrappedExchange::respond(ctx, key_pair_id, *mechanism, public_key, nonce)
                    .await
            },
            KeyRequestData::SymmetricWrapped { key_id, nonce } => {
                SymmetricWrappedExchange::respond(ctx, key_id, nonce).await
            },
        }
    }

    /// Complete a handshake on the initiator side.
    ///
    /// # Errors
    ///
    /// - `KeyExchangeError::SchemeMismatch` / `IdentifierMismatch` if the
    ///   response does not answer `pending`
    /// - `KeyExchangeError::Crypto` if wrapped keys fail to unwrap
    pub async fn derive_crypto_context<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        pending: &PendingKeyRequest,
        response: &KeyResponseData,
    ) -> Result<SymmetricCryptoContext<E>, KeyExchangeError> {
        pending.matches(response)?;

        let crypto_context = match (pending.secret(), response) {
            (
                LocalSecret::DiffieHellman(secret),
                KeyResponseData::DiffieHellman { parameters_id, public_value },
            ) => DiffieHellmanExchange::derive_crypto_context(ctx, secret, parameters_id, public_value)?,
            (
                LocalSecret::AsymmetricWrapped(key_pair),
                KeyResponseData::AsymmetricWrapped {
                    key_pair_id, mechanism, encryption_key, hmac_key, ..
                },
            ) => {
                if let KeyRequestData::AsymmetricWrapped { mechanism: offered, .. } = pending.data() {
                    if offered != mechanism {
                        return Err(KeyExchangeError::MalformedData {
                            reason: format!("response mechanism {mechanism} does not match {offered}"),
                        });
                    }
                }
                AsymmetricWrappedExchange::derive_crypto_context(
                    ctx,
                    key_pair,
                    key_pair_id,
                    encryption_key,
                    hmac_key,
                )
                .await?
            },
            (
                LocalSecret::SymmetricWrapped,
                KeyResponseData::SymmetricWrapped { key_id, encryption_key, hmac_key, .. },
            ) => {
                SymmetricWrappedExchange::derive_crypto_context(ctx, key_id, encryption_key, hmac_key)
                    .await?
            },
            _ => {
                return Err(KeyExchangeError::SchemeMismatch {
                    request: pending.scheme(),
                    response: response.scheme(),
                });
            },
        };

        tracing::info!(
            scheme = %response.scheme(),
            identifier = response.identifier(),
            "key exchange complete"
        );

        Ok(crypto_context)
    }

    /// The pending request `response` answers, if any.
    pub fn find_pending<'a>(
        pending: &'a [PendingKeyRequest],
        response: &KeyResponseData,
    ) -> Option<&'a PendingKeyRequest> {
        pending.iter().find(|request| request.matches(response).is_ok())
    }
}
