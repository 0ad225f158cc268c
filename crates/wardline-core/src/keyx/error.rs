//! Key exchange errors

use thiserror::Error;
use wardline_crypto::CryptoError;

use super::KeyExchangeScheme;

/// Errors from generating, answering or completing a key exchange.
///
/// None of these are retried. An unknown identifier never falls back to a
/// different one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyExchangeError {
    /// Diffie-Hellman parameter set is not known to the key store
    #[error("unknown Diffie-Hellman parameters ID {0:?}")]
    UnknownParametersId(String),

    /// Asymmetric key pair is not known to the key store
    #[error("unknown key pair ID {0:?}")]
    UnknownKeyPairId(String),

    /// Pre-shared key is not known to the key store
    #[error("unknown pre-shared key ID {0:?}")]
    UnknownKeyId(String),

    /// Response scheme does not match the request
    #[error("scheme mismatch: request is {request}, response is {response}")]
    SchemeMismatch {
        /// Scheme of the request
        request: KeyExchangeScheme,
        /// Scheme of the response
        response: KeyExchangeScheme,
    },

    /// Response identifier does not match the request
    #[error("identifier mismatch: request is {request:?}, response is {response:?}")]
    IdentifierMismatch {
        /// Identifier carried by the request
        request: String,
        /// Identifier carried by the response
        response: String,
    },

    /// Response does not echo the request's nonce
    #[error("{scheme} response for {identifier:?} does not echo the request nonce")]
    NonceMismatch {
        /// Scheme of the request
        scheme: KeyExchangeScheme,
        /// Identifier of the request
        identifier: String,
    },

    /// Offers were present but none uses a scheme the responder accepts
    #[error("no supported key exchange scheme among {offered:?}")]
    NoSupportedScheme {
        /// Schemes offered by the peer, in message order
        offered: Vec<KeyExchangeScheme>,
    },

    /// This exact request has already been answered
    #[error("{scheme} request {identifier:?} has already been answered")]
    Replayed {
        /// Scheme of the replayed request
        scheme: KeyExchangeScheme,
        /// Identifier of the replayed request
        identifier: String,
    },

    /// Request or response record could not be decoded
    #[error("malformed key exchange data: {reason}")]
    MalformedData {
        /// Decoder error
        reason: String,
    },

    /// Peer public value is malformed or produces a non-contributory secret
    #[error("invalid Diffie-Hellman public value")]
    InvalidPublicValue,

    /// Underlying crypto context failure (e.g. truncated wrapped key)
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
