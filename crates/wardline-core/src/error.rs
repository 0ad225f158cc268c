//! Error types for message policy and bounded operations.
//!
//! Each layer has its own enum: [`CryptoError`] for primitive failures,
//! [`KeyExchangeError`] for handshakes, [`PolicyError`] for contradictory
//! message policy and [`TimeoutError`] for deadlines. [`MessageContextError`]
//! is the single failure channel the message-building layer sees.
//!
//! Nothing in the core retries. [`MessageContextError::is_transient`] tells
//! the caller whether retrying with fresh input can help.

use std::{io, time::Duration};

use thiserror::Error;
use wardline_crypto::CryptoError;

use crate::{
    keyx::{KeyExchangeError, KeyExchangeScheme},
    msg::UserAuthenticationScheme,
};

/// Message policy that cannot be honored. Always fatal to message
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The authentication scheme has no supported data source
    #[error("unsupported user authentication scheme: {scheme}")]
    UnsupportedAuthScheme {
        /// Requested scheme
        scheme: UserAuthenticationScheme,
    },

    /// Authentication data is required but none is available
    #[error("user authentication data is required but not available")]
    MissingUserAuthData,

    /// A service token has neither an explicit nor a default crypto context
    #[error("no crypto context for service token {name:?} and no default context")]
    UnresolvedServiceToken {
        /// Service token name
        name: String,
    },

    /// Two key request offers select the same responder action
    #[error("duplicate key request offer: {scheme} {identifier:?}")]
    DuplicateKeyRequest {
        /// Scheme of the duplicated offer
        scheme: KeyExchangeScheme,
        /// Identifier of the duplicated offer
        identifier: String,
    },
}

/// A bounded suspension point exceeded its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} timed out after {timeout:?}")]
pub struct TimeoutError {
    /// Operation that timed out
    pub operation: &'static str,
    /// Deadline that was exceeded
    pub timeout: Duration,
}

/// Failure channel for message context operations.
#[derive(Debug, Error)]
pub enum MessageContextError {
    /// Crypto context failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Key exchange failure
    #[error(transparent)]
    KeyExchange(#[from] KeyExchangeError),

    /// Policy violation
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Deadline exceeded
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// Output stream failure
    #[error("output error: {0}")]
    Io(#[from] io::Error),
}

impl MessageContextError {
    /// Returns true if the operation may succeed when retried with fresh
    /// input.
    ///
    /// Only timeouts are transient. Crypto and key exchange failures repeat
    /// with identical material, and policy errors are fatal to the message.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_are_transient() {
        let timeout = TimeoutError { operation: "write", timeout: Duration::from_millis(10) };

        assert!(MessageContextError::from(timeout).is_transient());
        assert!(!MessageContextError::from(PolicyError::MissingUserAuthData).is_transient());
        assert!(
            !MessageContextError::from(CryptoError::DecryptionFailed {
                reason: "authentication failed".to_string(),
            })
            .is_transient()
        );
        assert!(
            !MessageContextError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
                .is_transient()
        );
    }

    #[test]
    fn timeout_display() {
        let err = TimeoutError { operation: "write", timeout: Duration::from_millis(250) };
        assert_eq!(err.to_string(), "write timed out after 250ms");
    }

    #[test]
    fn unresolved_token_display() {
        let err = PolicyError::UnresolvedServiceToken { name: "session".to_string() };
        assert_eq!(
            err.to_string(),
            "no crypto context for service token \"session\" and no default context"
        );
    }
}
