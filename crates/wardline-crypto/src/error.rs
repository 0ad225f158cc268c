//! Error types for crypto context operations

use thiserror::Error;

use crate::key::{KeyAlgorithm, KeyUsage};

/// Errors from crypto contexts and key material
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The context does not implement this operation (e.g. wrap on a
    /// symmetric context without a wrapping key)
    #[error("{operation} is not supported by crypto context {context}")]
    NotSupported {
        /// Operation that was attempted
        operation: &'static str,
        /// Identifier of the context
        context: String,
    },

    /// The context is missing the key half needed for this operation
    #[error("crypto context {context} has no {role} key")]
    MissingKey {
        /// Identifier of the context
        context: String,
        /// Which key is missing (e.g. "private")
        role: &'static str,
    },

    /// Raw key material has the wrong length for its algorithm
    #[error("invalid key length for {algorithm}: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Algorithm the material was imported for
        algorithm: KeyAlgorithm,
        /// Required length in bytes
        expected: usize,
        /// Supplied length in bytes
        actual: usize,
    },

    /// The algorithm cannot be used for the requested usage
    #[error("{algorithm} keys cannot be used for {usage}")]
    UnsupportedUsage {
        /// Key algorithm
        algorithm: KeyAlgorithm,
        /// Requested usage
        usage: KeyUsage,
    },

    /// A key was supplied in a slot that needs a different algorithm or usage
    #[error("key mismatch: expected {expected_algorithm} for {expected_usage}, got {actual_algorithm} for {actual_usage}")]
    KeyMismatch {
        /// Algorithm the slot requires
        expected_algorithm: KeyAlgorithm,
        /// Usage the slot requires
        expected_usage: KeyUsage,
        /// Algorithm of the supplied key
        actual_algorithm: KeyAlgorithm,
        /// Usage of the supplied key
        actual_usage: KeyUsage,
    },

    /// Encryption failed
    #[error("encryption failed: {reason}")]
    EncryptionFailed {
        /// Reason for encryption failure
        reason: String,
    },

    /// Decryption failed (authentication tag mismatch or malformed input)
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Reason for decryption failure
        reason: String,
    },

    /// Key wrapping failed
    #[error("key wrap failed: {reason}")]
    WrapFailed {
        /// Reason for wrap failure
        reason: String,
    },

    /// Key unwrapping failed (authentication failure or truncated input)
    #[error("key unwrap failed: {reason}")]
    UnwrapFailed {
        /// Reason for unwrap failure
        reason: String,
    },

    /// Signature has the wrong shape to be verified at all
    #[error("malformed signature: expected {expected} bytes, got {actual}")]
    MalformedSignature {
        /// Expected signature length
        expected: usize,
        /// Actual signature length
        actual: usize,
    },

    /// Public key bytes could not be decoded
    #[error("invalid public key: {reason}")]
    InvalidPublicKey {
        /// Decoder error
        reason: String,
    },

    /// Key pair generation failed
    #[error("key generation failed: {reason}")]
    KeyGeneration {
        /// Generator error
        reason: String,
    },
}

impl CryptoError {
    /// Returns true if this error was caused by malformed or forged input
    /// from the peer.
    ///
    /// The remaining errors indicate local misconfiguration (wrong key in a
    /// slot, unsupported operation). Neither kind is retried: the same
    /// material always produces the same failure.
    pub fn is_peer_fault(&self) -> bool {
        match self {
            Self::DecryptionFailed { .. }
            | Self::UnwrapFailed { .. }
            | Self::MalformedSignature { .. }
            | Self::InvalidPublicKey { .. } => true,

            Self::NotSupported { .. }
            | Self::MissingKey { .. }
            | Self::InvalidKeyLength { .. }
            | Self::UnsupportedUsage { .. }
            | Self::KeyMismatch { .. }
            | Self::EncryptionFailed { .. }
            | Self::WrapFailed { .. }
            | Self::KeyGeneration { .. } => false,
        }
    }
}
