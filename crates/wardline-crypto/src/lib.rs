//! Wardline crypto contexts
//!
//! Key material and the crypto context capability used to protect messages
//! once a key exchange has produced session keys. Randomness is drawn from an
//! injected [`Environment`] so every operation is reproducible under a seeded
//! source.
//!
//! # Contexts
//!
//! ```text
//! SymmetricCryptoContext   XChaCha20-Poly1305 + HMAC-SHA256 (+ optional wrapping key)
//! AsymmetricCryptoContext  RSA-OAEP-SHA256 encrypt and wrap
//! NullCryptoContext        identity encrypt/sign, no wrapping, no protection
//! ```
//!
//! # Security
//!
//! - Keys carry exactly one usage; a key cannot be placed in another slot
//! - Key material is zeroized on drop and never printed
//! - Decrypt and unwrap fail closed on malformed or forged input
//! - Wrapped keys are bound to their algorithm and usage

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod asymmetric;
pub mod context;
pub mod env;
pub mod error;
pub mod key;
pub mod null;
pub mod symmetric;

#[cfg(test)]
mod testing;

pub use asymmetric::AsymmetricCryptoContext;
pub use context::CryptoContext;
pub use env::{Environment, EnvironmentRng};
pub use error::CryptoError;
pub use key::{AsymmetricKeyPair, AsymmetricPublicKey, CipherKey, KeyAlgorithm, KeyUsage};
pub use null::NullCryptoContext;
pub use symmetric::{HMAC_TAG_SIZE, NONCE_SIZE, SymmetricCryptoContext};
