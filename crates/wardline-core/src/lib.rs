//! Wardline security core
//!
//! Key exchange and per-message security policy on top of the crypto
//! contexts in `wardline-crypto`.
//!
//! # Components
//!
//! ```text
//! keyx  KeyExchange {DiffieHellman, AsymmetricWrapped, SymmetricWrapped}
//!       KeyExchangeResponder: answers one offer per message by preference
//! msg   MessageContext: flags, identity, key requests, service token bindings
//! ```
//!
//! # Failure model
//!
//! Every suspension point completes exactly once through a `Result`. Nothing
//! here retries. Timeouts leave message state unchanged; policy errors are
//! fatal to message construction.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod keyx;
pub mod msg;
pub mod system_env;

pub use config::{KeyExchangeConfig, MessageContextConfig};
pub use error::{MessageContextError, PolicyError, TimeoutError};
pub use keyx::{
    KeyExchange, KeyExchangeContext, KeyExchangeError, KeyExchangeResponder, KeyExchangeResponse,
    KeyExchangeScheme, KeyRequestData, KeyResponseData, PendingKeyRequest,
};
pub use msg::{DefaultMessageContext, MessageContext};
pub use system_env::SystemEnv;
