//! Per-message security policy.
//!
//! A [`MessageContext`] binds, for one outgoing message, the policy flags,
//! user identity and authentication data, the key request offers and the
//! service token crypto bindings. The message builder is its only consumer.

mod auth;
mod context;
mod debug;
mod default;
mod service_tokens;

pub use auth::{ReauthCode, User, UserAuthenticationData, UserAuthenticationScheme};
pub use context::MessageContext;
pub use debug::MessageDebugContext;
pub use default::DefaultMessageContext;
pub use service_tokens::{
    DEFAULT_SERVICE_TOKEN_NAME, ServiceToken, ServiceTokenBuilder, ServiceTokenContexts,
    ServiceTokenRequest,
};
