//! The per-message security policy.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use super::{
    MessageDebugContext, ReauthCode, ServiceTokenBuilder, ServiceTokenContexts, User,
    UserAuthenticationData,
};
use crate::{
    error::MessageContextError,
    keyx::{KeyRequestData, PendingKeyRequest},
};

/// Security policy, identity and resource bindings for one outgoing message.
///
/// A message context has a single owner: one message construction or parsing
/// flow uses it at a time. The message builder queries it in this order:
///
/// ```text
/// policy flags -> key requests -> user auth data -> crypto contexts
///              -> (after handshake) update_service_tokens -> write
/// ```
///
/// `user_auth_data`, `update_service_tokens` and `write` are suspension
/// points. Each completes exactly once through its `Result`; a timeout leaves
/// the context unchanged.
#[async_trait]
pub trait MessageContext: Send + Sync {
    /// Service token crypto bindings.
    fn crypto_contexts(&self) -> &ServiceTokenContexts;

    /// Intended recipient, if any.
    fn recipient(&self) -> Option<&str>;

    /// Whether the message must be encrypted.
    fn is_encrypted(&self) -> bool;

    /// Whether the message must be integrity protected.
    fn is_integrity_protected(&self) -> bool;

    /// Whether the message must not be replayable.
    fn is_non_replayable(&self) -> bool;

    /// Whether the message requests tokens from the peer.
    fn is_requesting_tokens(&self) -> bool;

    /// Local user identity, if any.
    fn user_id(&self) -> Option<&str>;

    /// Authentication data for the local user.
    ///
    /// `reauth` is set when the peer rejected earlier data. With `required`
    /// set, the absence of data is a [`crate::PolicyError`] rather than
    /// `Ok(None)`. Obtaining or refreshing the data is bounded by `timeout`;
    /// exceeding it yields [`crate::TimeoutError`].
    async fn user_auth_data(
        &self,
        reauth: Option<ReauthCode>,
        renewable: bool,
        required: bool,
        timeout: Duration,
    ) -> Result<Option<UserAuthenticationData>, MessageContextError>;

    /// Authenticated remote user, if any.
    fn user(&self) -> Option<&User>;

    /// Key request offers, in message order, with their local secrets.
    fn key_requests(&self) -> &[PendingKeyRequest];

    /// Wire records of the key request offers, in message order.
    fn key_request_data(&self) -> Vec<KeyRequestData> {
        self.key_requests().iter().map(|pending| pending.data().clone()).collect()
    }

    /// Attach this context's service tokens to `builder`.
    ///
    /// Either every token is attached or none is. Returns `Ok(true)` when
    /// the builder was updated.
    async fn update_service_tokens(
        &self,
        builder: &mut dyn ServiceTokenBuilder,
        handshake: bool,
    ) -> Result<bool, MessageContextError>;

    /// Write application data to `output` within `timeout`.
    async fn write(
        &self,
        output: &mut (dyn AsyncWrite + Send + Unpin),
        timeout: Duration,
    ) -> Result<bool, MessageContextError>;

    /// Debug hooks, if installed.
    fn debug_context(&self) -> Option<&dyn MessageDebugContext>;
}
