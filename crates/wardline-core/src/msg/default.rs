//! Reference message context.

use std::{collections::HashSet, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use wardline_crypto::{Environment, SymmetricCryptoContext};

use super::{
    DEFAULT_SERVICE_TOKEN_NAME, MessageContext, MessageDebugContext, ReauthCode,
    ServiceTokenBuilder, ServiceTokenContexts, ServiceTokenRequest, User, UserAuthenticationData,
    UserAuthenticationScheme,
};
use crate::{
    config::MessageContextConfig,
    error::{MessageContextError, PolicyError, TimeoutError},
    keyx::{KeyExchange, KeyExchangeContext, PendingKeyRequest},
};

/// Message context with the reference policy.
///
/// A fresh context has every flag cleared, offers one asymmetric-wrapped and
/// one symmetric-wrapped key request (preceded by Diffie-Hellman only when
/// configured), and binds two independently generated symmetric crypto
/// contexts: one for the configured service token and the default entry.
///
/// Mutators update the owned state in place.
pub struct DefaultMessageContext {
    recipient: Option<String>,
    encrypted: bool,
    integrity_protected: bool,
    non_replayable: bool,
    requesting_tokens: bool,
    user_id: Option<String>,
    user_auth_data: Option<UserAuthenticationData>,
    user: Option<User>,
    key_requests: Vec<PendingKeyRequest>,
    crypto_contexts: ServiceTokenContexts,
    service_tokens: Vec<ServiceTokenRequest>,
    payload: Vec<u8>,
    operation_timeout: Duration,
    debug_context: Option<Arc<dyn MessageDebugContext>>,
}

impl DefaultMessageContext {
    /// Create a context for `user_id` authenticating with `scheme`.
    ///
    /// # Errors
    ///
    /// - `PolicyError::UnsupportedAuthScheme` for any scheme other than
    ///   email/password; no context is returned
    /// - `KeyExchangeError` if a configured key request cannot be generated
    pub fn create<E: Environment>(
        ctx: &KeyExchangeContext<E>,
        config: &MessageContextConfig,
        user_id: impl Into<String>,
        scheme: UserAuthenticationScheme,
    ) -> Result<Self, MessageContextError> {
        let user_auth_data = match scheme {
            UserAuthenticationScheme::EmailPassword => UserAuthenticationData::EmailPassword {
                email: config.email.clone(),
                password: config.password.clone(),
            },
            UserAuthenticationScheme::UserIdToken | UserAuthenticationScheme::ExternalToken => {
                tracing::warn!(%scheme, "unsupported user authentication scheme");
                return Err(PolicyError::UnsupportedAuthScheme { scheme }.into());
            },
        };

        let key_requests = KeyExchange::offers(&config.key_exchange)
            .iter()
            .map(|offer| offer.generate_request(ctx))
            .collect::<Result<Vec<_>, _>>()?;

        let mut crypto_contexts = ServiceTokenContexts::new();
        crypto_contexts.insert(
            config.service_token_name.clone(),
            Arc::new(SymmetricCryptoContext::generate(
                ctx.env().clone(),
                config.service_token_name.clone(),
            )?),
        );
        crypto_contexts.insert(
            DEFAULT_SERVICE_TOKEN_NAME,
            Arc::new(SymmetricCryptoContext::generate(
                ctx.env().clone(),
                DEFAULT_SERVICE_TOKEN_NAME,
            )?),
        );

        let user_id = user_id.into();
        tracing::debug!(
            user_id = %user_id,
            %scheme,
            key_requests = key_requests.len(),
            "created message context"
        );

        Ok(Self {
            recipient: None,
            encrypted: false,
            integrity_protected: false,
            non_replayable: false,
            requesting_tokens: false,
            user_id: Some(user_id),
            user_auth_data: Some(user_auth_data),
            user: None,
            key_requests,
            crypto_contexts,
            service_tokens: Vec::new(),
            payload: Vec::new(),
            operation_timeout: config.operation_timeout,
            debug_context: None,
        })
    }

    /// Set the intended recipient.
    pub fn set_recipient(&mut self, recipient: Option<String>) {
        self.recipient = recipient;
    }

    /// Require encryption.
    pub fn set_encrypted(&mut self, encrypted: bool) {
        self.encrypted = encrypted;
    }

    /// Require integrity protection.
    pub fn set_integrity_protected(&mut self, integrity_protected: bool) {
        self.integrity_protected = integrity_protected;
    }

    /// Require replay protection.
    pub fn set_non_replayable(&mut self, non_replayable: bool) {
        self.non_replayable = non_replayable;
    }

    /// Request tokens from the peer.
    pub fn set_requesting_tokens(&mut self, requesting_tokens: bool) {
        self.requesting_tokens = requesting_tokens;
    }

    /// Replace the user authentication data.
    pub fn set_user_auth_data(&mut self, user_auth_data: Option<UserAuthenticationData>) {
        self.user_auth_data = user_auth_data;
    }

    /// Set the authenticated remote user.
    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    /// Replace the key request offers.
    ///
    /// # Errors
    ///
    /// - `PolicyError::DuplicateKeyRequest` if two offers share a scheme and
    ///   identifier; the current offers are kept
    pub fn set_key_request_data(
        &mut self,
        key_requests: Vec<PendingKeyRequest>,
    ) -> Result<(), PolicyError> {
        let mut seen = HashSet::with_capacity(key_requests.len());
        for pending in &key_requests {
            let data = pending.data();
            if !seen.insert((data.scheme(), data.identifier())) {
                return Err(PolicyError::DuplicateKeyRequest {
                    scheme: data.scheme(),
                    identifier: data.identifier().to_string(),
                });
            }
        }

        self.key_requests = key_requests;
        Ok(())
    }

    /// Application data written by [`MessageContext::write`].
    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }

    /// Stage a service token for the next `update_service_tokens`.
    pub fn add_service_token(&mut self, token: ServiceTokenRequest) {
        self.service_tokens.push(token);
    }

    /// Staged service tokens.
    pub fn service_tokens(&self) -> &[ServiceTokenRequest] {
        &self.service_tokens
    }

    /// Mutable service token bindings.
    pub fn crypto_contexts_mut(&mut self) -> &mut ServiceTokenContexts {
        &mut self.crypto_contexts
    }

    /// Remove the crypto context bound to `name`.
    pub fn remove_crypto_context(&mut self, name: &str) {
        self.crypto_contexts.remove(name);
    }

    /// Install or clear debug hooks.
    pub fn set_debug_context(&mut self, debug_context: Option<Arc<dyn MessageDebugContext>>) {
        self.debug_context = debug_context;
    }
}

#[async_trait]
impl MessageContext for DefaultMessageContext {
    fn crypto_contexts(&self) -> &ServiceTokenContexts {
        &self.crypto_contexts
    }

    fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn is_integrity_protected(&self) -> bool {
        self.integrity_protected
    }

    fn is_non_replayable(&self) -> bool {
        self.non_replayable
    }

    fn is_requesting_tokens(&self) -> bool {
        self.requesting_tokens
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    async fn user_auth_data(
        &self,
        reauth: Option<ReauthCode>,
        renewable: bool,
        required: bool,
        timeout: Duration,
    ) -> Result<Option<UserAuthenticationData>, MessageContextError> {
        if let Some(code) = reauth {
            tracing::debug!(?code, renewable, "re-authentication requested");
        }

        let lookup = async {
            match &self.user_auth_data {
                None if required => Err(PolicyError::MissingUserAuthData),
                data => Ok(data.clone()),
            }
        };

        let data = tokio::time::timeout(timeout, lookup)
            .await
            .map_err(|_| TimeoutError { operation: "user_auth_data", timeout })??;

        Ok(data)
    }

    fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn key_requests(&self) -> &[PendingKeyRequest] {
        &self.key_requests
    }

    async fn update_service_tokens(
        &self,
        builder: &mut dyn ServiceTokenBuilder,
        handshake: bool,
    ) -> Result<bool, MessageContextError> {
        let protect_all = async {
            let mut tokens = Vec::with_capacity(self.service_tokens.len());
            for request in &self.service_tokens {
                let context = self.crypto_contexts.resolve(&request.name)?;
                tokens.push(request.protect(context.as_ref()).await?);
            }
            Ok::<_, MessageContextError>(tokens)
        };

        let tokens = tokio::time::timeout(self.operation_timeout, protect_all)
            .await
            .map_err(|_| TimeoutError {
                operation: "update_service_tokens",
                timeout: self.operation_timeout,
            })??;

        let count = tokens.len();
        for token in tokens {
            builder.add_service_token(token);
        }

        tracing::debug!(count, handshake, "attached service tokens");
        Ok(true)
    }

    async fn write(
        &self,
        output: &mut (dyn AsyncWrite + Send + Unpin),
        timeout: Duration,
    ) -> Result<bool, MessageContextError> {
        let write_all = async {
            output.write_all(&self.payload).await?;
            output.flush().await
        };

        tokio::time::timeout(timeout, write_all)
            .await
            .map_err(|_| TimeoutError { operation: "write", timeout })??;

        Ok(true)
    }

    fn debug_context(&self) -> Option<&dyn MessageDebugContext> {
        self.debug_context.as_deref()
    }
}

impl fmt::Debug for DefaultMessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultMessageContext")
            .field("recipient", &self.recipient)
            .field("encrypted", &self.encrypted)
            .field("integrity_protected", &self.integrity_protected)
            .field("non_replayable", &self.non_replayable)
            .field("requesting_tokens", &self.requesting_tokens)
            .field("user_id", &self.user_id)
            .field("user", &self.user)
            .field("key_requests", &self.key_requests.len())
            .field("crypto_contexts", &self.crypto_contexts)
            .field("service_tokens", &self.service_tokens.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyx::{
        KeyExchangeError, KeyExchangeScheme, MemoryKeyStore, PresharedKey, SymmetricWrappedExchange,
    };
    use crate::msg::ServiceToken;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[derive(Clone, Debug)]
    struct FixedEnv(u8);

    impl Environment for FixedEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.0);
        }
    }

    // RSA key pairs are exercised in integration tests.
    fn config() -> MessageContextConfig {
        let mut config = MessageContextConfig::default();
        config.key_exchange.key_pair_id = "missing".to_string();
        config
    }

    fn keyx() -> KeyExchangeContext<FixedEnv> {
        let env = FixedEnv(3);
        let store = MemoryKeyStore::new().with_preshared_key("PSK", PresharedKey::generate(&env).unwrap());
        KeyExchangeContext::new(env, Arc::new(store))
    }

    fn symmetric_only() -> DefaultMessageContext {
        let pending = SymmetricWrappedExchange::new("PSK").generate_request(&keyx()).unwrap();
        let mut context = DefaultMessageContext {
            recipient: None,
            encrypted: false,
            integrity_protected: false,
            non_replayable: false,
            requesting_tokens: false,
            user_id: Some("user".to_string()),
            user_auth_data: None,
            user: None,
            key_requests: Vec::new(),
            crypto_contexts: ServiceTokenContexts::new(),
            service_tokens: Vec::new(),
            payload: Vec::new(),
            operation_timeout: Duration::from_secs(1),
            debug_context: None,
        };
        context.set_key_request_data(vec![pending]).unwrap();
        context
    }

    #[test]
    fn missing_key_pair_fails_construction() {
        let result = DefaultMessageContext::create(
            &keyx(),
            &config(),
            "user",
            UserAuthenticationScheme::EmailPassword,
        );

        assert!(matches!(
            result,
            Err(MessageContextError::KeyExchange(KeyExchangeError::UnknownKeyPairId(id)))
                if id == "missing"
        ));
    }

    #[test]
    fn unsupported_scheme_fails_before_key_requests() {
        let result = DefaultMessageContext::create(
            &keyx(),
            &config(),
            "user",
            UserAuthenticationScheme::UserIdToken,
        );

        assert!(matches!(
            result,
            Err(MessageContextError::Policy(PolicyError::UnsupportedAuthScheme {
                scheme: UserAuthenticationScheme::UserIdToken
            }))
        ));
    }

    #[test]
    fn duplicate_key_requests_are_rejected() {
        let ctx = keyx();
        let mut context = symmetric_only();
        let first = SymmetricWrappedExchange::new("PSK").generate_request(&ctx).unwrap();
        let second = first.clone();

        assert_eq!(
            context.set_key_request_data(vec![first, second]),
            Err(PolicyError::DuplicateKeyRequest {
                scheme: KeyExchangeScheme::SymmetricWrapped,
                identifier: "PSK".to_string(),
            })
        );
        assert_eq!(context.key_requests().len(), 1, "previous offers are kept");
    }

    #[tokio::test]
    async fn required_auth_data_must_exist() {
        let context = symmetric_only();

        assert!(context.user_auth_data(None, false, false, TIMEOUT).await.unwrap().is_none());
        assert!(matches!(
            context.user_auth_data(Some(ReauthCode::UserDataReauth), true, true, TIMEOUT).await,
            Err(MessageContextError::Policy(PolicyError::MissingUserAuthData))
        ));
    }

    #[tokio::test]
    async fn unresolved_token_leaves_builder_untouched() {
        struct Collect(Vec<ServiceToken>);
        impl ServiceTokenBuilder for Collect {
            fn add_service_token(&mut self, token: ServiceToken) {
                self.0.push(token);
            }
        }

        let mut context = symmetric_only();
        context.add_service_token(ServiceTokenRequest {
            name: "orphan".to_string(),
            data: b"x".to_vec(),
            encrypt: false,
        });
        let mut builder = Collect(Vec::new());

        let result = context.update_service_tokens(&mut builder, false).await;

        assert!(matches!(
            result,
            Err(MessageContextError::Policy(PolicyError::UnresolvedServiceToken { .. }))
        ));
        assert!(builder.0.is_empty());
    }
}
