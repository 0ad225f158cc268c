//! Recording and delayed stand-ins for the message builder's collaborators.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use wardline_core::msg::{MessageDebugContext, ServiceToken, ServiceTokenBuilder};
use wardline_crypto::{CipherKey, CryptoContext, CryptoError, KeyAlgorithm, KeyUsage};

/// Service token builder that keeps every token it is given.
#[derive(Debug, Default)]
pub struct RecordingTokenBuilder {
    tokens: Vec<ServiceToken>,
}

impl RecordingTokenBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens attached so far, in order.
    pub fn tokens(&self) -> &[ServiceToken] {
        &self.tokens
    }

    /// Token attached under `name`.
    pub fn token(&self, name: &str) -> Option<&ServiceToken> {
        self.tokens.iter().find(|token| token.name == name)
    }
}

impl ServiceTokenBuilder for RecordingTokenBuilder {
    fn add_service_token(&mut self, token: ServiceToken) {
        tracing::trace!(name = %token.name, "recorded service token");
        self.tokens.push(token);
    }
}

/// Debug context that records headers. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingDebugContext {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingDebugContext {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers reported as sent.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Headers reported as received.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl MessageDebugContext for RecordingDebugContext {
    fn sent_header(&self, header: &[u8]) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(header.to_vec());
    }

    fn received_header(&self, header: &[u8]) {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).push(header.to_vec());
    }
}

/// Crypto context that sleeps before delegating every operation.
///
/// Stands in for a slow platform crypto service in deadline tests.
pub struct DelayedCryptoContext<C> {
    inner: C,
    delay: Duration,
}

impl<C: CryptoContext> DelayedCryptoContext<C> {
    /// Delay every operation of `inner` by `delay`.
    pub fn new(inner: C, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<C: CryptoContext> CryptoContext for DelayedCryptoContext<C> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.encrypt(data).await
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.decrypt(ciphertext).await
    }

    async fn wrap(&self, key: &CipherKey) -> Result<Vec<u8>, CryptoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.wrap(key).await
    }

    async fn unwrap(
        &self,
        data: &[u8],
        algorithm: KeyAlgorithm,
        usage: KeyUsage,
    ) -> Result<CipherKey, CryptoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.unwrap(data, algorithm, usage).await
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.sign(data).await
    }

    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        tokio::time::sleep(self.delay).await;
        self.inner.verify(data, signature).await
    }
}
