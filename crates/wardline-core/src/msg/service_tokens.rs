//! Service token crypto bindings.
//!
//! Every service token attached to a message is protected with the crypto
//! context bound to its name. A distinguished default entry, keyed by the
//! empty string, covers any token without an explicit binding. A name with
//! neither an explicit nor a default entry fails closed.

use std::{collections::HashMap, fmt, sync::Arc};

use wardline_crypto::{CryptoContext, CryptoError};

use crate::error::PolicyError;

/// Name of the default crypto context entry.
pub const DEFAULT_SERVICE_TOKEN_NAME: &str = "";

/// Mapping from service token name to crypto context.
#[derive(Clone, Default)]
pub struct ServiceTokenContexts {
    contexts: HashMap<String, Arc<dyn CryptoContext>>,
}

impl ServiceTokenContexts {
    /// Empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `context`, returning any previous binding.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        context: Arc<dyn CryptoContext>,
    ) -> Option<Arc<dyn CryptoContext>> {
        self.contexts.insert(name.into(), context)
    }

    /// Remove the binding for `name`.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn CryptoContext>> {
        self.contexts.remove(name)
    }

    /// Explicit binding for `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CryptoContext>> {
        self.contexts.get(name)
    }

    /// Whether `name` has an explicit binding.
    pub fn contains(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    /// Default binding.
    pub fn default_context(&self) -> Option<&Arc<dyn CryptoContext>> {
        self.get(DEFAULT_SERVICE_TOKEN_NAME)
    }

    /// Context protecting the token `name`: the explicit binding, else the
    /// default.
    ///
    /// # Errors
    ///
    /// - `PolicyError::UnresolvedServiceToken` if neither exists
    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn CryptoContext>, PolicyError> {
        self.get(name)
            .or_else(|| self.default_context())
            .ok_or_else(|| PolicyError::UnresolvedServiceToken { name: name.to_string() })
    }

    /// Bound names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl fmt::Debug for ServiceTokenContexts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ServiceTokenContexts").field("names", &names).finish()
    }
}

/// A service token staged on a message context, not yet protected.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceTokenRequest {
    /// Token name
    pub name: String,
    /// Token plaintext
    pub data: Vec<u8>,
    /// Whether the data is encrypted, not just integrity protected
    pub encrypt: bool,
}

impl fmt::Debug for ServiceTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceTokenRequest")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .field("encrypt", &self.encrypt)
            .finish()
    }
}

/// A protected service token, ready for the message builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceToken {
    /// Token name
    pub name: String,
    /// Token data, ciphertext if `encrypted`
    pub data: Vec<u8>,
    /// Whether `data` is ciphertext
    pub encrypted: bool,
    /// Integrity tag over the name and data
    pub signature: Vec<u8>,
}

impl ServiceTokenRequest {
    /// Protect this token with `context`: encrypt if requested, then sign.
    pub async fn protect(&self, context: &dyn CryptoContext) -> Result<ServiceToken, CryptoError> {
        let data = if self.encrypt {
            context.encrypt(&self.data).await?
        } else {
            self.data.clone()
        };

        let signature = context.sign(&signed_bytes(&self.name, self.encrypt, &data)).await?;

        Ok(ServiceToken { name: self.name.clone(), data, encrypted: self.encrypt, signature })
    }
}

impl ServiceToken {
    /// Check the token's integrity tag against `context`.
    pub async fn verify(&self, context: &dyn CryptoContext) -> Result<bool, CryptoError> {
        context.verify(&signed_bytes(&self.name, self.encrypted, &self.data), &self.signature).await
    }
}

/// `name || 0x00 || encrypted || data`
fn signed_bytes(name: &str, encrypted: bool, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(name.len() + 2 + data.len());
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    bytes.push(u8::from(encrypted));
    bytes.extend_from_slice(data);
    bytes
}

/// Message builder side of service token updates.
pub trait ServiceTokenBuilder: Send {
    /// Attach a protected token to the message under construction.
    fn add_service_token(&mut self, token: ServiceToken);
}

#[cfg(test)]
mod tests {
    use wardline_crypto::NullCryptoContext;

    use super::*;

    fn null(id: &str) -> Arc<dyn CryptoContext> {
        Arc::new(NullCryptoContext::new(id))
    }

    #[test]
    fn resolve_prefers_explicit_binding() {
        let mut contexts = ServiceTokenContexts::new();
        contexts.insert("serviceToken", null("named"));
        contexts.insert(DEFAULT_SERVICE_TOKEN_NAME, null("default"));

        assert_eq!(contexts.resolve("serviceToken").unwrap().id(), "named");
        assert_eq!(contexts.resolve("other").unwrap().id(), "default");
    }

    #[test]
    fn resolve_fails_closed_without_default() {
        let mut contexts = ServiceTokenContexts::new();
        contexts.insert("serviceToken", null("named"));

        assert_eq!(
            contexts.resolve("other").err(),
            Some(PolicyError::UnresolvedServiceToken { name: "other".to_string() })
        );
    }

    #[test]
    fn remove_drops_only_that_binding() {
        let mut contexts = ServiceTokenContexts::new();
        contexts.insert("serviceToken", null("named"));
        contexts.insert(DEFAULT_SERVICE_TOKEN_NAME, null("default"));

        assert!(contexts.remove("serviceToken").is_some());
        assert!(!contexts.contains("serviceToken"));
        assert!(contexts.contains(DEFAULT_SERVICE_TOKEN_NAME));
        assert_eq!(contexts.len(), 1);
    }

    #[tokio::test]
    async fn protect_then_verify() {
        let context = NullCryptoContext::new("null");
        let request =
            ServiceTokenRequest { name: "session".to_string(), data: b"abc".to_vec(), encrypt: true };

        let token = request.protect(&context).await.unwrap();

        assert_eq!(token.name, "session");
        assert!(token.encrypted);
        assert!(token.verify(&context).await.unwrap());
    }
}
