//! Deployment configuration injected at construction.

use std::time::Duration;

use crate::keyx::{KeyExchangeScheme, Mechanism};

/// Key-pair ID used when none is configured.
pub const DEFAULT_KEY_PAIR_ID: &str = "rsaKeypairId";

/// Diffie-Hellman parameter set ID used when none is configured.
pub const DEFAULT_DH_PARAMETERS_ID: &str = "1";

/// Pre-shared key ID used when none is configured.
pub const DEFAULT_PSK_ID: &str = "PSK";

/// Service token bound to its own crypto context unless configured otherwise.
pub const SERVICE_TOKEN_NAME: &str = "serviceToken";

/// Answered key requests a responder remembers for replay detection.
pub const DEFAULT_REPLAY_WINDOW: usize = 1024;

/// Upper bound for `update_service_tokens`.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Key exchange configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchangeConfig {
    /// Responder scheme preference, most preferred first
    pub preference: Vec<KeyExchangeScheme>,
    /// Diffie-Hellman parameter set offered by initiators
    pub dh_parameters_id: String,
    /// Asymmetric key pair offered by initiators
    pub key_pair_id: String,
    /// Asymmetric wrapping mechanism
    pub mechanism: Mechanism,
    /// Pre-shared key offered by initiators
    pub psk_id: String,
    /// Whether initiators offer Diffie-Hellman (placed first when enabled)
    pub offer_diffie_hellman: bool,
    /// Answered requests a responder remembers for replay detection
    pub replay_window: usize,
}

impl Default for KeyExchangeConfig {
    fn default() -> Self {
        Self {
            preference: vec![
                KeyExchangeScheme::AsymmetricWrapped,
                KeyExchangeScheme::SymmetricWrapped,
                KeyExchangeScheme::DiffieHellman,
            ],
            dh_parameters_id: DEFAULT_DH_PARAMETERS_ID.to_string(),
            key_pair_id: DEFAULT_KEY_PAIR_ID.to_string(),
            mechanism: Mechanism::Rsa,
            psk_id: DEFAULT_PSK_ID.to_string(),
            offer_diffie_hellman: false,
            replay_window: DEFAULT_REPLAY_WINDOW,
        }
    }
}

/// Message context configuration
#[derive(Clone, PartialEq, Eq)]
pub struct MessageContextConfig {
    /// Service token bound to its own crypto context
    pub service_token_name: String,
    /// Email for the email/password scheme
    pub email: String,
    /// Password for the email/password scheme
    pub password: String,
    /// Deadline for `update_service_tokens`
    pub operation_timeout: Duration,
    /// Key exchange offers
    pub key_exchange: KeyExchangeConfig,
}

impl Default for MessageContextConfig {
    fn default() -> Self {
        Self {
            service_token_name: SERVICE_TOKEN_NAME.to_string(),
            email: "user@example.com".to_string(),
            password: "password".to_string(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            key_exchange: KeyExchangeConfig::default(),
        }
    }
}

impl std::fmt::Debug for MessageContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageContextConfig")
            .field("service_token_name", &self.service_token_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("operation_timeout", &self.operation_timeout)
            .field("key_exchange", &self.key_exchange)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preference_order() {
        let config = KeyExchangeConfig::default();

        assert_eq!(
            config.preference,
            vec![
                KeyExchangeScheme::AsymmetricWrapped,
                KeyExchangeScheme::SymmetricWrapped,
                KeyExchangeScheme::DiffieHellman,
            ]
        );
        assert!(!config.offer_diffie_hellman);
    }

    #[test]
    fn debug_redacts_password() {
        let config = MessageContextConfig {
            password: "hunter2".to_string(),
            ..MessageContextConfig::default()
        };

        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
