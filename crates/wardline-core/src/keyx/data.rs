//! Key exchange wire records.
//!
//! Requests and responses are serde enums internally tagged by `scheme` and
//! encoded as CBOR. A record carries its scheme, the correlating identifier
//! and scheme-specific public material. Private material is not representable
//! here.
//!
//! Wrapped-scheme requests carry a fresh nonce that the response echoes, so
//! two requests for the same key pair or pre-shared key never encode alike.
//! A Diffie-Hellman request is already unique through its ephemeral public
//! value.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::KeyExchangeError;

/// Length of the per-request nonce in wrapped-scheme records.
pub const REQUEST_NONCE_SIZE: usize = 16;

/// Key exchange scheme tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyExchangeScheme {
    /// Ephemeral Diffie-Hellman under a named parameter set
    DiffieHellman,
    /// Session keys wrapped with the initiator's public key
    AsymmetricWrapped,
    /// Session keys wrapped with a pre-shared key
    SymmetricWrapped,
}

impl KeyExchangeScheme {
    /// Canonical scheme name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiffieHellman => "DIFFIE_HELLMAN",
            Self::AsymmetricWrapped => "ASYMMETRIC_WRAPPED",
            Self::SymmetricWrapped => "SYMMETRIC_WRAPPED",
        }
    }
}

impl fmt::Display for KeyExchangeScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Asymmetric wrapping mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mechanism {
    /// RSA-OAEP with SHA-256
    #[serde(rename = "RSA")]
    Rsa,
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa => f.write_str("RSA"),
        }
    }
}

/// Key request offered by the initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme")]
pub enum KeyRequestData {
    /// Initiator's ephemeral public value
    DiffieHellman {
        /// Parameter set ID
        parameters_id: String,
        /// Public value
        #[serde(with = "serde_bytes")]
        public_value: Vec<u8>,
    },
    /// Initiator's public wrapping key
    AsymmetricWrapped {
        /// Key pair ID
        key_pair_id: String,
        /// Wrapping mechanism
        mechanism: Mechanism,
        /// DER `SubjectPublicKeyInfo`
        #[serde(with = "serde_bytes")]
        public_key: Vec<u8>,
        /// Fresh per-request nonce
        #[serde(with = "serde_bytes")]
        nonce: Vec<u8>,
    },
    /// Reference to a pre-shared key; no key material
    SymmetricWrapped {
        /// Pre-shared key ID
        key_id: String,
        /// Fresh per-request nonce
        #[serde(with = "serde_bytes")]
        nonce: Vec<u8>,
    },
}

/// Key response produced by the responder for exactly one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme")]
pub enum KeyResponseData {
    /// Responder's ephemeral public value
    DiffieHellman {
        /// Parameter set ID from the request
        parameters_id: String,
        /// Public value
        #[serde(with = "serde_bytes")]
        public_value: Vec<u8>,
    },
    /// Session keys wrapped with the request's public key
    AsymmetricWrapped {
        /// Key pair ID from the request
        key_pair_id: String,
        /// Wrapping mechanism from the request
        mechanism: Mechanism,
        /// Wrapped cipher key
        #[serde(with = "serde_bytes")]
        encryption_key: Vec<u8>,
        /// Wrapped integrity key
        #[serde(with = "serde_bytes")]
        hmac_key: Vec<u8>,
        /// Nonce echoed from the request
        #[serde(with = "serde_bytes")]
        nonce: Vec<u8>,
    },
    /// Session keys wrapped with the pre-shared key
    SymmetricWrapped {
        /// Pre-shared key ID from the request
        key_id: String,
        /// Wrapped cipher key
        #[serde(with = "serde_bytes")]
        encryption_key: Vec<u8>,
        /// Wrapped integrity key
        #[serde(with = "serde_bytes")]
        hmac_key: Vec<u8>,
        /// Nonce echoed from the request
        #[serde(with = "serde_bytes")]
        nonce: Vec<u8>,
    },
}

impl KeyRequestData {
    /// Scheme tag.
    pub fn scheme(&self) -> KeyExchangeScheme {
        match self {
            Self::DiffieHellman { .. } => KeyExchangeScheme::DiffieHellman,
            Self::AsymmetricWrapped { .. } => KeyExchangeScheme::AsymmetricWrapped,
            Self::SymmetricWrapped { .. } => KeyExchangeScheme::SymmetricWrapped,
        }
    }

    /// Correlating identifier (parameter set, key pair or pre-shared key ID).
    pub fn identifier(&self) -> &str {
        match self {
            Self::DiffieHellman { parameters_id, .. } => parameters_id,
            Self::AsymmetricWrapped { key_pair_id, .. } => key_pair_id,
            Self::SymmetricWrapped { key_id, .. } => key_id,
        }
    }

    /// Per-request nonce; `None` for Diffie-Hellman.
    pub fn nonce(&self) -> Option<&[u8]> {
        match self {
            Self::DiffieHellman { .. } => None,
            Self::AsymmetricWrapped { nonce, .. } | Self::SymmetricWrapped { nonce, .. } => Some(nonce),
        }
    }

    /// Bytes that make this request unique: the nonce, or the ephemeral
    /// public value for Diffie-Hellman.
    pub fn freshness(&self) -> &[u8] {
        match self {
            Self::DiffieHellman { public_value, .. } => public_value,
            Self::AsymmetricWrapped { nonce, .. } | Self::SymmetricWrapped { nonce, .. } => nonce,
        }
    }

    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, KeyExchangeError> {
        to_cbor(self)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, KeyExchangeError> {
        from_cbor(bytes)
    }
}

impl KeyResponseData {
    /// Scheme tag.
    pub fn scheme(&self) -> KeyExchangeScheme {
        match self {
            Self::DiffieHellman { .. } => KeyExchangeScheme::DiffieHellman,
            Self::AsymmetricWrapped { .. } => KeyExchangeScheme::AsymmetricWrapped,
            Self::SymmetricWrapped { .. } => KeyExchangeScheme::SymmetricWrapped,
        }
    }

    /// Correlating identifier copied from the request.
    pub fn identifier(&self) -> &str {
        match self {
            Self::DiffieHellman { parameters_id, .. } => parameters_id,
            Self::AsymmetricWrapped { key_pair_id, .. } => key_pair_id,
            Self::SymmetricWrapped { key_id, .. } => key_id,
        }
    }

    /// Nonce echoed from the request; `None` for Diffie-Hellman.
    pub fn nonce(&self) -> Option<&[u8]> {
        match self {
            Self::DiffieHellman { .. } => None,
            Self::AsymmetricWrapped { nonce, .. } | Self::SymmetricWrapped { nonce, .. } => Some(nonce),
        }
    }

    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, KeyExchangeError> {
        to_cbor(self)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, KeyExchangeError> {
        from_cbor(bytes)
    }
}

/// Reject a nonce of the wrong length.
pub(crate) fn check_nonce(nonce: &[u8]) -> Result<(), KeyExchangeError> {
    if nonce.len() != REQUEST_NONCE_SIZE {
        return Err(KeyExchangeError::MalformedData {
            reason: format!("nonce is {} bytes, expected {REQUEST_NONCE_SIZE}", nonce.len()),
        });
    }
    Ok(())
}

fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, KeyExchangeError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(|e| KeyExchangeError::MalformedData { reason: format!("CBOR encode failed: {e}") })?;
    Ok(bytes)
}

fn from_cbor<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, KeyExchangeError> {
    ciborium::de::from_reader(bytes)
        .map_err(|e| KeyExchangeError::MalformedData { reason: format!("CBOR decode failed: {e}") })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_follows_scheme() {
        let request = KeyRequestData::AsymmetricWrapped {
            key_pair_id: "rsaKeypairId".to_string(),
            mechanism: Mechanism::Rsa,
            public_key: vec![1, 2, 3],
            nonce: vec![7; REQUEST_NONCE_SIZE],
        };

        assert_eq!(request.scheme(), KeyExchangeScheme::AsymmetricWrapped);
        assert_eq!(request.identifier(), "rsaKeypairId");
    }

    #[test]
    fn request_cbor_carries_scheme_tag() {
        let request =
            KeyRequestData::SymmetricWrapped { key_id: "PSK".to_string(), nonce: vec![7; REQUEST_NONCE_SIZE] };
        let bytes = request.to_cbor().unwrap();

        let value: ciborium::Value = ciborium::de::from_reader(&bytes[..]).unwrap();
        let map = value.as_map().unwrap();
        let scheme = map
            .iter()
            .find(|(k, _)| k.as_text() == Some("scheme"))
            .and_then(|(_, v)| v.as_text())
            .unwrap();

        assert_eq!(scheme, "SymmetricWrapped");
        assert_eq!(KeyRequestData::from_cbor(&bytes).unwrap(), request);
    }

    #[test]
    fn mechanism_serializes_as_rsa() {
        let request = KeyRequestData::AsymmetricWrapped {
            key_pair_id: "kp".to_string(),
            mechanism: Mechanism::Rsa,
            public_key: Vec::new(),
            nonce: vec![7; REQUEST_NONCE_SIZE],
        };
        let bytes = request.to_cbor().unwrap();

        let value: ciborium::Value = ciborium::de::from_reader(&bytes[..]).unwrap();
        let mechanism = value
            .as_map()
            .unwrap()
            .iter()
            .find(|(k, _)| k.as_text() == Some("mechanism"))
            .and_then(|(_, v)| v.as_text())
            .unwrap()
            .to_string();

        assert_eq!(mechanism, "RSA");
    }

    #[test]
    fn response_decode_rejects_unknown_scheme() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(
            &ciborium::Value::Map(vec![(
                ciborium::Value::Text("scheme".to_string()),
                ciborium::Value::Text("Quantum".to_string()),
            )]),
            &mut bytes,
        )
        .unwrap();

        assert!(matches!(
            KeyResponseData::from_cbor(&bytes),
            Err(KeyExchangeError::MalformedData { .. })
        ));
    }

    #[test]
    fn truncated_record_is_malformed() {
        let response = KeyResponseData::SymmetricWrapped {
            key_id: "PSK".to_string(),
            encryption_key: vec![0xAA; 72],
            hmac_key: vec![0xBB; 72],
            nonce: vec![0xCC; REQUEST_NONCE_SIZE],
        };
        let bytes = response.to_cbor().unwrap();

        assert!(matches!(
            KeyResponseData::from_cbor(&bytes[..bytes.len() - 10]),
            Err(KeyExchangeError::MalformedData { .. })
        ));
    }

    #[test]
    fn freshness_is_nonce_or_public_value() {
        let wrapped =
            KeyRequestData::SymmetricWrapped { key_id: "PSK".to_string(), nonce: vec![9; REQUEST_NONCE_SIZE] };
        let dh = KeyRequestData::DiffieHellman { parameters_id: "1".to_string(), public_value: vec![5; 32] };

        assert_eq!(wrapped.freshness(), &[9; REQUEST_NONCE_SIZE]);
        assert_eq!(wrapped.nonce(), Some(&[9; REQUEST_NONCE_SIZE][..]));
        assert_eq!(dh.freshness(), &[5; 32]);
        assert_eq!(dh.nonce(), None);
    }

    #[test]
    fn short_nonce_is_malformed() {
        assert!(check_nonce(&[0; REQUEST_NONCE_SIZE]).is_ok());
        assert!(matches!(check_nonce(&[0; 4]), Err(KeyExchangeError::MalformedData { .. })));
    }
}
