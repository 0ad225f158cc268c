//! Tests for the deterministic test support itself.
//!
//! Integration tests in the other crates lean on these guarantees:
//! - `SimEnv` seeds reproduce key material exactly
//! - `DelayedCryptoContext` delays without altering results
//! - Fixture stores carry the default credentials

use std::time::Duration;

use proptest::prelude::*;
use wardline_core::{
    config::{DEFAULT_DH_PARAMETERS_ID, DEFAULT_KEY_PAIR_ID, DEFAULT_PSK_ID},
    keyx::{DhGroup, KeyStore},
};
use wardline_crypto::{CipherKey, CryptoContext, KeyAlgorithm, KeyUsage, SymmetricCryptoContext};
use wardline_harness::{DelayedCryptoContext, SimEnv, default_key_store, init_tracing};

proptest! {
    /// Two environments with the same seed generate identical keys.
    #[test]
    fn prop_seed_reproduces_keys(seed in any::<u64>()) {
        let a = CipherKey::generate(&SimEnv::with_seed(seed), KeyAlgorithm::HmacSha256, KeyUsage::SignVerify).unwrap();
        let b = CipherKey::generate(&SimEnv::with_seed(seed), KeyAlgorithm::HmacSha256, KeyUsage::SignVerify).unwrap();

        prop_assert_eq!(a, b);
    }
}

#[test]
fn fixture_store_has_default_credentials() {
    let store = default_key_store(&SimEnv::new()).unwrap();

    assert!(store.preshared_key(DEFAULT_PSK_ID).is_some());
    assert!(store.key_pair(DEFAULT_KEY_PAIR_ID).is_some());
    assert_eq!(store.dh_parameters(DEFAULT_DH_PARAMETERS_ID), Some(DhGroup::X25519));
    assert!(store.preshared_key("missing").is_none());
}

#[tokio::test(start_paused = true)]
async fn delayed_context_waits_then_delegates() {
    init_tracing();
    let inner = SymmetricCryptoContext::generate(SimEnv::with_seed(3), "delayed").unwrap();
    let delayed = DelayedCryptoContext::new(inner.clone(), Duration::from_secs(2));

    let start = tokio::time::Instant::now();
    let sealed = delayed.encrypt(b"payload").await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(2));
    assert_eq!(delayed.id(), "delayed");
    assert_eq!(inner.decrypt(&sealed).await.unwrap(), b"payload");

    let tag = inner.sign(b"payload").await.unwrap();
    assert!(delayed.verify(b"payload", &tag).await.unwrap());
}
